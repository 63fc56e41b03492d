//! Application state.

use std::sync::Arc;

use qledger_store::{AccountStore, InMemoryAccountStore, RestAccountStore, StoreResult};
use tracing::info;

use crate::config::{ApiConfig, StoreBackend};
use crate::services::QuotaService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub quota: QuotaService,
}

impl AppState {
    /// Build state with the store selected by `config`.
    pub fn new(config: ApiConfig) -> StoreResult<Self> {
        let store: Arc<dyn AccountStore> = match config.store {
            StoreBackend::Memory => Arc::new(InMemoryAccountStore::new()),
            StoreBackend::Rest => Arc::new(RestAccountStore::from_env()?),
        };
        info!(store = store.name(), "Account store ready");
        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: ApiConfig, store: Arc<dyn AccountStore>) -> Self {
        Self {
            config,
            quota: QuotaService::new(store),
        }
    }
}
