//! In-memory account store.

use std::collections::HashMap;

use async_trait::async_trait;
use qledger_models::Account;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::store::AccountStore;

/// Process-local store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts.
    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn load(&self, user_id: &str) -> StoreResult<Option<Account>> {
        Ok(self.accounts.read().await.get(user_id).cloned())
    }

    async fn save(&self, account: &Account) -> StoreResult<Account> {
        let mut accounts = self.accounts.write().await;
        let current = accounts.get(&account.user_id).map(|a| a.revision).unwrap_or(0);

        let mut stored = account.clone();
        stored.revision = current.max(account.revision) + 1;
        accounts.insert(stored.user_id.clone(), stored.clone());

        debug!(user_id = %stored.user_id, revision = stored.revision, "Saved account");
        Ok(stored)
    }

    async fn save_if_revision(&self, account: &Account, expected: u64) -> StoreResult<Account> {
        let mut accounts = self.accounts.write().await;
        let current = accounts
            .get(&account.user_id)
            .map(|a| a.revision)
            .ok_or_else(|| StoreError::not_found(account.user_id.clone()))?;

        if current != expected {
            return Err(StoreError::PreconditionFailed(format!(
                "{} is at revision {}, expected {}",
                account.user_id, current, expected
            )));
        }

        let mut stored = account.clone();
        stored.revision = expected + 1;
        accounts.insert(stored.user_id.clone(), stored.clone());
        Ok(stored)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
