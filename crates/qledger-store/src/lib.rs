//! Account store backends.
//!
//! This crate provides:
//! - The [`AccountStore`] trait the ledger's callers persist through
//! - An in-memory store for tests and single-node deployments
//! - A REST store speaking to a PostgREST-style `profiles` table
//! - Retry with exponential backoff and store metrics

pub mod error;
pub mod memory;
pub mod metrics;
pub mod record;
pub mod rest;
pub mod retry;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryAccountStore;
pub use record::ProfileRecord;
pub use rest::{RestAccountStore, RestStoreConfig};
pub use retry::RetryConfig;
pub use store::AccountStore;
