//! The account store contract.

use async_trait::async_trait;
use qledger_models::Account;

use crate::error::StoreResult;

/// Durable key-value record per user.
///
/// Every successful write bumps `revision` and returns the stored account.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Load a user's account. `Ok(None)` when it has never been created.
    async fn load(&self, user_id: &str) -> StoreResult<Option<Account>>;

    /// Upsert: create if absent, otherwise overwrite. Last write wins, but
    /// the stored revision ends above both the caller's and the previous one.
    async fn save(&self, account: &Account) -> StoreResult<Account>;

    /// Overwrite only if the stored revision still equals `expected`.
    ///
    /// Transient failures may be retried; a retry that finds this same write
    /// already applied succeeds instead of reporting a conflict.
    ///
    /// Fails with [`StoreError::PreconditionFailed`] when another writer got
    /// there first and [`StoreError::NotFound`] when there is no record.
    ///
    /// [`StoreError::PreconditionFailed`]: crate::StoreError::PreconditionFailed
    /// [`StoreError::NotFound`]: crate::StoreError::NotFound
    async fn save_if_revision(&self, account: &Account, expected: u64) -> StoreResult<Account>;

    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> StoreResult<()>;

    /// Backend name for logs and health output.
    fn name(&self) -> &'static str;
}
