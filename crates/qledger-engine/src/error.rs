//! Ledger error types.

use qledger_models::DenialReason;
use thiserror::Error;

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Misuse of the ledger API. Denials themselves are values, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Cannot commit a denied action: {0}")]
    NotAllowed(DenialReason),
}
