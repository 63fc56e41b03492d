//! Quota ledger engine.
//!
//! Pure, synchronous accounting over a single [`Account`]:
//! - Window reconciliation (weekly credits, 10-hour image window)
//! - Request classification into text or image actions
//! - Affordability checks against balance and tier sub-limits
//! - Debits and plan upgrades
//!
//! Nothing here performs I/O. Callers load the account, run it through the
//! ledger, and persist whatever comes back.
//!
//! [`Account`]: qledger_models::Account

pub mod affordability;
pub mod catalog;
pub mod classifier;
pub mod error;
pub mod ledger;
pub mod state;
pub mod upgrade;
pub mod windows;

pub use affordability::{check_affordability, debit};
pub use catalog::{PlanCatalog, StaticPlanCatalog};
pub use classifier::{classify_cost, ActionClassifier, PatternClassifier};
pub use error::{LedgerError, LedgerResult};
pub use ledger::{Evaluation, QuotaLedger};
pub use state::account_state;
pub use upgrade::apply_plan_upgrade;
pub use windows::{reconcile_windows, Reconciliation, CREDIT_WINDOW_MS, IMAGE_WINDOW_HOURS, IMAGE_WINDOW_MS};
