//! Business logic services.

pub mod quota;

pub use quota::{ConsumeOutcome, QuotaService, QuotaSnapshot, MAX_COMMIT_RETRIES};
