//! Shared data models for the quota ledger.
//!
//! This crate provides Serde-serializable types for:
//! - Plan tiers and their entitlements
//! - User accounts with credit and image-window counters
//! - Metered actions and their costs
//! - Affordability decisions and denial reasons

pub mod account;
pub mod action;
pub mod decision;
pub mod plan;
pub mod state;
pub mod time;

// Re-export common types
pub use account::{Account, INITIAL_CREDITS};
pub use action::{Action, ActionKind, IMAGE_COST, TEXT_COST};
pub use decision::{Decision, DenialReason};
pub use plan::{PlanEntitlements, PlanTier};
pub use state::AccountState;
pub use time::{now_millis, EpochMillis};
