//! User account record.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::plan::PlanTier;
use crate::time::EpochMillis;

/// Credit balance granted when an account is first created.
pub const INITIAL_CREDITS: u32 = 100;

/// Per-user quota record.
///
/// There is exactly one authoritative account per user. It is read before
/// every metered action and written back after every reset or debit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Account {
    /// Owner of this account.
    pub user_id: String,

    /// Current plan tier.
    #[serde(default)]
    pub plan: PlanTier,

    /// Spendable credit balance.
    pub credits: u32,

    /// When `credits` was last replenished (epoch millis).
    pub last_credit_reset: EpochMillis,

    /// Image generations since the last image-window reset.
    #[serde(default)]
    pub daily_image_count: u32,

    /// When the image window last reset (epoch millis).
    pub last_image_reset: EpochMillis,

    /// Write counter used for conditional saves.
    #[serde(default)]
    pub revision: u64,
}

impl Account {
    /// Create a fresh basic-tier account at `now`.
    pub fn new(user_id: impl Into<String>, now: EpochMillis) -> Self {
        Self {
            user_id: user_id.into(),
            plan: PlanTier::Basic,
            credits: INITIAL_CREDITS,
            last_credit_reset: now,
            daily_image_count: 0,
            last_image_reset: now,
            revision: 0,
        }
    }

    /// Set the plan tier.
    pub fn with_plan(mut self, plan: PlanTier) -> Self {
        self.plan = plan;
        self
    }

    /// Set the credit balance.
    pub fn with_credits(mut self, credits: u32) -> Self {
        self.credits = credits;
        self
    }

    /// Set the image counter.
    pub fn with_daily_image_count(mut self, count: u32) -> Self {
        self.daily_image_count = count;
        self
    }

    /// Set both window reset timestamps.
    pub fn with_resets(mut self, last_credit_reset: EpochMillis, last_image_reset: EpochMillis) -> Self {
        self.last_credit_reset = last_credit_reset;
        self.last_image_reset = last_image_reset;
        self
    }

    /// Compare the quota-bearing fields, ignoring `revision`.
    pub fn same_quota(&self, other: &Account) -> bool {
        self.user_id == other.user_id
            && self.plan == other.plan
            && self.credits == other.credits
            && self.last_credit_reset == other.last_credit_reset
            && self.daily_image_count == other.daily_image_count
            && self.last_image_reset == other.last_image_reset
    }
}
