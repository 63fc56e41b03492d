//! Wire representation of an account in the REST store.
//!
//! Rows live in a `profiles` table keyed by `id`, with snake_case columns.
//! Rows written by older clients may miss any of the quota columns; missing
//! values fall back to the same defaults a new account gets.

use qledger_models::time::EpochMillis;
use qledger_models::{Account, PlanTier, INITIAL_CREDITS};
use serde::{Deserialize, Serialize};

/// One row of the profiles table, limited to the quota columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_credit_reset: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_image_count: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_image_reset: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<i64>,
}

fn clamp_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

impl ProfileRecord {
    /// Build a row carrying every quota column.
    pub fn from_account(account: &Account) -> Self {
        Self {
            id: account.user_id.clone(),
            plan: Some(account.plan.as_str().to_string()),
            credits: Some(i64::from(account.credits)),
            last_credit_reset: Some(account.last_credit_reset),
            daily_image_count: Some(i64::from(account.daily_image_count)),
            last_image_reset: Some(account.last_image_reset),
            revision: Some(i64::try_from(account.revision).unwrap_or(i64::MAX)),
        }
    }

    /// Convert to an account, filling gaps as of `now`.
    ///
    /// Negative counters clamp to zero and an unrecognised plan reads as basic.
    pub fn into_account(self, now: EpochMillis) -> Account {
        Account {
            plan: self
                .plan
                .as_deref()
                .map(PlanTier::from_str)
                .unwrap_or_default(),
            credits: self.credits.map(clamp_u32).unwrap_or(INITIAL_CREDITS),
            last_credit_reset: self.last_credit_reset.unwrap_or(now),
            daily_image_count: self.daily_image_count.map(clamp_u32).unwrap_or(0),
            last_image_reset: self.last_image_reset.unwrap_or(now),
            revision: self.revision.map(|r| r.max(0) as u64).unwrap_or(0),
            user_id: self.id,
        }
    }
}
