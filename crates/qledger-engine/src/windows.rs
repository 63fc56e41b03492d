//! Time-window reconciliation.
//!
//! Two independent windows govern an account:
//! - the credit window (7 days), after which `credits` is set back to the
//!   plan's full entitlement;
//! - the image window (10 hours), after which `daily_image_count` returns to 0.
//!
//! A window has elapsed when `now - last_reset > window`. Each elapsed window
//! resets exactly once and its timestamp advances to `now`, so reconciling
//! again with the same `now` is a no-op.

use qledger_models::time::{EpochMillis, MILLIS_PER_DAY, MILLIS_PER_HOUR};
use qledger_models::Account;
use tracing::debug;

use crate::catalog::PlanCatalog;

/// Length of the credit window.
pub const CREDIT_WINDOW_MS: EpochMillis = 7 * MILLIS_PER_DAY;

/// Length of the image window in hours.
pub const IMAGE_WINDOW_HOURS: u32 = 10;

/// Length of the image window.
pub const IMAGE_WINDOW_MS: EpochMillis = IMAGE_WINDOW_HOURS as EpochMillis * MILLIS_PER_HOUR;

/// Result of reconciling an account against the clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// The account after zero, one or two resets.
    pub account: Account,
    /// Whether the credit window reset.
    pub credit_reset: bool,
    /// Whether the image window reset.
    pub image_reset: bool,
}

impl Reconciliation {
    /// True if any field changed and the account should be persisted.
    pub fn changed(&self) -> bool {
        self.credit_reset || self.image_reset
    }
}

fn elapsed(last_reset: EpochMillis, now: EpochMillis, window: EpochMillis) -> bool {
    now.saturating_sub(last_reset) > window
}

/// Apply any elapsed window resets to `account` as of `now`.
///
/// Credits are overwritten with the entitlement, never incremented.
pub fn reconcile_windows<P: PlanCatalog + ?Sized>(
    account: &Account,
    catalog: &P,
    now: EpochMillis,
) -> Reconciliation {
    let mut next = account.clone();
    let mut credit_reset = false;
    let mut image_reset = false;

    if elapsed(account.last_credit_reset, now, CREDIT_WINDOW_MS) {
        next.credits = catalog.entitlement_for(account.plan);
        next.last_credit_reset = now;
        credit_reset = true;
    }

    if elapsed(account.last_image_reset, now, IMAGE_WINDOW_MS) {
        next.daily_image_count = 0;
        next.last_image_reset = now;
        image_reset = true;
    }

    if credit_reset || image_reset {
        debug!(
            user_id = %account.user_id,
            credit_reset,
            image_reset,
            credits = next.credits,
            "Reconciled quota windows"
        );
    }

    Reconciliation {
        account: next,
        credit_reset,
        image_reset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticPlanCatalog;
    use qledger_models::PlanTier;

    const NOW: EpochMillis = 1_750_000_000_000;

    fn account() -> Account {
        Account::new("user", NOW)
    }

    #[test]
    fn test_no_reset_inside_both_windows() {
        let a = account().with_credits(3).with_daily_image_count(2);
        let r = reconcile_windows(&a, &StaticPlanCatalog, NOW + MILLIS_PER_HOUR);
        assert!(!r.changed());
        assert_eq!(r.account, a);
    }

    #[test]
    fn test_credit_reset_overwrites_balance() {
        let a = account()
            .with_plan(PlanTier::Plus)
            .with_credits(1000)
            .with_resets(NOW - 8 * MILLIS_PER_DAY, NOW);
        let r = reconcile_windows(&a, &StaticPlanCatalog, NOW);
        assert!(r.credit_reset);
        assert!(!r.image_reset);
        assert_eq!(r.account.credits, 1000);
        assert_eq!(r.account.last_credit_reset, NOW);
    }

    #[test]
    fn test_credit_reset_never_adds() {
        for credits in [0, 42, 100, 9_999] {
            let a = account()
                .with_credits(credits)
                .with_resets(NOW - CREDIT_WINDOW_MS - 1, NOW);
            let r = reconcile_windows(&a, &StaticPlanCatalog, NOW);
            assert_eq!(r.account.credits, 100, "starting from {}", credits);
        }
    }

    #[test]
    fn test_exact_window_boundary_does_not_reset() {
        let a = account().with_credits(1).with_resets(NOW - CREDIT_WINDOW_MS, NOW - IMAGE_WINDOW_MS);
        let r = reconcile_windows(&a, &StaticPlanCatalog, NOW);
        assert!(!r.changed());

        let r = reconcile_windows(&a, &StaticPlanCatalog, NOW + 1);
        assert!(r.credit_reset);
        assert!(r.image_reset);
    }

    #[test]
    fn test_image_reset_leaves_credits_alone() {
        let a = account()
            .with_credits(7)
            .with_daily_image_count(3)
            .with_resets(NOW, NOW - 11 * MILLIS_PER_HOUR);
        let r = reconcile_windows(&a, &StaticPlanCatalog, NOW);
        assert!(r.image_reset);
        assert!(!r.credit_reset);
        assert_eq!(r.account.daily_image_count, 0);
        assert_eq!(r.account.credits, 7);
        assert_eq!(r.account.last_image_reset, NOW);
        assert_eq!(r.account.last_credit_reset, NOW);
    }

    #[test]
    fn test_credit_reset_leaves_image_count_alone() {
        let a = account()
            .with_credits(0)
            .with_daily_image_count(2)
            .with_resets(NOW - 8 * MILLIS_PER_DAY, NOW - MILLIS_PER_HOUR);
        let r = reconcile_windows(&a, &StaticPlanCatalog, NOW);
        assert!(r.credit_reset);
        assert_eq!(r.account.daily_image_count, 2);
    }

    #[test]
    fn test_both_windows_reset_in_one_pass() {
        let a = account()
            .with_plan(PlanTier::Pro)
            .with_credits(4)
            .with_daily_image_count(9)
            .with_resets(NOW - 30 * MILLIS_PER_DAY, NOW - 30 * MILLIS_PER_DAY);
        let r = reconcile_windows(&a, &StaticPlanCatalog, NOW);
        assert!(r.credit_reset && r.image_reset);
        assert_eq!(r.account.credits, 500);
        assert_eq!(r.account.daily_image_count, 0);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let a = account()
            .with_credits(12)
            .with_daily_image_count(3)
            .with_resets(NOW - 9 * MILLIS_PER_DAY, NOW - 12 * MILLIS_PER_HOUR);
        let once = reconcile_windows(&a, &StaticPlanCatalog, NOW);
        let twice = reconcile_windows(&once.account, &StaticPlanCatalog, NOW);
        assert_eq!(once.account, twice.account);
        assert!(!twice.changed());
    }

    #[test]
    fn test_clock_behind_last_reset_is_noop() {
        let a = account().with_credits(1);
        let r = reconcile_windows(&a, &StaticPlanCatalog, NOW - MILLIS_PER_DAY);
        assert!(!r.changed());
    }
}
