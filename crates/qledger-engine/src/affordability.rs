//! Affordability checks and debits.

use qledger_models::{Account, Action, Decision, DenialReason};

use crate::catalog::PlanCatalog;
use crate::windows::IMAGE_WINDOW_HOURS;

/// Decide whether `account` can pay for `action`.
///
/// The account must already be reconciled. The credit floor applies to every
/// tier and is checked first; the image sub-limit only applies to tiers whose
/// entitlements carry one.
pub fn check_affordability<P: PlanCatalog + ?Sized>(
    account: &Account,
    action: &Action,
    catalog: &P,
) -> Decision {
    if account.credits < action.cost {
        return Decision::Denied(DenialReason::InsufficientCredits {
            required: action.cost,
            available: account.credits,
        });
    }

    if action.consumes_image_slot() {
        let entitlements = catalog.entitlements(account.plan);
        if let Some(limit) = entitlements.image_limit {
            if account.daily_image_count >= limit {
                return Decision::Denied(DenialReason::ImageLimitExceeded {
                    limit,
                    window_hours: IMAGE_WINDOW_HOURS,
                });
            }
        }
    }

    Decision::Allowed
}

/// Charge `action` to `account`.
///
/// Callers must only debit an action that was `Allowed` for this exact
/// account state. The balance saturates at zero if that contract is broken.
pub fn debit(account: &Account, action: &Action) -> Account {
    let mut next = account.clone();
    next.credits = next.credits.saturating_sub(action.cost);
    if action.consumes_image_slot() {
        next.daily_image_count = next.daily_image_count.saturating_add(1);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticPlanCatalog;
    use qledger_models::PlanTier;

    fn basic(credits: u32, images: u32) -> Account {
        Account::new("u", 0).with_credits(credits).with_daily_image_count(images)
    }

    #[test]
    fn test_text_on_small_balance_is_allowed_and_debited() {
        let account = basic(5, 0);
        let action = Action::text();
        assert_eq!(check_affordability(&account, &action, &StaticPlanCatalog), Decision::Allowed);
        let after = debit(&account, &action);
        assert_eq!(after.credits, 4);
        assert_eq!(after.daily_image_count, 0);
    }

    #[test]
    fn test_basic_image_cap_applies_with_ample_credits() {
        let account = basic(100, 3);
        assert_eq!(
            check_affordability(&account, &Action::image(), &StaticPlanCatalog),
            Decision::Denied(DenialReason::ImageLimitExceeded {
                limit: 3,
                window_hours: 10
            })
        );
    }

    #[test]
    fn test_free_alias_is_capped_like_basic() {
        let account = basic(100, 3).with_plan(PlanTier::Free);
        assert!(!check_affordability(&account, &Action::image(), &StaticPlanCatalog).is_allowed());
    }

    #[test]
    fn test_paid_tiers_skip_image_cap() {
        for plan in [PlanTier::Pro, PlanTier::Plus, PlanTier::Agent] {
            let account = basic(10, 3).with_plan(plan);
            assert_eq!(
                check_affordability(&account, &Action::image(), &StaticPlanCatalog),
                Decision::Allowed,
                "{} should not be capped",
                plan
            );
        }
    }

    #[test]
    fn test_image_on_small_balance_is_insufficient() {
        let account = basic(5, 0);
        assert_eq!(
            check_affordability(&account, &Action::image(), &StaticPlanCatalog),
            Decision::Denied(DenialReason::InsufficientCredits {
                required: 10,
                available: 5
            })
        );
    }

    #[test]
    fn test_credit_floor_checked_before_image_cap() {
        let account = basic(2, 3);
        assert_eq!(
            check_affordability(&account, &Action::image(), &StaticPlanCatalog).outcome(),
            "insufficient_credits"
        );
    }

    #[test]
    fn test_text_is_never_image_capped() {
        let account = basic(1, 99);
        assert!(check_affordability(&account, &Action::text(), &StaticPlanCatalog).is_allowed());
    }

    #[test]
    fn test_exact_balance_is_allowed_and_reaches_zero() {
        let account = basic(10, 0);
        let action = Action::image();
        assert!(check_affordability(&account, &action, &StaticPlanCatalog).is_allowed());
        let after = debit(&account, &action);
        assert_eq!(after.credits, 0);
        assert_eq!(after.daily_image_count, 1);
    }

    #[test]
    fn test_allowed_debit_never_goes_negative() {
        for credits in 0..=25 {
            for action in [Action::text(), Action::image()] {
                let account = basic(credits, 0).with_plan(PlanTier::Pro);
                if check_affordability(&account, &action, &StaticPlanCatalog).is_allowed() {
                    let after = debit(&account, &action);
                    assert_eq!(after.credits, credits - action.cost);
                }
            }
        }
    }

    #[test]
    fn test_debit_does_not_touch_windows() {
        let account = Account::new("u", 123);
        let after = debit(&account, &Action::image());
        assert_eq!(after.last_credit_reset, 123);
        assert_eq!(after.last_image_reset, 123);
        assert_eq!(after.revision, account.revision);
    }
}
