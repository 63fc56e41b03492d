//! Observational state labels.

use qledger_models::{Account, AccountState, TEXT_COST};

use crate::catalog::PlanCatalog;

/// Label a reconciled account.
///
/// Precedence: credit exhaustion, then image cap, then fresh, else active.
pub fn account_state<P: PlanCatalog + ?Sized>(account: &Account, catalog: &P) -> AccountState {
    let entitlements = catalog.entitlements(account.plan);

    if account.credits < TEXT_COST {
        AccountState::CreditExhausted
    } else if entitlements.image_limit_reached(account.daily_image_count) {
        AccountState::ImageCapped
    } else if account.credits == entitlements.weekly_credits && account.daily_image_count == 0 {
        AccountState::Fresh
    } else {
        AccountState::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affordability::debit;
    use crate::catalog::StaticPlanCatalog;
    use qledger_models::{Action, PlanTier};

    #[test]
    fn test_new_account_is_fresh() {
        let account = Account::new("u", 0);
        assert_eq!(account_state(&account, &StaticPlanCatalog), AccountState::Fresh);
    }

    #[test]
    fn test_spend_moves_to_active() {
        let account = debit(&Account::new("u", 0), &Action::text());
        assert_eq!(account_state(&account, &StaticPlanCatalog), AccountState::Active);
    }

    #[test]
    fn test_zero_balance_is_exhausted() {
        let account = Account::new("u", 0).with_credits(0).with_daily_image_count(3);
        assert_eq!(
            account_state(&account, &StaticPlanCatalog),
            AccountState::CreditExhausted
        );
    }

    #[test]
    fn test_third_image_caps_basic_but_not_pro() {
        let mut account = Account::new("u", 0);
        for _ in 0..3 {
            account = debit(&account, &Action::image());
        }
        assert_eq!(account_state(&account, &StaticPlanCatalog), AccountState::ImageCapped);

        let pro = account.with_plan(PlanTier::Pro);
        assert_eq!(account_state(&pro, &StaticPlanCatalog), AccountState::Active);
    }
}
