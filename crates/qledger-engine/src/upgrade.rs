//! Plan changes.

use qledger_models::{Account, PlanTier};

use crate::catalog::PlanCatalog;

/// Move `account` onto `plan`.
///
/// The balance is raised to the new plan's entitlement if it is lower and is
/// otherwise kept. Window timestamps and the image counter are untouched.
pub fn apply_plan_upgrade<P: PlanCatalog + ?Sized>(
    account: &Account,
    plan: PlanTier,
    catalog: &P,
) -> Account {
    let mut next = account.clone();
    next.plan = plan;
    next.credits = next.credits.max(catalog.entitlement_for(plan));
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticPlanCatalog;

    #[test]
    fn test_upgrade_raises_balance_to_entitlement() {
        let account = Account::new("u", 0).with_credits(20);
        let upgraded = apply_plan_upgrade(&account, PlanTier::Plus, &StaticPlanCatalog);
        assert_eq!(upgraded.plan, PlanTier::Plus);
        assert_eq!(upgraded.credits, 1000);
    }

    #[test]
    fn test_downgrade_keeps_higher_balance() {
        let account = Account::new("u", 0)
            .with_plan(PlanTier::Agent)
            .with_credits(1200);
        let downgraded = apply_plan_upgrade(&account, PlanTier::Basic, &StaticPlanCatalog);
        assert_eq!(downgraded.plan, PlanTier::Basic);
        assert_eq!(downgraded.credits, 1200);
    }

    #[test]
    fn test_upgrade_keeps_windows_and_image_count() {
        let account = Account::new("u", 55).with_daily_image_count(3);
        let upgraded = apply_plan_upgrade(&account, PlanTier::Pro, &StaticPlanCatalog);
        assert_eq!(upgraded.daily_image_count, 3);
        assert_eq!(upgraded.last_credit_reset, 55);
        assert_eq!(upgraded.last_image_reset, 55);
    }
}
