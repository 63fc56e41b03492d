//! Plan catalog: static mapping from tier to entitlements.

use qledger_models::{PlanEntitlements, PlanTier};

/// Source of plan entitlements.
pub trait PlanCatalog: Send + Sync {
    /// Full entitlements for a tier.
    fn entitlements(&self, plan: PlanTier) -> PlanEntitlements;

    /// Credits granted at every credit-window reset.
    fn entitlement_for(&self, plan: PlanTier) -> u32 {
        self.entitlements(plan).weekly_credits
    }
}

/// The built-in entitlement table.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticPlanCatalog;

impl PlanCatalog for StaticPlanCatalog {
    fn entitlements(&self, plan: PlanTier) -> PlanEntitlements {
        PlanEntitlements::for_tier(plan)
    }
}
