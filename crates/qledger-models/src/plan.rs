//! Plan tiers and their entitlements.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Weekly credit grants for each plan tier.
pub const BASIC_WEEKLY_CREDITS: u32 = 100;
pub const PRO_WEEKLY_CREDITS: u32 = 500;
pub const PLUS_WEEKLY_CREDITS: u32 = 1000;
pub const AGENT_WEEKLY_CREDITS: u32 = 1500;

/// Image generations allowed per image window on capped tiers.
pub const CAPPED_IMAGE_LIMIT: u32 = 3;

/// Plan tier enumeration.
///
/// `Free` is a legacy alias of `Basic`. Both stay distinct on the wire so
/// stored profiles round-trip untouched, but they share entitlements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Free,
    #[default]
    Basic,
    Pro,
    Plus,
    Agent,
}

impl PlanTier {
    /// Parse from string (case-insensitive). Unknown values fall back to basic.
    pub fn from_str(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }

    /// Strict parse: `None` for unknown plan names.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "free" => Some(PlanTier::Free),
            "basic" => Some(PlanTier::Basic),
            "pro" => Some(PlanTier::Pro),
            "plus" => Some(PlanTier::Plus),
            "agent" => Some(PlanTier::Agent),
            _ => None,
        }
    }

    /// Get the plan name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Basic => "basic",
            PlanTier::Pro => "pro",
            PlanTier::Plus => "plus",
            PlanTier::Agent => "agent",
        }
    }

    /// Collapse the legacy `free` alias onto `basic` for display.
    ///
    /// Stored values are never rewritten.
    pub fn normalized(&self) -> Self {
        match self {
            PlanTier::Free => PlanTier::Basic,
            other => *other,
        }
    }

    /// Whether this tier is subject to the image sub-limit.
    pub fn is_image_capped(&self) -> bool {
        matches!(self, PlanTier::Free | PlanTier::Basic)
    }

    /// Whether this tier may select the pro model.
    pub fn has_pro_model_access(&self) -> bool {
        !self.is_image_capped()
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a plan tier grants per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PlanEntitlements {
    /// Plan tier these entitlements belong to.
    pub tier: PlanTier,
    /// Credits restored at every credit-window reset.
    pub weekly_credits: u32,
    /// Image generations allowed per image window. `None` = only cost gates images.
    pub image_limit: Option<u32>,
    /// Access to the pro model. Lower tiers are offered an upgrade instead.
    pub pro_model_access: bool,
}

impl Default for PlanEntitlements {
    fn default() -> Self {
        Self::for_tier(PlanTier::Basic)
    }
}

impl PlanEntitlements {
    /// Entitlements for a specific plan tier.
    ///
    /// | Tier | Credits / week | Images / 10h | Pro model |
    /// |------|----------------|--------------|-----------|
    /// | free, basic | 100 | 3 | no |
    /// | pro | 500 | unlimited | yes |
    /// | plus | 1000 | unlimited | yes |
    /// | agent | 1500 | unlimited | yes |
    pub fn for_tier(tier: PlanTier) -> Self {
        match tier {
            PlanTier::Free | PlanTier::Basic => Self {
                tier,
                weekly_credits: BASIC_WEEKLY_CREDITS,
                image_limit: Some(CAPPED_IMAGE_LIMIT),
                pro_model_access: false,
            },
            PlanTier::Pro => Self {
                tier,
                weekly_credits: PRO_WEEKLY_CREDITS,
                image_limit: None,
                pro_model_access: true,
            },
            PlanTier::Plus => Self {
                tier,
                weekly_credits: PLUS_WEEKLY_CREDITS,
                image_limit: None,
                pro_model_access: true,
            },
            PlanTier::Agent => Self {
                tier,
                weekly_credits: AGENT_WEEKLY_CREDITS,
                image_limit: None,
                pro_model_access: true,
            },
        }
    }

    /// Check if the image limit has been reached for the given count.
    ///
    /// Returns false if the tier has no image limit.
    pub fn image_limit_reached(&self, daily_image_count: u32) -> bool {
        self.image_limit
            .map(|max| daily_image_count >= max)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekly_credit_table() {
        assert_eq!(PlanEntitlements::for_tier(PlanTier::Basic).weekly_credits, 100);
        assert_eq!(PlanEntitlements::for_tier(PlanTier::Free).weekly_credits, 100);
        assert_eq!(PlanEntitlements::for_tier(PlanTier::Pro).weekly_credits, 500);
        assert_eq!(PlanEntitlements::for_tier(PlanTier::Plus).weekly_credits, 1000);
        assert_eq!(PlanEntitlements::for_tier(PlanTier::Agent).weekly_credits, 1500);
    }

    #[test]
    fn test_free_and_basic_share_limits() {
        let free = PlanEntitlements::for_tier(PlanTier::Free);
        let basic = PlanEntitlements::for_tier(PlanTier::Basic);
        assert_eq!(free.weekly_credits, basic.weekly_credits);
        assert_eq!(free.image_limit, basic.image_limit);
        // But the tiers themselves stay distinct
        assert_ne!(free.tier, basic.tier);
    }

    #[test]
    fn test_paid_tiers_have_no_image_limit() {
        for tier in [PlanTier::Pro, PlanTier::Plus, PlanTier::Agent] {
            let e = PlanEntitlements::for_tier(tier);
            assert_eq!(e.image_limit, None);
            assert!(!e.image_limit_reached(1_000));
            assert!(!tier.is_image_capped());
        }
    }

    #[test]
    fn test_pro_model_access_by_tier() {
        for tier in [PlanTier::Free, PlanTier::Basic] {
            assert!(!PlanEntitlements::for_tier(tier).pro_model_access, "{}", tier);
            assert!(!tier.has_pro_model_access());
        }
        for tier in [PlanTier::Pro, PlanTier::Plus, PlanTier::Agent] {
            assert!(PlanEntitlements::for_tier(tier).pro_model_access, "{}", tier);
            assert!(tier.has_pro_model_access());
        }
    }

    #[test]
    fn test_image_limit_reached() {
        let basic = PlanEntitlements::for_tier(PlanTier::Basic);
        assert!(!basic.image_limit_reached(0));
        assert!(!basic.image_limit_reached(2));
        assert!(basic.image_limit_reached(3));
        assert!(basic.image_limit_reached(4));
    }

    #[test]
    fn test_plan_tier_from_string() {
        assert_eq!(PlanTier::from_str("free"), PlanTier::Free);
        assert_eq!(PlanTier::from_str("basic"), PlanTier::Basic);
        assert_eq!(PlanTier::from_str("pro"), PlanTier::Pro);
        assert_eq!(PlanTier::from_str("plus"), PlanTier::Plus);
        assert_eq!(PlanTier::from_str("agent"), PlanTier::Agent);
        assert_eq!(PlanTier::from_str("unknown"), PlanTier::Basic); // Default
        assert_eq!(PlanTier::from_str("PRO"), PlanTier::Pro); // Case insensitive
        assert_eq!(PlanTier::parse("studio"), None);
    }

    #[test]
    fn test_normalized_only_touches_free() {
        assert_eq!(PlanTier::Free.normalized(), PlanTier::Basic);
        assert_eq!(PlanTier::Basic.normalized(), PlanTier::Basic);
        assert_eq!(PlanTier::Agent.normalized(), PlanTier::Agent);
    }

    #[test]
    fn test_serde_keeps_free_distinct() {
        let json = serde_json::to_string(&PlanTier::Free).unwrap();
        assert_eq!(json, "\"free\"");
        let back: PlanTier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PlanTier::Free);
    }
}
