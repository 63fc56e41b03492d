//! Affordability decisions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Why an action was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// Balance below the action's cost.
    InsufficientCredits { required: u32, available: u32 },
    /// Tier-specific image sub-limit hit for the current image window.
    ImageLimitExceeded { limit: u32, window_hours: u32 },
}

impl DenialReason {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            DenialReason::InsufficientCredits { .. } => "INSUFFICIENT_CREDITS",
            DenialReason::ImageLimitExceeded { .. } => "IMAGE_LIMIT_EXCEEDED",
        }
    }

    /// Message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            DenialReason::InsufficientCredits {
                required,
                available,
            } => format!(
                "Insufficient credits. You need {} credits but have {}. Please upgrade your plan.",
                required, available
            ),
            DenialReason::ImageLimitExceeded {
                limit,
                window_hours,
            } => format!(
                "Free plan is limited to {} images per {} hours. Upgrade to Pro for more.",
                limit, window_hours
            ),
        }
    }

    /// Every denial is recoverable by upgrading.
    pub fn upgrade_suggested(&self) -> bool {
        true
    }
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.user_message())
    }
}

/// Outcome of an affordability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allowed,
    Denied(DenialReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }

    pub fn denial(&self) -> Option<DenialReason> {
        match self {
            Decision::Allowed => None,
            Decision::Denied(reason) => Some(*reason),
        }
    }

    /// Label used for logging and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Decision::Allowed => "allowed",
            Decision::Denied(DenialReason::InsufficientCredits { .. }) => "insufficient_credits",
            Decision::Denied(DenialReason::ImageLimitExceeded { .. }) => "image_limit_exceeded",
        }
    }
}
