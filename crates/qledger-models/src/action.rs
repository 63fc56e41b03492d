//! Metered actions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Credits charged for a text generation.
pub const TEXT_COST: u32 = 1;

/// Credits charged for an image generation.
pub const IMAGE_COST: u32 = 10;

/// Classification of a user request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Text,
    Image,
}

impl ActionKind {
    /// Credit cost for this kind of action.
    pub fn cost(&self) -> u32 {
        match self {
            ActionKind::Text => TEXT_COST,
            ActionKind::Image => IMAGE_COST,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Text => "text",
            ActionKind::Image => "image",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A classified action and its cost. Ephemeral, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Action {
    pub kind: ActionKind,
    pub cost: u32,
}

impl Action {
    /// Build an action whose cost is derived from its kind.
    pub fn of(kind: ActionKind) -> Self {
        Self {
            kind,
            cost: kind.cost(),
        }
    }

    pub fn text() -> Self {
        Self::of(ActionKind::Text)
    }

    pub fn image() -> Self {
        Self::of(ActionKind::Image)
    }

    /// Whether this action consumes a unit of the image sub-limit.
    pub fn consumes_image_slot(&self) -> bool {
        self.kind == ActionKind::Image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_costs() {
        assert_eq!(Action::text().cost, 1);
        assert_eq!(Action::image().cost, 10);
    }

    #[test]
    fn test_only_images_consume_slot() {
        assert!(Action::image().consumes_image_slot());
        assert!(!Action::text().consumes_image_slot());
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ActionKind::Image).unwrap(), "\"image\"");
    }
}
