//! Observational account states.
//!
//! These labels describe where an account sits in its spend cycle. They are
//! derived on read and never stored.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AccountState {
    /// Nothing spent since the last credit reset.
    Fresh,
    /// Some spend, and the cheapest action is still affordable.
    Active,
    /// Balance below the cheapest action.
    CreditExhausted,
    /// Image sub-limit reached on a capped tier.
    ImageCapped,
}

impl AccountState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountState::Fresh => "fresh",
            AccountState::Active => "active",
            AccountState::CreditExhausted => "credit_exhausted",
            AccountState::ImageCapped => "image_capped",
        }
    }
}

impl std::fmt::Display for AccountState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
