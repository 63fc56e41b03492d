//! Request classification.
//!
//! Whether a request is an image generation is decided by a replaceable
//! [`ActionClassifier`]. The default [`PatternClassifier`] is a text
//! heuristic: false positives and negatives are expected. "Make an image
//! of..." counts as an image, but so does "generate a list of names", since
//! anything starting with "generate" is treated as image intent.

use std::sync::LazyLock;

use qledger_models::{Action, ActionKind};
use regex::Regex;

/// Verb + article + image noun, anchored at the start of the request.
static IMAGE_INTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(generate|draw|create|make)\s+(a|an)\s+.*(image|picture|photo|art|drawing|sketch)")
        .unwrap()
});

/// Strategy for labelling a request as text or image generation.
pub trait ActionClassifier: Send + Sync {
    fn classify(&self, text: &str, has_attachments: bool) -> ActionKind;
}

/// Regex-based image intent heuristic.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternClassifier;

impl PatternClassifier {
    pub const fn new() -> Self {
        Self
    }

    /// The compiled image intent pattern, shared by every classifier.
    pub fn pattern(&self) -> &'static Regex {
        &IMAGE_INTENT
    }

    fn is_image_request(&self, text: &str) -> bool {
        self.pattern().is_match(text) || text.to_lowercase().starts_with("generate")
    }
}

impl ActionClassifier for PatternClassifier {
    // Attachments are inputs to the model, not outputs; they never change cost.
    fn classify(&self, text: &str, _has_attachments: bool) -> ActionKind {
        if self.is_image_request(text) {
            ActionKind::Image
        } else {
            ActionKind::Text
        }
    }
}

/// Classify with the default heuristic and attach the cost.
pub fn classify_cost(text: &str, has_attachments: bool) -> Action {
    Action::of(PatternClassifier.classify(text, has_attachments))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(text: &str) -> ActionKind {
        PatternClassifier::new().classify(text, false)
    }

    #[test]
    fn test_classify_cost_examples() {
        let image = classify_cost("generate a picture of a cat", false);
        assert_eq!(image.kind, ActionKind::Image);
        assert_eq!(image.cost, 10);

        let text = classify_cost("what's the weather", false);
        assert_eq!(text.kind, ActionKind::Text);
        assert_eq!(text.cost, 1);
    }

    #[test]
    fn test_verb_article_noun_forms() {
        assert_eq!(kind("Draw a quick sketch of a house"), ActionKind::Image);
        assert_eq!(kind("create an ART piece with dragons"), ActionKind::Image);
        assert_eq!(kind("make a photo"), ActionKind::Image);
        assert_eq!(kind("MAKE A drawing"), ActionKind::Image);
    }

    #[test]
    fn test_requires_article() {
        assert_eq!(kind("draw me an image"), ActionKind::Text);
        assert_eq!(kind("make images of cats"), ActionKind::Text);
    }

    #[test]
    fn test_must_start_with_verb() {
        assert_eq!(kind("please draw a picture"), ActionKind::Text);
        assert_eq!(kind(" draw a picture"), ActionKind::Text);
    }

    #[test]
    fn test_generate_prefix_is_always_image() {
        // Known false positive of the heuristic
        assert_eq!(kind("generate three names for my dog"), ActionKind::Image);
        assert_eq!(kind("Generated code review please"), ActionKind::Image);
    }

    #[test]
    fn test_noun_must_follow_on_the_same_line() {
        assert_eq!(kind("draw a cat\nimage please"), ActionKind::Text);
    }

    #[test]
    fn test_pattern_compiled_once() {
        let a = PatternClassifier::new();
        let b = PatternClassifier::default();
        assert!(std::ptr::eq(a.pattern(), b.pattern()));
        for _ in 0..3 {
            assert_eq!(classify_cost("draw a picture", false).kind, ActionKind::Image);
        }
    }

    #[test]
    fn test_attachments_do_not_change_kind() {
        let classifier = PatternClassifier::new();
        assert_eq!(classifier.classify("describe this", true), ActionKind::Text);
        assert_eq!(classifier.classify("", true), ActionKind::Text);
        assert_eq!(
            classifier.classify("draw a picture like this", true),
            ActionKind::Image
        );
    }
}
