//! SummaryResult struct - the final output of the summarization pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bullet glyph commonly emitted by the model
pub const MODEL_BULLET: char = '•';

/// Replacement glyph, distinct from markdown's own list markers
pub const DISPLAY_BULLET: char = '○';

/// Consolidated bullet-point summary of one URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResult {
    /// The summarized URL
    pub url: String,
    /// Bullet-point text, glyph-normalized
    pub text: String,
    /// When the summary was created
    pub created_at: DateTime<Utc>,
    /// Number of map-stage completions issued
    pub map_calls: usize,
    /// Number of combine-stage completions issued (collapse rounds included)
    pub combine_calls: usize,
    /// Display metadata of the first source document (title, author, length, ...)
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl SummaryResult {
    /// Create a new summary result, normalizing bullet glyphs
    pub fn new(url: impl Into<String>, text: &str, map_calls: usize, combine_calls: usize) -> Self {
        Self {
            url: url.into(),
            text: normalize_bullets(text.trim()),
            created_at: Utc::now(),
            map_calls,
            combine_calls,
            metadata: BTreeMap::new(),
        }
    }

    /// Attach source metadata
    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Check if the summary has any content
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Replace the model's bullet glyph with the display glyph.
pub fn normalize_bullets(text: &str) -> String {
    text.replace(MODEL_BULLET, &DISPLAY_BULLET.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bullets_are_replaced() {
        assert_eq!(normalize_bullets("• one\n• two"), "○ one\n○ two");
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = ["", "plain text", "• a\n  • b", "- dash\n* star\n○ done"];
        for input in inputs {
            let once = normalize_bullets(input);
            assert_eq!(normalize_bullets(&once), once);
        }
    }

    #[test]
    fn result_trims_and_normalizes() {
        let result = SummaryResult::new("https://example.com", "\n• point\n", 2, 1);
        assert_eq!(result.text, "○ point");
        assert_eq!(result.map_calls, 2);
        assert!(!result.is_empty());
    }
}
