//! Document struct - a unit of extracted text passed through the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Extracted text content plus display-only metadata (title, author, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// The extracted text
    pub text: String,
    /// Key-value pairs such as title, author or source
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    /// Create a document without metadata
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Look up a metadata value
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Check if the document carries any non-whitespace text
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}
