//! Prompt templates for the map and combine stages.

/// The template's single substitution slot
const SLOT: &str = "{text}";

/// A fixed prompt with exactly one `{text}` slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    template: &'static str,
}

impl PromptTemplate {
    pub const fn new(template: &'static str) -> Self {
        Self { template }
    }

    /// Substitute `text` into the slot
    pub fn render(&self, text: &str) -> String {
        self.template.replacen(SLOT, text, 1)
    }
}

/// Asks for the key points of a single document
pub const MAP_PROMPT: PromptTemplate = PromptTemplate::new(
    r#"
Analyze the following text and identify the key points and main ideas:
"{text}"
SUMMARY:
"#,
);

/// Merges partial summaries into the final point-wise summary
pub const COMBINE_PROMPT: PromptTemplate = PromptTemplate::new(
    r#"
Create a comprehensive point-wise summary of the text. Include:
1. Main topics and key ideas
2. Important details and examples
3. Any significant conclusions or findings

Format the summary as bullet points with clear headers for each section.
Text: "{text}"

POINT-WISE SUMMARY:
"#,
);
