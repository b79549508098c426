//! Map-reduce summarization over a sequence of documents.
//!
//! 1. Documents larger than `chunk_tokens` are split into chunks.
//! 2. Map: each chunk is summarized independently; requests run concurrently
//!    but results are collected in source order.
//! 3. Combine: partial summaries are grouped in order under `token_max` and
//!    collapsed until they fit one prompt, then combined a final time.

use crate::agent::{CompletionModel, ModelError};
use crate::config::SummarizeConfig;
use crate::document::Document;
use crate::prompts::{PromptTemplate, COMBINE_PROMPT, MAP_PROMPT};
use crate::text::split_text;
use futures::stream::{self, StreamExt, TryStreamExt};
use thiserror::Error;
use tracing::{debug, info};

/// Separator between partial summaries in a combine prompt
const PARTIAL_SEPARATOR: &str = "\n\n";

#[derive(Error, Debug)]
pub enum SummarizeError {
    #[error("model error: {0}")]
    Model(#[from] ModelError),
    #[error("no documents to summarize")]
    NoDocuments,
    #[error("partial summaries of ~{tokens} tokens do not fit the combine budget of {token_max}")]
    InputTooLarge { tokens: usize, token_max: usize },
}

/// Text and call counts produced by a summarization run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryOutput {
    pub text: String,
    pub map_calls: usize,
    pub combine_calls: usize,
}

/// Runs the map and combine stages against a completion model.
pub struct Summarizer<'a> {
    model: &'a dyn CompletionModel,
    settings: SummarizeConfig,
    map_prompt: PromptTemplate,
    combine_prompt: PromptTemplate,
}

impl<'a> Summarizer<'a> {
    pub fn new(model: &'a dyn CompletionModel, settings: SummarizeConfig) -> Self {
        Self {
            model,
            settings,
            map_prompt: MAP_PROMPT,
            combine_prompt: COMBINE_PROMPT,
        }
    }

    /// Summarize documents into a single bullet-point string
    pub async fn summarize(&self, documents: &[Document]) -> Result<SummaryOutput, SummarizeError> {
        let chunks = self.chunk(documents);
        if chunks.is_empty() {
            return Err(SummarizeError::NoDocuments);
        }

        info!(documents = documents.len(), chunks = chunks.len(), "map stage");
        let partials = self.map(&chunks).await?;
        let map_calls = partials.len();

        info!(partials = partials.len(), "combine stage");
        let (text, combine_calls) = self.reduce(partials).await?;

        Ok(SummaryOutput {
            text,
            map_calls,
            combine_calls,
        })
    }

    /// Split oversized documents so each map prompt stays within budget
    fn chunk(&self, documents: &[Document]) -> Vec<String> {
        let max_chars = self.settings.chunk_tokens.saturating_mul(4);
        documents
            .iter()
            .filter(|doc| !doc.is_empty())
            .flat_map(|doc| {
                if self.model.estimate_tokens(&doc.text) > self.settings.chunk_tokens {
                    split_text(&doc.text, max_chars)
                } else {
                    vec![doc.text.trim().to_string()]
                }
            })
            .collect()
    }

    async fn map(&self, chunks: &[String]) -> Result<Vec<String>, ModelError> {
        let concurrency = self.settings.map_concurrency.max(1);
        stream::iter(chunks.iter().enumerate())
            .map(|(index, chunk)| async move {
                debug!(index, chars = chunk.len(), "map request");
                self.model.complete(&self.map_prompt.render(chunk)).await
            })
            .buffered(concurrency)
            .try_collect()
            .await
    }

    /// Collapse partials until they fit one combine prompt, then combine once.
    ///
    /// Fails when a single partial exceeds `token_max` or a collapse round
    /// does not shrink the total.
    async fn reduce(&self, mut partials: Vec<String>) -> Result<(String, usize), SummarizeError> {
        let token_max = self.settings.token_max;
        let mut calls = 0;
        let mut total = self.tokens(&partials);

        while total > token_max {
            let largest = partials
                .iter()
                .map(|p| self.model.estimate_tokens(p))
                .max()
                .unwrap_or_default();
            if largest > token_max {
                return Err(SummarizeError::InputTooLarge {
                    tokens: largest,
                    token_max,
                });
            }

            let groups = group_in_order(&partials, token_max, |text| self.model.estimate_tokens(text));
            debug!(from = partials.len(), to = groups.len(), "collapsing partial summaries");
            let mut collapsed = Vec::with_capacity(groups.len());
            for group in groups {
                collapsed.push(self.combine(&group).await?);
                calls += 1;
            }

            let collapsed_total = self.tokens(&collapsed);
            if collapsed_total >= total {
                return Err(SummarizeError::InputTooLarge {
                    tokens: collapsed_total,
                    token_max,
                });
            }
            partials = collapsed;
            total = collapsed_total;
        }

        let text = self.combine(&partials).await?;
        Ok((text, calls + 1))
    }

    async fn combine(&self, partials: &[String]) -> Result<String, ModelError> {
        let joined = partials.join(PARTIAL_SEPARATOR);
        self.model.complete(&self.combine_prompt.render(&joined)).await
    }

    fn tokens(&self, partials: &[String]) -> usize {
        self.model.estimate_tokens(&partials.join(PARTIAL_SEPARATOR))
    }
}

/// Group consecutive partials so each group's estimated size fits `token_max`.
///
/// A partial that alone exceeds the budget forms its own group.
fn group_in_order(
    partials: &[String],
    token_max: usize,
    estimate: impl Fn(&str) -> usize,
) -> Vec<Vec<String>> {
    let mut groups: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for partial in partials {
        current.push(partial.clone());
        if current.len() > 1 && estimate(&current.join(PARTIAL_SEPARATOR)) > token_max {
            let last = current.pop();
            groups.push(std::mem::take(&mut current));
            current.extend(last);
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Echoes each prompt's text back and records every prompt seen.
    #[derive(Default)]
    struct EchoModel {
        prompts: Mutex<Vec<String>>,
        calls: AtomicUsize,
        /// Answer combine prompts with a short fixed-size summary
        compact_combine: bool,
        /// Answer map prompts with this many characters instead of an echo
        map_answer_chars: Option<usize>,
    }

    #[async_trait]
    impl CompletionModel for EchoModel {
        async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            let body = extract_slot(prompt);
            if prompt.contains("POINT-WISE SUMMARY:") {
                if self.compact_combine {
                    return Ok(format!("summary of {} parts", body.split(PARTIAL_SEPARATOR).count()));
                }
                Ok(format!("combined[{}]", body))
            } else {
                // Later documents answer first
                let delay = 30u64.saturating_sub(body.len() as u64 % 30);
                tokio::time::sleep(Duration::from_millis(delay)).await;
                if let Some(chars) = self.map_answer_chars {
                    return Ok("x".repeat(chars));
                }
                Ok(format!("• {}", body))
            }
        }
    }

    fn extract_slot(prompt: &str) -> String {
        let start = prompt.find('"').map(|i| i + 1).unwrap_or(0);
        let end = prompt.rfind('"').unwrap_or(prompt.len());
        prompt[start..end].to_string()
    }

    fn settings(token_max: usize) -> SummarizeConfig {
        SummarizeConfig {
            token_max,
            chunk_tokens: 10_000,
            map_concurrency: 4,
        }
    }

    #[tokio::test]
    async fn one_map_call_per_document_then_combine() {
        let model = EchoModel::default();
        let docs = vec![Document::new("D1"), Document::new("D2"), Document::new("D3")];
        let out = Summarizer::new(&model, settings(3000)).summarize(&docs).await.unwrap();

        assert_eq!(out.map_calls, 3);
        assert_eq!(out.combine_calls, 1);
        assert_eq!(model.calls.load(Ordering::SeqCst), 4);
        assert_eq!(out.text, "combined[• D1\n\n• D2\n\n• D3]");
    }

    #[tokio::test]
    async fn combine_order_is_stable_under_concurrent_map() {
        let model = EchoModel::default();
        let docs: Vec<Document> = ["a", "bb", "ccc", "dddd", "eeeee"]
            .iter()
            .map(|t| Document::new(*t))
            .collect();
        let out = Summarizer::new(&model, settings(3000)).summarize(&docs).await.unwrap();
        assert_eq!(out.text, "combined[• a\n\n• bb\n\n• ccc\n\n• dddd\n\n• eeeee]");
    }

    #[tokio::test]
    async fn oversized_partials_collapse_hierarchically() {
        let model = EchoModel {
            compact_combine: true,
            ..Default::default()
        };
        let docs: Vec<Document> = (0..8)
            .map(|i| Document::new(format!("document number {i} {}", "x".repeat(40))))
            .collect();
        // Each partial is ~15 tokens; the budget fits three of them per group.
        let out = Summarizer::new(&model, settings(50)).summarize(&docs).await.unwrap();

        assert_eq!(out.map_calls, 8);
        // Groups of 3, 3 and 2, then the final combine
        assert_eq!(out.combine_calls, 4);
        assert_eq!(out.text, "summary of 3 parts");
        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), out.map_calls + out.combine_calls);
    }

    #[tokio::test]
    async fn irreducible_partial_is_an_error() {
        let model = EchoModel::default();
        let docs = vec![Document::new("y".repeat(400)), Document::new("z".repeat(400))];
        let err = Summarizer::new(&model, settings(20)).summarize(&docs).await.unwrap_err();
        assert!(matches!(err, SummarizeError::InputTooLarge { token_max: 20, .. }));
    }

    #[tokio::test]
    async fn partials_that_fit_alone_collapse_one_by_one() {
        let model = EchoModel {
            compact_combine: true,
            map_answer_chars: Some(2400),
            ..Default::default()
        };
        let docs = vec![Document::new("D1"), Document::new("D2"), Document::new("D3")];
        // ~600 tokens each: no two fit together under 1000, but each fits alone
        let out = Summarizer::new(&model, settings(1000)).summarize(&docs).await.unwrap();

        assert_eq!(out.map_calls, 3);
        // One collapse per partial, then the final combine
        assert_eq!(out.combine_calls, 4);
        assert_eq!(out.text, "summary of 3 parts");
    }

    #[tokio::test]
    async fn collapse_that_does_not_shrink_is_an_error() {
        let model = EchoModel {
            map_answer_chars: Some(2400),
            ..Default::default()
        };
        let docs = vec![Document::new("D1"), Document::new("D2"), Document::new("D3")];
        let err = Summarizer::new(&model, settings(1000)).summarize(&docs).await.unwrap_err();

        assert!(matches!(err, SummarizeError::InputTooLarge { token_max: 1000, .. }));
        // Three map calls and one round of three collapses, no final combine
        assert_eq!(model.calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn large_documents_are_chunked_before_map() {
        let model = EchoModel::default();
        let text = (0..200).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let config = SummarizeConfig {
            token_max: 100_000,
            chunk_tokens: 50,
            map_concurrency: 2,
        };
        let out = Summarizer::new(&model, config).summarize(&[Document::new(text)]).await.unwrap();
        assert!(out.map_calls > 1);
        assert_eq!(out.combine_calls, 1);
    }

    #[tokio::test]
    async fn empty_input_is_rejected() {
        let model = EchoModel::default();
        let summarizer = Summarizer::new(&model, settings(3000));
        assert!(matches!(
            summarizer.summarize(&[]).await,
            Err(SummarizeError::NoDocuments)
        ));
        assert!(matches!(
            summarizer.summarize(&[Document::new("  ")]).await,
            Err(SummarizeError::NoDocuments)
        ));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn grouping_keeps_order_and_budget() {
        let partials: Vec<String> = ["aaaa", "bbbb", "cccc", "dddd", "e"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let groups = group_in_order(&partials, 10, |t| t.len());
        assert_eq!(
            groups,
            vec![
                vec!["aaaa".to_string(), "bbbb".to_string()],
                vec!["cccc".to_string(), "dddd".to_string()],
                vec!["e".to_string()],
            ]
        );
    }
}
