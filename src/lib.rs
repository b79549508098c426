//! # SyntheSmart
//!
//! AI powered summaries of YouTube videos and web pages.
//!
//! ## Features
//!
//! - **Source dispatch**: video URLs use transcript strategies with fallback, other URLs are scraped
//! - **Map-reduce summarization**: per-document key points, combined hierarchically into one summary
//! - **Provider agnostic**: any OpenAI-compatible chat-completions endpoint (Groq by default)

pub mod acquire;
pub mod agent;
pub mod config;
pub mod document;
pub mod export;
pub mod logging;
pub mod pipeline;
pub mod prompts;
pub mod scraper;
pub mod source;
pub mod summarize;
pub mod summary;
pub mod text;
pub mod transcript;
pub mod ui;
pub mod validate;
pub mod youtube;

pub use acquire::{AcquireError, ContentAcquirer};
pub use agent::{ChatClient, CompletionModel, ModelError};
pub use config::Config;
pub use document::Document;
pub use pipeline::{Pipeline, PipelineError, Stage};
pub use summary::SummaryResult;
pub use validate::{is_valid_url, validate_url, InputError};
