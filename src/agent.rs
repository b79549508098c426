//! LLM agent module: the completion model seam and its HTTP client.
//!
//! [`CompletionModel`] is the only thing the summarizer knows about the model.
//! [`ChatClient`] implements it against an OpenAI-compatible chat-completions
//! endpoint (Groq by default).

use crate::config::{Config, ConfigError};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("missing API key for provider: {0}")]
    MissingApiKey(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("authentication failed: {0}")]
    Unauthorized(String),
    #[error("rate limited by provider: {0}")]
    RateLimited(String),
    #[error("model request timed out after {0}s")]
    Timeout(u64),
    #[error("network error: {0}")]
    Network(String),
    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to parse response: {0}")]
    Malformed(String),
    #[error("model returned an empty completion")]
    EmptyResponse,
}

impl ModelError {
    /// Timeouts, rate limits, connection problems and server errors may succeed on retry
    pub fn is_retryable(&self) -> bool {
        match self {
            ModelError::RateLimited(_) | ModelError::Timeout(_) | ModelError::Network(_) => true,
            ModelError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<ConfigError> for ModelError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingApiKey(provider) => ModelError::MissingApiKey(provider),
            other => ModelError::Config(other.to_string()),
        }
    }
}

/// A hosted model that turns a prompt into a completion.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Complete a single prompt
    async fn complete(&self, prompt: &str) -> Result<String, ModelError>;

    /// Rough token estimate used for the combine budget (~4 characters per token)
    fn estimate_tokens(&self, text: &str) -> usize {
        text.chars().count().div_ceil(4)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatContent,
}

#[derive(Debug, Deserialize)]
struct ChatContent {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client for Groq or OpenAI
pub struct ChatClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    timeout: Duration,
    max_retries: u32,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

impl ChatClient {
    /// Build a client from config. Fails before any request when the API key is missing.
    pub fn from_config(config: &Config) -> Result<Self, ModelError> {
        let api_key = config.api_key()?.to_string();
        let endpoint = config.endpoint()?;
        let timeout = config.agent.timeout();

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ModelError::Network(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            model: config.agent.model.clone(),
            temperature: config.agent.temperature,
            timeout,
            max_retries: config.agent.max_retries,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, prompt: &str) -> Result<String, ModelError> {
        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!(model = %self.model, chars = prompt.len(), "sending completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let response = check_status(response).await?;
        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Malformed(e.to_string()))?;

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ModelError::Malformed("no choices in response".to_string()))?;

        if text.trim().is_empty() {
            return Err(ModelError::EmptyResponse);
        }
        Ok(text)
    }

    fn classify(&self, err: reqwest::Error) -> ModelError {
        if err.is_timeout() {
            ModelError::Timeout(self.timeout.as_secs())
        } else {
            ModelError::Network(err.to_string())
        }
    }
}

/// Map an HTTP error status to a model error
async fn check_status(response: Response) -> Result<Response, ModelError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(match status.as_u16() {
        401 | 403 => ModelError::Unauthorized(body),
        429 => ModelError::RateLimited(body),
        code => ModelError::Status { status: code, body },
    })
}

/// Backoff before retry `attempt` (0-based); rate limits wait longer
fn backoff(err: &ModelError, attempt: u32) -> Duration {
    match err {
        ModelError::RateLimited(_) => Duration::from_secs(15u64.saturating_mul(attempt as u64 + 1)),
        _ => Duration::from_millis(1000u64.saturating_mul(2_u64.saturating_pow(attempt))),
    }
}

#[async_trait]
impl CompletionModel for ChatClient {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        let mut attempt = 0;
        loop {
            match self.send(prompt).await {
                Ok(text) => return Ok(text),
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    let delay = backoff(&err, attempt);
                    warn!(error = %err, ?delay, "model request failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
