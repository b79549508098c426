//! Configuration loading and management for synthesmart.
//!
//! Loads settings from `synthesmart.toml` with environment variable overrides for sensitive data.
//! Every section has defaults, so running without a config file works.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const CONFIG_FILE: &str = "synthesmart.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("missing required API key for provider: {0}")]
    MissingApiKey(String),
    #[error("unknown LLM provider: {0}")]
    UnknownProvider(String),
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// LLM provider: "groq" or "openai"
    pub provider: String,
    /// Model identifier (e.g., "llama-3.1-8b-instant")
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Chat-completions endpoint; the provider's default when unset
    pub endpoint: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Retries for timeouts, rate limits and server errors
    pub max_retries: u32,
}

/// API keys configuration (loaded from environment)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    #[serde(default)]
    pub groq_key: Option<String>,
    #[serde(default)]
    pub openai_key: Option<String>,
}

/// Map-reduce budgets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizeConfig {
    /// Token budget for one combine prompt
    pub token_max: usize,
    /// Documents above this estimated size are split before the map stage
    pub chunk_tokens: usize,
    /// Concurrent map-stage requests
    pub map_concurrency: usize,
}

/// Content fetching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Browser-identifying User-Agent for page and video requests
    pub user_agent: String,
    /// Skip TLS certificate verification for generic pages
    pub accept_invalid_certs: bool,
    /// Preferred transcript languages, in order
    pub languages: Vec<String>,
}

/// Summary export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the summary file is written to
    pub dir: PathBuf,
    /// Name of the summary file
    pub file_name: String,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub summarize: SummarizeConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from the default location (synthesmart.toml in cwd or home)
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::parse_file(&path)?,
            None => Config::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::parse_file(path)?;
        config.apply_env();
        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Override API keys from environment variables
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("GROQ_API_KEY") {
            self.api.groq_key = Some(key);
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.api.openai_key = Some(key);
        }
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        // Check current directory first
        let local_config = PathBuf::from(CONFIG_FILE);
        if local_config.exists() {
            return Some(local_config);
        }

        // Check home directory
        let home_config = dirs::home_dir()?
            .join(".config")
            .join("synthesmart")
            .join(CONFIG_FILE);
        home_config.exists().then_some(home_config)
    }

    /// Get the API key for the configured provider
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        let key = match self.agent.provider.as_str() {
            "groq" => self.api.groq_key.as_deref(),
            "openai" => self.api.openai_key.as_deref(),
            other => return Err(ConfigError::UnknownProvider(other.to_string())),
        };
        key.filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey(self.agent.provider.clone()))
    }

    /// Chat-completions endpoint for the configured provider
    pub fn endpoint(&self) -> Result<String, ConfigError> {
        if let Some(endpoint) = &self.agent.endpoint {
            return Ok(endpoint.clone());
        }
        match self.agent.provider.as_str() {
            "groq" => Ok("https://api.groq.com/openai/v1/chat/completions".to_string()),
            "openai" => Ok("https://api.openai.com/v1/chat/completions".to_string()),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }

    /// Where the summary file is written by default
    pub fn output_path(&self) -> PathBuf {
        self.output.dir.join(&self.output.file_name)
    }
}

impl AgentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            provider: "groq".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            temperature: 0.5,
            endpoint: None,
            timeout_secs: 60,
            max_retries: 2,
        }
    }
}

impl Default for SummarizeConfig {
    fn default() -> Self {
        Self {
            token_max: 3000,
            chunk_tokens: 3000,
            map_concurrency: 4,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_5_1) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/116.0.0.0 Safari/537.36"
                .to_string(),
            accept_invalid_certs: true,
            languages: vec!["en".to_string()],
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            file_name: "content_summary.txt".to_string(),
        }
    }
}
