//! Content acquisition: URL → documents.
//!
//! Video URLs run the transcript strategies in order and stop at the first
//! success. Every other URL is scraped as a generic page.

use crate::config::FetchConfig;
use crate::document::Document;
use crate::scraper::{PageLoader, ScraperError};
use crate::source::{Source, VideoUrl};
use crate::transcript::{default_strategies, TranscriptStrategy};
use crate::youtube::{YouTubeClient, YouTubeError};
use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

#[derive(Error, Debug)]
pub enum AcquireError {
    #[error("could not load page: {0}")]
    Page(#[from] ScraperError),
    #[error("could not access video transcript: {0}")]
    Video(#[from] YouTubeError),
    #[error("could not access video transcript through any available method ({}): {last}", .attempted.join(", "))]
    AllStrategiesFailed {
        attempted: Vec<&'static str>,
        last: YouTubeError,
    },
    #[error("no transcript strategies configured")]
    NoStrategies,
    #[error("no content found at {0}")]
    NoContent(String),
}

impl AcquireError {
    /// Timeouts are worth retrying; everything else is a hard failure
    pub fn is_retryable(&self) -> bool {
        match self {
            AcquireError::Page(err) => err.is_timeout(),
            AcquireError::Video(err) | AcquireError::AllStrategiesFailed { last: err, .. } => {
                err.is_timeout()
            }
            _ => false,
        }
    }
}

/// Fetches generic pages. Implemented by [`PageLoader`].
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn load(&self, url: &Url) -> Result<Vec<Document>, ScraperError>;
}

#[async_trait]
impl PageSource for PageLoader {
    async fn load(&self, url: &Url) -> Result<Vec<Document>, ScraperError> {
        Ok(self.fetch_content(url).await?.into_documents())
    }
}

/// Resolves a URL to documents using source-specific strategies.
pub struct ContentAcquirer {
    strategies: Vec<Box<dyn TranscriptStrategy>>,
    pages: Box<dyn PageSource>,
}

impl ContentAcquirer {
    /// Acquirer with the default transcript strategies and page loader
    pub fn from_config(config: &FetchConfig) -> Result<Self, AcquireError> {
        let youtube = YouTubeClient::new(config)?;
        let pages = PageLoader::new(config)?;
        Ok(Self::new(default_strategies(&youtube), Box::new(pages)))
    }

    pub fn new(strategies: Vec<Box<dyn TranscriptStrategy>>, pages: Box<dyn PageSource>) -> Self {
        Self { strategies, pages }
    }

    /// Acquire the documents for a validated URL
    pub async fn acquire(&self, url: &Url) -> Result<Vec<Document>, AcquireError> {
        let documents = match Source::classify(url) {
            Source::Video(video) => self.acquire_video(&video).await?,
            Source::Page(page) => self.pages.load(&page).await?,
        };

        let documents: Vec<Document> = documents.into_iter().filter(|d| !d.is_empty()).collect();
        if documents.is_empty() {
            return Err(AcquireError::NoContent(url.to_string()));
        }
        Ok(documents)
    }

    async fn acquire_video(&self, video: &VideoUrl) -> Result<Vec<Document>, AcquireError> {
        let mut attempted = Vec::with_capacity(self.strategies.len());
        let mut last_error = None;

        for strategy in &self.strategies {
            attempted.push(strategy.name());
            match strategy.fetch(video).await {
                Ok(documents) if documents.iter().any(|d| !d.is_empty()) => {
                    info!(strategy = strategy.name(), "transcript acquired");
                    return Ok(documents);
                }
                Ok(_) => {
                    warn!(strategy = strategy.name(), "transcript strategy returned no text");
                    last_error = Some(YouTubeError::EmptyTranscript);
                }
                Err(err) => {
                    warn!(strategy = strategy.name(), error = %err, "transcript strategy failed");
                    last_error = Some(err);
                }
            }
        }

        match last_error {
            Some(last) if attempted.len() == 1 => Err(AcquireError::Video(last)),
            Some(last) => Err(AcquireError::AllStrategiesFailed { attempted, last }),
            None => Err(AcquireError::NoStrategies),
        }
    }
}
