//! Pipeline driver: validate → acquire → summarize.
//!
//! Every failure is returned as a [`PipelineError`]; nothing here panics or
//! exits, so the caller stays available for the next request.

use crate::acquire::{AcquireError, ContentAcquirer};
use crate::agent::{ChatClient, CompletionModel, ModelError};
use crate::config::{Config, SummarizeConfig};
use crate::summarize::{SummarizeError, Summarizer};
use crate::summary::SummaryResult;
use crate::validate::{validate_url, InputError};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Acquisition(#[from] AcquireError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Summarize(SummarizeError),
}

/// Model failures inside the map or combine stages are reported as model errors
impl From<SummarizeError> for PipelineError {
    fn from(err: SummarizeError) -> Self {
        match err {
            SummarizeError::Model(err) => PipelineError::Model(err),
            other => PipelineError::Summarize(other),
        }
    }
}

/// Progress points reported between stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Fetching content for the URL
    Acquiring,
    /// Running the map and combine stages over this many documents
    Summarizing { documents: usize },
    Done,
}

/// One configured summarization pipeline.
pub struct Pipeline {
    acquirer: ContentAcquirer,
    model: Box<dyn CompletionModel>,
    settings: SummarizeConfig,
}

impl Pipeline {
    /// Build the model client first so a missing API key fails before any fetch
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        let model = ChatClient::from_config(config)?;
        let acquirer = ContentAcquirer::from_config(&config.fetch)?;
        Ok(Self::new(acquirer, Box::new(model), config.summarize.clone()))
    }

    pub fn new(
        acquirer: ContentAcquirer,
        model: Box<dyn CompletionModel>,
        settings: SummarizeConfig,
    ) -> Self {
        Self {
            acquirer,
            model,
            settings,
        }
    }

    pub fn acquirer(&self) -> &ContentAcquirer {
        &self.acquirer
    }

    /// Summarize the content behind `input`
    pub async fn run(&self, input: &str) -> Result<SummaryResult, PipelineError> {
        self.run_with_progress(input, |_| {}).await
    }

    /// Like [`Pipeline::run`], reporting each stage to `progress`
    pub async fn run_with_progress(
        &self,
        input: &str,
        mut progress: impl FnMut(Stage),
    ) -> Result<SummaryResult, PipelineError> {
        let url = validate_url(input)?;

        progress(Stage::Acquiring);
        let documents = self.acquirer.acquire(&url).await?;

        progress(Stage::Summarizing {
            documents: documents.len(),
        });
        let output = Summarizer::new(self.model.as_ref(), self.settings.clone())
            .summarize(&documents)
            .await?;

        let metadata = documents
            .first()
            .map(|doc| doc.metadata.clone())
            .unwrap_or_default();
        let result = SummaryResult::new(url.as_str(), &output.text, output.map_calls, output.combine_calls)
            .with_metadata(metadata);
        if result.is_empty() {
            return Err(ModelError::EmptyResponse.into());
        }

        info!(
            url = %url,
            map_calls = result.map_calls,
            combine_calls = result.combine_calls,
            "summary complete"
        );
        progress(Stage::Done);
        Ok(result)
    }
}
