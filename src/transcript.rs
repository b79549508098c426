//! Transcript strategies for video sources.
//!
//! Each strategy is one way of turning a video URL into documents. The
//! acquirer holds them as an ordered list and stops at the first success.

use crate::document::Document;
use crate::source::VideoUrl;
use crate::youtube::{select_track, YouTubeClient, YouTubeError};
use async_trait::async_trait;

/// One method of retrieving a video transcript.
#[async_trait]
pub trait TranscriptStrategy: Send + Sync {
    /// Short name used in logs and error reports
    fn name(&self) -> &'static str;

    /// Fetch the transcript as documents
    async fn fetch(&self, video: &VideoUrl) -> Result<Vec<Document>, YouTubeError>;
}

/// The default strategy order: player API first, watch page second
pub fn default_strategies(client: &YouTubeClient) -> Vec<Box<dyn TranscriptStrategy>> {
    vec![
        Box::new(PlayerApiStrategy::new(client.clone())),
        Box::new(WatchPageStrategy::new(client.clone())),
    ]
}

fn video_id(video: &VideoUrl) -> Result<String, YouTubeError> {
    video
        .video_id()
        .ok_or_else(|| YouTubeError::InvalidVideoId(video.url.to_string()))
}

/// Player endpoint with a preferred-language track and video metadata.
pub struct PlayerApiStrategy {
    client: YouTubeClient,
}

impl PlayerApiStrategy {
    pub fn new(client: YouTubeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TranscriptStrategy for PlayerApiStrategy {
    fn name(&self) -> &'static str {
        "player_api"
    }

    async fn fetch(&self, video: &VideoUrl) -> Result<Vec<Document>, YouTubeError> {
        let id = video_id(video)?;
        let player = self.client.player(&id).await?;
        player.ensure_playable(&id)?;

        let tracks = player.caption_tracks();
        if tracks.is_empty() {
            return Err(YouTubeError::NoCaptions(id));
        }
        let track = select_track(tracks, self.client.languages(), false).ok_or_else(|| {
            YouTubeError::LanguageUnavailable {
                id: id.clone(),
                languages: self.client.languages().to_vec(),
            }
        })?;

        let segments = self.client.transcript(track).await?;
        let mut document = Document::new(segments.join(" "))
            .with_metadata("source", id.as_str())
            .with_metadata("language", track.language_code.as_str());

        if let Some(details) = &player.video_details {
            if let Some(title) = &details.title {
                document = document.with_metadata("title", title.as_str());
            }
            if let Some(author) = &details.author {
                document = document.with_metadata("author", author.as_str());
            }
            if let Some(length) = &details.length_seconds {
                document = document.with_metadata("length", length.as_str());
            }
        }

        Ok(vec![document])
    }
}

/// Watch page keyed by the parsed video id; any language as a last resort.
pub struct WatchPageStrategy {
    client: YouTubeClient,
}

impl WatchPageStrategy {
    pub fn new(client: YouTubeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TranscriptStrategy for WatchPageStrategy {
    fn name(&self) -> &'static str {
        "watch_page"
    }

    async fn fetch(&self, video: &VideoUrl) -> Result<Vec<Document>, YouTubeError> {
        let id = video_id(video)?;
        let player = self.client.watch_page(&id).await?;
        player.ensure_playable(&id)?;

        let track = select_track(player.caption_tracks(), self.client.languages(), true)
            .ok_or_else(|| YouTubeError::NoCaptions(id.clone()))?;
        let segments = self.client.transcript(track).await?;

        Ok(vec![join_segments(&segments)])
    }
}

/// One document holding every segment, space-joined in source order
pub fn join_segments(segments: &[String]) -> Document {
    Document::new(segments.join(" "))
}
