//! YouTube access: player responses, caption tracks, timed-text transcripts
//! and oEmbed video details.
//!
//! Uses reqwest for fetching, serde_json for player responses and quick-xml
//! for the timed-text transcript format.

use crate::config::FetchConfig;
use crate::source::VideoUrl;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, Event};
use quick_xml::Reader;
use reqwest::Client;
use scraper::Html;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

const PLAYER_ENDPOINT: &str = "https://www.youtube.com/youtubei/v1/player";
const WATCH_URL: &str = "https://www.youtube.com/watch";
const OEMBED_URL: &str = "https://www.youtube.com/oembed";

/// Marker preceding the player response embedded in the watch page
const PLAYER_RESPONSE_MARKER: &str = "ytInitialPlayerResponse = ";

/// Innertube client used for player requests
const PLAYER_CLIENT_NAME: &str = "ANDROID";
const PLAYER_CLIENT_VERSION: &str = "20.10.38";

/// Caption kind for automatically generated tracks
const GENERATED_KIND: &str = "asr";

#[derive(Error, Debug)]
pub enum YouTubeError {
    #[error("request failed: {0}")]
    Http(String),
    #[error("request timed out")]
    Timeout,
    #[error("YouTube returned {status} for {url}")]
    Status { status: u16, url: String },
    #[error("could not parse a video id from {0}")]
    InvalidVideoId(String),
    #[error("video {id} is unavailable: {reason}")]
    Unplayable { id: String, reason: String },
    #[error("video {0} has no captions")]
    NoCaptions(String),
    #[error("no transcript in {languages:?} for video {id}")]
    LanguageUnavailable { id: String, languages: Vec<String> },
    #[error("transcript is empty")]
    EmptyTranscript,
    #[error("failed to parse response: {0}")]
    Parse(String),
}

impl YouTubeError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, YouTubeError::Timeout)
    }
}

impl From<reqwest::Error> for YouTubeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            YouTubeError::Timeout
        } else {
            YouTubeError::Http(err.to_string())
        }
    }
}

/// Player response, trimmed to the fields we read
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    #[serde(default)]
    pub playability_status: Option<PlayabilityStatus>,
    #[serde(default)]
    pub captions: Option<Captions>,
    #[serde(default)]
    pub video_details: Option<PlayerVideoDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayabilityStatus {
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Captions {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    pub tracklist: Option<Tracklist>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tracklist {
    #[serde(default)]
    pub caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    pub language_code: String,
    #[serde(default)]
    pub kind: Option<String>,
}

impl CaptionTrack {
    pub fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some(GENERATED_KIND)
    }

    fn matches_language(&self, language: &str) -> bool {
        let code = self.language_code.to_ascii_lowercase();
        let language = language.to_ascii_lowercase();
        code == language || code.starts_with(&format!("{}-", language))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerVideoDetails {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub length_seconds: Option<String>,
}

impl PlayerResponse {
    /// Fail on unplayable videos; "OK" or a missing status is playable
    pub fn ensure_playable(&self, id: &str) -> Result<(), YouTubeError> {
        match &self.playability_status {
            Some(status) if status.status != "OK" => Err(YouTubeError::Unplayable {
                id: id.to_string(),
                reason: status
                    .reason
                    .clone()
                    .unwrap_or_else(|| status.status.clone()),
            }),
            _ => Ok(()),
        }
    }

    pub fn caption_tracks(&self) -> &[CaptionTrack] {
        self.captions
            .as_ref()
            .and_then(|c| c.tracklist.as_ref())
            .map(|t| t.caption_tracks.as_slice())
            .unwrap_or_default()
    }
}

/// Display-only details about a video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDetails {
    pub title: String,
    pub channel: String,
    pub thumbnail_url: Option<String>,
    pub duration_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: String,
    author_name: String,
    #[serde(default)]
    thumbnail_url: Option<String>,
}

/// Pick a caption track for the preferred languages.
///
/// Manually created tracks win over generated ones for the same language.
/// With `fallback_to_any`, the first track is used when no language matches.
pub fn select_track<'a>(
    tracks: &'a [CaptionTrack],
    languages: &[String],
    fallback_to_any: bool,
) -> Option<&'a CaptionTrack> {
    for language in languages {
        let manual = tracks
            .iter()
            .find(|t| t.matches_language(language) && !t.is_generated());
        let any = tracks.iter().find(|t| t.matches_language(language));
        if let Some(track) = manual.or(any) {
            return Some(track);
        }
    }
    if fallback_to_any {
        tracks.first()
    } else {
        None
    }
}

/// Extract the player response embedded in a watch page
pub fn extract_player_response(html: &str) -> Result<PlayerResponse, YouTubeError> {
    let start = html
        .find(PLAYER_RESPONSE_MARKER)
        .map(|i| i + PLAYER_RESPONSE_MARKER.len())
        .ok_or_else(|| YouTubeError::Parse("player response not found in watch page".to_string()))?;

    // The JSON object is followed by more script; read exactly one value
    serde_json::Deserializer::from_str(&html[start..])
        .into_iter::<PlayerResponse>()
        .next()
        .ok_or_else(|| YouTubeError::Parse("empty player response".to_string()))?
        .map_err(|e| YouTubeError::Parse(e.to_string()))
}

/// Parse a timed-text transcript into segment texts, in source order
pub fn parse_timed_text(xml: &str) -> Result<Vec<String>, YouTubeError> {
    let mut reader = Reader::from_str(xml);
    let mut segments = Vec::new();
    let mut current: Option<String> = None;

    loop {
        match reader
            .read_event()
            .map_err(|e| YouTubeError::Parse(e.to_string()))?
        {
            Event::Start(e) if is_segment(e.name().as_ref()) => {
                current = Some(String::new());
            }
            Event::End(e) if is_segment(e.name().as_ref()) => {
                if let Some(raw) = current.take() {
                    let text = clean_caption_text(&raw);
                    if !text.is_empty() {
                        segments.push(text);
                    }
                }
            }
            Event::Text(t) => {
                if let Some(buf) = current.as_mut() {
                    let text = t.decode().map_err(|e| YouTubeError::Parse(e.to_string()))?;
                    buf.push_str(&text);
                }
            }
            Event::CData(c) => {
                if let Some(buf) = current.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::GeneralRef(r) => {
                if let Some(buf) = current.as_mut() {
                    push_reference(buf, &r)?;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(segments)
}

fn is_segment(name: &[u8]) -> bool {
    name == b"text" || name == b"p"
}

/// Resolve an entity or character reference into `buf`; unknown names are kept verbatim
fn push_reference(buf: &mut String, reference: &BytesRef) -> Result<(), YouTubeError> {
    if let Some(c) = reference
        .resolve_char_ref()
        .map_err(|e| YouTubeError::Parse(e.to_string()))?
    {
        buf.push(c);
        return Ok(());
    }

    let name = reference
        .decode()
        .map_err(|e| YouTubeError::Parse(e.to_string()))?;
    match resolve_predefined_entity(&name) {
        Some(value) => buf.push_str(value),
        None => {
            buf.push('&');
            buf.push_str(&name);
            buf.push(';');
        }
    }
    Ok(())
}

/// Caption text is HTML-escaped inside the XML and may carry formatting tags
fn clean_caption_text(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    let text: String = fragment.root_element().text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// HTTP access to YouTube endpoints
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    client: Client,
    languages: Vec<String>,
    oembed_url: String,
}

impl YouTubeClient {
    pub fn new(config: &FetchConfig) -> Result<Self, YouTubeError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            languages: config.languages.clone(),
            oembed_url: OEMBED_URL.to_string(),
        })
    }

    /// Use a different oEmbed endpoint for video details
    pub fn with_oembed_url(mut self, url: impl Into<String>) -> Self {
        self.oembed_url = url.into();
        self
    }

    /// Preferred transcript languages, in order
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Query the player endpoint for a video
    pub async fn player(&self, id: &str) -> Result<PlayerResponse, YouTubeError> {
        let body = json!({
            "context": {
                "client": {
                    "clientName": PLAYER_CLIENT_NAME,
                    "clientVersion": PLAYER_CLIENT_VERSION,
                    "hl": self.languages.first().map(String::as_str).unwrap_or("en"),
                }
            },
            "videoId": id,
        });

        debug!(id, "requesting player response");
        let response = self.client.post(PLAYER_ENDPOINT).json(&body).send().await?;
        let response = check_status(response)?;
        response
            .json::<PlayerResponse>()
            .await
            .map_err(|e| YouTubeError::Parse(e.to_string()))
    }

    /// Download the public watch page and read its embedded player response
    pub async fn watch_page(&self, id: &str) -> Result<PlayerResponse, YouTubeError> {
        let url = Url::parse_with_params(WATCH_URL, &[("v", id)])
            .map_err(|e| YouTubeError::InvalidVideoId(e.to_string()))?;

        debug!(%url, "fetching watch page");
        let response = self
            .client
            .get(url)
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Cookie", "CONSENT=YES+cb")
            .send()
            .await?;
        let html = check_status(response)?.text().await?;
        extract_player_response(&html)
    }

    /// Download and parse the transcript of a caption track
    pub async fn transcript(&self, track: &CaptionTrack) -> Result<Vec<String>, YouTubeError> {
        // srv3 uses a different layout; ask for the default format
        let url = track.base_url.replace("&fmt=srv3", "");
        debug!(language = %track.language_code, "fetching transcript");
        let response = self.client.get(url).send().await?;
        let xml = check_status(response)?.text().await?;
        let segments = parse_timed_text(&xml)?;
        if segments.is_empty() {
            return Err(YouTubeError::EmptyTranscript);
        }
        Ok(segments)
    }

    /// Title, channel and thumbnail from the oEmbed endpoint
    pub async fn video_details(&self, video: &VideoUrl) -> Result<VideoDetails, YouTubeError> {
        let url = Url::parse_with_params(
            &self.oembed_url,
            &[("url", video.url.as_str()), ("format", "json")],
        )
        .map_err(|e| YouTubeError::Parse(e.to_string()))?;

        let response = self.client.get(url).send().await?;
        let body: OEmbedResponse = check_status(response)?
            .json()
            .await
            .map_err(|e| YouTubeError::Parse(e.to_string()))?;

        Ok(VideoDetails {
            title: body.title,
            channel: body.author_name,
            thumbnail_url: body.thumbnail_url,
            duration_secs: None,
        })
    }
}

/// Best-effort video details; failures are logged and yield `None`.
///
/// `length_hint` fills the duration when a transcript strategy already saw it.
pub async fn fetch_video_details(
    client: &YouTubeClient,
    video: &VideoUrl,
    length_hint: Option<&str>,
) -> Option<VideoDetails> {
    match client.video_details(video).await {
        Ok(mut details) => {
            details.duration_secs = length_hint.and_then(|l| l.parse().ok());
            Some(details)
        }
        Err(err) => {
            warn!(error = %err, url = %video.url, "could not load video details");
            None
        }
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, YouTubeError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(YouTubeError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn track(code: &str, kind: Option<&str>) -> CaptionTrack {
        CaptionTrack {
            base_url: format!("https://example.com/{code}"),
            language_code: code.to_string(),
            kind: kind.map(str::to_string),
        }
    }

    fn en() -> Vec<String> {
        vec!["en".to_string()]
    }

    #[test]
    fn parses_timed_text_in_order() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?><transcript>
            <text start="0.0" dur="1.5">Hello   there</text>
            <text start="1.5" dur="2.0">it&amp;#39;s a &lt;b&gt;test&lt;/b&gt;</text>
            <text start="3.5" dur="1.0"></text>
            <text start="4.5" dur="1.0">Tom &amp;amp; Jerry</text>
        </transcript>"#;
        let segments = parse_timed_text(xml).unwrap();
        assert_eq!(segments, vec!["Hello there", "it's a test", "Tom & Jerry"]);
    }

    #[test]
    fn parses_paragraph_layout() {
        let xml = r#"<timedtext><body><p t="0" d="10"><s>one</s><s> two</s></p><p t="10" d="5">three</p></body></timedtext>"#;
        assert_eq!(parse_timed_text(xml).unwrap(), vec!["one two", "three"]);
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(parse_timed_text("<transcript><text>unclosed</transcript>").is_err());
    }

    #[test]
    fn prefers_manual_english_track() {
        let tracks = vec![track("de", None), track("en", Some("asr")), track("en-GB", None)];
        let selected = select_track(&tracks, &en(), false).unwrap();
        assert_eq!(selected.language_code, "en-GB");
    }

    #[test]
    fn generated_track_when_no_manual() {
        let tracks = vec![track("de", None), track("en", Some("asr"))];
        assert_eq!(select_track(&tracks, &en(), false).unwrap().language_code, "en");
    }

    #[test]
    fn strict_selection_rejects_other_languages() {
        let tracks = vec![track("de", None), track("fr", None)];
        assert!(select_track(&tracks, &en(), false).is_none());
        assert_eq!(select_track(&tracks, &en(), true).unwrap().language_code, "de");
        assert!(select_track(&[], &en(), true).is_none());
    }

    #[test]
    fn extracts_embedded_player_response() {
        let html = r#"<html><script>var ytInitialPlayerResponse = {"playabilityStatus":{"status":"OK"},"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":"https://www.youtube.com/api/timedtext?v=abc&lang=en","languageCode":"en","name":{"simpleText":"English"}}]}},"videoDetails":{"title":"T","author":"A","lengthSeconds":"212"}};var meta = {};</script></html>"#;
        let player = extract_player_response(html).unwrap();
        assert!(player.ensure_playable("abc").is_ok());
        assert_eq!(player.caption_tracks().len(), 1);
        let details = player.video_details.unwrap();
        assert_eq!(details.title.as_deref(), Some("T"));
        assert_eq!(details.length_seconds.as_deref(), Some("212"));
    }

    #[test]
    fn missing_player_response_is_an_error() {
        assert!(matches!(
            extract_player_response("<html>consent</html>"),
            Err(YouTubeError::Parse(_))
        ));
    }

    #[test]
    fn unplayable_video() {
        let player: PlayerResponse = serde_json::from_str(
            r#"{"playabilityStatus":{"status":"LOGIN_REQUIRED","reason":"Sign in"}}"#,
        )
        .unwrap();
        assert!(matches!(
            player.ensure_playable("abc"),
            Err(YouTubeError::Unplayable { reason, .. }) if reason == "Sign in"
        ));
        assert!(player.caption_tracks().is_empty());
    }

    #[test]
    fn oembed_response_parses() {
        let body: OEmbedResponse = serde_json::from_str(
            r#"{"title":"Rust in 100 Seconds","author_name":"Fireship","type":"video",
                "thumbnail_url":"https://i.ytimg.com/vi/abc/hqdefault.jpg"}"#,
        )
        .unwrap();
        assert_eq!(body.title, "Rust in 100 Seconds");
        assert_eq!(body.author_name, "Fireship");
        assert!(body.thumbnail_url.is_some());
    }

    #[test]
    fn resolves_character_and_predefined_references() {
        let xml = r#"<transcript><text start="0" dur="1">it&#39;s &#x41; &quot;ok&quot; &apos;x&apos;</text></transcript>"#;
        let segments = parse_timed_text(xml).unwrap();
        assert_eq!(segments, vec!["it's A \"ok\" 'x'"]);
    }

    #[tokio::test]
    async fn unreachable_details_endpoint_yields_none() {
        let config = FetchConfig {
            timeout_secs: 2,
            ..FetchConfig::default()
        };
        // Nothing listens on the discard port
        let client = YouTubeClient::new(&config)
            .unwrap()
            .with_oembed_url("http://127.0.0.1:9/oembed");
        let video = VideoUrl {
            url: Url::parse("https://www.youtube.com/watch?v=abc123").unwrap(),
        };

        let details = fetch_video_details(&client, &video, Some("212")).await;
        assert!(details.is_none());
    }
}
