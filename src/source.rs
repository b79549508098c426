//! Source classification: video transcript vs. generic web page.
//!
//! A validated URL is resolved once into a [`Source`] at acquisition entry.

use url::Url;

/// Hosts (and their subdomains) served by the video platform
const VIDEO_DOMAINS: &[&str] = &["youtube.com", "youtube-nocookie.com", "youtu.be"];

/// Query parameter carrying the video id
const VIDEO_ID_PARAM: &str = "v";

/// Where the content of a URL comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A video whose transcript is the content
    Video(VideoUrl),
    /// A generic page whose readable text is the content
    Page(Url),
}

impl Source {
    /// Resolve a URL into a source by host
    pub fn classify(url: &Url) -> Self {
        if is_video_host(url) {
            Source::Video(VideoUrl::new(url.clone()))
        } else {
            Source::Page(url.clone())
        }
    }

    pub fn url(&self) -> &Url {
        match self {
            Source::Video(video) => &video.url,
            Source::Page(url) => url,
        }
    }
}

/// A URL on the video platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoUrl {
    pub url: Url,
}

impl VideoUrl {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    /// The video identifier, if one can be parsed out of the URL
    pub fn video_id(&self) -> Option<String> {
        parse_video_id(&self.url)
    }
}

fn is_video_host(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    VIDEO_DOMAINS
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{}", domain)))
}

/// Take the `v` query parameter if present, otherwise the last path segment.
pub fn parse_video_id(url: &Url) -> Option<String> {
    if let Some((_, value)) = url.query_pairs().find(|(key, _)| key == VIDEO_ID_PARAM) {
        let id = value.trim();
        return (!id.is_empty()).then(|| id.to_string());
    }

    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn classifies_video_hosts() {
        for s in [
            "https://www.youtube.com/watch?v=abc123",
            "https://youtube.com/watch?v=abc123",
            "https://m.youtube.com/watch?v=abc123",
            "https://youtu.be/abc123",
            "https://www.youtube-nocookie.com/embed/abc123",
        ] {
            assert!(matches!(Source::classify(&url(s)), Source::Video(_)), "{s}");
        }
    }

    #[test]
    fn classifies_generic_pages() {
        for s in [
            "https://example.com/article",
            "https://notyoutube.com/watch?v=abc",
            "https://blog.example.com/youtube.com",
        ] {
            assert!(matches!(Source::classify(&url(s)), Source::Page(_)), "{s}");
        }
    }

    #[test]
    fn video_id_from_query_parameter() {
        assert_eq!(
            parse_video_id(&url("https://www.youtube.com/watch?v=abc123")),
            Some("abc123".to_string())
        );
        assert_eq!(
            parse_video_id(&url("https://www.youtube.com/watch?v=abc123&t=42s&list=PL1")),
            Some("abc123".to_string())
        );
        assert_eq!(
            parse_video_id(&url("https://www.youtube.com/watch?feature=share&v=xyz")),
            Some("xyz".to_string())
        );
    }

    #[test]
    fn video_id_from_last_path_segment() {
        assert_eq!(
            parse_video_id(&url("https://youtu.be/abc123")),
            Some("abc123".to_string())
        );
        assert_eq!(
            parse_video_id(&url("https://www.youtube.com/shorts/short42/")),
            Some("short42".to_string())
        );
        assert_eq!(
            parse_video_id(&url("https://youtu.be/abc123?si=tracking")),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn missing_video_id() {
        assert_eq!(parse_video_id(&url("https://www.youtube.com/")), None);
        assert_eq!(parse_video_id(&url("https://www.youtube.com/watch?v=")), None);
    }
}
