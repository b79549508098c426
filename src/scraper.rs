//! Web scraping module for generic page content.
//!
//! Uses reqwest for fetching and scraper for HTML parsing. The readable text of
//! a page is split into content blocks: every heading opens a new block and
//! the paragraphs and list items below it belong to that block.

use crate::config::FetchConfig;
use crate::document::Document;
use lazy_static::lazy_static;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Paragraphs and list items shorter than this are navigation noise
const MIN_PARAGRAPH_CHARS: usize = 20;

/// Candidate containers for the main content, most specific first
const MAIN_SELECTORS: &[&str] = &["article", "main", "[role='main']", ".content", "#content"];

lazy_static! {
    static ref TITLE: Selector = Selector::parse("title").unwrap();
    static ref H1: Selector = Selector::parse("h1").unwrap();
    static ref BODY: Selector = Selector::parse("body").unwrap();
    static ref CONTENT: Selector = Selector::parse("p, h1, h2, h3, h4, h5, h6, li").unwrap();
    static ref MAIN: Vec<Selector> = MAIN_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .collect();
}

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("failed to fetch URL: {0}")]
    FetchError(String),
    #[error("request timed out")]
    Timeout,
    #[error("page returned HTTP {0}")]
    Status(u16),
    #[error("no content found at URL")]
    NoContent,
}

impl ScraperError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ScraperError::Timeout)
    }
}

impl From<reqwest::Error> for ScraperError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ScraperError::Timeout
        } else {
            ScraperError::FetchError(err.to_string())
        }
    }
}

/// Extracted content from a webpage
#[derive(Debug, Clone)]
pub struct WebContent {
    /// The original URL
    pub url: String,
    /// Page title
    pub title: Option<String>,
    /// Content blocks in document order
    pub blocks: Vec<ContentBlock>,
}

/// A heading (if any) and the text that follows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentBlock {
    pub heading: Option<String>,
    pub text: String,
}

impl WebContent {
    /// One document per content block
    pub fn into_documents(self) -> Vec<Document> {
        let WebContent { url, title, blocks } = self;
        blocks
            .into_iter()
            .map(|block| {
                let mut doc = Document::new(block.text).with_metadata("source", url.as_str());
                if let Some(title) = &title {
                    doc = doc.with_metadata("title", title.as_str());
                }
                if let Some(heading) = block.heading {
                    doc = doc.with_metadata("section", heading);
                }
                doc
            })
            .collect()
    }
}

/// Fetches generic pages with a browser-like client
#[derive(Debug, Clone)]
pub struct PageLoader {
    client: Client,
}

impl PageLoader {
    /// Create a configured HTTP client for scraping
    pub fn new(config: &FetchConfig) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;
        Ok(Self { client })
    }

    /// Fetch and extract content from a URL
    pub async fn fetch_content(&self, url: &Url) -> Result<WebContent, ScraperError> {
        debug!(%url, "fetching page");
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::Status(status.as_u16()));
        }

        let html = response.text().await?;
        parse_content(url.as_str(), &html)
    }
}

/// Parse an HTML page into title and content blocks
pub fn parse_content(url: &str, html: &str) -> Result<WebContent, ScraperError> {
    let document = Html::parse_document(html);
    let title = extract_title(&document);
    let blocks = extract_blocks(&document);

    if blocks.is_empty() {
        return Err(ScraperError::NoContent);
    }

    Ok(WebContent {
        url: url.to_string(),
        title,
        blocks,
    })
}

/// Extract the page title from <title> or <h1>
fn extract_title(document: &Html) -> Option<String> {
    [&*TITLE, &*H1].into_iter().find_map(|selector| {
        document
            .select(selector)
            .next()
            .map(collapse_text)
            .filter(|title| !title.is_empty())
    })
}

/// Extract content blocks, preferring the main content region
fn extract_blocks(document: &Html) -> Vec<ContentBlock> {
    for selector in MAIN.iter() {
        if let Some(element) = document.select(selector).next() {
            let blocks = blocks_in(element);
            if !blocks.is_empty() {
                return blocks;
            }
        }
    }

    // Fall back to the whole body
    match document.select(&BODY).next() {
        Some(body) => blocks_in(body),
        None => blocks_in(document.root_element()),
    }
}

/// Walk headings, paragraphs and list items in order, opening a block per heading
fn blocks_in(root: ElementRef<'_>) -> Vec<ContentBlock> {
    let mut blocks = Vec::new();
    let mut heading: Option<String> = None;
    let mut paragraphs: Vec<String> = Vec::new();

    for element in root.select(&CONTENT) {
        // Paragraphs nested in list items are read through the list item
        if has_content_ancestor(element, root) {
            continue;
        }

        let text = collapse_text(element);
        if is_heading(element) {
            flush(&mut blocks, heading.take(), &mut paragraphs);
            heading = (!text.is_empty()).then_some(text);
        } else if text.len() > MIN_PARAGRAPH_CHARS {
            paragraphs.push(text);
        }
    }
    flush(&mut blocks, heading, &mut paragraphs);

    blocks
}

fn flush(blocks: &mut Vec<ContentBlock>, heading: Option<String>, paragraphs: &mut Vec<String>) {
    if paragraphs.is_empty() {
        return;
    }
    let body = paragraphs.join("\n\n");
    let text = match &heading {
        Some(h) => format!("{}\n\n{}", h, body),
        None => body,
    };
    blocks.push(ContentBlock { heading, text });
    paragraphs.clear();
}

fn is_heading(element: ElementRef<'_>) -> bool {
    matches!(element.value().name(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

fn has_content_ancestor(element: ElementRef<'_>, root: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .take_while(|node| node.id() != root.id())
        .filter_map(ElementRef::wrap)
        .any(|ancestor| CONTENT.matches(&ancestor))
}

fn collapse_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ARTICLE: &str = r#"
        <html><head><title>Rust Ownership Explained</title></head>
        <body>
          <nav><ul><li>Home</li><li>About this website and its authors</li></ul></nav>
          <article>
            <h2>Ownership</h2>
            <p>Every value in Rust has a single owner at any time.</p>
            <p>When the owner goes out of scope the value is dropped.</p>
            <h2>Borrowing</h2>
            <p>References let code use a value without taking ownership.</p>
            <h2>Lifetimes</h2>
            <ul><li>Lifetimes describe how long references remain valid.</li></ul>
          </article>
          <script>var tracking = "this is a long script string that is not content";</script>
        </body></html>"#;

    #[test]
    fn splits_article_into_heading_blocks() {
        let content = parse_content("https://example.com/rust", ARTICLE).unwrap();
        assert_eq!(content.title.as_deref(), Some("Rust Ownership Explained"));
        assert_eq!(content.blocks.len(), 3);
        assert_eq!(content.blocks[0].heading.as_deref(), Some("Ownership"));
        assert_eq!(
            content.blocks[0].text,
            "Ownership\n\nEvery value in Rust has a single owner at any time.\n\n\
             When the owner goes out of scope the value is dropped."
        );
        assert_eq!(content.blocks[2].heading.as_deref(), Some("Lifetimes"));
    }

    #[test]
    fn documents_carry_metadata() {
        let docs = parse_content("https://example.com/rust", ARTICLE)
            .unwrap()
            .into_documents();
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[1].meta("section"), Some("Borrowing"));
        assert_eq!(docs[1].meta("title"), Some("Rust Ownership Explained"));
        assert_eq!(docs[1].meta("source"), Some("https://example.com/rust"));
    }

    #[test]
    fn text_before_first_heading_is_its_own_block() {
        let html = r#"<body>
            <p>An introduction paragraph that is long enough.</p>
            <h1>Main Heading</h1>
            <p>A second paragraph that is also long enough.</p>
        </body>"#;
        let content = parse_content("https://example.com", html).unwrap();
        assert_eq!(content.title.as_deref(), Some("Main Heading"));
        assert_eq!(content.blocks.len(), 2);
        assert_eq!(content.blocks[0].heading, None);
    }

    #[test]
    fn nested_paragraphs_are_not_duplicated() {
        let html = r#"<main><ul><li><p>A list item holding a nested paragraph.</p></li></ul></main>"#;
        let content = parse_content("https://example.com", html).unwrap();
        assert_eq!(content.blocks.len(), 1);
        assert_eq!(content.blocks[0].text, "A list item holding a nested paragraph.");
    }

    #[test]
    fn empty_page_has_no_content() {
        let html = "<html><body><h1>Title only</h1><p>short</p></body></html>";
        assert!(matches!(
            parse_content("https://example.com", html),
            Err(ScraperError::NoContent)
        ));
    }
}
