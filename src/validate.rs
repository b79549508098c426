//! URL validation, performed before any network call.

use thiserror::Error;
use url::{Host, Url};

/// Schemes accepted as a well-formed URL
const SCHEMES: &[&str] = &["http", "https", "ftp"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("please provide a URL to get started")]
    Empty,
    #[error("please enter a valid URL (YouTube video or website): {0}")]
    Invalid(String),
}

/// Returns true iff `input` has a recognized scheme and a host.
pub fn is_valid_url(input: &str) -> bool {
    parse_url(input).is_some()
}

/// Validate user input and return the parsed URL
pub fn validate_url(input: &str) -> Result<Url, InputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }
    parse_url(trimmed).ok_or_else(|| InputError::Invalid(trimmed.to_string()))
}

fn parse_url(input: &str) -> Option<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return None;
    }

    let url = Url::parse(trimmed).ok()?;
    if !SCHEMES.contains(&url.scheme()) {
        return None;
    }

    let host_ok = match url.host()? {
        Host::Domain(domain) => {
            let domain = domain.trim_end_matches('.');
            let labels_ok = domain
                .split('.')
                .all(|label| !label.is_empty() && !label.starts_with('-') && !label.ends_with('-'));
            labels_ok && (domain.contains('.') || domain == "localhost")
        }
        Host::Ipv4(_) | Host::Ipv6(_) => true,
    };
    host_ok.then_some(url)
}
