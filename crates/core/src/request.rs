//! Extraction requests and URL validation.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{JaibError, Result};

static SHARED_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)https?://[^\s]+").expect("shared URL pattern is valid"));

/// Characters that commonly trail a URL pasted into prose.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}', '"', '\'', '>'];

/// A request to extract one article.
///
/// Deserializes from the `{ "url": "..." }` request body. A missing `url`
/// deserializes to an empty string so that validation, not the JSON layer,
/// reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    #[serde(default)]
    pub url: String,
}

impl ExtractionRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Builds a request from free-form shared text such as
    /// `"Look at this https://example.com/post"`.
    ///
    /// # Errors
    ///
    /// Returns [`JaibError::InvalidUrl`] when the text holds no http(s) URL.
    pub fn from_shared_text(text: &str) -> Result<Self> {
        extract_first_url(text)
            .map(Self::new)
            .ok_or_else(|| JaibError::InvalidUrl(format!("no http(s) URL found in shared text {:?}", text.trim())))
    }

    /// Checks that the URL is an absolute http(s) URL with a host.
    pub fn validate(&self) -> Result<Url> {
        parse_article_url(&self.url)
    }
}

/// Parses `input` as an absolute http(s) URL.
///
/// # Example
///
/// ```rust
/// use jaib_core::request::parse_article_url;
///
/// assert!(parse_article_url("https://example.com/post").is_ok());
/// assert!(parse_article_url("example.com/post").is_err());
/// assert!(parse_article_url("mailto:me@example.com").is_err());
/// ```
pub fn parse_article_url(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(JaibError::InvalidUrl("URL is required".to_string()));
    }

    let url = Url::parse(trimmed).map_err(|e| JaibError::InvalidUrl(format!("{}: {}", trimmed, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(JaibError::InvalidUrl(format!("unsupported scheme {:?} in {}", url.scheme(), trimmed)));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(JaibError::InvalidUrl(format!("{} has no host", trimmed)));
    }

    Ok(url)
}

/// First `http://` or `https://` token in `text`, minus trailing punctuation.
pub fn extract_first_url(text: &str) -> Option<String> {
    let found = SHARED_URL.find(text)?.as_str();
    let url = found.trim_end_matches(TRAILING_PUNCTUATION);
    (url.len() > "http://".len()).then(|| url.to_string())
}
