//! Error types for the extraction pipeline.
//!
//! Two layers live here. [`JaibError`] is the internal error every
//! component returns through [`Result`]. [`ExtractionError`] is the
//! normalized failure handed to callers: one [`ErrorKind`], a human-readable
//! message and the URL the caller asked for, so bulk callers can attribute
//! the failure to the right input row.
//!
//! # Example
//!
//! ```rust
//! use jaib_core::{ErrorKind, ExtractionError, JaibError};
//!
//! let err = JaibError::InvalidUrl("relative URL without a base".to_string());
//! let normalized = ExtractionError::from_error(err, "example.com/post");
//! assert_eq!(normalized.kind, ErrorKind::InvalidUrl);
//! assert_eq!(normalized.source_url, "example.com/post");
//! ```

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for fetching, parsing and extraction.
#[derive(Error, Debug)]
pub enum JaibError {
    /// The input is missing or is not an absolute http(s) URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// DNS, connect or transport failure before a response arrived.
    #[error("Network error: {0}")]
    Network(String),

    /// The target answered with a non-success status.
    #[error("HTTP error! Status: {status} {reason}. Response snippet: {snippet}")]
    HttpStatus { status: u16, reason: String, snippet: String },

    /// The fetch exceeded its wall-clock budget.
    #[error("Request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// The payload could not be interpreted as HTML at all.
    ///
    /// Also returned for invalid CSS selectors.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// The best candidate did not clear the minimum score.
    ///
    /// Typical for login walls, error pages, search results and
    /// navigation-only pages.
    #[error("Content is not readable (score {score:.1} below threshold {threshold:.1})")]
    NotReadable { score: f64, threshold: f64 },

    /// The document had no candidate content at all.
    #[error("No content could be extracted from the document")]
    NoContent,

    /// Local input file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Local I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else that went wrong inside the pipeline.
    #[error("{0}")]
    Internal(String),
}

/// Result type alias for [`JaibError`].
pub type Result<T> = std::result::Result<T, JaibError>;

/// Failure taxonomy reported to callers.
///
/// Serialized with the variant name (`"InvalidUrl"`, `"Timeout"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidUrl,
    NetworkError,
    HttpError,
    Timeout,
    ParseError,
    ExtractionFailed,
    ArticleProcessingError,
}

impl ErrorKind {
    /// Whether a caller may reasonably try the same request again later.
    ///
    /// The pipeline itself never retries.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::NetworkError | Self::Timeout)
    }

    /// Whether the failure was caused by the caller's input rather than the
    /// target site or the pipeline.
    pub fn is_client_error(self) -> bool {
        matches!(self, Self::InvalidUrl)
    }

    /// Whether the failure came from the remote host.
    pub fn is_upstream_error(self) -> bool {
        matches!(self, Self::NetworkError | Self::HttpError | Self::Timeout)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidUrl => "InvalidUrl",
            Self::NetworkError => "NetworkError",
            Self::HttpError => "HttpError",
            Self::Timeout => "Timeout",
            Self::ParseError => "ParseError",
            Self::ExtractionFailed => "ExtractionFailed",
            Self::ArticleProcessingError => "ArticleProcessingError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&JaibError> for ErrorKind {
    fn from(err: &JaibError) -> Self {
        match err {
            JaibError::InvalidUrl(_) => Self::InvalidUrl,
            JaibError::Network(_) => Self::NetworkError,
            JaibError::HttpStatus { .. } => Self::HttpError,
            JaibError::Timeout { .. } => Self::Timeout,
            JaibError::HtmlParseError(_) => Self::ParseError,
            JaibError::NotReadable { .. } | JaibError::NoContent => Self::ExtractionFailed,
            JaibError::FileNotFound(_) | JaibError::Io(_) | JaibError::Internal(_) => Self::ArticleProcessingError,
        }
    }
}

/// The normalized failure result of one extraction request.
///
/// Serializes to the wire shape `{ "error", "message", "sourceUrl" }`.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct ExtractionError {
    #[serde(rename = "error")]
    pub kind: ErrorKind,
    pub message: String,
    #[serde(rename = "sourceUrl")]
    pub source_url: String,
}

impl ExtractionError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self { kind, message: message.into(), source_url: source_url.into() }
    }

    /// Classifies an internal error and attributes it to `source_url`.
    pub fn from_error(err: JaibError, source_url: impl Into<String>) -> Self {
        let kind = ErrorKind::from(&err);
        Self { kind, message: err.to_string(), source_url: source_url.into() }
    }
}
