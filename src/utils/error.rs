//! Error types for the scraping engine
//!
//! [`ExtractionError`] is what classifiers and strategies return. Every
//! variant projects onto an [`ErrorKind`], the serialisable tag recorded in a
//! [`UrlOutcome`](crate::models::UrlOutcome).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised while classifying or extracting a single source
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// Source could not be classified: bad URL, unreachable during the probe
    #[error("Classification failed: {0}")]
    ClassificationFailed(String),

    /// Connection, DNS or mid-body transport failure during extraction
    #[error("Network error: {0}")]
    Network(String),

    /// Request, render or readiness wait exceeded the configured timeout
    #[error("Request timeout")]
    Timeout,

    /// Non-success HTTP status
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// Document could not be parsed (malformed feed, undecodable body)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Source produced no articles
    #[error("No articles found")]
    EmptyResult,

    /// Headless rendering session failed
    #[error("Render failed: {0}")]
    RenderFailed(String),

    /// Run was cancelled before this source could be attempted
    #[error("Cancelled")]
    Cancelled,
}

impl ExtractionError {
    /// Create an HTTP error from a status code
    pub fn http(status: u16) -> Self {
        Self::Http { status }
    }

    /// Whether another extraction attempt may succeed
    ///
    /// Retryable: `Timeout`, `Network`, `Http` 5xx (and 429), `RenderFailed`.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Network(_) | Self::RenderFailed(_) => true,
            Self::Http { status } => is_retryable_status(*status),
            Self::ClassificationFailed(_)
            | Self::Parse(_)
            | Self::EmptyResult
            | Self::Cancelled => false,
        }
    }

    /// Tag recorded in the run report
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ClassificationFailed(_) => ErrorKind::ClassificationFailed,
            Self::Timeout => ErrorKind::Timeout,
            Self::Network(_) => ErrorKind::NetworkError,
            Self::Http { status } => ErrorKind::HttpError { code: *status },
            Self::Parse(_) => ErrorKind::ParseError,
            Self::EmptyResult => ErrorKind::EmptyResult,
            Self::RenderFailed(_) => ErrorKind::RenderFailed,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Map a transport-level reqwest error
    ///
    /// Only an undecodable body is a parse failure; connect, DNS and dropped
    /// connections are [`ExtractionError::Network`].
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::http(status.as_u16())
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Status codes worth retrying
///
/// 5xx are transient server failures, 429 is the server asking us to back off.
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Serialisable error tag for run reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorKind {
    ClassificationFailed,
    Timeout,
    NetworkError,
    HttpError { code: u16 },
    ParseError,
    EmptyResult,
    RenderFailed,
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClassificationFailed => write!(f, "ClassificationFailed"),
            Self::Timeout => write!(f, "Timeout"),
            Self::NetworkError => write!(f, "NetworkError"),
            Self::HttpError { code } => write!(f, "HttpError{{{code}}}"),
            Self::ParseError => write!(f, "ParseError"),
            Self::EmptyResult => write!(f, "EmptyResult"),
            Self::RenderFailed => write!(f, "RenderFailed"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}
