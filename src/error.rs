//! Unified error handling for the newsgrab crate
//!
//! Per-source failures are [`ExtractionError`]s and never abort a run; they end
//! up as outcomes in the [`RunReport`](crate::models::RunReport). The [`Error`]
//! enum here covers everything that *can* abort an invocation: bad
//! configuration, invalid input URLs, storage and sync failures.
//!
//! # Architecture
//!
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping the domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use newsgrab::error::{Error, ErrorCategory};
//!
//! fn report(err: &Error) {
//!     if err.category() == ErrorCategory::Storage {
//!         eprintln!("Output not written: {err}");
//!     } else {
//!         eprintln!("{}: {err}", err.category().description());
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

pub use crate::utils::error::{ErrorKind, ExtractionError};

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout, rate limit)
    Network,
    /// Parsing and data extraction errors
    Parsing,
    /// Storage and I/O errors
    Storage,
    /// Configuration and validation errors
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Short description used in log lines
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "network error",
            Self::Parsing => "parsing error",
            Self::Storage => "storage error",
            Self::Config => "configuration error",
            Self::Other => "other error",
        }
    }
}

/// Unified error type for the newsgrab crate
#[derive(Error, Debug)]
pub enum Error {
    /// Extraction errors surfaced outside a run report
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Rejected input (URL list out of bounds, malformed URL)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage sink failures
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration parse errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Anything else, carried as its message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Extraction(e) => match e {
                ExtractionError::Parse(_) | ExtractionError::EmptyResult => ErrorCategory::Parsing,
                ExtractionError::Cancelled => ErrorCategory::Other,
                _ => ErrorCategory::Network,
            },
            Self::Http(_) => ErrorCategory::Network,
            Self::Json(_) => ErrorCategory::Parsing,
            Self::Storage(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::InvalidInput(_) | Self::Config(_) | Self::Toml(_) => ErrorCategory::Config,
            Self::Other(_) => ErrorCategory::Other,
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid-input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}

// Conversion from anyhow::Error
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(format!("{err:#}"))
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
