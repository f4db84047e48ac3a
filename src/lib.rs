//! newsgrab - universal news scraping engine
//!
//! Classifies arbitrary URLs as feeds, server-rendered pages or
//! JavaScript-rendered pages, extracts articles with the matching strategy
//! under per-host rate limits and bounded retries, and normalises them into
//! one record shape for storage.
//!
//! # Architecture
//!
//! - [`classifier`] - URL to [`SourceKind`](models::SourceKind) decision
//! - [`strategy`] - feed, static HTML and rendered-page extraction
//! - [`crawler`] - HTTP fetcher and per-host rate limiter
//! - [`parser`] - structural HTML extraction and text sanitisation
//! - [`normalizer`] - raw to clean article conversion
//! - [`orchestrator`] - per-URL state machine with retry
//! - [`coordinator`] - bounded-concurrency runs and the run report
//! - [`storage`] - article sinks (JSON lines, webhook sync)
//! - [`config`] - configuration management
//! - [`models`] - core data structures
//!
//! # Example
//!
//! ```no_run
//! use newsgrab::config::Config;
//! use newsgrab::coordinator::RunCoordinator;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let coordinator = RunCoordinator::new(&config)?;
//!     let result = coordinator
//!         .run(&config.sources.urls, CancellationToken::new())
//!         .await?;
//!     result.report.log_outcomes();
//!     Ok(())
//! }
//! ```

pub mod classifier;
pub mod config;
pub mod coordinator;
pub mod crawler;
pub mod error;
pub mod models;
pub mod normalizer;
pub mod orchestrator;
pub mod parser;
pub mod storage;
pub mod strategy;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::classifier::SourceClassifier;
    pub use crate::config::Config;
    pub use crate::coordinator::{RunCoordinator, RunResult};
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::models::{
        CleanArticle, ExtractionConfig, RawArticle, RunReport, SourceDescriptor, SourceKind,
        UrlOutcome, UrlStatus,
    };
    pub use crate::normalizer::Normalizer;
    pub use crate::orchestrator::ScrapeOrchestrator;
    pub use crate::storage::{ArticleSink, JsonLinesSink, WebhookSink};
    pub use crate::utils::error::{ErrorKind, ExtractionError};
}

pub use models::{CleanArticle, RawArticle, RunReport, SourceKind, UrlOutcome, UrlStatus};
