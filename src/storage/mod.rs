//! Storage collaborators
//!
//! The engine hands each run's [`CleanArticle`]s to one or more
//! [`ArticleSink`]s. Sinks see articles as [`TabularRow`]s
//! (`Title, Date, Source, Link, Summary`) and own their persistence format.

pub mod jsonl;
pub mod webhook;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::models::{CleanArticle, TabularRow};

pub use jsonl::JsonLinesSink;
pub use webhook::{WebhookSink, WebhookSinkConfig};

/// Where a batch went and how many rows it held
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SinkReceipt {
    pub sink: &'static str,
    /// File path or endpoint URL
    pub location: String,
    pub rows: usize,
}

/// Destination for normalised articles
#[async_trait]
pub trait ArticleSink: Send + Sync {
    fn name(&self) -> &'static str;

    /// Persist one batch
    async fn write(&self, articles: &[CleanArticle]) -> Result<SinkReceipt>;
}

/// Project articles to tabular rows, preserving order
pub fn to_rows(articles: &[CleanArticle]) -> Vec<TabularRow> {
    articles.iter().map(CleanArticle::to_row).collect()
}
