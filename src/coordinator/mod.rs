//! Run coordinator
//!
//! Fans a batch of URLs out to the [`ScrapeOrchestrator`] with bounded
//! concurrency and assembles the [`RunReport`] in input order. One URL's
//! failure never affects another; a cancelled run still reports every URL.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use crate::config::{Config, MAX_BATCH};
use crate::error::{Error, Result};
use crate::models::{CleanArticle, RunReport};
use crate::orchestrator::{ScrapeOrchestrator, UrlResult};

/// Report plus the per-URL article batches, both in input order
#[derive(Debug, Clone)]
pub struct RunResult {
    pub report: RunReport,
    pub batches: Vec<UrlResult>,
}

impl RunResult {
    /// Articles of every successful URL, grouped by URL in input order
    pub fn articles(&self) -> impl Iterator<Item = &CleanArticle> {
        self.batches
            .iter()
            .filter(|b| b.outcome.is_success())
            .flat_map(|b| b.articles.iter())
    }
}

/// Trim, drop blanks and duplicates (first occurrence wins) and check the batch size
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] when no URL remains or more than
/// [`MAX_BATCH`] are given.
pub fn validate_urls<S: AsRef<str>>(urls: &[S]) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let unique: Vec<String> = urls
        .iter()
        .map(|u| u.as_ref().trim())
        .filter(|u| !u.is_empty())
        .filter(|u| seen.insert(u.to_string()))
        .map(str::to_string)
        .collect();

    if unique.is_empty() {
        return Err(Error::invalid_input("at least one URL is required"));
    }
    if unique.len() > MAX_BATCH {
        return Err(Error::invalid_input(format!(
            "{} URLs given, at most {MAX_BATCH} allowed",
            unique.len()
        )));
    }
    Ok(unique)
}

/// Runs URL batches through a shared orchestrator
pub struct RunCoordinator {
    orchestrator: Arc<ScrapeOrchestrator>,
    concurrency: usize,
}

impl RunCoordinator {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let orchestrator = Arc::new(ScrapeOrchestrator::new(config)?);
        Ok(Self::with_orchestrator(orchestrator, config.engine.concurrency))
    }

    pub fn with_orchestrator(orchestrator: Arc<ScrapeOrchestrator>, concurrency: usize) -> Self {
        Self {
            orchestrator,
            concurrency: concurrency.max(1),
        }
    }

    pub fn orchestrator(&self) -> &Arc<ScrapeOrchestrator> {
        &self.orchestrator
    }

    /// Scrape every URL and report one outcome per URL in input order
    ///
    /// Once `cancel` fires no new extraction attempt starts; URLs not yet
    /// started are reported as cancelled.
    ///
    /// # Errors
    ///
    /// Only input validation fails the run; see [`validate_urls`].
    pub async fn run<S: AsRef<str>>(&self, urls: &[S], cancel: CancellationToken) -> Result<RunResult> {
        let urls = validate_urls(urls)?;
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(
            run_id = %run_id,
            urls = urls.len(),
            concurrency = self.concurrency,
            article_limit = self.orchestrator.extraction_config().article_limit,
            "Run started"
        );

        let mut indexed: Vec<(usize, UrlResult)> = stream::iter(urls.into_iter().enumerate())
            .map(|(idx, url)| {
                let orchestrator = Arc::clone(&self.orchestrator);
                let cancel = cancel.clone();
                async move { (idx, orchestrator.scrape(&url, &cancel).await) }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        indexed.sort_by_key(|(idx, _)| *idx);

        let batches: Vec<UrlResult> = indexed.into_iter().map(|(_, r)| r).collect();
        let report = RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            outcomes: batches.iter().map(|b| b.outcome.clone()).collect(),
            cancelled: cancel.is_cancelled(),
        };

        let summary = report.summary();
        info!(
            run_id = %run_id,
            succeeded = summary.succeeded,
            partial = summary.partial,
            failed = summary.failed,
            articles = summary.articles,
            duration_ms = summary.duration_ms,
            cancelled = report.cancelled,
            "Run finished"
        );

        Ok(RunResult { report, batches })
    }
}
