//! Per-URL scrape pipeline
//!
//! Each URL moves through
//! `Pending -> Classifying -> Extracting -> Normalizing -> Done`, and every
//! path ends in exactly one [`UrlOutcome`]. Extraction is retried in an
//! explicit bounded loop: only errors for which
//! [`ExtractionError::is_retryable`] holds are retried, up to
//! `max_retries` times with exponential backoff. The per-host permit is
//! held for one attempt and released before the backoff sleep.
//!
//! Strategy errors never escape [`ScrapeOrchestrator::scrape`].

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::classifier::SourceClassifier;
use crate::config::Config;
use crate::crawler::fetcher::HttpFetcher;
use crate::crawler::rate_limit::HostRateLimiter;
use crate::models::{
    CleanArticle, ExtractionConfig, RawArticle, SourceDescriptor, UrlOutcome, UrlStatus,
};
use crate::normalizer::{Normalizer, NormalizerConfig};
use crate::strategy::StrategySet;
use crate::utils::error::ExtractionError;
use crate::utils::retry::RetryPolicy;

/// Pipeline state of one URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeState {
    Pending,
    Classifying,
    Extracting { attempt: u32 },
    Normalizing,
    Done(UrlStatus),
}

impl fmt::Display for ScrapeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Classifying => write!(f, "classifying"),
            Self::Extracting { attempt } => write!(f, "extracting#{attempt}"),
            Self::Normalizing => write!(f, "normalizing"),
            Self::Done(status) => write!(f, "done({status})"),
        }
    }
}

/// Outcome of one URL plus the articles it produced
#[derive(Debug, Clone)]
pub struct UrlResult {
    pub outcome: UrlOutcome,
    /// Source document order, at most `article_limit`
    pub articles: Vec<CleanArticle>,
    pub descriptor: Option<SourceDescriptor>,
}

/// What the extraction loop ended with
struct Extracted {
    articles: Vec<RawArticle>,
    attempts: u32,
    /// Error that cut the stream short, or the last error when nothing came back
    error: Option<ExtractionError>,
}

/// Drives classification, extraction with retry, and normalisation
pub struct ScrapeOrchestrator {
    classifier: SourceClassifier,
    strategies: StrategySet,
    limiter: Arc<HostRateLimiter>,
    normalizer: Normalizer,
    retry: RetryPolicy,
    extraction: ExtractionConfig,
}

impl ScrapeOrchestrator {
    /// Orchestrator with the standard strategies over a fresh fetcher
    pub fn new(config: &Config) -> crate::error::Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(config)?);
        let strategies = StrategySet::standard(Arc::clone(&fetcher), config);
        Ok(Self::from_parts(config, fetcher, strategies))
    }

    /// Orchestrator with caller-supplied strategies
    pub fn from_parts(config: &Config, fetcher: Arc<HttpFetcher>, strategies: StrategySet) -> Self {
        let limiter = Arc::new(HostRateLimiter::from_millis(
            config.engine.per_host_min_interval_ms,
        ));
        let classifier = SourceClassifier::new(
            fetcher,
            Arc::clone(&limiter),
            config.classifier.clone(),
        );

        Self {
            classifier,
            strategies,
            limiter,
            normalizer: Normalizer::new(NormalizerConfig {
                summary_max_len: config.engine.summary_max_len,
                ascii_only: config.engine.ascii_only,
            }),
            retry: config.retry_policy(),
            extraction: config.extraction_config(),
        }
    }

    pub fn extraction_config(&self) -> &ExtractionConfig {
        &self.extraction
    }

    pub fn limiter(&self) -> &Arc<HostRateLimiter> {
        &self.limiter
    }

    pub fn classifier(&self) -> &SourceClassifier {
        &self.classifier
    }

    /// Run one URL to completion
    pub async fn scrape(&self, url: &str, cancel: &CancellationToken) -> UrlResult {
        let mut state = ScrapeState::Pending;

        if cancel.is_cancelled() {
            return self.finish(url, &mut state, None, Extracted::cancelled(0, None));
        }

        transition(url, &mut state, ScrapeState::Classifying);
        let descriptor = match self.classifier.classify(url).await {
            Ok(d) => d,
            Err(e) => {
                warn!(url = url, error = %e, "Classification failed");
                let extracted = Extracted {
                    articles: Vec::new(),
                    attempts: 0,
                    error: Some(e),
                };
                return self.finish(url, &mut state, None, extracted);
            }
        };

        let extracted = self.extract_with_retry(&descriptor, &mut state, cancel).await;
        self.finish(url, &mut state, Some(descriptor), extracted)
    }

    async fn extract_with_retry(
        &self,
        descriptor: &SourceDescriptor,
        state: &mut ScrapeState,
        cancel: &CancellationToken,
    ) -> Extracted {
        let url = descriptor.url.as_str();
        let Some(strategy) = self.strategies.get(descriptor.detected_kind) else {
            let err = ExtractionError::ClassificationFailed(format!(
                "no strategy registered for {}",
                descriptor.detected_kind
            ));
            return Extracted {
                articles: Vec::new(),
                attempts: 0,
                error: Some(err),
            };
        };

        let mut attempt: u32 = 0;
        loop {
            if cancel.is_cancelled() {
                return Extracted::cancelled(attempt, None);
            }

            transition(url, state, ScrapeState::Extracting { attempt });
            let result = {
                let _permit = match self.limiter.acquire_for_url(&descriptor.fetch_url).await {
                    Ok(p) => p,
                    Err(e) => {
                        return Extracted {
                            articles: Vec::new(),
                            attempts: attempt,
                            error: Some(e),
                        }
                    }
                };
                strategy.extract(descriptor, &self.extraction).await
            };
            attempt += 1;

            let error = match result {
                Ok(stream) => {
                    let (articles, stream_error) = drain(stream, self.extraction.article_limit);
                    match stream_error {
                        // Cut short after at least one article; keep what we have
                        Some(e) if !articles.is_empty() => {
                            debug!(url = url, count = articles.len(), error = %e, "Stream ended early");
                            return Extracted {
                                articles,
                                attempts: attempt,
                                error: Some(e),
                            };
                        }
                        Some(e) => e,
                        None if articles.is_empty() => ExtractionError::EmptyResult,
                        None => {
                            return Extracted {
                                articles,
                                attempts: attempt,
                                error: None,
                            }
                        }
                    }
                }
                Err(e) => e,
            };

            if !error.is_retryable() || attempt >= self.retry.max_attempts() {
                warn!(url = url, attempt = attempt, error = %error, "Extraction failed");
                return Extracted {
                    articles: Vec::new(),
                    attempts: attempt,
                    error: Some(error),
                };
            }

            let delay = self.retry.delay_for(attempt);
            warn!(
                url = url,
                attempt = attempt,
                max_attempts = self.retry.max_attempts(),
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Extraction attempt failed, retrying"
            );

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => {
                    return Extracted::cancelled(attempt, Some(error));
                }
            }
        }
    }

    fn finish(
        &self,
        url: &str,
        state: &mut ScrapeState,
        descriptor: Option<SourceDescriptor>,
        extracted: Extracted,
    ) -> UrlResult {
        let limit = self.extraction.article_limit;

        let articles: Vec<CleanArticle> = if extracted.articles.is_empty() {
            Vec::new()
        } else {
            transition(url, state, ScrapeState::Normalizing);
            extracted
                .articles
                .into_iter()
                .take(limit)
                .map(|raw| self.normalizer.normalize(raw))
                .collect()
        };

        let count = articles.len();
        let status = if count == 0 {
            UrlStatus::Failed
        } else if count < limit {
            UrlStatus::PartialSuccess
        } else {
            UrlStatus::Success
        };
        transition(url, state, ScrapeState::Done(status));

        let source_kind = descriptor.as_ref().map(|d| d.detected_kind);
        let outcome = UrlOutcome {
            url: url.to_string(),
            status,
            article_count: count,
            error_kind: extracted.error.as_ref().map(ExtractionError::kind),
            error_detail: extracted.error.as_ref().map(ToString::to_string),
            source_kind,
            attempts: extracted.attempts,
        };

        info!(
            url = url,
            status = %status,
            article_count = count,
            attempts = outcome.attempts,
            "URL done"
        );

        UrlResult {
            outcome,
            articles,
            descriptor,
        }
    }
}

impl Extracted {
    fn cancelled(attempts: u32, last: Option<ExtractionError>) -> Self {
        if let Some(e) = last {
            debug!(error = %e, "Retry abandoned on cancellation");
        }
        Self {
            articles: Vec::new(),
            attempts,
            error: Some(ExtractionError::Cancelled),
        }
    }
}

/// Pull at most `limit` articles, stopping at the first error
fn drain(
    stream: crate::strategy::ArticleStream,
    limit: usize,
) -> (Vec<RawArticle>, Option<ExtractionError>) {
    let mut articles = Vec::new();
    for item in stream.take(limit) {
        match item {
            Ok(article) => articles.push(article),
            Err(e) => return (articles, Some(e)),
        }
    }
    (articles, None)
}

fn transition(url: &str, state: &mut ScrapeState, next: ScrapeState) {
    debug!(url = url, from = %state, to = %next, "State transition");
    *state = next;
}
