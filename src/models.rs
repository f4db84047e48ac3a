// Core data structures for the scraping engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use crate::utils::error::ErrorKind;

/// Classification of a source URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// RSS, Atom or RDF feed document
    Feed,
    /// Server-rendered HTML page
    StaticHtml,
    /// Page whose primary content needs a rendering engine
    Dynamic,
}

impl SourceKind {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feed => "feed",
            Self::StaticHtml => "static_html",
            Self::Dynamic => "dynamic",
        }
    }

    /// Relative cost of extracting this kind, used for tie-breaks
    pub fn cost(&self) -> u8 {
        match self {
            Self::Feed => 0,
            Self::StaticHtml => 1,
            Self::Dynamic => 2,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of classifying one URL; immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// URL as submitted
    pub url: String,
    /// URL the strategy should fetch (differs for platform feed rewrites)
    pub fetch_url: String,
    pub detected_kind: SourceKind,
    /// Confidence in `[0.0, 1.0]`
    pub detection_confidence: f32,
}

impl SourceDescriptor {
    pub fn new(url: impl Into<String>, kind: SourceKind, confidence: f32) -> Self {
        let url = url.into();
        Self {
            fetch_url: url.clone(),
            url,
            detected_kind: kind,
            detection_confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Point the strategy at a different URL than the one submitted
    pub fn with_fetch_url(mut self, fetch_url: impl Into<String>) -> Self {
        self.fetch_url = fetch_url.into();
        self
    }
}

/// User-agent selection for outgoing requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum UserAgentPolicy {
    /// Pick a browser user agent from the built-in pool per request
    #[default]
    Rotate,
    /// Always send this user agent
    Fixed(String),
}

/// Per-run extraction settings; read-only for the duration of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub article_limit: usize,
    pub per_host_min_interval_ms: u64,
    pub max_retries: u32,
    pub request_timeout_ms: u64,
    pub user_agent_policy: UserAgentPolicy,
}

impl ExtractionConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn per_host_min_interval(&self) -> Duration {
        Duration::from_millis(self.per_host_min_interval_ms)
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            article_limit: 8,
            per_host_min_interval_ms: 2000,
            max_retries: 3,
            request_timeout_ms: 30_000,
            user_agent_policy: UserAgentPolicy::Rotate,
        }
    }
}

/// Article as produced by a strategy, before normalisation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RawArticle {
    pub source_url: String,
    pub title: String,
    pub link: String,
    pub published_at: Option<DateTime<Utc>>,
    pub raw_summary_html: Option<String>,
    pub raw_body_html: Option<String>,
}

/// Normalised article handed to storage collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanArticle {
    pub source_url: String,
    pub title: String,
    pub link: String,
    pub published_at: Option<DateTime<Utc>>,
    pub summary: String,
    pub body: Option<String>,
    pub extracted_at: DateTime<Utc>,
}

impl CleanArticle {
    /// View this article as strategy output again
    pub fn to_raw(&self) -> RawArticle {
        RawArticle {
            source_url: self.source_url.clone(),
            title: self.title.clone(),
            link: self.link.clone(),
            published_at: self.published_at,
            raw_summary_html: Some(self.summary.clone()),
            raw_body_html: self.body.clone(),
        }
    }

    /// Row shape used by tabular writers: Title, Date, Source, Link, Summary
    pub fn to_row(&self) -> TabularRow {
        let date = self.published_at.unwrap_or(self.extracted_at);
        TabularRow {
            title: self.title.clone(),
            date: date.format("%Y-%m-%d").to_string(),
            source: crate::utils::source_name(&self.source_url),
            link: self.link.clone(),
            summary: self.summary.clone(),
        }
    }
}

/// One spreadsheet-style row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabularRow {
    pub title: String,
    pub date: String,
    pub source: String,
    pub link: String,
    pub summary: String,
}

impl TabularRow {
    /// Column headers in row order
    pub const HEADERS: [&'static str; 5] = ["Title", "Date", "Source", "Link", "Summary"];
}

/// Terminal status of one URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlStatus {
    Success,
    PartialSuccess,
    Failed,
}

impl UrlStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::PartialSuccess => "partial_success",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for UrlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-URL result line of a run report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlOutcome {
    pub url: String,
    pub status: UrlStatus,
    pub article_count: usize,
    pub error_kind: Option<ErrorKind>,
    pub error_detail: Option<String>,
    pub source_kind: Option<SourceKind>,
    /// Extraction attempts made (0 when classification failed)
    pub attempts: u32,
}

impl UrlOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, UrlStatus::Success | UrlStatus::PartialSuccess)
    }
}

/// Aggregated per-URL summary of one invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// In input URL order
    pub outcomes: Vec<UrlOutcome>,
    pub cancelled: bool,
}

impl RunReport {
    /// Count outcomes by status and total articles
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for outcome in &self.outcomes {
            match outcome.status {
                UrlStatus::Success => summary.succeeded += 1,
                UrlStatus::PartialSuccess => summary.partial += 1,
                UrlStatus::Failed => summary.failed += 1,
            }
            summary.articles += outcome.article_count;
        }
        summary.duration_ms = (self.finished_at - self.started_at).num_milliseconds().max(0) as u64;
        summary
    }

    /// Emit one log line per outcome for operators
    pub fn log_outcomes(&self) {
        for outcome in &self.outcomes {
            let error_kind = outcome
                .error_kind
                .map(|k| k.to_string())
                .unwrap_or_else(|| "-".to_string());
            match outcome.status {
                UrlStatus::Failed => tracing::warn!(
                    url = %outcome.url,
                    status = %outcome.status,
                    article_count = outcome.article_count,
                    error_kind = %error_kind,
                    "Source outcome"
                ),
                _ => tracing::info!(
                    url = %outcome.url,
                    status = %outcome.status,
                    article_count = outcome.article_count,
                    error_kind = %error_kind,
                    "Source outcome"
                ),
            }
        }
    }
}

/// Run statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub succeeded: usize,
    pub partial: usize,
    pub failed: usize,
    pub articles: usize,
    pub duration_ms: u64,
}

impl RunSummary {
    /// Failed sources as a percentage of all sources
    pub fn failure_rate(&self) -> f64 {
        let total = self.succeeded + self.partial + self.failed;
        if total == 0 {
            0.0
        } else {
            (self.failed as f64 / total as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn outcome(status: UrlStatus, count: usize) -> UrlOutcome {
        UrlOutcome {
            url: "https://example.com".to_string(),
            status,
            article_count: count,
            error_kind: None,
            error_detail: None,
            source_kind: Some(SourceKind::Feed),
            attempts: 1,
        }
    }

    #[test]
    fn test_descriptor_confidence_clamped() {
        let d = SourceDescriptor::new("https://example.com", SourceKind::Feed, 1.7);
        assert_eq!(d.detection_confidence, 1.0);
        assert_eq!(d.fetch_url, d.url);
    }

    #[test]
    fn test_descriptor_fetch_url() {
        let d = SourceDescriptor::new("https://www.reddit.com/r/rust", SourceKind::Feed, 1.0)
            .with_fetch_url("https://www.reddit.com/r/rust.rss");
        assert_eq!(d.url, "https://www.reddit.com/r/rust");
        assert_eq!(d.fetch_url, "https://www.reddit.com/r/rust.rss");
    }

    #[test]
    fn test_kind_cost_ordering() {
        assert!(SourceKind::Feed.cost() < SourceKind::StaticHtml.cost());
        assert!(SourceKind::StaticHtml.cost() < SourceKind::Dynamic.cost());
    }

    #[test]
    fn test_to_raw_round_trip_fields() {
        let clean = CleanArticle {
            source_url: "https://example.com/feed".to_string(),
            title: "Title".to_string(),
            link: "https://example.com/a".to_string(),
            published_at: None,
            summary: "Summary".to_string(),
            body: Some("Body".to_string()),
            extracted_at: Utc::now(),
        };
        let raw = clean.to_raw();
        assert_eq!(raw.raw_summary_html.as_deref(), Some("Summary"));
        assert_eq!(raw.raw_body_html.as_deref(), Some("Body"));
        assert_eq!(raw.title, "Title");
    }

    #[test]
    fn test_to_row_uses_published_date_and_domain() {
        let clean = CleanArticle {
            source_url: "https://www.technologyreview.com/feed/".to_string(),
            title: "T".to_string(),
            link: "https://www.technologyreview.com/x".to_string(),
            published_at: Some(Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap()),
            summary: "S".to_string(),
            body: None,
            extracted_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        };
        let row = clean.to_row();
        assert_eq!(row.date, "2024-03-09");
        assert_eq!(row.source, "technologyreview.com");
    }

    #[test]
    fn test_to_row_falls_back_to_extraction_date() {
        let clean = CleanArticle {
            source_url: "https://example.com".to_string(),
            title: "T".to_string(),
            link: "https://example.com".to_string(),
            published_at: None,
            summary: String::new(),
            body: None,
            extracted_at: Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap(),
        };
        assert_eq!(clean.to_row().date, "2025-01-02");
    }

    #[test]
    fn test_report_summary() {
        let now = Utc::now();
        let report = RunReport {
            run_id: Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            outcomes: vec![
                outcome(UrlStatus::Success, 5),
                outcome(UrlStatus::PartialSuccess, 2),
                outcome(UrlStatus::Failed, 0),
                outcome(UrlStatus::Failed, 0),
            ],
            cancelled: false,
        };
        let summary = report.summary();
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.partial, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.articles, 7);
        assert_eq!(summary.failure_rate(), 50.0);
    }

    #[test]
    fn test_user_agent_policy_serde() {
        let fixed = UserAgentPolicy::Fixed("bot/1.0".to_string());
        let json = serde_json::to_string(&fixed).unwrap();
        assert_eq!(json, r#"{"mode":"fixed","value":"bot/1.0"}"#);
        let rotate: UserAgentPolicy = serde_json::from_str(r#"{"mode":"rotate"}"#).unwrap();
        assert_eq!(rotate, UserAgentPolicy::Rotate);
    }
}
