//! Cloud-sheet sync over a webhook
//!
//! Posts the run's rows to a spreadsheet bridge endpoint:
//!
//! ```json
//! {
//!   "headers": ["Title", "Date", "Source", "Link", "Summary"],
//!   "rows": [
//!     { "title": "...", "date": "2024-05-01", "source": "example.com", "link": "...", "summary": "..." }
//!   ]
//! }
//! ```
//!
//! Transient failures (network, 429, 5xx) are retried with backoff; client
//! errors are returned at once.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::{to_rows, ArticleSink, SinkReceipt};
use crate::config::OutputConfig;
use crate::error::{Error, Result};
use crate::models::{CleanArticle, TabularRow};
use crate::utils::error::is_retryable_status;
use crate::utils::retry::{with_retry_if, RetryPolicy};

/// Webhook sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookSinkConfig {
    pub url: String,
    /// Sent as a Bearer token
    pub auth_token: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_timeout() -> u64 {
    15
}

impl WebhookSinkConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth_token: None,
            timeout_secs: default_timeout(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sink settings from the output section, when a URL is configured
    pub fn from_output(output: &OutputConfig) -> Option<Self> {
        let url = output.webhook_url.as_deref()?.trim();
        if url.is_empty() {
            return None;
        }
        let mut config = Self::new(url);
        config.auth_token = output.webhook_token.clone();
        Some(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(Error::config("Webhook URL must start with http:// or https://"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::config("Webhook timeout must be greater than 0"));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct Payload<'a> {
    headers: [&'static str; 5],
    rows: &'a [TabularRow],
}

/// Failure of one delivery attempt
#[derive(Debug, thiserror::Error)]
enum DeliveryError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl DeliveryError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Status { status, .. } => is_retryable_status(*status),
            Self::Transport(_) => true,
        }
    }
}

pub struct WebhookSink {
    config: WebhookSinkConfig,
    client: Client,
}

impl WebhookSink {
    pub fn new(config: WebhookSinkConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    async fn deliver(&self, payload: &Payload<'_>) -> std::result::Result<(), DeliveryError> {
        let mut request = self.client.post(&self.config.url);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.json(payload).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());
        Err(DeliveryError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ArticleSink for WebhookSink {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn write(&self, articles: &[CleanArticle]) -> Result<SinkReceipt> {
        let rows = to_rows(articles);
        let payload = Payload {
            headers: TabularRow::HEADERS,
            rows: &rows,
        };

        with_retry_if(
            &self.config.retry,
            || self.deliver(&payload),
            DeliveryError::is_transient,
        )
        .await
        .map_err(|e| {
            error!(url = %self.config.url, error = %e, "Webhook sync failed");
            Error::storage(format!("webhook sync to {} failed: {e}", self.config.url))
        })?;

        info!(url = %self.config.url, rows = rows.len(), "Rows synced");
        Ok(SinkReceipt {
            sink: self.name(),
            location: self.config.url.clone(),
            rows: rows.len(),
        })
    }
}
