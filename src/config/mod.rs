//! Configuration management for newsgrab
//!
//! This module handles loading and validating configuration from TOML files,
//! environment variables, and command-line arguments. Later sources override
//! earlier ones: defaults, then file, then `NEWSGRAB_*` variables, then CLI.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::{ExtractionConfig, UserAgentPolicy};
use crate::utils::retry::RetryPolicy;

/// Upper bound for both the article limit and the URL count of a run
pub const MAX_BATCH: usize = 1000;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine limits shared by every source in a run
    pub engine: EngineConfig,

    /// Backoff between extraction attempts
    pub retry: RetryPolicy,

    /// HTTP client configuration
    pub http: HttpConfig,

    /// Source classification heuristics
    pub classifier: ClassifierConfig,

    /// Headless rendering configuration
    pub render: RenderConfig,

    /// Default sources used when none are given
    pub sources: SourcesConfig,

    /// Storage collaborators
    pub output: OutputConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Engine-level limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum articles kept per source
    pub article_limit: usize,

    /// Retries after the first extraction attempt
    pub max_retries: u32,

    /// Minimum gap between two requests to the same host
    pub per_host_min_interval_ms: u64,

    /// Bound for every fetch, render and readiness wait
    pub request_timeout_ms: u64,

    /// Number of sources processed in parallel
    pub concurrency: usize,

    /// Maximum summary length in characters
    pub summary_max_len: usize,

    /// Drop non-ASCII characters from normalised text
    pub ascii_only: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            article_limit: 8,
            max_retries: 3,
            per_host_min_interval_ms: 2000,
            request_timeout_ms: 30_000,
            concurrency: 4,
            summary_max_len: 500,
            ascii_only: false,
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User agent selection
    pub user_agent: UserAgentPolicy,

    /// Optional process-wide request ceiling (requests per second)
    pub max_requests_per_second: Option<u32>,

    /// Enable cookie persistence
    pub enable_cookies: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: UserAgentPolicy::Rotate,
            max_requests_per_second: None,
            enable_cookies: true,
        }
    }
}

/// Source classifier heuristics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Timeout for the HEAD/GET probe
    pub probe_timeout_ms: u64,

    /// Bytes of the body inspected by the GET probe
    pub probe_bytes: usize,

    /// Hosts always treated as dynamic
    pub dynamic_hosts: Vec<String>,

    /// Hosts never rendered, even if markers suggest it
    pub static_hosts: Vec<String>,

    /// Markup fragments that indicate client-side rendering
    pub dynamic_markers: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: 5000,
            probe_bytes: 5120,
            dynamic_hosts: Vec::new(),
            static_hosts: Vec::new(),
            dynamic_markers: vec![
                "__NEXT_DATA__".to_string(),
                "vue-server-renderer".to_string(),
                "ng-version".to_string(),
                "data-reactroot".to_string(),
                "window.__INITIAL_STATE__".to_string(),
            ],
        }
    }
}

/// Condition the dynamic strategy waits for before reading the DOM
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", content = "selector", rename_all = "snake_case")]
pub enum Readiness {
    /// Navigation finished and the network settled
    #[default]
    NetworkIdle,
    /// A CSS selector is present in the DOM
    Selector(String),
}

/// Headless rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub readiness: Readiness,

    /// Extra wait after readiness for late requests
    pub settle_ms: u64,

    /// Chrome/Chromium executable; autodetected when unset
    pub chrome_executable: Option<PathBuf>,

    pub headless: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            readiness: Readiness::NetworkIdle,
            settle_ms: 500,
            chrome_executable: None,
            headless: true,
        }
    }
}

/// Default sources
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub urls: Vec<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            urls: vec![
                "https://techcrunch.com/category/artificial-intelligence/feed/".to_string(),
                "https://www.technologyreview.com/feed/".to_string(),
                "https://analyticsindiamag.com/feed/".to_string(),
            ],
        }
    }
}

/// Storage collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for tabular output files
    pub data_dir: PathBuf,

    /// Cloud-sheet bridge endpoint used when sync is requested
    pub webhook_url: Option<String>,

    /// Bearer token for the bridge
    pub webhook_token: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            webhook_url: None,
            webhook_token: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables on top of defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Defaults, then the optional file, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Override fields from `NEWSGRAB_*` environment variables
    pub fn apply_env(&mut self) {
        if let Some(v) = env_parse("NEWSGRAB_ARTICLE_LIMIT") {
            self.engine.article_limit = v;
        }
        if let Some(v) = env_parse("NEWSGRAB_MAX_RETRIES") {
            self.engine.max_retries = v;
        }
        if let Some(v) = env_parse("NEWSGRAB_PER_HOST_INTERVAL_MS") {
            self.engine.per_host_min_interval_ms = v;
        }
        if let Some(v) = env_parse("NEWSGRAB_REQUEST_TIMEOUT_MS") {
            self.engine.request_timeout_ms = v;
        }
        if let Some(v) = env_parse("NEWSGRAB_CONCURRENCY") {
            self.engine.concurrency = v;
        }
        if let Ok(ua) = std::env::var("NEWSGRAB_USER_AGENT") {
            if !ua.trim().is_empty() {
                self.http.user_agent = UserAgentPolicy::Fixed(ua);
            }
        }
        if let Some(v) = env_parse("NEWSGRAB_MAX_RPS") {
            self.http.max_requests_per_second = Some(v);
        }
        if let Ok(dir) = std::env::var("NEWSGRAB_DATA_DIR") {
            self.output.data_dir = PathBuf::from(dir);
        }
        if let Ok(url) = std::env::var("NEWSGRAB_WEBHOOK_URL") {
            self.output.webhook_url = Some(url);
        }
        if let Ok(token) = std::env::var("NEWSGRAB_WEBHOOK_TOKEN") {
            self.output.webhook_token = Some(token);
        }
        if let Ok(level) = std::env::var("NEWSGRAB_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("NEWSGRAB_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.engine.article_limit == 0 || self.engine.article_limit > MAX_BATCH {
            anyhow::bail!("article_limit must be between 1 and {MAX_BATCH}");
        }

        if self.engine.request_timeout_ms == 0 {
            anyhow::bail!("request_timeout_ms must be greater than 0");
        }

        if self.engine.concurrency == 0 {
            anyhow::bail!("concurrency must be greater than 0");
        }

        if self.engine.summary_max_len == 0 {
            anyhow::bail!("summary_max_len must be greater than 0");
        }

        if self.retry.backoff_multiplier < 1.0 {
            anyhow::bail!("backoff_multiplier must be at least 1.0");
        }

        if self.http.max_requests_per_second == Some(0) {
            anyhow::bail!("max_requests_per_second must be positive when set");
        }

        if self.classifier.probe_bytes == 0 {
            anyhow::bail!("probe_bytes must be greater than 0");
        }

        if let UserAgentPolicy::Fixed(ua) = &self.http.user_agent {
            if ua.trim().is_empty() {
                anyhow::bail!("fixed user agent must not be empty");
            }
        }

        if let Readiness::Selector(sel) = &self.render.readiness {
            if scraper::Selector::parse(sel).is_err() {
                anyhow::bail!("readiness selector is not valid CSS: {sel}");
            }
        }

        Ok(())
    }

    /// Immutable per-run settings handed to strategies
    pub fn extraction_config(&self) -> ExtractionConfig {
        ExtractionConfig {
            article_limit: self.engine.article_limit,
            per_host_min_interval_ms: self.engine.per_host_min_interval_ms,
            max_retries: self.engine.max_retries,
            request_timeout_ms: self.engine.request_timeout_ms,
            user_agent_policy: self.http.user_agent.clone(),
        }
    }

    /// Retry policy with the engine's retry budget applied
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.engine.max_retries,
            ..self.retry.clone()
        }
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.engine.request_timeout_ms)
    }

    /// Get probe timeout as Duration
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.classifier.probe_timeout_ms)
    }
}
