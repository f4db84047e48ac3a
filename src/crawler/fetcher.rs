//! HTTP fetcher with charset detection and an optional global request ceiling
//!
//! This module provides the single HTTP client shared by the classifier probe
//! and the feed/static strategies, with features including:
//! - User-Agent rotation or a pinned agent
//! - Optional process-wide requests-per-second ceiling with governor
//! - Charset detection from `Content-Type`, XML declaration or `<meta charset>`
//! - Status mapping onto [`ExtractionError`]
//!
//! Per-host pacing is not done here; callers hold a
//! [`HostPermit`](super::rate_limit::HostPermit) around each request.
//! The fetcher never retries.

use crate::config::Config;
use crate::crawler::headers::{build_browser_headers, select_user_agent};
use crate::models::UserAgentPolicy;
use crate::utils::error::ExtractionError;
use encoding_rs::{Encoding, UTF_8};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use regex::Regex;
use reqwest::{header::CONTENT_TYPE, Client, Response};
use std::num::NonZeroU32;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, trace};

static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?\s*([A-Za-z0-9_\-:.]+)"#)
        .expect("valid meta charset regex")
});

static XML_ENCODING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<\?xml[^>]+encoding\s*=\s*["']([A-Za-z0-9_\-:.]+)["']"#)
        .expect("valid xml encoding regex")
});

/// Body of a successful GET
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// Result of a HEAD or truncated GET probe
#[derive(Debug, Clone, Default)]
pub struct ProbeResponse {
    pub status: u16,
    pub content_type: Option<String>,
    /// Decoded body prefix; empty for HEAD probes
    pub prefix: String,
}

impl ProbeResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Shared HTTP client for probes and static fetches
pub struct HttpFetcher {
    /// HTTP client with compression and optional cookie store
    client: Client,

    /// Process-wide ceiling, independent of per-host pacing
    global_limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,

    user_agent: UserAgentPolicy,
}

impl HttpFetcher {
    /// Create a fetcher from configuration
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Http`] if the HTTP client cannot be created
    pub fn new(config: &Config) -> crate::error::Result<Self> {
        let client = Client::builder()
            .gzip(true)
            .cookie_store(config.http.enable_cookies)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        let global_limiter = config
            .http
            .max_requests_per_second
            .and_then(NonZeroU32::new)
            .map(|rate| RateLimiter::direct(Quota::per_second(rate)));

        Ok(Self {
            client,
            global_limiter,
            user_agent: config.http.user_agent.clone(),
        })
    }

    /// Fetcher with defaults, for tests and one-off tools
    pub fn with_defaults() -> crate::error::Result<Self> {
        Self::new(&Config::default())
    }

    pub fn user_agent_policy(&self) -> &UserAgentPolicy {
        &self.user_agent
    }

    async fn wait_global(&self) {
        if let Some(limiter) = &self.global_limiter {
            limiter.until_ready().await;
        }
    }

    fn request(&self, method: reqwest::Method, url: &str, prefer_feed: bool, timeout: Duration) -> reqwest::RequestBuilder {
        let ua = select_user_agent(&self.user_agent);
        self.client
            .request(method, url)
            .headers(build_browser_headers(&ua, prefer_feed))
            .timeout(timeout)
    }

    /// GET a whole document and decode it to text
    ///
    /// # Errors
    ///
    /// - [`ExtractionError::Http`] for non-2xx statuses
    /// - [`ExtractionError::Timeout`] when `timeout` elapses
    /// - [`ExtractionError::ClassificationFailed`] for connect/DNS failures
    pub async fn fetch(
        &self,
        url: &str,
        prefer_feed: bool,
        timeout: Duration,
    ) -> Result<FetchedPage, ExtractionError> {
        self.wait_global().await;
        debug!(url = url, "GET");

        let response = self
            .request(reqwest::Method::GET, url, prefer_feed, timeout)
            .send()
            .await
            .map_err(|e| ExtractionError::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::http(status.as_u16()));
        }

        let final_url = response.url().to_string();
        let content_type = content_type_of(&response);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ExtractionError::from_reqwest(&e))?;

        Ok(FetchedPage {
            url: final_url,
            status: status.as_u16(),
            body: decode_bytes(&bytes, content_type.as_deref().unwrap_or("")),
            content_type,
        })
    }

    /// HEAD probe; non-2xx statuses are returned, not raised
    pub async fn head(&self, url: &str, timeout: Duration) -> Result<ProbeResponse, ExtractionError> {
        self.wait_global().await;
        trace!(url = url, "HEAD");

        let response = self
            .request(reqwest::Method::HEAD, url, false, timeout)
            .send()
            .await
            .map_err(|e| ExtractionError::from_reqwest(&e))?;

        Ok(ProbeResponse {
            status: response.status().as_u16(),
            content_type: content_type_of(&response),
            prefix: String::new(),
        })
    }

    /// GET at most `max_bytes` of the body
    ///
    /// The body is streamed chunk by chunk and the connection dropped once
    /// enough bytes have arrived. Non-2xx statuses are returned, not raised.
    pub async fn probe_prefix(
        &self,
        url: &str,
        max_bytes: usize,
        timeout: Duration,
    ) -> Result<ProbeResponse, ExtractionError> {
        self.wait_global().await;
        trace!(url = url, max_bytes = max_bytes, "GET probe");

        let mut response = self
            .request(reqwest::Method::GET, url, false, timeout)
            .send()
            .await
            .map_err(|e| ExtractionError::from_reqwest(&e))?;

        let status = response.status().as_u16();
        let content_type = content_type_of(&response);
        if !(200..300).contains(&status) {
            return Ok(ProbeResponse {
                status,
                content_type,
                prefix: String::new(),
            });
        }

        let mut buf: Vec<u8> = Vec::with_capacity(max_bytes.min(64 * 1024));
        while buf.len() < max_bytes {
            match response.chunk().await {
                Ok(Some(chunk)) => buf.extend_from_slice(&chunk),
                Ok(None) => break,
                Err(e) => return Err(ExtractionError::from_reqwest(&e)),
            }
        }
        buf.truncate(max_bytes);

        Ok(ProbeResponse {
            status,
            prefix: decode_bytes(&buf, content_type.as_deref().unwrap_or("")),
            content_type,
        })
    }
}

fn content_type_of(response: &Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Charset label from a `Content-Type` header value
fn header_charset(content_type: &str) -> Option<&str> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|part| part.trim().split_once('='))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("charset"))
        .map(|(_, v)| v.trim().trim_matches('"'))
}

/// Decode response bytes to text
///
/// Tries, in order: BOM, the `Content-Type` charset, an XML declaration or
/// `<meta charset>` in the first 1024 bytes, then UTF-8. Undecodable sequences
/// become U+FFFD rather than failing the fetch.
pub fn decode_bytes(bytes: &[u8], content_type: &str) -> String {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return text.into_owned();
    }

    let declared = header_charset(content_type)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(|| {
            let head = String::from_utf8_lossy(&bytes[..bytes.len().min(1024)]);
            XML_ENCODING
                .captures(&head)
                .or_else(|| META_CHARSET.captures(&head))
                .and_then(|c| c.get(1))
                .and_then(|m| Encoding::for_label(m.as_str().as_bytes()))
        });

    let encoding = declared.unwrap_or(UTF_8);
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        debug!(encoding = encoding.name(), "Lossy decode");
    }
    text.into_owned()
}
