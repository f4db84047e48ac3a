//! Source classifier
//!
//! Decides, once per URL, which extraction strategy applies. Cheap checks
//! run first and short-circuit:
//!
//! 1. Platform rewrites (subreddit and user pages to their `.rss` feed)
//! 2. Configured dynamic/static host lists
//! 3. Feed-looking URL paths (`/feed`, `/rss`, `.xml`, ...)
//! 4. `HEAD` probe `Content-Type`
//! 5. A bounded `GET` of the first bytes: feed root elements, then
//!    client-side rendering markers
//!
//! Anything still undecided is static HTML. When signals disagree the
//! cheaper kind wins.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, info};
use url::Url;

use crate::config::ClassifierConfig;
use crate::crawler::fetcher::{HttpFetcher, ProbeResponse};
use crate::crawler::rate_limit::HostRateLimiter;
use crate::models::{SourceDescriptor, SourceKind};
use crate::parser::sanitize::{remove_noise_blocks, strip_html_tags};
use crate::utils::error::{is_retryable_status, ExtractionError};
use crate::utils::extract_host;

static FEED_PATH_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"/feed/?$", r"/rss/?$", r"/atom/?$", r"\.xml$", r"\.rss$"]
        .iter()
        .map(|p| Regex::new(&format!("(?i){p}")).unwrap())
        .collect()
});

static FEED_ROOT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(rss|feed|rdf:RDF)[\s>]").unwrap());

/// Framework mount points left empty in the server response
static EMPTY_MOUNT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<div[^>]*\bid=["'](root|app|__next|__nuxt)["'][^>]*>\s*</div>"#).unwrap()
});

/// Visible text below this in a fully-received page counts as near-empty
const NEAR_EMPTY_TEXT: usize = 200;

/// Classifies URLs into [`SourceKind`]s
pub struct SourceClassifier {
    fetcher: Arc<HttpFetcher>,
    limiter: Arc<HostRateLimiter>,
    config: ClassifierConfig,
}

impl SourceClassifier {
    pub fn new(
        fetcher: Arc<HttpFetcher>,
        limiter: Arc<HostRateLimiter>,
        config: ClassifierConfig,
    ) -> Self {
        Self {
            fetcher,
            limiter,
            config,
        }
    }

    /// Classify a URL, probing it over the network only when needed
    ///
    /// # Errors
    ///
    /// - [`ExtractionError::ClassificationFailed`] for invalid URLs, network
    ///   and DNS failures, and probe timeouts
    /// - [`ExtractionError::Http`] when the probe answers with a client error
    pub async fn classify(&self, url: &str) -> Result<SourceDescriptor, ExtractionError> {
        let parsed = Url::parse(url)
            .map_err(|e| ExtractionError::ClassificationFailed(format!("{url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(ExtractionError::ClassificationFailed(format!(
                "{url}: unsupported URL"
            )));
        }

        if let Some(descriptor) = self.classify_offline(url) {
            info!(url = url, kind = %descriptor.detected_kind, fetch_url = %descriptor.fetch_url, "Classified without probe");
            return Ok(descriptor);
        }

        let descriptor = self.classify_by_probe(url).await?;
        info!(
            url = url,
            kind = %descriptor.detected_kind,
            confidence = descriptor.detection_confidence,
            "Classified"
        );
        Ok(descriptor)
    }

    /// URL-only heuristics; `None` when a probe is required
    pub fn classify_offline(&self, url: &str) -> Option<SourceDescriptor> {
        if let Some(descriptor) = platform_rewrite(url) {
            return Some(descriptor);
        }

        let host = extract_host(url).ok()?;
        if host_listed(&host, &self.config.dynamic_hosts) {
            return Some(SourceDescriptor::new(url, SourceKind::Dynamic, 0.95));
        }

        if looks_like_feed_url(url) {
            return Some(SourceDescriptor::new(url, SourceKind::Feed, 0.9));
        }

        None
    }

    async fn classify_by_probe(&self, url: &str) -> Result<SourceDescriptor, ExtractionError> {
        let timeout = std::time::Duration::from_millis(self.config.probe_timeout_ms);

        let head = {
            let _permit = self.limiter.acquire_for_url(url).await?;
            self.fetcher.head(url, timeout).await
        };
        match head {
            Ok(probe) if probe.is_success() && is_feed_content_type(&probe) => {
                return Ok(SourceDescriptor::new(url, SourceKind::Feed, 0.9));
            }
            Ok(probe) => log_inconclusive("HEAD", url, &probe),
            // Some servers refuse HEAD outright; the GET probe decides
            Err(e) => debug!(url = url, error = %e, "HEAD probe failed"),
        }

        let probe = {
            let _permit = self.limiter.acquire_for_url(url).await?;
            self.fetcher
                .probe_prefix(url, self.config.probe_bytes, timeout)
                .await
                .map_err(|e| match e {
                    ExtractionError::Timeout => {
                        ExtractionError::ClassificationFailed(format!("{url}: probe timed out"))
                    }
                    ExtractionError::Network(detail) => {
                        ExtractionError::ClassificationFailed(format!("{url}: {detail}"))
                    }
                    other => other,
                })?
        };

        if !probe.is_success() {
            if is_retryable_status(probe.status) {
                // Transient server trouble; let the retrying strategy see it
                debug!(url = url, status = probe.status, "Probe inconclusive");
                return Ok(SourceDescriptor::new(url, SourceKind::StaticHtml, 0.3));
            }
            return Err(ExtractionError::http(probe.status));
        }

        Ok(self.classify_prefix(url, &probe))
    }

    /// Classify from a probed content type and body prefix
    pub fn classify_prefix(&self, url: &str, probe: &ProbeResponse) -> SourceDescriptor {
        if is_feed_content_type(probe) || FEED_ROOT_REGEX.is_match(&probe.prefix) {
            return SourceDescriptor::new(url, SourceKind::Feed, 0.9);
        }

        let static_listed = extract_host(url)
            .map(|h| host_listed(&h, &self.config.static_hosts))
            .unwrap_or(false);
        if static_listed {
            return SourceDescriptor::new(url, SourceKind::StaticHtml, 0.95);
        }

        if self
            .config
            .dynamic_markers
            .iter()
            .any(|m| probe.prefix.contains(m.as_str()))
            || EMPTY_MOUNT_REGEX.is_match(&probe.prefix)
        {
            return SourceDescriptor::new(url, SourceKind::Dynamic, 0.7);
        }

        // Only a body received in full can be judged near-empty
        let complete = probe.prefix.len() < self.config.probe_bytes;
        if complete && probe.prefix.contains("<script") && visible_text_len(&probe.prefix) < NEAR_EMPTY_TEXT {
            return SourceDescriptor::new(url, SourceKind::Dynamic, 0.6);
        }

        SourceDescriptor::new(url, SourceKind::StaticHtml, 0.6)
    }
}

fn log_inconclusive(method: &str, url: &str, probe: &ProbeResponse) {
    debug!(
        method = method,
        url = url,
        status = probe.status,
        content_type = ?probe.content_type,
        "Probe inconclusive"
    );
}

/// Rewrite platform pages that publish a feed
///
/// Subreddit and user pages become their `.rss` feed; comment threads need
/// rendering. Stack Overflow question listings map to the site feed.
pub fn platform_rewrite(url: &str) -> Option<SourceDescriptor> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    let path = parsed.path();

    if host == "reddit.com" || host.ends_with(".reddit.com") {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let section = segments.next()?;
        if !matches!(section, "r" | "user") || segments.next().is_none() {
            return None;
        }
        if path.contains("/comments/") {
            return Some(SourceDescriptor::new(url, SourceKind::Dynamic, 0.9));
        }
        if path.ends_with(".rss") {
            return Some(SourceDescriptor::new(url, SourceKind::Feed, 1.0));
        }

        let mut feed = parsed.clone();
        feed.set_path(&format!("{}.rss", path.trim_end_matches('/')));
        feed.set_query(None);
        return Some(SourceDescriptor::new(url, SourceKind::Feed, 1.0).with_fetch_url(feed.as_str()));
    }

    if (host == "stackoverflow.com" || host.ends_with(".stackoverflow.com"))
        && path.starts_with("/questions")
    {
        return Some(
            SourceDescriptor::new(url, SourceKind::Feed, 0.9)
                .with_fetch_url("https://stackoverflow.com/feeds"),
        );
    }

    None
}

/// Feed-like path, ignoring query and fragment
pub fn looks_like_feed_url(url: &str) -> bool {
    let path = Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    FEED_PATH_REGEXES.iter().any(|re| re.is_match(&path))
}

/// Feed media types by name
///
/// Generic `text/xml` and `application/xml` also carry sitemaps and SOAP
/// responses, so those only count once the body root is a feed element.
fn is_feed_content_type(probe: &ProbeResponse) -> bool {
    probe.content_type.as_deref().is_some_and(|ct| {
        let essence = ct.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        ["rss", "atom", "rdf"].iter().any(|name| essence.contains(name))
    })
}

fn host_listed(host: &str, list: &[String]) -> bool {
    list.iter().any(|entry| {
        let entry = entry.trim().to_ascii_lowercase();
        !entry.is_empty() && (host == entry || host.ends_with(&format!(".{entry}")))
    })
}

fn visible_text_len(html: &str) -> usize {
    let body = match html.find("<body") {
        Some(idx) => &html[idx..],
        None => html,
    };
    strip_html_tags(&remove_noise_blocks(body))
        .split_whitespace()
        .map(|w| w.chars().count())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier(config: ClassifierConfig) -> SourceClassifier {
        SourceClassifier::new(
            Arc::new(HttpFetcher::with_defaults().unwrap()),
            Arc::new(HostRateLimiter::from_millis(0)),
            config,
        )
    }

    fn probe(content_type: &str, prefix: &str) -> ProbeResponse {
        ProbeResponse {
            status: 200,
            content_type: Some(content_type.to_string()),
            prefix: prefix.to_string(),
        }
    }

    #[test]
    fn test_feed_url_patterns() {
        assert!(looks_like_feed_url("https://techcrunch.com/category/ai/feed/"));
        assert!(looks_like_feed_url("https://example.com/rss"));
        assert!(looks_like_feed_url("https://example.com/atom.xml?x=1"));
        assert!(looks_like_feed_url("https://example.com/index.RSS"));
        assert!(!looks_like_feed_url("https://example.com/feedback"));
        assert!(!looks_like_feed_url("https://example.com/news"));
    }

    #[test]
    fn test_reddit_subreddit_rewritten_to_rss() {
        let d = platform_rewrite("https://www.reddit.com/r/MachineLearning/").unwrap();
        assert_eq!(d.detected_kind, SourceKind::Feed);
        assert_eq!(d.fetch_url, "https://www.reddit.com/r/MachineLearning.rss");
        assert_eq!(d.url, "https://www.reddit.com/r/MachineLearning/");
        assert_eq!(d.detection_confidence, 1.0);
    }

    #[test]
    fn test_reddit_user_and_threads() {
        let user = platform_rewrite("https://reddit.com/user/someone").unwrap();
        assert_eq!(user.fetch_url, "https://reddit.com/user/someone.rss");

        let thread =
            platform_rewrite("https://www.reddit.com/r/rust/comments/abc123/title/").unwrap();
        assert_eq!(thread.detected_kind, SourceKind::Dynamic);
        assert_eq!(thread.fetch_url, thread.url);

        assert!(platform_rewrite("https://www.reddit.com/").is_none());
        assert!(platform_rewrite("https://example.com/r/rust").is_none());
    }

    #[test]
    fn test_offline_host_lists() {
        let c = classifier(ClassifierConfig {
            dynamic_hosts: vec!["spa.example".to_string()],
            ..Default::default()
        });
        let d = c.classify_offline("https://news.spa.example/latest").unwrap();
        assert_eq!(d.detected_kind, SourceKind::Dynamic);
        assert!(c.classify_offline("https://other.example/latest").is_none());
    }

    #[test]
    fn test_prefix_feed_root() {
        let c = classifier(ClassifierConfig::default());
        let d = c.classify_prefix(
            "https://example.com/latest",
            &probe("text/plain", "<?xml version=\"1.0\"?>\n<rss version=\"2.0\">"),
        );
        assert_eq!(d.detected_kind, SourceKind::Feed);

        let d = c.classify_prefix("https://example.com/x", &probe("application/atom+xml", ""));
        assert_eq!(d.detected_kind, SourceKind::Feed);
    }

    #[test]
    fn test_prefix_dynamic_markers() {
        let c = classifier(ClassifierConfig::default());
        let html = r#"<html><body><div id="__next"></div><script id="__NEXT_DATA__">{}</script></body></html>"#;
        let d = c.classify_prefix("https://example.com/", &probe("text/html", html));
        assert_eq!(d.detected_kind, SourceKind::Dynamic);
    }

    #[test]
    fn test_static_list_overrides_markers() {
        let c = classifier(ClassifierConfig {
            static_hosts: vec!["example.com".to_string()],
            ..Default::default()
        });
        let html = r#"<div id="root"></div><script src="/app.js"></script>"#;
        let d = c.classify_prefix("https://example.com/", &probe("text/html", html));
        assert_eq!(d.detected_kind, SourceKind::StaticHtml);
    }

    #[test]
    fn test_near_empty_page_is_dynamic() {
        let c = classifier(ClassifierConfig::default());
        let html = r#"<html><head><title>App</title></head><body><main></main><script src="/bundle.js"></script></body></html>"#;
        let d = c.classify_prefix("https://example.com/", &probe("text/html", html));
        assert_eq!(d.detected_kind, SourceKind::Dynamic);
    }

    #[test]
    fn test_server_rendered_page_is_static() {
        let c = classifier(ClassifierConfig::default());
        let paragraph = "Server rendered article text with plenty of words. ".repeat(10);
        let html = format!("<html><body><article><p>{paragraph}</p></article><script>track()</script></body></html>");
        let d = c.classify_prefix("https://example.com/", &probe("text/html; charset=utf-8", &html));
        assert_eq!(d.detected_kind, SourceKind::StaticHtml);
    }

    #[test]
    fn test_xhtml_is_not_a_feed() {
        let c = classifier(ClassifierConfig::default());
        let d = c.classify_prefix(
            "https://example.com/",
            &probe("application/xhtml+xml", "<html><body><p>hi</p></body></html>"),
        );
        assert_ne!(d.detected_kind, SourceKind::Feed);
    }

    #[test]
    fn test_generic_xml_needs_a_feed_root() {
        let c = classifier(ClassifierConfig::default());
        let sitemap = r#"<?xml version="1.0"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"><url><loc>https://example.com/a</loc></url></urlset>"#;
        let d = c.classify_prefix("https://example.com/sitemap", &probe("application/xml", sitemap));
        assert_eq!(d.detected_kind, SourceKind::StaticHtml);

        let d = c.classify_prefix(
            "https://example.com/latest",
            &probe("text/xml; charset=utf-8", r#"<?xml version="1.0"?><rss version="2.0"><channel>"#),
        );
        assert_eq!(d.detected_kind, SourceKind::Feed);

        let d = c.classify_prefix(
            "https://example.com/latest",
            &probe("application/rdf+xml", ""),
        );
        assert_eq!(d.detected_kind, SourceKind::Feed);
    }
}
