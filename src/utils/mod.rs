//! Common utilities and helper functions
//!
//! This module provides shared utilities used across the application.

pub mod error;
pub mod retry;

use anyhow::{Context, Result};
use url::Url;

/// Extract the host (without port) used as the rate-limit key
pub fn extract_host(url: &str) -> Result<String> {
    let parsed = Url::parse(url).context("Invalid URL")?;

    parsed
        .host_str()
        .map(|s| s.to_ascii_lowercase())
        .context("No host in URL")
}

/// Human-readable source name: host without a leading `www.`
pub fn source_name(url: &str) -> String {
    match extract_host(url) {
        Ok(host) => host.strip_prefix("www.").unwrap_or(&host).to_string(),
        Err(_) => url.to_string(),
    }
}

/// Check that a URL is absolute http(s) with a host
pub fn is_supported_url(url: &str) -> bool {
    Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// Resolve a possibly relative link against the page it was found on
pub fn resolve_link(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }

    match Url::parse(href) {
        Ok(abs) => Some(abs.to_string()),
        Err(_) => Url::parse(base)
            .ok()
            .and_then(|b| b.join(href).ok())
            .map(|u| u.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_host() {
        let host = extract_host("https://News.Example.com:8443/article/123");
        assert_eq!(host.unwrap(), "news.example.com");
        assert!(extract_host("not a url").is_err());
    }

    #[test]
    fn test_source_name() {
        assert_eq!(source_name("https://www.reddit.com/r/rust/"), "reddit.com");
        assert_eq!(source_name("https://techcrunch.com/feed/"), "techcrunch.com");
        assert_eq!(source_name("garbage"), "garbage");
    }

    #[test]
    fn test_is_supported_url() {
        assert!(is_supported_url("https://example.com/feed"));
        assert!(is_supported_url("http://127.0.0.1:8080/x"));
        assert!(!is_supported_url("ftp://example.com/file"));
        assert!(!is_supported_url("example.com"));
    }

    #[test]
    fn test_resolve_link() {
        assert_eq!(
            resolve_link("https://example.com/news/", "story-1").as_deref(),
            Some("https://example.com/news/story-1")
        );
        assert_eq!(
            resolve_link("https://example.com/news/", "/about").as_deref(),
            Some("https://example.com/about")
        );
        assert_eq!(
            resolve_link("https://example.com/", "https://other.org/a").as_deref(),
            Some("https://other.org/a")
        );
        assert_eq!(resolve_link("https://example.com/", "#top"), None);
        assert_eq!(resolve_link("https://example.com/", "javascript:void(0)"), None);
    }
}
