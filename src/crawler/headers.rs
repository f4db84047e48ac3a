use rand::seq::SliceRandom;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT,
};

use crate::models::UserAgentPolicy;

/// Pool of realistic User-Agent strings for rotation
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.4; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
];

const HTML_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

const FEED_ACCEPT: &str =
    "application/rss+xml,application/atom+xml,application/xml;q=0.9,text/xml;q=0.9,*/*;q=0.8";

/// Resolve the user agent to send for one request
///
/// # Examples
///
/// ```
/// use newsgrab::crawler::headers::{select_user_agent, USER_AGENTS};
/// use newsgrab::models::UserAgentPolicy;
///
/// let fixed = UserAgentPolicy::Fixed("newsgrab-test/1.0".to_string());
/// assert_eq!(select_user_agent(&fixed), "newsgrab-test/1.0");
///
/// let rotated = select_user_agent(&UserAgentPolicy::Rotate);
/// assert!(USER_AGENTS.contains(&rotated.as_str()));
/// ```
pub fn select_user_agent(policy: &UserAgentPolicy) -> String {
    match policy {
        UserAgentPolicy::Fixed(ua) => ua.clone(),
        UserAgentPolicy::Rotate => {
            let mut rng = rand::thread_rng();
            USER_AGENTS
                .choose(&mut rng)
                .copied()
                .unwrap_or(USER_AGENTS[0])
                .to_string()
        }
    }
}

/// Build browser-like headers for page and feed requests
///
/// An unencodable user agent is skipped rather than failing the request.
pub fn build_browser_headers(user_agent: &str, prefer_feed: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();

    if let Ok(value) = HeaderValue::from_str(user_agent) {
        headers.insert(USER_AGENT, value);
    }
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(if prefer_feed { FEED_ACCEPT } else { HTML_ACCEPT }),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert(HeaderName::from_static("dnt"), HeaderValue::from_static("1"));
    headers.insert(
        HeaderName::from_static("upgrade-insecure-requests"),
        HeaderValue::from_static("1"),
    );

    headers
}
