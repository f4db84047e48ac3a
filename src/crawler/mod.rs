//! HTTP transport with per-host pacing
//!
//! [`fetcher::HttpFetcher`] issues probes and document fetches with
//! browser-like headers; [`rate_limit::HostRateLimiter`] serialises and
//! spaces requests to the same host across the whole run.

pub mod fetcher;
pub mod headers;
pub mod rate_limit;

pub use fetcher::{decode_bytes, FetchedPage, HttpFetcher, ProbeResponse};
pub use headers::{build_browser_headers, select_user_agent, USER_AGENTS};
pub use rate_limit::{HostPermit, HostRateLimiter};
