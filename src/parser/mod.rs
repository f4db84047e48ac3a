//! HTML parsing and data extraction
//!
//! This module handles structural extraction of articles from HTML pages and
//! the text-cleaning primitives used by the normalizer.

pub mod content;
pub mod sanitize;
pub mod selectors;

// Re-export main extractor and public types
pub use content::{ContentExtractor, PageLayout};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parse a publication date as found in feeds and page metadata
///
/// Accepts RFC 3339, RFC 2822 and a few common naive layouts (read as UTC).
///
/// # Examples
///
/// ```
/// use newsgrab::parser::parse_date;
///
/// assert!(parse_date("2024-05-01T10:00:00Z").is_some());
/// assert!(parse_date("Wed, 01 May 2024 10:00:00 +0000").is_some());
/// assert!(parse_date("2024-05-01").is_some());
/// assert!(parse_date("yesterday").is_none());
/// ```
pub fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
    let clean_date = date_str.trim();
    if clean_date.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(clean_date) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(clean_date) {
        return Some(dt.with_timezone(&Utc));
    }

    let formats = [
        "%Y-%m-%dT%H:%M:%S%.f", // 2024-12-15T14:30:00.000
        "%Y-%m-%dT%H:%M:%S",    // 2024-12-15T14:30:00
        "%Y-%m-%d %H:%M:%S",    // 2024-12-15 14:30:00
        "%Y-%m-%d %H:%M",       // 2024-12-15 14:30
    ];
    for format in &formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(clean_date, format) {
            return Some(DateTime::from_naive_utc_and_offset(dt, Utc));
        }
    }

    for format in &["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(clean_date, format) {
            let dt = date.and_hms_opt(0, 0, 0)?;
            return Some(DateTime::from_naive_utc_and_offset(dt, Utc));
        }
    }

    None
}
