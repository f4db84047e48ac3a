//! Text sanitization utilities for cleaning extracted article content
//!
//! These are the primitives behind the [normalizer](crate::normalizer): markup
//! removal, entity decoding, invisible-character removal, whitespace collapse
//! and word-boundary truncation. All functions are pure.

use regex::Regex;
use std::sync::LazyLock;

// Pre-compiled regex patterns for performance
static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static COMMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

/// Tags whose content is never article text
static NOISE_BLOCK_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["script", "style", "noscript", "template", "iframe", "svg"]
        .iter()
        .map(|tag| Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).unwrap())
        .collect()
});

/// A tag needs a letter, `/` or `!` right after `<`, so "a < b > c" survives
static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[/!?]?[A-Za-z][^<>]*>").unwrap());

/// Marker appended to truncated summaries
pub const ELLIPSIS: char = '\u{2026}';

/// Remove HTML comments
pub fn remove_comments(html: &str) -> String {
    COMMENT_REGEX.replace_all(html, " ").to_string()
}

/// Remove `<script>`, `<style>` and similar blocks together with their content
///
/// # Examples
///
/// ```
/// use newsgrab::parser::sanitize::remove_noise_blocks;
///
/// let html = "<p>Hi</p><script>track()</script><style>p{}</style>";
/// assert_eq!(remove_noise_blocks(html).trim(), "<p>Hi</p>");
/// ```
pub fn remove_noise_blocks(html: &str) -> String {
    let mut result = html.to_string();
    for re in NOISE_BLOCK_REGEXES.iter() {
        result = re.replace_all(&result, " ").to_string();
    }
    result
}

/// Replace every tag with a space so adjacent block text does not merge
///
/// # Examples
///
/// ```
/// use newsgrab::parser::sanitize::strip_html_tags;
///
/// let html = "<p>Hello <strong>World</strong></p>";
/// assert_eq!(strip_html_tags(html).split_whitespace().collect::<Vec<_>>(), ["Hello", "World"]);
/// ```
pub fn strip_html_tags(html: &str) -> String {
    TAG_REGEX.replace_all(html, " ").to_string()
}

/// Decode named and numeric HTML entities
///
/// # Examples
///
/// ```
/// use newsgrab::parser::sanitize::decode_html_entities;
///
/// assert_eq!(decode_html_entities("Tom &amp; Jerry &#8212; &quot;hi&quot;"), "Tom & Jerry \u{2014} \"hi\"");
/// ```
pub fn decode_html_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Remove zero-width spaces and similar invisible characters
///
/// Removes:
/// - \u{200B}-\u{200F} zero-width and direction marks
/// - \u{2028}-\u{202F} separators and embedding controls
/// - \u{2060} word joiner
/// - \u{FEFF} byte order mark
///
/// # Examples
///
/// ```
/// use newsgrab::parser::sanitize::remove_zero_width;
///
/// assert_eq!(remove_zero_width("a\u{200B}b\u{FEFF}c"), "abc");
/// ```
pub fn remove_zero_width(text: &str) -> String {
    text.chars()
        .filter(|c| {
            !matches!(*c,
                '\u{200B}'..='\u{200F}' |
                '\u{2028}'..='\u{202F}' |
                '\u{2060}' |
                '\u{FEFF}'
            )
        })
        .collect()
}

/// Replace control characters with spaces
pub fn remove_control_chars(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Keep ASCII characters only
pub fn to_ascii(text: &str) -> String {
    text.chars().filter(char::is_ascii).collect()
}

/// Collapse every whitespace run to one space and trim the ends
///
/// # Examples
///
/// ```
/// use newsgrab::parser::sanitize::collapse_whitespace;
///
/// assert_eq!(collapse_whitespace("  Hello \n\n\t World  "), "Hello World");
/// ```
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_REGEX.replace_all(text, " ").trim().to_string()
}

/// Check if text contains meaningful content
///
/// # Examples
///
/// ```
/// use newsgrab::parser::sanitize::has_content;
///
/// assert!(has_content("Hello"));
/// assert!(!has_content("   \n\t  "));
/// ```
pub fn has_content(text: &str) -> bool {
    !text.trim().is_empty()
}

/// Truncate to at most `max_len` characters, cutting at a word boundary
///
/// When text is cut, trailing punctuation is trimmed and [`ELLIPSIS`] is
/// appended; the ellipsis counts toward `max_len`. A single word longer than
/// the limit is hard-cut.
///
/// # Examples
///
/// ```
/// use newsgrab::parser::sanitize::truncate_at_word;
///
/// assert_eq!(truncate_at_word("Hello brave new world", 12), "Hello brave\u{2026}");
/// assert_eq!(truncate_at_word("Short", 20), "Short");
/// ```
pub fn truncate_at_word(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    if max_len == 0 {
        return String::new();
    }

    let budget = max_len - 1;
    let head: String = text.chars().take(budget).collect();
    let next_is_boundary = text
        .chars()
        .nth(budget)
        .map(char::is_whitespace)
        .unwrap_or(true);

    let cut = if next_is_boundary {
        head.as_str()
    } else {
        match head.rfind(char::is_whitespace) {
            Some(pos) if pos > 0 => &head[..pos],
            _ => head.as_str(),
        }
    };

    let cut = cut.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':' | '-'));
    format!("{cut}{ELLIPSIS}")
}
