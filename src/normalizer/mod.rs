//! Content normalizer
//!
//! Turns a [`RawArticle`] into a [`CleanArticle`]: markup and boilerplate
//! blocks are removed, entities decoded, invisible characters dropped,
//! whitespace collapsed and the summary truncated at a word boundary.
//!
//! Normalisation is pure and never fails; malformed input degrades to empty
//! fields. Text cleaning runs to a fixpoint, so normalising an article that
//! was already normalised is a no-op.

use chrono::{DateTime, Utc};

use crate::models::{CleanArticle, RawArticle};
use crate::parser::sanitize::{
    collapse_whitespace, decode_html_entities, has_content, remove_comments, remove_control_chars,
    remove_noise_blocks, remove_zero_width, strip_html_tags, to_ascii, truncate_at_word,
};

/// Normalizer settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizerConfig {
    /// Maximum summary length in characters, ellipsis included
    pub summary_max_len: usize,
    /// Drop every non-ASCII character
    pub ascii_only: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            summary_max_len: 500,
            ascii_only: false,
        }
    }
}

/// Stateless article normalizer
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize with the current time as `extracted_at`
    pub fn normalize(&self, raw: RawArticle) -> CleanArticle {
        self.normalize_at(raw, Utc::now())
    }

    /// Normalize with an explicit extraction timestamp
    pub fn normalize_at(&self, raw: RawArticle, extracted_at: DateTime<Utc>) -> CleanArticle {
        let title = self.clean_text(&raw.title);
        let link = raw.link.trim().to_string();

        let body = raw
            .raw_body_html
            .as_deref()
            .map(|html| self.clean_text(html))
            .filter(|text| has_content(text));

        let summary_source = raw
            .raw_summary_html
            .as_deref()
            .map(|html| self.clean_text(html))
            .filter(|text| has_content(text))
            .or_else(|| body.clone())
            .unwrap_or_default();

        CleanArticle {
            source_url: raw.source_url,
            title,
            link,
            published_at: raw.published_at,
            summary: self.summarize(&summary_source),
            body,
            extracted_at,
        }
    }

    /// Clean one field until another pass changes nothing
    ///
    /// Every pass either shortens the text or only rewrites whitespace, so the
    /// loop terminates.
    pub fn clean_text(&self, input: &str) -> String {
        let mut current = input.to_string();
        loop {
            let next = self.clean_pass(&current);
            if next == current {
                return next;
            }
            current = next;
        }
    }

    fn clean_pass(&self, text: &str) -> String {
        let mut result = remove_comments(text);
        result = remove_noise_blocks(&result);
        result = strip_html_tags(&result);
        result = decode_html_entities(&result);
        result = remove_zero_width(&result);
        result = remove_control_chars(&result);
        if self.config.ascii_only {
            result = to_ascii(&result);
        }
        collapse_whitespace(&result)
    }

    /// Truncate already-clean text to the summary limit
    fn summarize(&self, clean: &str) -> String {
        let truncated = truncate_at_word(clean, self.config.summary_max_len);
        if truncated == clean {
            truncated
        } else {
            // A cut can split an entity-like sequence; settle it again
            self.clean_text(&truncated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::sanitize::ELLIPSIS;

    fn raw(title: &str, summary: Option<&str>, body: Option<&str>) -> RawArticle {
        RawArticle {
            source_url: "https://example.com/feed".to_string(),
            title: title.to_string(),
            link: " https://example.com/a ".to_string(),
            published_at: None,
            raw_summary_html: summary.map(str::to_string),
            raw_body_html: body.map(str::to_string),
        }
    }

    #[test]
    fn test_strips_markup_and_entities() {
        let n = Normalizer::default();
        let clean = n.normalize(raw(
            "  AI &amp; <em>Robots</em>\n",
            Some("<p>Hello&nbsp;<b>world</b></p><script>evil()</script>"),
            None,
        ));

        assert_eq!(clean.title, "AI & Robots");
        assert_eq!(clean.summary, "Hello world");
        assert_eq!(clean.link, "https://example.com/a");
        assert!(clean.body.is_none());
    }

    #[test]
    fn test_summary_falls_back_to_body() {
        let n = Normalizer::default();
        let clean = n.normalize(raw("T", Some("<p>  </p>"), Some("<div>Body text</div>")));
        assert_eq!(clean.summary, "Body text");
        assert_eq!(clean.body.as_deref(), Some("Body text"));
    }

    #[test]
    fn test_empty_input_degrades_to_empty_fields() {
        let n = Normalizer::default();
        let clean = n.normalize(raw("", None, None));
        assert_eq!(clean.title, "");
        assert_eq!(clean.summary, "");
        assert!(clean.body.is_none());
    }

    #[test]
    fn test_malformed_markup_does_not_panic() {
        let n = Normalizer::default();
        let clean = n.normalize(raw("<b>Unclosed", Some("<<<>>> &#xZZZ; <p"), None));
        assert_eq!(clean.title, "Unclosed");
        assert!(has_content(&clean.summary));
    }

    #[test]
    fn test_summary_truncated_at_word_boundary() {
        let n = Normalizer::new(NormalizerConfig {
            summary_max_len: 16,
            ascii_only: false,
        });
        let clean = n.normalize(raw("T", Some("alpha beta gamma delta epsilon"), None));
        assert!(clean.summary.chars().count() <= 16);
        assert_eq!(clean.summary, format!("alpha beta{ELLIPSIS}"));
    }

    #[test]
    fn test_double_encoded_entities_settle() {
        let n = Normalizer::default();
        assert_eq!(n.clean_text("&amp;lt;b&amp;gt;bold&amp;lt;/b&amp;gt;"), "bold");
    }

    #[test]
    fn test_ascii_only() {
        let n = Normalizer::new(NormalizerConfig {
            summary_max_len: 100,
            ascii_only: true,
        });
        let clean = n.normalize(raw("Caf\u{e9} \u{2014} news", None, None));
        assert_eq!(clean.title, "Caf news");
    }

    #[test]
    fn test_idempotent_on_clean_article() {
        let n = Normalizer::new(NormalizerConfig {
            summary_max_len: 20,
            ascii_only: false,
        });
        let at = Utc::now();
        let once = n.normalize_at(
            raw("<h1>Title</h1>", Some("<p>A fairly long summary that will be cut</p>"), Some("<p>Body</p>")),
            at,
        );
        let twice = n.normalize_at(once.to_raw(), at);
        assert_eq!(once, twice);
    }
}
