//! Structural article extraction from HTML
//!
//! Shared by the static and dynamic strategies. A page is read either as a
//! listing (several article containers or headline links) or as a single
//! article (title, main content block, description). Boilerplate containers
//! such as `nav`, `header`, `footer` and `aside` are ignored.

use std::collections::{HashMap, HashSet};

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::models::RawArticle;
use crate::parser::parse_date;
use crate::parser::sanitize::{collapse_whitespace, has_content, remove_comments, remove_noise_blocks};
use crate::parser::selectors::{ArticleSelectors, ListingSelectors, NoiseSelectors};
use crate::utils::error::ExtractionError;
use crate::utils::resolve_link;

/// Elements whose subtree is never article content
const BOILERPLATE_TAGS: &[&str] = &["nav", "header", "footer", "aside", "form"];

/// Minimum paragraph text for a block to count as article body
const MIN_BODY_CHARS: usize = 80;

/// How a page was interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLayout {
    Listing,
    SingleArticle,
}

/// HTML content extractor
pub struct ContentExtractor {
    listing: ListingSelectors,
    article: ArticleSelectors,
    noise: NoiseSelectors,
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            listing: ListingSelectors::new(),
            article: ArticleSelectors::new(),
            noise: NoiseSelectors::new(),
        }
    }

    /// Extract up to `limit` articles in document order
    ///
    /// `page_url` resolves relative links; `source_url` is recorded on every
    /// article.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::EmptyResult`] when neither a listing nor a
    /// single article can be found.
    pub fn extract(
        &self,
        html: &str,
        source_url: &str,
        page_url: &str,
        limit: usize,
    ) -> Result<(PageLayout, Vec<RawArticle>), ExtractionError> {
        if limit == 0 {
            return Err(ExtractionError::EmptyResult);
        }

        let cleaned = remove_noise_blocks(&remove_comments(html));
        let document = Html::parse_document(&cleaned);

        let listing = self.extract_listing(&document, source_url, page_url, limit);
        if listing.len() >= 2 {
            debug!(count = listing.len(), url = page_url, "Page read as listing");
            return Ok((PageLayout::Listing, listing));
        }

        match self.extract_single(&document, source_url, page_url) {
            Some(article) => {
                debug!(url = page_url, "Page read as single article");
                Ok((PageLayout::SingleArticle, vec![article]))
            }
            None if !listing.is_empty() => Ok((PageLayout::Listing, listing)),
            None => Err(ExtractionError::EmptyResult),
        }
    }

    fn extract_listing(
        &self,
        document: &Html,
        source_url: &str,
        page_url: &str,
        limit: usize,
    ) -> Vec<RawArticle> {
        for selector in self.listing.items {
            let items: Vec<ElementRef> = document
                .select(selector)
                .filter(|el| !in_boilerplate(el))
                .collect();
            if items.len() < 2 {
                continue;
            }

            let articles = collect_unique(
                items
                    .iter()
                    .filter_map(|item| self.listing_item(item, source_url, page_url)),
                limit,
            );
            if articles.len() >= 2 {
                return articles;
            }
        }

        collect_unique(
            document
                .select(self.listing.headline_links)
                .filter(|el| !in_boilerplate(el))
                .filter_map(|anchor| {
                    let title = element_text(&anchor);
                    let link = resolve_link(page_url, anchor.value().attr("href")?)?;
                    has_content(&title).then(|| RawArticle {
                        source_url: source_url.to_string(),
                        title,
                        link,
                        ..Default::default()
                    })
                }),
            limit,
        )
    }

    fn listing_item(
        &self,
        item: &ElementRef,
        source_url: &str,
        page_url: &str,
    ) -> Option<RawArticle> {
        let anchor = first_match(item, self.listing.link)?;
        let link = resolve_link(page_url, anchor.value().attr("href")?)?;

        let title = first_match(item, self.listing.title)
            .map(|el| element_text(&el))
            .filter(|t| has_content(t))
            .or_else(|| Some(element_text(&anchor)).filter(|t| has_content(t)))?;

        let raw_summary_html = self
            .listing
            .summary
            .iter()
            .flat_map(|s| item.select(s))
            .find(|el| has_content(&element_text(el)))
            .map(|el| el.inner_html());

        let published_at = first_match(item, self.listing.date).and_then(|el| {
            el.value()
                .attr("datetime")
                .or_else(|| el.value().attr("content"))
                .map(str::to_string)
                .or_else(|| Some(element_text(&el)))
                .and_then(|d| parse_date(&d))
        });

        Some(RawArticle {
            source_url: source_url.to_string(),
            title,
            link,
            published_at,
            raw_summary_html,
            raw_body_html: None,
        })
    }

    fn extract_single(&self, document: &Html, source_url: &str, page_url: &str) -> Option<RawArticle> {
        let root = document.root_element();

        let title = self
            .article
            .title
            .iter()
            .flat_map(|s| root.select(s))
            .map(|el| attr_or_text(&el))
            .find(|t| has_content(t))?;

        let body_paragraphs = self.main_paragraphs(&root);
        let description = self
            .article
            .description
            .iter()
            .flat_map(|s| root.select(s))
            .filter_map(|el| el.value().attr("content").map(str::to_string))
            .find(|d| has_content(d));

        if body_paragraphs.is_empty() && description.is_none() {
            return None;
        }

        let link = self
            .article
            .canonical
            .iter()
            .flat_map(|s| root.select(s))
            .filter_map(|el| el.value().attr("href").or_else(|| el.value().attr("content")))
            .find_map(|href| resolve_link(page_url, href))
            .unwrap_or_else(|| page_url.to_string());

        let published_at = self
            .article
            .published
            .iter()
            .flat_map(|s| root.select(s))
            .filter_map(|el| {
                el.value()
                    .attr("content")
                    .or_else(|| el.value().attr("datetime"))
                    .map(str::to_string)
            })
            .find_map(|d| parse_date(&d));

        let raw_body_html = (!body_paragraphs.is_empty()).then(|| body_paragraphs.join("\n"));
        let raw_summary_html = description.or_else(|| body_paragraphs.first().cloned());

        Some(RawArticle {
            source_url: source_url.to_string(),
            title,
            link,
            published_at,
            raw_summary_html,
            raw_body_html,
        })
    }

    /// Paragraph HTML of the main content block
    ///
    /// Tries the content selectors first; falls back to the block with the
    /// most paragraph text.
    fn main_paragraphs(&self, root: &ElementRef) -> Vec<String> {
        for selector in self.article.content {
            for container in root.select(selector).filter(|el| !in_boilerplate(el)) {
                let (chars, paragraphs) = self.paragraphs_in(&container);
                if chars >= MIN_BODY_CHARS {
                    return paragraphs;
                }
            }
        }

        let mut by_parent = HashMap::new();
        let mut order = Vec::new();
        for p in root.select(self.article.paragraphs) {
            if in_boilerplate(&p) || self.is_noise(&p) {
                continue;
            }
            let Some(parent) = p.parent() else { continue };
            let text = element_text(&p);
            if !has_content(&text) {
                continue;
            }
            let entry: &mut (usize, Vec<String>) =
                by_parent.entry(parent.id()).or_insert_with(|| {
                    order.push(parent.id());
                    (0, Vec::new())
                });
            entry.0 += text.chars().count();
            entry.1.push(p.html());
        }

        order
            .into_iter()
            .filter_map(|id| by_parent.remove(&id))
            .filter(|(chars, _)| *chars >= MIN_BODY_CHARS)
            .max_by_key(|(chars, _)| *chars)
            .map(|(_, paragraphs)| paragraphs)
            .unwrap_or_default()
    }

    /// Paragraph HTML in `container` with the length of its visible text
    fn paragraphs_in(&self, container: &ElementRef) -> (usize, Vec<String>) {
        container
            .select(self.article.paragraphs)
            .filter(|p| !in_boilerplate(p) && !self.is_noise(p))
            .fold((0, Vec::new()), |(chars, mut paragraphs), p| {
                let text = element_text(&p);
                if !has_content(&text) {
                    return (chars, paragraphs);
                }
                paragraphs.push(p.html());
                (chars + text.chars().count(), paragraphs)
            })
    }

    fn is_noise(&self, element: &ElementRef) -> bool {
        element.ancestors().filter_map(ElementRef::wrap).any(|ancestor| {
            self.noise
                .elements
                .iter()
                .any(|s| s.matches(&ancestor))
        })
    }
}

/// Whether the element sits inside navigation or page chrome
fn in_boilerplate(element: &ElementRef) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| BOILERPLATE_TAGS.contains(&a.value().name()))
}

fn first_match<'a>(element: &ElementRef<'a>, selectors: &[Selector]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|s| element.select(s).next())
}

fn element_text(element: &ElementRef) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn attr_or_text(element: &ElementRef) -> String {
    match element.value().attr("content") {
        Some(content) => collapse_whitespace(content),
        None => element_text(element),
    }
}

/// Keep document order, drop repeated links, stop at `limit`
fn collect_unique(articles: impl Iterator<Item = RawArticle>, limit: usize) -> Vec<RawArticle> {
    let mut seen = HashSet::new();
    articles
        .filter(|a| seen.insert(a.link.clone()))
        .take(limit)
        .collect()
}
