//! CSS selectors for structural article extraction
//!
//! Each list is ordered by preference; extraction takes the first selector
//! that yields usable content.

use lazy_static::lazy_static;
use scraper::Selector;

// Helper macro to parse selectors safely at compile time
macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

lazy_static! {
    // Listing pages
    static ref LISTING_ITEMS: Vec<Selector> = vec![
        parse_selector!("article"),
        parse_selector!(".post"),
        parse_selector!(".story"),
        parse_selector!(".news-item"),
        parse_selector!("li.entry"),
        parse_selector!("div.entry"),
    ];

    static ref ITEM_TITLE: Vec<Selector> = vec![
        parse_selector!("h1"),
        parse_selector!("h2"),
        parse_selector!("h3"),
        parse_selector!("h4"),
        parse_selector!(".title"),
        parse_selector!(".headline"),
    ];

    static ref ITEM_LINK: Vec<Selector> = vec![
        parse_selector!("h1 a[href]"),
        parse_selector!("h2 a[href]"),
        parse_selector!("h3 a[href]"),
        parse_selector!("h4 a[href]"),
        parse_selector!("a[rel='bookmark']"),
        parse_selector!("a.title[href]"),
        parse_selector!("a[href]"),
    ];

    static ref ITEM_SUMMARY: Vec<Selector> = vec![
        parse_selector!(".summary"),
        parse_selector!(".excerpt"),
        parse_selector!(".dek"),
        parse_selector!(".description"),
        parse_selector!("p"),
    ];

    static ref ITEM_DATE: Vec<Selector> = vec![
        parse_selector!("time[datetime]"),
        parse_selector!("[itemprop='datePublished']"),
    ];

    // Pages without article containers: bare headline links, one selector
    // so matches come back in document order
    static ref HEADLINE_LINKS: Selector = parse_selector!("h2 a[href], h3 a[href]");

    // Single-article pages
    static ref PAGE_TITLE: Vec<Selector> = vec![
        parse_selector!("meta[property='og:title']"),
        parse_selector!("meta[name='twitter:title']"),
        parse_selector!("h1"),
        parse_selector!("title"),
    ];

    static ref MAIN_CONTENT: Vec<Selector> = vec![
        parse_selector!("[itemprop='articleBody']"),
        parse_selector!(".entry-content"),
        parse_selector!(".post-content"),
        parse_selector!(".article-body"),
        parse_selector!("article"),
        parse_selector!("main"),
        parse_selector!("[role='main']"),
        parse_selector!("#content"),
    ];

    static ref PAGE_DESCRIPTION: Vec<Selector> = vec![
        parse_selector!("meta[property='og:description']"),
        parse_selector!("meta[name='description']"),
    ];

    static ref PAGE_PUBLISHED: Vec<Selector> = vec![
        parse_selector!("meta[property='article:published_time']"),
        parse_selector!("meta[itemprop='datePublished']"),
        parse_selector!("meta[name='pubdate']"),
        parse_selector!("time[datetime]"),
    ];

    static ref PAGE_CANONICAL: Vec<Selector> = vec![
        parse_selector!("link[rel='canonical']"),
        parse_selector!("meta[property='og:url']"),
    ];

    static ref PARAGRAPHS: Selector = parse_selector!("p");

    static ref BLOCKS: Selector = parse_selector!("div, section");

    static ref NOISE_ELEMENTS: Vec<Selector> = {
        let selectors = vec![
            "script",
            "style",
            "noscript",
            "iframe",
            "template",
            "nav",
            "header",
            "footer",
            "aside",
            "form",
            ".advertisement",
            ".ad",
            ".share",
            ".newsletter",
            ".related",
            ".comments",
        ];

        selectors
            .iter()
            .filter_map(|s| Selector::parse(s).ok())
            .collect()
    };
}

/// Selectors for pages that list several articles
pub struct ListingSelectors {
    pub items: &'static [Selector],
    pub title: &'static [Selector],
    pub link: &'static [Selector],
    pub summary: &'static [Selector],
    pub date: &'static [Selector],
    pub headline_links: &'static Selector,
}

impl ListingSelectors {
    pub fn new() -> Self {
        Self {
            items: &LISTING_ITEMS,
            title: &ITEM_TITLE,
            link: &ITEM_LINK,
            summary: &ITEM_SUMMARY,
            date: &ITEM_DATE,
            headline_links: &HEADLINE_LINKS,
        }
    }
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self::new()
    }
}

/// Selectors for a page carrying one article
pub struct ArticleSelectors {
    pub title: &'static [Selector],
    pub content: &'static [Selector],
    pub description: &'static [Selector],
    pub published: &'static [Selector],
    pub canonical: &'static [Selector],
    pub paragraphs: &'static Selector,
    pub blocks: &'static Selector,
}

impl ArticleSelectors {
    pub fn new() -> Self {
        Self {
            title: &PAGE_TITLE,
            content: &MAIN_CONTENT,
            description: &PAGE_DESCRIPTION,
            published: &PAGE_PUBLISHED,
            canonical: &PAGE_CANONICAL,
            paragraphs: &PARAGRAPHS,
            blocks: &BLOCKS,
        }
    }
}

impl Default for ArticleSelectors {
    fn default() -> Self {
        Self::new()
    }
}

/// Boilerplate removed before extraction
pub struct NoiseSelectors {
    pub elements: &'static [Selector],
}

impl NoiseSelectors {
    pub fn new() -> Self {
        Self {
            elements: &NOISE_ELEMENTS,
        }
    }
}

impl Default for NoiseSelectors {
    fn default() -> Self {
        Self::new()
    }
}
