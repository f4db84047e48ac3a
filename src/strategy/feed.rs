//! RSS, Atom and RDF feed extraction
//!
//! The document is fetched once; entries are parsed on demand by
//! [`FeedEntries`], so entries past the article limit are never parsed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use super::{ArticleStream, ExtractionStrategy};
use crate::crawler::fetcher::HttpFetcher;
use crate::models::{ExtractionConfig, RawArticle, SourceDescriptor, SourceKind};
use crate::parser::parse_date;
use crate::utils::error::ExtractionError;
use crate::utils::resolve_link;

/// Feed dialect, taken from the root element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Rss,
    Atom,
    Rdf,
}

impl FeedFormat {
    /// Local name of the element holding one entry
    fn entry_tag(&self) -> &'static [u8] {
        match self {
            Self::Rss | Self::Rdf => b"item",
            Self::Atom => b"entry",
        }
    }
}

fn reader_for(doc: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(doc);
    let config = reader.config_mut();
    config.trim_text(true);
    config.check_end_names = false;
    reader
}

/// Identify the feed dialect from the first element
///
/// # Errors
///
/// Returns [`ExtractionError::Parse`] when the document is not XML or its
/// root is not `rss`, `feed` or `RDF`.
pub fn sniff_format(doc: &str) -> Result<FeedFormat, ExtractionError> {
    let mut reader = reader_for(doc);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return match e.local_name().as_ref() {
                    b"rss" => Ok(FeedFormat::Rss),
                    b"feed" => Ok(FeedFormat::Atom),
                    b"RDF" => Ok(FeedFormat::Rdf),
                    other => Err(ExtractionError::Parse(format!(
                        "unexpected root element <{}>",
                        String::from_utf8_lossy(other)
                    ))),
                };
            }
            Ok(Event::Eof) => {
                return Err(ExtractionError::Parse("no root element".to_string()));
            }
            Ok(_) => {}
            Err(e) => return Err(ExtractionError::Parse(e.to_string())),
        }
    }
}

/// Lazy iterator over the entries of a feed document
pub struct FeedEntries {
    doc: String,
    pos: usize,
    format: FeedFormat,
    source_url: String,
    base_url: String,
    parsed: Arc<AtomicUsize>,
    done: bool,
}

impl FeedEntries {
    /// Prepare iteration without parsing any entry
    pub fn new(doc: String, source_url: &str, base_url: &str) -> Result<Self, ExtractionError> {
        let format = sniff_format(&doc)?;
        Ok(Self {
            doc,
            pos: 0,
            format,
            source_url: source_url.to_string(),
            base_url: base_url.to_string(),
            parsed: Arc::new(AtomicUsize::new(0)),
            done: false,
        })
    }

    pub fn format(&self) -> FeedFormat {
        self.format
    }

    /// Shared count of entries parsed so far
    pub fn parsed_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.parsed)
    }

    fn next_entry(&mut self) -> Option<Result<RawArticle, ExtractionError>> {
        let entry_tag = self.format.entry_tag();
        let mut reader = reader_for(&self.doc[self.pos..]);

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) if e.local_name().as_ref() == entry_tag => {
                    let fields = read_entry(&mut reader, entry_tag);
                    self.pos += reader.buffer_position() as usize;
                    self.parsed.fetch_add(1, Ordering::Relaxed);
                    return Some(fields.map(|f| f.into_article(&self.source_url, &self.base_url)));
                }
                Ok(Event::Eof) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(ExtractionError::Parse(e.to_string()))),
            }
        }
    }
}

impl Iterator for FeedEntries {
    type Item = Result<RawArticle, ExtractionError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.next_entry();
        if !matches!(item, Some(Ok(_))) {
            self.done = true;
        }
        item
    }
}

#[derive(Debug, Default)]
struct EntryFields {
    title: String,
    link: Option<String>,
    guid: Option<String>,
    summary: Option<String>,
    body: Option<String>,
    published: Option<String>,
    updated: Option<String>,
}

impl EntryFields {
    fn append(&mut self, field: &[u8], text: &str) {
        let slot = match field {
            b"title" => {
                self.title.push_str(text);
                return;
            }
            b"link" => &mut self.link,
            b"guid" | b"id" => &mut self.guid,
            b"description" | b"summary" => &mut self.summary,
            b"encoded" | b"content" => &mut self.body,
            b"pubDate" | b"published" | b"date" | b"issued" => &mut self.published,
            b"updated" | b"modified" => &mut self.updated,
            _ => return,
        };
        slot.get_or_insert_with(String::new).push_str(text);
    }

    /// Atom `<link href=.. rel=..>`; the alternate link wins
    fn link_element(&mut self, e: &BytesStart) {
        let mut href = None;
        let mut rel = None;
        for attr in e.attributes().flatten() {
            let value = attr
                .unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
            match attr.key.local_name().as_ref() {
                b"href" => href = Some(value),
                b"rel" => rel = Some(value),
                _ => {}
            }
        }
        if let Some(href) = href {
            let alternate = rel.as_deref().map_or(true, |r| r == "alternate");
            if alternate || self.link.is_none() {
                self.link = Some(href);
            }
        }
    }

    fn into_article(self, source_url: &str, base_url: &str) -> RawArticle {
        let link = self
            .link
            .filter(|l| !l.trim().is_empty())
            .or_else(|| self.guid.filter(|g| g.starts_with("http")))
            .map(|l| resolve_link(base_url, &l).unwrap_or_else(|| l.trim().to_string()))
            .unwrap_or_default();

        let published_at = self
            .published
            .as_deref()
            .and_then(parse_date)
            .or_else(|| self.updated.as_deref().and_then(parse_date));

        RawArticle {
            source_url: source_url.to_string(),
            title: self.title.trim().to_string(),
            link,
            published_at,
            raw_summary_html: self.summary,
            raw_body_html: self.body,
        }
    }
}

/// Read one entry; the reader is positioned just after its start tag
fn read_entry(reader: &mut Reader<&[u8]>, entry_tag: &[u8]) -> Result<EntryFields, ExtractionError> {
    let mut fields = EntryFields::default();
    // Local names of open elements below the entry
    let mut stack: Vec<Vec<u8>> = Vec::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ExtractionError::Parse(e.to_string()))?;

        match event {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                if stack.is_empty() && name == b"link" {
                    fields.link_element(&e);
                }
                stack.push(name);
            }
            Event::Empty(e) => {
                if stack.is_empty() && e.local_name().as_ref() == b"link" {
                    fields.link_element(&e);
                }
            }
            Event::Text(t) => {
                if let Some(field) = stack.first() {
                    let text = t
                        .unescape()
                        .map(|s| s.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&t).into_owned());
                    fields.append(field, &text);
                }
            }
            Event::CData(c) => {
                if let Some(field) = stack.first() {
                    fields.append(field, &String::from_utf8_lossy(&c));
                }
            }
            Event::End(e) => {
                if stack.pop().is_none() && e.local_name().as_ref() == entry_tag {
                    return Ok(fields);
                }
                if stack.is_empty() && e.local_name().as_ref() == entry_tag {
                    // Unbalanced child closed by the entry end tag
                    return Ok(fields);
                }
            }
            Event::Eof => return Err(ExtractionError::Parse("unterminated feed entry".to_string())),
            _ => {}
        }
    }
}

/// Strategy for RSS/Atom/RDF documents
pub struct FeedStrategy {
    fetcher: Arc<HttpFetcher>,
}

impl FeedStrategy {
    pub fn new(fetcher: Arc<HttpFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ExtractionStrategy for FeedStrategy {
    fn kind(&self) -> SourceKind {
        SourceKind::Feed
    }

    async fn extract(
        &self,
        source: &SourceDescriptor,
        config: &ExtractionConfig,
    ) -> Result<ArticleStream, ExtractionError> {
        let page = self
            .fetcher
            .fetch(&source.fetch_url, true, config.request_timeout())
            .await?;

        let entries = FeedEntries::new(page.body, &source.url, &page.url)?;
        debug!(url = %source.fetch_url, format = ?entries.format(), "Feed document fetched");

        let mut entries = entries.take(config.article_limit).peekable();
        match entries.peek() {
            None => Err(ExtractionError::EmptyResult),
            Some(Err(e)) => Err(e.clone()),
            Some(Ok(_)) => Ok(Box::new(entries)),
        }
    }
}
