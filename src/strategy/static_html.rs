//! Server-rendered HTML extraction

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{ArticleStream, ExtractionStrategy};
use crate::crawler::fetcher::HttpFetcher;
use crate::models::{ExtractionConfig, SourceDescriptor, SourceKind};
use crate::parser::ContentExtractor;
use crate::utils::error::ExtractionError;

/// Fetches a page once and extracts articles from its markup
pub struct StaticHtmlStrategy {
    fetcher: Arc<HttpFetcher>,
    extractor: ContentExtractor,
}

impl StaticHtmlStrategy {
    pub fn new(fetcher: Arc<HttpFetcher>) -> Self {
        Self {
            fetcher,
            extractor: ContentExtractor::new(),
        }
    }
}

#[async_trait]
impl ExtractionStrategy for StaticHtmlStrategy {
    fn kind(&self) -> SourceKind {
        SourceKind::StaticHtml
    }

    async fn extract(
        &self,
        source: &SourceDescriptor,
        config: &ExtractionConfig,
    ) -> Result<ArticleStream, ExtractionError> {
        let page = self
            .fetcher
            .fetch(&source.fetch_url, false, config.request_timeout())
            .await?;

        let (layout, articles) =
            self.extractor
                .extract(&page.body, &source.url, &page.url, config.article_limit)?;
        debug!(url = %source.fetch_url, layout = ?layout, count = articles.len(), "Static page extracted");

        Ok(Box::new(articles.into_iter().map(Ok)))
    }
}
