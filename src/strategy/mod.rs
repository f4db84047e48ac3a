//! Extraction strategies
//!
//! One strategy per [`SourceKind`]. Each turns a classified source into a
//! lazy stream of [`RawArticle`]s; the orchestrator picks the strategy from
//! the descriptor and drives retries around it.

pub mod dynamic;
pub mod feed;
pub mod render;
pub mod static_html;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::crawler::fetcher::HttpFetcher;
use crate::models::{ExtractionConfig, RawArticle, SourceDescriptor, SourceKind};
use crate::utils::error::ExtractionError;

pub use dynamic::DynamicStrategy;
pub use feed::FeedStrategy;
pub use render::{ChromiumRenderer, PageRenderer};
pub use static_html::StaticHtmlStrategy;

/// Lazily produced articles; an `Err` item ends the stream
pub type ArticleStream = Box<dyn Iterator<Item = Result<RawArticle, ExtractionError>> + Send>;

/// Extraction for one kind of source
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Fetch the source and return its articles, at most `config.article_limit`
    async fn extract(
        &self,
        source: &SourceDescriptor,
        config: &ExtractionConfig,
    ) -> Result<ArticleStream, ExtractionError>;
}

/// Strategy registry keyed by source kind
#[derive(Clone, Default)]
pub struct StrategySet {
    strategies: HashMap<SourceKind, Arc<dyn ExtractionStrategy>>,
}

impl StrategySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed, static and Chromium-backed dynamic strategies over one fetcher
    pub fn standard(fetcher: Arc<HttpFetcher>, config: &Config) -> Self {
        let renderer: Arc<dyn PageRenderer> = Arc::new(ChromiumRenderer::new(&config.render));
        Self::new()
            .with(Arc::new(FeedStrategy::new(Arc::clone(&fetcher))))
            .with(Arc::new(StaticHtmlStrategy::new(fetcher)))
            .with(Arc::new(DynamicStrategy::new(
                renderer,
                config.render.readiness.clone(),
            )))
    }

    /// Register a strategy, replacing any previous one for its kind
    pub fn with(mut self, strategy: Arc<dyn ExtractionStrategy>) -> Self {
        self.strategies.insert(strategy.kind(), strategy);
        self
    }

    pub fn get(&self, kind: SourceKind) -> Option<Arc<dyn ExtractionStrategy>> {
        self.strategies.get(&kind).cloned()
    }

    pub fn kinds(&self) -> Vec<SourceKind> {
        let mut kinds: Vec<_> = self.strategies.keys().copied().collect();
        kinds.sort_by_key(|k| k.cost());
        kinds
    }
}

impl std::fmt::Debug for StrategySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategySet")
            .field("kinds", &self.kinds())
            .finish()
    }
}
