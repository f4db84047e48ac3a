//! JavaScript-rendered page extraction
//!
//! Renders the page through a [`PageRenderer`], waits for the configured
//! readiness condition within the request timeout, then applies the same
//! structural extraction as the static strategy.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::render::PageRenderer;
use super::{ArticleStream, ExtractionStrategy};
use crate::config::Readiness;
use crate::crawler::headers::select_user_agent;
use crate::models::{ExtractionConfig, SourceDescriptor, SourceKind};
use crate::parser::ContentExtractor;
use crate::utils::error::ExtractionError;

/// Text shown by anti-bot interstitials instead of content
const BOT_CHALLENGE_MARKERS: &[&str] = &[
    "Checking if the site connection is secure",
    "Checking your browser before accessing",
    "Verify you are human",
    "cf-challenge",
    "Access Denied",
];

/// Whether rendered markup is an anti-bot challenge page
pub fn is_bot_challenge(html: &str) -> bool {
    BOT_CHALLENGE_MARKERS.iter().any(|m| html.contains(m))
}

pub struct DynamicStrategy {
    renderer: Arc<dyn PageRenderer>,
    readiness: Readiness,
    extractor: ContentExtractor,
}

impl DynamicStrategy {
    pub fn new(renderer: Arc<dyn PageRenderer>, readiness: Readiness) -> Self {
        Self {
            renderer,
            readiness,
            extractor: ContentExtractor::new(),
        }
    }
}

#[async_trait]
impl ExtractionStrategy for DynamicStrategy {
    fn kind(&self) -> SourceKind {
        SourceKind::Dynamic
    }

    async fn extract(
        &self,
        source: &SourceDescriptor,
        config: &ExtractionConfig,
    ) -> Result<ArticleStream, ExtractionError> {
        let user_agent = select_user_agent(&config.user_agent_policy);
        let render = self
            .renderer
            .render(&source.fetch_url, &self.readiness, &user_agent);

        let html = tokio::time::timeout(config.request_timeout(), render)
            .await
            .map_err(|_| ExtractionError::Timeout)??;

        if is_bot_challenge(&html) {
            warn!(url = %source.fetch_url, "Rendered page is a bot challenge");
            return Err(ExtractionError::EmptyResult);
        }

        let (layout, articles) = self.extractor.extract(
            &html,
            &source.url,
            &source.fetch_url,
            config.article_limit,
        )?;
        debug!(url = %source.fetch_url, layout = ?layout, count = articles.len(), "Rendered page extracted");

        Ok(Box::new(articles.into_iter().map(Ok)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct FixedRenderer {
        html: String,
        delay: Duration,
    }

    #[async_trait]
    impl PageRenderer for FixedRenderer {
        async fn render(
            &self,
            _url: &str,
            _readiness: &Readiness,
            _user_agent: &str,
        ) -> Result<String, ExtractionError> {
            tokio::time::sleep(self.delay).await;
            Ok(self.html.clone())
        }
    }

    fn config(timeout_ms: u64) -> ExtractionConfig {
        ExtractionConfig {
            request_timeout_ms: timeout_ms,
            ..Default::default()
        }
    }

    fn descriptor() -> SourceDescriptor {
        SourceDescriptor::new("https://spa.example/news", SourceKind::Dynamic, 0.8)
    }

    #[tokio::test]
    async fn test_rendered_listing() {
        let html = r#"<div id="app"><article><h2><a href="/a">A</a></h2></article>
                      <article><h2><a href="/b">B</a></h2></article></div>"#;
        let strategy = DynamicStrategy::new(
            Arc::new(FixedRenderer {
                html: html.to_string(),
                delay: Duration::ZERO,
            }),
            Readiness::NetworkIdle,
        );

        let articles: Vec<_> = strategy
            .extract(&descriptor(), &config(1000))
            .await
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].link, "https://spa.example/a");
    }

    #[tokio::test(start_paused = true)]
    async fn test_readiness_never_reached_is_timeout() {
        let strategy = DynamicStrategy::new(
            Arc::new(FixedRenderer {
                html: String::new(),
                delay: Duration::from_secs(3600),
            }),
            Readiness::Selector("article".to_string()),
        );

        let err = strategy
            .extract(&descriptor(), &config(500))
            .await
            .err()
            .unwrap();
        assert_eq!(err, ExtractionError::Timeout);
    }

    #[tokio::test]
    async fn test_bot_challenge_is_empty_result() {
        let strategy = DynamicStrategy::new(
            Arc::new(FixedRenderer {
                html: "<html><body>Checking if the site connection is secure</body></html>".to_string(),
                delay: Duration::ZERO,
            }),
            Readiness::NetworkIdle,
        );

        let err = strategy
            .extract(&descriptor(), &config(1000))
            .await
            .err()
            .unwrap();
        assert_eq!(err, ExtractionError::EmptyResult);
    }
}
