use anyhow::Result;
use std::sync::Arc;

use newsgrab::classifier::SourceClassifier;
use newsgrab::config::Config;
use newsgrab::crawler::{HostRateLimiter, HttpFetcher};

pub async fn classify(config: Config, url: String) -> Result<()> {
    let fetcher = Arc::new(HttpFetcher::new(&config)?);
    let limiter = Arc::new(HostRateLimiter::from_millis(
        config.engine.per_host_min_interval_ms,
    ));
    let classifier = SourceClassifier::new(fetcher, limiter, config.classifier.clone());

    match classifier.classify(&url).await {
        Ok(descriptor) => {
            println!("URL:        {}", descriptor.url);
            println!("Fetch URL:  {}", descriptor.fetch_url);
            println!("Kind:       {}", descriptor.detected_kind);
            println!("Confidence: {:.2}", descriptor.detection_confidence);
        }
        Err(e) => {
            println!("Classification failed for {url}: {e} ({})", e.kind());
        }
    }

    Ok(())
}
