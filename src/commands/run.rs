use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use newsgrab::config::Config;
use newsgrab::coordinator::RunCoordinator;
use newsgrab::models::{CleanArticle, RunReport};
use newsgrab::storage::{ArticleSink, JsonLinesSink, WebhookSink, WebhookSinkConfig};

/// Output file name for the cleaned rows
const OUTPUT_NAME: &str = "daily_news";

/// Command-line overrides for one run
pub struct RunParams {
    pub urls: Vec<String>,
    pub limit: Option<usize>,
    pub sync: bool,
    pub concurrency: Option<usize>,
}

pub async fn run(mut config: Config, params: RunParams) -> Result<()> {
    if let Some(limit) = params.limit {
        config.engine.article_limit = limit;
    }
    if let Some(concurrency) = params.concurrency {
        config.engine.concurrency = concurrency;
    }
    config.validate().context("Invalid configuration")?;

    let urls = if params.urls.is_empty() {
        config.sources.urls.clone()
    } else {
        params.urls
    };

    println!("Starting news scrape");
    println!("====================");
    println!("Sources: {}", urls.len());
    println!("Articles per source: {}", config.engine.article_limit);

    let coordinator = RunCoordinator::new(&config)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight sources");
            on_signal.cancel();
        }
    });

    let result = coordinator.run(&urls, cancel).await?;
    result.report.log_outcomes();
    print_summary(&result.report);

    let report_path = write_report(&config, &result.report).await?;
    println!("Run report: {}", report_path.display());

    let articles: Vec<CleanArticle> = result.articles().cloned().collect();
    if articles.is_empty() {
        println!("\nNo articles were scraped from any source.");
        return Ok(());
    }

    let sink = JsonLinesSink::new(&config.output.data_dir, "cleaned", OUTPUT_NAME);
    let receipt = sink.write(&articles).await?;
    println!("Saved {} rows: {}", receipt.rows, receipt.location);

    if params.sync {
        sync_rows(&config, &articles).await;
    }

    Ok(())
}

/// Cloud sync is best effort; local output is already on disk
async fn sync_rows(config: &Config, articles: &[CleanArticle]) {
    let Some(webhook) = WebhookSinkConfig::from_output(&config.output) else {
        println!("Sync skipped: no webhook URL configured (NEWSGRAB_WEBHOOK_URL)");
        return;
    };

    let result = match WebhookSink::new(webhook.with_retry(config.retry.clone())) {
        Ok(sink) => sink.write(articles).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(receipt) => println!("Synced {} rows to {}", receipt.rows, receipt.location),
        Err(e) => {
            let category = e.category().description();
            tracing::error!(error = %e, category = category, "Sync failed");
            println!("Sync failed ({category}): {e}");
        }
    }
}

async fn write_report(config: &Config, report: &RunReport) -> Result<std::path::PathBuf> {
    let dir = config.output.data_dir.join("reports");
    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let path = dir.join(format!("{}.json", report.run_id));
    let json = serde_json::to_string_pretty(report)?;
    tokio::fs::write(&path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn print_summary(report: &RunReport) {
    let summary = report.summary();

    println!("\nRun Summary");
    println!("===========");
    println!("Succeeded: {}", summary.succeeded);
    println!("Partial: {}", summary.partial);
    println!("Failed: {}", summary.failed);
    println!("Articles: {}", summary.articles);
    println!("Failure rate: {:.1}%", summary.failure_rate());
    println!("Duration: {}ms", summary.duration_ms);
    if report.cancelled {
        println!("Run was cancelled before all sources finished");
    }

    for outcome in report.outcomes.iter().filter(|o| !o.is_success()) {
        let kind = outcome
            .error_kind
            .map(|k| k.to_string())
            .unwrap_or_default();
        println!("  [!] {} {kind}", outcome.url);
    }
}
