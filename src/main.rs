use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newsgrab::config::Config;

mod commands;

#[derive(Parser)]
#[command(
    name = "newsgrab",
    version,
    about = "Universal news scraper for feeds, static pages and JavaScript-rendered pages",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); defaults to the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape articles from the given URLs (or the configured sources)
    Run {
        /// Source URLs
        urls: Vec<String>,

        /// Articles to keep per source
        #[arg(short, long)]
        limit: Option<usize>,

        /// Sync rows to the configured webhook after saving
        #[arg(long, default_value = "false")]
        sync: bool,

        /// Sources processed in parallel
        #[arg(short = 'j', long)]
        concurrency: Option<usize>,
    },

    /// Show how a URL would be classified
    Classify {
        /// URL to classify
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    let format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&format, &config.logging.level, cli.verbose)?;

    tracing::info!("newsgrab starting");

    match cli.command {
        Commands::Run {
            urls,
            limit,
            sync,
            concurrency,
        } => {
            tracing::info!(
                urls = urls.len(),
                limit = ?limit,
                sync = %sync,
                concurrency = ?concurrency,
                "Starting run command"
            );
            commands::run(
                config,
                commands::RunParams {
                    urls,
                    limit,
                    sync,
                    concurrency,
                },
            )
            .await?;
        }

        Commands::Classify { url } => {
            tracing::info!(url = %url, "Starting classify command");
            commands::classify(config, url).await?;
        }
    }

    tracing::info!("newsgrab completed");
    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("newsgrab=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("newsgrab={level},warn")))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
