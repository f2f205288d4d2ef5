//! CLI parser and command dispatch.

mod commands;
mod progress;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{FetchStrategy, Settings};
use crate::utils::CancelToken;

#[derive(Parser)]
#[command(name = "media")]
#[command(about = "Paginated media listing acquisition tool")]
#[command(version)]
pub struct Cli {
    /// Config file path (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a listing, persist metadata, and download the discovered media
    Scrape {
        /// Listing URL; a `page` query parameter enables pagination mode
        url: String,

        /// Output directory root for downloaded assets
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of concurrent download workers
        #[arg(long)]
        concurrency: Option<usize>,

        /// Pagination ceiling
        #[arg(long)]
        max_pages: Option<u32>,

        /// Page-fetching strategy
        #[arg(long, value_enum)]
        fetch: Option<FetchStrategy>,

        /// CSS selector that must appear before a rendered page is read
        #[arg(long)]
        wait_for: Option<String>,

        /// Only crawl and persist metadata; skip downloading
        #[arg(long)]
        no_download: bool,
    },

    /// Download assets from a previously persisted metadata file
    Download {
        /// Metadata JSON path (defaults to the configured location)
        #[arg(short, long)]
        metadata: Option<PathBuf>,

        /// Output directory root for downloaded assets
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of concurrent download workers
        #[arg(long)]
        concurrency: Option<usize>,
    },
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// Parse arguments and run the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;

    // Finish in-flight work on interrupt instead of dying mid-write.
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received; finishing in-flight work");
                cancel.cancel();
            }
        });
    }

    match cli.command {
        Commands::Scrape {
            url,
            output,
            concurrency,
            max_pages,
            fetch,
            wait_for,
            no_download,
        } => {
            if let Some(output) = output {
                settings.output_root = output;
            }
            if let Some(concurrency) = concurrency {
                settings.concurrency = concurrency;
            }
            if let Some(max_pages) = max_pages {
                settings.max_pages = max_pages;
            }
            if let Some(fetch) = fetch {
                settings.fetch = fetch;
            }
            if let Some(wait_for) = wait_for {
                settings.browser.wait_for_selector = Some(wait_for);
            }
            settings.validate()?;
            commands::cmd_scrape(&settings, &url, no_download, cancel).await
        }
        Commands::Download {
            metadata,
            output,
            concurrency,
        } => {
            if let Some(output) = output {
                settings.output_root = output;
            }
            if let Some(concurrency) = concurrency {
                settings.concurrency = concurrency;
            }
            settings.validate()?;
            let metadata = metadata.unwrap_or_else(|| settings.metadata_json.clone());
            commands::cmd_download(&settings, &metadata, cancel).await
        }
    }
}
