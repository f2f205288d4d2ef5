//! Scrape and download command implementations.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use console::style;
use tokio::sync::mpsc;

use crate::config::{FetchStrategy, Settings};
use crate::crawl::{CrawlConfig, Crawler};
use crate::download::{DownloadConfig, DownloadEvent, DownloadScheduler};
use crate::fetch::{HttpFetcher, PageFetcher};
use crate::models::MediaItem;
use crate::persist;
use crate::utils::CancelToken;

use super::progress::DownloadProgress;

/// Crawl a listing, persist the metadata, and download the collection.
pub async fn cmd_scrape(
    settings: &Settings,
    url: &str,
    no_download: bool,
    cancel: CancelToken,
) -> anyhow::Result<()> {
    settings.ensure_output_root()?;

    let fetcher = build_fetcher(settings)?;

    println!("{} Crawling {}", style("→").cyan(), url);

    let crawler = Crawler::new(fetcher.clone(), crawl_config(settings), cancel.clone());
    let outcome = crawler.crawl(url).await?;
    fetcher.shutdown().await;

    println!(
        "{} {} unique media items found across {} pages ({})",
        style("✓").green(),
        outcome.items.len(),
        outcome.pages_visited,
        outcome.stop_reason
    );

    persist::write_metadata(&outcome.items, &settings.metadata_json, &settings.metadata_csv)?;
    println!(
        "  {} metadata written to {} and {}",
        style("→").dim(),
        settings.metadata_json.display(),
        settings.metadata_csv.display()
    );

    if outcome.items.is_empty() {
        println!("{} No media files to download", style("!").yellow());
        return Ok(());
    }
    if no_download {
        return Ok(());
    }

    run_downloads(settings, outcome.items, cancel).await
}

/// Download assets listed in a previously persisted metadata file.
pub async fn cmd_download(
    settings: &Settings,
    metadata: &Path,
    cancel: CancelToken,
) -> anyhow::Result<()> {
    settings.ensure_output_root()?;

    let items = persist::load_metadata(metadata)?;
    if items.is_empty() {
        println!(
            "{} No media items in {}",
            style("!").yellow(),
            metadata.display()
        );
        return Ok(());
    }

    run_downloads(settings, items, cancel).await
}

/// Drive the scheduler with a progress display and report the summary.
async fn run_downloads(
    settings: &Settings,
    items: Vec<MediaItem>,
    cancel: CancelToken,
) -> anyhow::Result<()> {
    let total = items.len();
    println!(
        "{} Starting {} download workers ({} items)",
        style("→").cyan(),
        settings.concurrency,
        total
    );

    let scheduler = DownloadScheduler::new(download_config(settings), cancel);

    let (event_tx, mut event_rx) = mpsc::channel::<DownloadEvent>(100);
    let progress = DownloadProgress::new(total as u64);
    let display = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            progress.handle(&event);
        }
        progress.finish();
    });

    let report = scheduler
        .download_all(items, &settings.output_root, event_tx)
        .await;
    let _ = display.await;

    let failed_urls = report.failed_urls();
    persist::write_failed_urls(&failed_urls, &settings.failed_list)?;

    println!(
        "{} Downloaded {}, skipped {} (already present), failed {}",
        if report.failed == 0 {
            style("✓").green()
        } else {
            style("!").yellow()
        },
        report.downloaded,
        report.skipped,
        report.failed
    );
    if !failed_urls.is_empty() {
        println!(
            "  {} failed URLs written to {}",
            style("→").dim(),
            settings.failed_list.display()
        );
    }

    Ok(())
}

/// Select the page-fetching strategy from configuration.
fn build_fetcher(settings: &Settings) -> anyhow::Result<Arc<dyn PageFetcher>> {
    match settings.fetch {
        FetchStrategy::Http => Ok(Arc::new(HttpFetcher::new(
            &settings.user_agent,
            Duration::from_secs(settings.page_timeout_secs),
        ))),
        FetchStrategy::Browser => {
            #[cfg(feature = "browser")]
            {
                Ok(Arc::new(crate::fetch::BrowserFetcher::new(
                    settings.browser.clone(),
                )))
            }
            #[cfg(not(feature = "browser"))]
            {
                anyhow::bail!(
                    "built without browser support; rebuild with --features browser or use --fetch http"
                )
            }
        }
    }
}

fn crawl_config(settings: &Settings) -> CrawlConfig {
    CrawlConfig {
        max_pages: settings.max_pages,
        failure_threshold: settings.failure_threshold,
        page_delay_min_ms: settings.page_delay_min_ms,
        page_delay_max_ms: settings.page_delay_max_ms,
    }
}

fn download_config(settings: &Settings) -> DownloadConfig {
    DownloadConfig {
        concurrency: settings.concurrency,
        max_attempts: settings.download_attempts,
        backoff_base: Duration::from_millis(settings.backoff_base_ms),
        request_timeout: Duration::from_secs(settings.download_timeout_secs),
        user_agent: settings.user_agent.clone(),
    }
}
