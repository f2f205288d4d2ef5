//! Bounded-concurrency download scheduler.
//!
//! A fixed pool of workers drains a shared queue of media items, routing
//! each file into its category subdirectory. Separated from UI concerns -
//! progress is reported through an event channel.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

use crate::models::MediaItem;
use crate::utils::CancelToken;

/// Events emitted during download operations.
#[derive(Debug, Clone)]
pub enum DownloadEvent {
    /// Download started for a URL.
    Started { worker_id: usize, url: String },
    /// Download completed successfully.
    Completed { worker_id: usize, url: String },
    /// Destination already present; nothing fetched.
    Skipped { worker_id: usize, url: String },
    /// All attempts exhausted.
    Failed {
        worker_id: usize,
        url: String,
        error: String,
    },
}

/// Result of a single item's download.
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    /// The item's canonical URL.
    pub url: String,
    /// Whether the file is present on disk after the run.
    pub success: bool,
    /// Final destination path when successful.
    pub path: Option<PathBuf>,
    /// Error detail when failed.
    pub error: Option<String>,
}

/// Aggregated result of a download run.
#[derive(Debug, Default)]
pub struct DownloadReport {
    /// Files actually fetched this run.
    pub downloaded: usize,
    /// Files skipped because the destination already existed.
    pub skipped: usize,
    /// Items that exhausted every attempt.
    pub failed: usize,
    /// Per-item outcomes in completion order.
    pub outcomes: Vec<DownloadOutcome>,
}

impl DownloadReport {
    /// URLs of permanently failed items, for the end-of-run report.
    pub fn failed_urls(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|outcome| !outcome.success)
            .map(|outcome| outcome.url.clone())
            .collect()
    }
}

/// Configuration for the download scheduler.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Number of concurrent workers.
    pub concurrency: usize,
    /// Attempts per item before recording a failure.
    pub max_attempts: u32,
    /// Base of the exponential backoff between attempts.
    pub backoff_base: Duration,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// User agent sent with asset requests.
    pub user_agent: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            max_attempts: 3,
            backoff_base: Duration::from_secs(2),
            request_timeout: Duration::from_secs(20),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64)".to_string(),
        }
    }
}

/// What happened to one item, before aggregation.
enum ItemResult {
    Downloaded(PathBuf),
    Skipped(PathBuf),
    Failed(String),
}

/// Service for downloading a finalized collection of media items.
pub struct DownloadScheduler {
    client: Client,
    config: DownloadConfig,
    cancel: CancelToken,
}

impl DownloadScheduler {
    /// Create a new scheduler. The HTTP client is shared by all workers.
    pub fn new(config: DownloadConfig, cancel: CancelToken) -> Self {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            config,
            cancel,
        }
    }

    /// Download every item into `output_root/<Category>/<filename>`.
    ///
    /// One item's failure never blocks or aborts siblings; cancellation lets
    /// in-flight items finish and drains the rest unprocessed.
    pub async fn download_all(
        &self,
        items: Vec<MediaItem>,
        output_root: &Path,
        event_tx: mpsc::Sender<DownloadEvent>,
    ) -> DownloadReport {
        let queue = Arc::new(Mutex::new(VecDeque::from(items)));
        let outcomes = Arc::new(Mutex::new(Vec::new()));
        let downloaded = Arc::new(AtomicUsize::new(0));
        let skipped = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::with_capacity(self.config.concurrency);

        for worker_id in 0..self.config.concurrency {
            let queue = queue.clone();
            let outcomes = outcomes.clone();
            let downloaded = downloaded.clone();
            let skipped = skipped.clone();
            let failed = failed.clone();
            let client = self.client.clone();
            let config = self.config.clone();
            let cancel = self.cancel.clone();
            let output_root = output_root.to_path_buf();
            let event_tx = event_tx.clone();

            let handle = tokio::spawn(async move {
                loop {
                    if cancel.is_cancelled() {
                        break;
                    }

                    let item = { queue.lock().await.pop_front() };
                    let item = match item {
                        Some(item) => item,
                        None => break,
                    };

                    let _ = event_tx
                        .send(DownloadEvent::Started {
                            worker_id,
                            url: item.url.clone(),
                        })
                        .await;

                    let result =
                        download_item(&client, &config, &item, &output_root, &cancel).await;

                    let outcome = match result {
                        ItemResult::Downloaded(path) => {
                            downloaded.fetch_add(1, Ordering::Relaxed);
                            let _ = event_tx
                                .send(DownloadEvent::Completed {
                                    worker_id,
                                    url: item.url.clone(),
                                })
                                .await;
                            DownloadOutcome {
                                url: item.url,
                                success: true,
                                path: Some(path),
                                error: None,
                            }
                        }
                        ItemResult::Skipped(path) => {
                            skipped.fetch_add(1, Ordering::Relaxed);
                            let _ = event_tx
                                .send(DownloadEvent::Skipped {
                                    worker_id,
                                    url: item.url.clone(),
                                })
                                .await;
                            DownloadOutcome {
                                url: item.url,
                                success: true,
                                path: Some(path),
                                error: None,
                            }
                        }
                        ItemResult::Failed(error) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                            warn!("Failed to download {}: {}", item.url, error);
                            let _ = event_tx
                                .send(DownloadEvent::Failed {
                                    worker_id,
                                    url: item.url.clone(),
                                    error: error.clone(),
                                })
                                .await;
                            DownloadOutcome {
                                url: item.url,
                                success: false,
                                path: None,
                                error: Some(error),
                            }
                        }
                    };

                    outcomes.lock().await.push(outcome);
                }
            });

            handles.push(handle);
        }

        for handle in handles {
            let _ = handle.await;
        }

        let outcomes = {
            let mut guard = outcomes.lock().await;
            std::mem::take(&mut *guard)
        };

        DownloadReport {
            downloaded: downloaded.load(Ordering::Relaxed),
            skipped: skipped.load(Ordering::Relaxed),
            failed: failed.load(Ordering::Relaxed),
            outcomes,
        }
    }
}

/// Download one item with retries, or skip it when already present.
async fn download_item(
    client: &Client,
    config: &DownloadConfig,
    item: &MediaItem,
    output_root: &Path,
    cancel: &CancelToken,
) -> ItemResult {
    let category_dir = output_root.join(item.category.dir_name());
    let dest = category_dir.join(&item.filename);

    // Assets are immutable once fetched: an existing destination is complete.
    if dest.exists() {
        debug!("Already present, skipping: {}", dest.display());
        return ItemResult::Skipped(dest);
    }

    if let Err(e) = std::fs::create_dir_all(&category_dir) {
        return ItemResult::Failed(e.to_string());
    }

    // Stream into a partial file and rename on success, so cancellation or a
    // crash never leaves a truncated destination.
    let part = category_dir.join(format!("{}.part", item.filename));

    let mut last_error = String::new();
    for attempt in 0..config.max_attempts {
        if cancel.is_cancelled() {
            return ItemResult::Failed("cancelled before completion".to_string());
        }

        match fetch_to_file(client, &item.url, &part, &dest).await {
            Ok(()) => return ItemResult::Downloaded(dest),
            Err(e) => {
                last_error = e.to_string();
                let _ = std::fs::remove_file(&part);
                if attempt + 1 < config.max_attempts {
                    let delay = backoff_delay(config.backoff_base, attempt);
                    debug!(
                        "Retry {}/{} for {} in {:?}: {}",
                        attempt + 1,
                        config.max_attempts,
                        item.url,
                        delay,
                        last_error
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    ItemResult::Failed(last_error)
}

/// Exponential backoff with jitter: base * 2^attempt plus up to one second.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..=1000));
    base * 2u32.saturating_pow(attempt) + jitter
}

/// Stream a URL's bytes to `part`, renaming to `dest` on success.
async fn fetch_to_file(
    client: &Client,
    url: &str,
    part: &Path,
    dest: &Path,
) -> anyhow::Result<()> {
    let mut response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("HTTP {}", status);
    }

    let mut file = tokio::fs::File::create(part).await?;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    drop(file);

    tokio::fs::rename(part, dest).await?;
    Ok(())
}
