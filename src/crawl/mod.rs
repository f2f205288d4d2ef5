//! Pagination driver: sequential page crawl with deduplication.
//!
//! Pages are fetched and extracted one at a time, so the dedup registry
//! needs no synchronization. Every stop reason returns the accumulated
//! collection; none of them is an error.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use rand::Rng;
use tracing::{info, warn};
use url::Url;

use crate::extract::extract;
use crate::fetch::PageFetcher;
use crate::models::MediaItem;
use crate::utils::{with_page_param, CancelToken};

/// Crawl-loop tuning knobs.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Pagination ceiling.
    pub max_pages: u32,
    /// Back-to-back fetch failures that stop the crawl.
    pub failure_threshold: u32,
    /// Lower bound of the randomized polite delay between pages (ms).
    pub page_delay_min_ms: u64,
    /// Upper bound of the randomized polite delay between pages (ms).
    pub page_delay_max_ms: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 100,
            failure_threshold: 3,
            page_delay_min_ms: 1000,
            page_delay_max_ms: 3000,
        }
    }
}

/// Why a crawl stopped. Diagnostic, never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A successfully fetched page produced zero new items - the primary,
    /// expected termination path.
    NoNewMedia,
    /// Consecutive fetch failures reached the threshold.
    TooManyFailures,
    /// The pagination ceiling was reached.
    MaxPagesReached,
    /// The listing URL had no page parameter; one pass was performed.
    SinglePage,
    /// An external cancellation request ended the crawl.
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            StopReason::NoNewMedia => "no new media",
            StopReason::TooManyFailures => "too many consecutive failures",
            StopReason::MaxPagesReached => "max pages reached",
            StopReason::SinglePage => "single page",
            StopReason::Cancelled => "cancelled",
        };
        f.write_str(reason)
    }
}

/// Result of a crawl: the deduplicated collection plus diagnostics.
#[derive(Debug)]
pub struct CrawlOutcome {
    /// Deduplicated media items in discovery order.
    pub items: Vec<MediaItem>,
    /// Why the crawl stopped.
    pub stop_reason: StopReason,
    /// Number of successfully fetched pages.
    pub pages_visited: u32,
}

/// Sequential crawler over a paginated listing.
pub struct Crawler {
    fetcher: Arc<dyn PageFetcher>,
    config: CrawlConfig,
    cancel: CancelToken,
}

impl Crawler {
    /// Create a new crawler over the given fetching strategy.
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: CrawlConfig, cancel: CancelToken) -> Self {
        Self {
            fetcher,
            config,
            cancel,
        }
    }

    /// Crawl the listing.
    ///
    /// A listing URL carrying a `page` query parameter enables pagination
    /// mode; otherwise exactly one fetch/extract pass runs. Only an invalid
    /// listing URL is an error - fetch failures are folded into the stop
    /// decision.
    pub async fn crawl(&self, listing_url: &str) -> anyhow::Result<CrawlOutcome> {
        let start = Url::parse(listing_url)
            .with_context(|| format!("invalid listing URL: {listing_url}"))?;

        let paginated = start.query_pairs().any(|(key, _)| key == "page");
        if paginated {
            self.crawl_paginated(&start).await
        } else {
            self.crawl_single(&start).await
        }
    }

    /// One fetch/extract pass for listings without a page parameter.
    async fn crawl_single(&self, start: &Url) -> anyhow::Result<CrawlOutcome> {
        info!("Scraping single page: {}", start);

        let mut seen = HashSet::new();
        let mut items = Vec::new();
        let mut pages_visited = 0;

        match self.fetcher.fetch_page(start.as_str()).await {
            Ok(html) => {
                pages_visited = 1;
                for item in extract(&html, start.as_str(), start.as_str()) {
                    if seen.insert(item.url.clone()) {
                        items.push(item);
                    }
                }
                info!("Found {} media items", items.len());
            }
            Err(e) => warn!("Failed to fetch {}: {}", start, e),
        }

        Ok(CrawlOutcome {
            items,
            stop_reason: StopReason::SinglePage,
            pages_visited,
        })
    }

    /// The pagination loop: fetch, extract, dedup, decide.
    async fn crawl_paginated(&self, start: &Url) -> anyhow::Result<CrawlOutcome> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut items: Vec<MediaItem> = Vec::new();
        let mut consecutive_failures = 0u32;
        let mut pages_visited = 0u32;
        let mut stop_reason = StopReason::MaxPagesReached;

        for page in 1..=self.config.max_pages {
            if self.cancel.is_cancelled() {
                info!("Crawl cancelled at page {}", page);
                stop_reason = StopReason::Cancelled;
                break;
            }

            let page_url = with_page_param(start, page);

            let html = match self.fetcher.fetch_page(page_url.as_str()).await {
                Ok(html) => html,
                Err(e) => {
                    consecutive_failures += 1;
                    warn!(
                        "Page {} fetch failed ({} consecutive): {}",
                        page, consecutive_failures, e
                    );
                    if consecutive_failures >= self.config.failure_threshold {
                        info!("Stopping due to consecutive page fetch failures");
                        stop_reason = StopReason::TooManyFailures;
                        break;
                    }
                    continue;
                }
            };

            pages_visited += 1;
            consecutive_failures = 0;

            let mut new_count = 0usize;
            for item in extract(&html, page_url.as_str(), page_url.as_str()) {
                if seen.insert(item.url.clone()) {
                    items.push(item);
                    new_count += 1;
                }
            }

            if new_count == 0 {
                info!("No new media found on page {}, stopping pagination", page);
                stop_reason = StopReason::NoNewMedia;
                break;
            }

            info!("Found {} new media items on page {}", new_count, page);

            if page < self.config.max_pages {
                self.polite_delay().await;
            }
        }

        Ok(CrawlOutcome {
            items,
            stop_reason,
            pages_visited,
        })
    }

    /// Randomized delay between successful page transitions. Bounds request
    /// rate; has no correctness effect.
    async fn polite_delay(&self) {
        let (min, max) = (self.config.page_delay_min_ms, self.config.page_delay_max_ms);
        let wait = if max > min {
            rand::thread_rng().gen_range(min..=max)
        } else {
            min
        };
        if wait > 0 {
            tokio::time::sleep(Duration::from_millis(wait)).await;
        }
    }
}
