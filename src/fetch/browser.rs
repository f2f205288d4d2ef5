//! Rendered-DOM fetcher for JS-heavy listings.
//!
//! Drives a headless Chromium instance over CDP, waits for the page (and an
//! optional marker element) to render, and reads the resulting DOM.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{FetchError, PageFetcher};
use crate::config::BrowserSettings;

/// How often the marker-element wait re-queries the DOM.
const MARKER_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Script that resolves once the document has loaded enough to query.
const READY_STATE_SCRIPT: &str = r#"
    new Promise((resolve) => {
        if (document.readyState === 'complete' || document.readyState === 'interactive') {
            resolve(document.readyState);
        } else {
            document.addEventListener('DOMContentLoaded', () => resolve(document.readyState));
            setTimeout(() => resolve('timeout'), 10000);
        }
    })
"#;

/// Fetches listing pages through a browser, returning the rendered DOM.
///
/// The browser is launched lazily on the first fetch and reused for the rest
/// of the crawl.
pub struct BrowserFetcher {
    settings: BrowserSettings,
    browser: Mutex<Option<Browser>>,
}

impl BrowserFetcher {
    /// Create a new browser fetcher. The browser process is not started
    /// until the first page is requested.
    pub fn new(settings: BrowserSettings) -> Self {
        Self {
            settings,
            browser: Mutex::new(None),
        }
    }

    /// Launch or connect to a browser per the configured settings.
    async fn start_browser(settings: &BrowserSettings) -> Result<Browser, FetchError> {
        if let Some(ref remote_url) = settings.remote_url {
            info!("Connecting to remote browser at {}", remote_url);
            let (browser, mut handler) = Browser::connect(remote_url.clone())
                .await
                .map_err(|e| FetchError::Transport(format!("browser connect failed: {e}")))?;
            tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });
            return Ok(browser);
        }

        info!("Launching browser (headless={})", settings.headless);

        let mut builder = BrowserConfig::builder();
        if !settings.headless {
            builder = builder.with_head();
        }
        builder = builder
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox") // Often needed for headless in containers/restricted environments
            .arg("--disable-gpu"); // Recommended for headless
        for arg in &settings.chrome_args {
            builder = builder.arg(arg);
        }

        let config = builder
            .build()
            .map_err(|e| FetchError::Transport(format!("browser config failed: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::Transport(format!("browser launch failed: {e}")))?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(browser)
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let mut guard = self.browser.lock().await;
        if guard.is_none() {
            *guard = Some(Self::start_browser(&self.settings).await?);
        }
        let browser = match guard.as_ref() {
            Some(browser) => browser,
            None => return Err(FetchError::Transport("browser unavailable".to_string())),
        };

        debug!("Navigating to {}", url);
        let page = browser
            .new_page(url)
            .await
            .map_err(|e| FetchError::Transport(format!("navigation failed: {e}")))?;

        let timeout = Duration::from_secs(self.settings.timeout_secs);

        // Wait for the document to be queryable before looking for markers.
        match tokio::time::timeout(timeout, page.evaluate(READY_STATE_SCRIPT.to_string())).await {
            Ok(Ok(result)) => {
                let state: String = result
                    .into_value()
                    .unwrap_or_else(|_| "unknown".to_string());
                debug!("Page ready state: {}", state);
            }
            Ok(Err(e)) => {
                // Script execution can fail on non-HTML responses.
                debug!("Could not check ready state: {}", e);
            }
            Err(_) => {
                warn!("Timeout waiting for page ready state");
            }
        }

        // Wait for the marker element if one is configured; a page that never
        // produces it is treated as a timeout, not as content.
        if let Some(ref selector) = self.settings.wait_for_selector {
            debug!("Waiting for selector: {}", selector);
            let deadline = Instant::now() + timeout;
            loop {
                if page.find_element(selector.as_str()).await.is_ok() {
                    break;
                }
                if Instant::now() >= deadline {
                    warn!("Marker {:?} never appeared on {}", selector, url);
                    let _ = page.close().await;
                    return Err(FetchError::Timeout);
                }
                tokio::time::sleep(MARKER_POLL_INTERVAL).await;
            }
        }

        let content = page
            .content()
            .await
            .map_err(|e| FetchError::Transport(format!("could not read page content: {e}")))?;

        // Close the page to prevent tab accumulation.
        let _ = page.close().await;

        Ok(content)
    }

    async fn shutdown(&self) {
        let mut guard = self.browser.lock().await;
        if let Some(mut browser) = guard.take() {
            debug!("Closing browser");
            let _ = browser.close().await;
        }
    }
}
