//! Page fetching strategies for listing pages.
//!
//! Static HTML and rendered-DOM fetching are two implementations of one
//! capability; the crawl loop is written against the [`PageFetcher`] trait
//! and the strategy is selected by configuration.

#[cfg(feature = "browser")]
mod browser;
mod http;

#[cfg(feature = "browser")]
pub use browser::BrowserFetcher;
pub use http::HttpFetcher;

use async_trait::async_trait;
use thiserror::Error;

/// Soft failures from a single page retrieval.
///
/// None of these abort a crawl; the pagination driver folds them into its
/// consecutive-failure accounting.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request exceeded its deadline, or a rendered page never produced
    /// the configured marker element.
    #[error("request timed out")]
    Timeout,

    /// Connection, DNS, or TLS failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("HTTP status {0}")]
    HttpStatus(u16),
}

impl FetchError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// Retrieves raw page content for a URL.
///
/// Implementations perform a single bounded-timeout retrieval and classify
/// failures; retry policy belongs to callers.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the content of a single page.
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError>;

    /// Release any resources held by the fetcher (e.g. a browser process).
    async fn shutdown(&self) {}
}
