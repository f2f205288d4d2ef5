//! Configuration for crawling and downloading.
//!
//! Every retry/sleep constant the scraper relies on is a named field here,
//! loadable from an optional TOML file and overridable from the CLI.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Which page-fetching strategy to use for listing pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FetchStrategy {
    /// Plain HTTP GET of the static HTML.
    #[default]
    Http,
    /// Headless browser rendering (requires the `browser` feature).
    Browser,
}

/// Browser fetcher configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserSettings {
    /// Run in headless mode (default: true).
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Ceiling in seconds for page load and marker waits.
    #[serde(default = "default_browser_timeout_secs")]
    pub timeout_secs: u64,

    /// Wait for this CSS selector before reading the rendered DOM.
    /// A page that never produces it counts as a (soft) timeout.
    #[serde(default)]
    pub wait_for_selector: Option<String>,

    /// Remote Chrome DevTools WebSocket URL (e.g. "ws://localhost:9222").
    /// If set, connects to an existing browser instead of launching one.
    #[serde(default)]
    pub remote_url: Option<String>,

    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            timeout_secs: default_browser_timeout_secs(),
            wait_for_selector: None,
            remote_url: None,
            chrome_args: Vec::new(),
        }
    }
}

/// Crawl and download settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Root directory for downloaded assets, one subdirectory per category.
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// Path of the metadata JSON array.
    #[serde(default = "default_metadata_json")]
    pub metadata_json: PathBuf,

    /// Path of the metadata CSV.
    #[serde(default = "default_metadata_csv")]
    pub metadata_csv: PathBuf,

    /// Path of the plain-text list of permanently failed URLs.
    #[serde(default = "default_failed_list")]
    pub failed_list: PathBuf,

    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout in seconds for a static page fetch.
    #[serde(default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,

    /// Pagination ceiling.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Back-to-back page-fetch failures that stop the crawl.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Lower bound of the randomized polite delay between pages.
    #[serde(default = "default_page_delay_min_ms")]
    pub page_delay_min_ms: u64,

    /// Upper bound of the randomized polite delay between pages.
    #[serde(default = "default_page_delay_max_ms")]
    pub page_delay_max_ms: u64,

    /// Number of concurrent download workers.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Attempts per asset download before recording a failure.
    #[serde(default = "default_download_attempts")]
    pub download_attempts: u32,

    /// Base of the exponential retry backoff, in milliseconds.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Timeout in seconds for an asset download request.
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,

    /// Page-fetching strategy for listing pages.
    #[serde(default)]
    pub fetch: FetchStrategy,

    /// Browser configuration, used when `fetch = "browser"`.
    #[serde(default)]
    pub browser: BrowserSettings,
}

fn default_output_root() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_metadata_json() -> PathBuf {
    PathBuf::from("media_files.json")
}

fn default_metadata_csv() -> PathBuf {
    PathBuf::from("media_files.csv")
}

fn default_failed_list() -> PathBuf {
    PathBuf::from("failed_downloads.txt")
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64)".to_string()
}

fn default_page_timeout_secs() -> u64 {
    10
}

fn default_max_pages() -> u32 {
    100
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_page_delay_min_ms() -> u64 {
    1000
}

fn default_page_delay_max_ms() -> u64 {
    3000
}

fn default_concurrency() -> usize {
    5
}

fn default_download_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    2000
}

fn default_download_timeout_secs() -> u64 {
    20
}

pub(crate) fn default_headless() -> bool {
    true
}

pub(crate) fn default_browser_timeout_secs() -> u64 {
    20
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            metadata_json: default_metadata_json(),
            metadata_csv: default_metadata_csv(),
            failed_list: default_failed_list(),
            user_agent: default_user_agent(),
            page_timeout_secs: default_page_timeout_secs(),
            max_pages: default_max_pages(),
            failure_threshold: default_failure_threshold(),
            page_delay_min_ms: default_page_delay_min_ms(),
            page_delay_max_ms: default_page_delay_max_ms(),
            concurrency: default_concurrency(),
            download_attempts: default_download_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            download_timeout_secs: default_download_timeout_secs(),
            fetch: FetchStrategy::default(),
            browser: BrowserSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("could not read config file {}", path.display()))?;
                let settings: Settings = toml::from_str(&raw)
                    .with_context(|| format!("invalid config file {}", path.display()))?;
                Ok(settings)
            }
            None => Ok(Settings::default()),
        }
    }

    /// Reject configurations that cannot produce a meaningful run.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_pages == 0 {
            anyhow::bail!("max_pages must be at least 1");
        }
        if self.failure_threshold == 0 {
            anyhow::bail!("failure_threshold must be at least 1");
        }
        if self.concurrency == 0 {
            anyhow::bail!("concurrency must be at least 1");
        }
        if self.download_attempts == 0 {
            anyhow::bail!("download_attempts must be at least 1");
        }
        if self.page_delay_min_ms > self.page_delay_max_ms {
            anyhow::bail!(
                "page_delay_min_ms ({}) exceeds page_delay_max_ms ({})",
                self.page_delay_min_ms,
                self.page_delay_max_ms
            );
        }
        Ok(())
    }

    /// Create the output root and verify it is writable. Failures here are
    /// fatal and surface before any crawling starts.
    pub fn ensure_output_root(&self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.output_root).with_context(|| {
            format!(
                "could not create output root {}",
                self.output_root.display()
            )
        })?;

        let probe = self.output_root.join(".write_probe");
        fs::write(&probe, b"")
            .with_context(|| format!("output root {} is not writable", self.output_root.display()))?;
        let _ = fs::remove_file(&probe);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.max_pages, 100);
        assert_eq!(settings.failure_threshold, 3);
        assert_eq!(settings.concurrency, 5);
        assert_eq!(settings.download_attempts, 3);
        assert_eq!(settings.fetch, FetchStrategy::Http);
        assert!(settings.browser.headless);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let raw = r#"
            concurrency = 8
            fetch = "browser"

            [browser]
            wait_for_selector = "table"
        "#;
        let settings: Settings = toml::from_str(raw).unwrap();
        assert_eq!(settings.concurrency, 8);
        assert_eq!(settings.fetch, FetchStrategy::Browser);
        assert_eq!(settings.browser.wait_for_selector.as_deref(), Some("table"));
        // Untouched fields keep their defaults.
        assert_eq!(settings.max_pages, 100);
        assert_eq!(settings.browser.timeout_secs, 20);
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let settings = Settings {
            concurrency: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_delay_range() {
        let settings = Settings {
            page_delay_min_ms: 5000,
            page_delay_max_ms: 1000,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }
}
