//! Download progress display (UI layer over scheduler events).

use indicatif::{ProgressBar, ProgressStyle};

use crate::download::DownloadEvent;

/// Single progress bar over the whole download batch.
pub struct DownloadProgress {
    bar: ProgressBar,
}

impl DownloadProgress {
    /// Create a bar sized to the item count.
    pub fn new(total: u64) -> Self {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap()
            .progress_chars("#>-"),
        );
        Self { bar }
    }

    /// Advance the bar for a scheduler event.
    pub fn handle(&self, event: &DownloadEvent) {
        match event {
            DownloadEvent::Started { url, .. } => {
                self.bar.set_message(short_name(url));
            }
            DownloadEvent::Completed { .. } | DownloadEvent::Skipped { .. } => {
                self.bar.inc(1);
            }
            DownloadEvent::Failed { url, error, .. } => {
                self.bar.inc(1);
                self.bar.println(format!("failed: {url} ({error})"));
            }
        }
    }

    /// Clear the bar once the batch is done.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

/// Last path segment of a URL, for compact display.
fn short_name(url: &str) -> String {
    url.rsplit('/').next().unwrap_or(url).to_string()
}
