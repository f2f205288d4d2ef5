//! mediacquire - paginated media listing acquisition tool.
//!
//! Crawls paginated listings for embedded media assets and downloads them
//! concurrently into type-classified storage.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediacquire::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "mediacquire=info"
    } else {
        "mediacquire=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Run CLI
    cli::run().await
}
