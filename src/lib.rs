//! mediacquire - paginated media listing acquisition.
//!
//! Crawls a paginated content listing, extracts references to embedded media
//! assets with their descriptive metadata, deduplicates them across pages,
//! and downloads them concurrently into type-classified storage. Metadata is
//! persisted as JSON and CSV for downstream catalog consumers.

pub mod cli;
pub mod config;
pub mod crawl;
pub mod download;
pub mod extract;
pub mod fetch;
pub mod models;
pub mod persist;
pub mod utils;
