//! Domain models for discovered media assets.

mod media;

pub use media::{MediaCategory, MediaItem};
