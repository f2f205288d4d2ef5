//! Shared utility functions.
//!
//! This module contains reusable utilities used across the codebase:
//! - `url`: reference resolution and collision-resistant filename derivation
//! - `cancel`: cooperative cancellation token

mod cancel;
mod url;

pub use cancel::CancelToken;
pub use url::{derive_filename, resolve, with_page_param};
