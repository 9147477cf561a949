//! Page retrieval
//!
//! The monitor engine depends only on the [`PageFetcher`] trait;
//! [`HttpFetcher`] is the production implementation.

pub mod fetcher;

pub use fetcher::{decode_body, HttpFetcher, PageFetcher};
