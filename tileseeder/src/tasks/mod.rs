//! Concrete tasks submitted by the seeder.
//!
//! - [`CacheRequestTask`] - tile or legend, streamed straight to disk
//! - [`ThumbnailTask`] - decoded and re-encoded as PNG

mod cache_request;
mod thumbnail;

pub use cache_request::CacheRequestTask;
pub use thumbnail::ThumbnailTask;
