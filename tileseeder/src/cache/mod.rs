//! On-disk tile, legend and thumbnail cache.
//!
//! - [`CacheLayout`] maps cache keys to file paths
//! - [`cache_request`] fetches one URL into one cache file
//! - [`clear_layer`] and [`layer_stats`] manage a layer's entries

mod fetch;
mod layout;
mod maintenance;

pub use fetch::cache_request;
pub use layout::{sanitize_segment, CacheLayout, LEGEND_FILE};
pub use maintenance::{clear_layer, layer_stats, CacheStats};
