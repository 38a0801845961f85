//! Default values and paths for all configuration settings.

use std::path::PathBuf;

pub use crate::backend::{
    DEFAULT_STYLE, DEFAULT_THUMBNAIL_HEIGHT, DEFAULT_THUMBNAIL_WIDTH, DEFAULT_TIMEOUT_SECS,
};
pub use crate::executor::DEFAULT_WORKERS;
pub use crate::seeder::{DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM};

pub const DEFAULT_QGIS_SERVER_URL: &str = "http://localhost:8080/ows/";

/// Retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

pub const DEFAULT_RETRY_DELAY_SECS: u64 = 5;

pub const DEFAULT_LOG_FILE: &str = "tileseeder.log";

pub const CONFIG_DIR_NAME: &str = ".tileseeder";
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Get the path to the config directory (~/.tileseeder).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Get the path to the config file (~/.tileseeder/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

/// Root of the default tile and thumbnail cache.
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("tileseeder"))
        .unwrap_or_else(|| config_directory().join("cache"))
}
