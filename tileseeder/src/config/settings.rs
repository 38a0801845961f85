//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.

use std::path::PathBuf;
use std::time::Duration;

use super::defaults::*;
use crate::backend::{EndpointError, QgisServerUrls};
use crate::cache::CacheLayout;
use crate::executor::{Backoff, QueueConfig, RetryPolicy, DEFAULT_CAPACITY};
use crate::seeder::SeedOptions;

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub qgis_server: QgisServerSettings,
    pub cache: CacheSettings,
    pub catalog: CatalogSettings,
    pub queue: QueueSettings,
    pub seed: SeedSettings,
    pub thumbnail: ThumbnailSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QgisServerSettings {
    /// OWS endpoint, e.g. `http://localhost:8080/ows/`
    pub url: String,
    /// Request timeout in seconds
    pub timeout: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    pub tiles_directory: PathBuf,
    pub thumbnails_directory: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSettings {
    /// Directory of `.qlr` files and an optional `layers.json`
    pub directory: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueSettings {
    pub workers: usize,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Seconds before the first retry
    pub retry_delay: u64,
    /// Whether the delay stays fixed or doubles per retry
    pub backoff: Backoff,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeedSettings {
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub style: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailSettings {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub file: PathBuf,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            qgis_server: QgisServerSettings {
                url: DEFAULT_QGIS_SERVER_URL.to_string(),
                timeout: DEFAULT_TIMEOUT_SECS,
            },
            cache: CacheSettings {
                tiles_directory: default_cache_root().join("tiles"),
                thumbnails_directory: default_cache_root().join("thumbnails"),
            },
            catalog: CatalogSettings {
                directory: config_directory().join("layers"),
            },
            queue: QueueSettings {
                workers: DEFAULT_WORKERS,
                max_retries: DEFAULT_MAX_RETRIES,
                retry_delay: DEFAULT_RETRY_DELAY_SECS,
                backoff: Backoff::default(),
            },
            seed: SeedSettings {
                min_zoom: DEFAULT_MIN_ZOOM,
                max_zoom: DEFAULT_MAX_ZOOM,
                style: DEFAULT_STYLE.to_string(),
            },
            thumbnail: ThumbnailSettings {
                width: DEFAULT_THUMBNAIL_WIDTH,
                height: DEFAULT_THUMBNAIL_HEIGHT,
            },
            logging: LoggingSettings {
                file: config_directory().join(DEFAULT_LOG_FILE),
            },
        }
    }
}

impl ConfigFile {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_retries(
            self.queue.max_retries,
            Duration::from_secs(self.queue.retry_delay),
            self.queue.backoff,
        )
    }

    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            workers: self.queue.workers,
            capacity: DEFAULT_CAPACITY,
        }
    }

    pub fn cache_layout(&self) -> CacheLayout {
        CacheLayout::new(
            &self.cache.tiles_directory,
            &self.cache.thumbnails_directory,
        )
    }

    pub fn server_urls(&self) -> Result<QgisServerUrls, EndpointError> {
        Ok(QgisServerUrls::new(&self.qgis_server.url)?
            .with_thumbnail_size(self.thumbnail.width, self.thumbnail.height))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.qgis_server.timeout)
    }

    /// Seed options from the `[seed]` and `[queue]` sections.
    pub fn seed_options(&self) -> SeedOptions {
        SeedOptions {
            min_zoom: self.seed.min_zoom,
            max_zoom: self.seed.max_zoom,
            style: self.seed.style.clone(),
            thumbnail_bbox: None,
            no_input: false,
            retry: self.retry_policy(),
        }
    }
}
