//! Configuration for the seeder.
//!
//! Settings are read from an INI file (`~/.tileseeder/config.ini` by default).
//! Missing files and missing keys fall back to the values in [`defaults`].
//!
//! # Example
//!
//! ```
//! use tileseeder::config::ConfigFile;
//!
//! let config = ConfigFile::default();
//! assert_eq!(config.queue.workers, 4);
//! let options = config.seed_options();
//! assert_eq!((options.min_zoom, options.max_zoom), (10, 12));
//! ```

pub mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use file::{resolve_config_path, ConfigFileError};
pub use settings::{
    CacheSettings, CatalogSettings, ConfigFile, LoggingSettings, QgisServerSettings,
    QueueSettings, SeedSettings, ThumbnailSettings,
};
