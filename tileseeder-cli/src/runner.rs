//! CLI runner for common setup.
//!
//! Loads the config file, initializes logging and wires the seeder's
//! collaborators so command handlers stay short.

use std::path::{Path, PathBuf};

use tileseeder::config::{resolve_config_path, ConfigFile};
use tileseeder::layer::{DirectoryCatalog, Layer, LayerCatalog};
use tileseeder::logging::{init_logging, LoggingGuard};
use tileseeder::seeder::TileSeeder;
use tracing::info;

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Keeps the log writer alive while the runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    config: ConfigFile,
    config_path: PathBuf,
}

impl CliRunner {
    /// Load the config at `config_path` (or the default path) and start logging.
    ///
    /// With `debug`, library events are logged at debug level and mirrored to stderr.
    pub fn new(config_path: Option<&Path>, debug: bool) -> Result<Self, CliError> {
        let config_path = resolve_config_path(config_path);
        let config = ConfigFile::load_from(&config_path)?;

        let logging_guard = init_logging(&config.logging.file, debug, debug)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
            config_path,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("tileseeder v{}", tileseeder::VERSION);
        info!(config = %self.config_path.display(), "tileseeder CLI: {} command", command);
    }

    pub fn catalog(&self) -> Result<DirectoryCatalog, CliError> {
        Ok(DirectoryCatalog::open(&self.config.catalog.directory)?)
    }

    /// Resolve a single layer from the configured catalog.
    pub fn layer(&self, name: &str) -> Result<Layer, CliError> {
        Ok(self.catalog()?.resolve(name)?)
    }

    /// Build a seeder backed by QGIS Server over HTTP and a fresh task queue.
    pub fn seeder(&self) -> Result<TileSeeder, CliError> {
        Ok(TileSeeder::from_config(&self.config)?)
    }
}
