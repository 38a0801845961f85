//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and the exit code.

use std::fmt;
use std::path::PathBuf;
use std::process;

use tileseeder::backend::{EndpointError, FetchError};
use tileseeder::config::ConfigFileError;
use tileseeder::layer::CatalogError;
use tileseeder::seeder::SeedError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file could not be read or is invalid
    Config(ConfigFileError),
    /// QGIS Server URL is unusable
    Endpoint(EndpointError),
    /// Layer catalog could not be opened or the layer is unknown
    Catalog(CatalogError),
    /// HTTP client could not be built
    Client(FetchError),
    /// Task queue runtime could not start
    Queue(std::io::Error),
    /// Seeding aborted
    Seed(SeedError),
    /// Cache maintenance failed
    Cache { path: PathBuf, error: std::io::Error },
}

impl CliError {
    /// Exit the process with an error message and code 1.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Seed(SeedError::Task(e))
                if e.fetch_error().is_some_and(FetchError::is_connection) =>
            {
                eprintln!();
                eprintln!("Check that QGIS Server is running and that [qgis_server] url");
                eprintln!("in the config file points at its OWS endpoint.");
            }
            CliError::Catalog(CatalogError::NotFound(_))
            | CliError::Seed(SeedError::LayerNotFound(_)) => {
                eprintln!();
                eprintln!("Run 'tileseeder layers list' to see the known layers.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Endpoint(e) => write!(f, "Configuration error: {}", e),
            CliError::Catalog(e) => write!(f, "{}", e),
            CliError::Client(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Queue(e) => write!(f, "Failed to start task queue: {}", e),
            CliError::Seed(e) => write!(f, "Seeding failed: {}", e),
            CliError::Cache { path, error } => {
                write!(f, "Cache operation failed at '{}': {}", path.display(), error)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Endpoint(e) => Some(e),
            CliError::Catalog(e) => Some(e),
            CliError::Client(e) => Some(e),
            CliError::Queue(e) => Some(e),
            CliError::Seed(e) => Some(e),
            CliError::Cache { error, .. } => Some(error),
            CliError::LoggingInit(_) => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<EndpointError> for CliError {
    fn from(e: EndpointError) -> Self {
        CliError::Endpoint(e)
    }
}

impl From<CatalogError> for CliError {
    fn from(e: CatalogError) -> Self {
        CliError::Catalog(e)
    }
}

impl From<SeedError> for CliError {
    fn from(e: SeedError) -> Self {
        CliError::Seed(e)
    }
}

impl From<tileseeder::Error> for CliError {
    fn from(e: tileseeder::Error) -> Self {
        match e {
            tileseeder::Error::Config(e) => CliError::Config(e),
            tileseeder::Error::Endpoint(e) => CliError::Endpoint(e),
            tileseeder::Error::Catalog(e) => CliError::Catalog(e),
            tileseeder::Error::Seed(e) => CliError::Seed(e),
            tileseeder::Error::Fetch(e) => CliError::Client(e),
            tileseeder::Error::Io(e) => CliError::Queue(e),
        }
    }
}
