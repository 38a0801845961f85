//! Crate-level error type.
//!
//! Each module defines its own error enum; [`Error`] gathers them for
//! callers that drive several modules at once, such as the CLI.

use thiserror::Error;

pub use crate::backend::{EndpointError, FetchError};
pub use crate::config::ConfigFileError;
pub use crate::coord::CoordError;
pub use crate::executor::{QueueClosed, TaskError};
pub use crate::layer::{CatalogError, QlrError};
pub use crate::seeder::SeedError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigFileError),

    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Seed(#[from] SeedError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True when the layer name did not resolve.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::Catalog(CatalogError::NotFound(_)) | Error::Seed(SeedError::LayerNotFound(_))
        )
    }
}
