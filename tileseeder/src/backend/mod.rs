//! Rendering backend access.
//!
//! The seeder talks to QGIS Server over plain HTTP through the
//! [`HttpClient`] trait; [`QgisServerUrls`] builds the OGC requests.

mod error;
mod http;
mod urls;

pub use error::{FetchError, MAX_ERROR_BODY};
pub use http::{HttpClient, HttpResponse, ReqwestClient, DEFAULT_TIMEOUT_SECS};
pub use urls::{
    EndpointError, QgisServerUrls, DEFAULT_STYLE, DEFAULT_THUMBNAIL_HEIGHT,
    DEFAULT_THUMBNAIL_WIDTH, TILE_SIZE,
};

#[cfg(test)]
pub(crate) use http::tests::MockHttpClient;
