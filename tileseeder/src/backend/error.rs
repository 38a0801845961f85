//! Errors raised while fetching from the rendering backend.

use std::path::PathBuf;

use thiserror::Error;

/// Maximum number of response body bytes kept in [`FetchError::Status`].
pub const MAX_ERROR_BODY: usize = 1024;

/// Errors raised by a fetch against the rendering backend.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The backend answered with a non-2xx status.
    #[error("HTTP {status} from {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// The backend could not be reached.
    #[error("connection to {url} failed: {message}")]
    Connection { url: String, message: String },

    /// The backend answered 200 with something that is not an image.
    #[error("invalid image from {url}: {reason}")]
    InvalidImage { url: String, reason: String },

    /// Writing the cache entry failed.
    #[error("cache write to {path} failed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// Builds a [`FetchError::Status`] from a raw error body, decoded as
    /// lossy UTF-8 and truncated to [`MAX_ERROR_BODY`] bytes.
    pub fn status(url: impl Into<String>, status: u16, body: &[u8]) -> Self {
        let end = body.len().min(MAX_ERROR_BODY);
        Self::Status {
            url: url.into(),
            status,
            body: String::from_utf8_lossy(&body[..end]).trim().to_string(),
        }
    }

    /// Whether the task queue may retry the request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Status { .. })
    }

    /// Whether the backend was unreachable.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// Failures that are counted and skipped rather than aborting a run.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::Status { .. } | Self::InvalidImage { .. })
    }
}
