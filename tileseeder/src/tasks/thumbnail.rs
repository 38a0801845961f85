//! Task that renders and stores a layer thumbnail.
//!
//! Unlike tiles, a thumbnail is decoded before it is written so that an OGC
//! exception document served with status 200 never ends up in the cache.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageFormat;
use roxmltree::Document;
use tracing::debug;

use crate::backend::{FetchError, HttpClient, MAX_ERROR_BODY};
use crate::executor::{RetryPolicy, Task};

pub struct ThumbnailTask {
    name: String,
    client: Arc<dyn HttpClient>,
    url: String,
    path: PathBuf,
    retry: RetryPolicy,
}

impl ThumbnailTask {
    pub fn new(
        name: impl Into<String>,
        client: Arc<dyn HttpClient>,
        url: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            client,
            url: url.into(),
            path: path.into(),
            retry: RetryPolicy::fetch_default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn invalid(&self, reason: impl Into<String>) -> FetchError {
        FetchError::InvalidImage {
            url: self.url.clone(),
            reason: reason.into(),
        }
    }

    fn io_error(&self, source: io::Error) -> FetchError {
        FetchError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Task for ThumbnailTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.retry.clone()
    }

    fn run(&self) -> Result<u64, FetchError> {
        let mut response = self.client.get(&self.url)?;
        let mut body = Vec::new();

        if !response.is_success() {
            let _ = response
                .body
                .by_ref()
                .take(MAX_ERROR_BODY as u64)
                .read_to_end(&mut body);
            return Err(FetchError::status(&self.url, response.status, &body));
        }

        response
            .body
            .read_to_end(&mut body)
            .map_err(|e| FetchError::Connection {
                url: self.url.clone(),
                message: format!("failed to read response: {}", e),
            })?;

        if let Some(report) = service_exception(&body) {
            return Err(self.invalid(report));
        }
        let image = image::load_from_memory(&body).map_err(|e| self.invalid(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let file = File::create(&self.path).map_err(|e| self.io_error(e))?;
        let mut writer = BufWriter::new(file);
        image
            .write_to(&mut writer, ImageFormat::Png)
            .map_err(|e| match e {
                image::ImageError::IoError(source) => self.io_error(source),
                other => self.invalid(other.to_string()),
            })?;
        writer.flush().map_err(|e| self.io_error(e))?;

        let written = fs::metadata(&self.path)
            .map(|m| m.len())
            .map_err(|e| self.io_error(e))?;
        debug!(
            path = %self.path.display(),
            width = image.width(),
            height = image.height(),
            bytes = written,
            "Thumbnail written"
        );
        Ok(written)
    }
}

/// Returns the exception text if `body` is an OGC exception document.
fn service_exception(body: &[u8]) -> Option<String> {
    let head = String::from_utf8_lossy(&body[..body.len().min(MAX_ERROR_BODY)]);
    if !head.trim_start().starts_with('<') || !head.contains("ServiceException") {
        return None;
    }
    let message = std::str::from_utf8(body).ok().and_then(|text| {
        let doc = Document::parse(text.trim_start()).ok()?;
        doc.descendants()
            .find(|n| n.is_element() && n.tag_name().name() == "ServiceException")
            .and_then(|n| n.text())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    });
    Some(message.unwrap_or_else(|| "service exception report".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockHttpClient;
    use image::{ImageBuffer, Rgba};
    use std::io::Cursor;
    use tempfile::TempDir;

    const EXCEPTION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ServiceExceptionReport version="1.3.0" xmlns="http://www.opengis.net/ogc">
 <ServiceException code="LayerNotDefined">Layer 'roads' does not exist</ServiceException>
</ServiceExceptionReport>"#;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgba([10u8, 20, 30, 255]));
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    fn task(client: MockHttpClient, path: &Path) -> ThumbnailTask {
        ThumbnailTask::new("thumbnail roads", Arc::new(client), "http://qgis/thumb", path)
            .with_retry(RetryPolicy::None)
    }

    #[test]
    fn test_writes_decoded_png() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("thumbs/roads.png");
        let client = MockHttpClient::default().route("thumb", 200, &png(24, 18));

        let written = task(client, &path).run().unwrap();
        assert!(written > 0);
        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (24, 18));
    }

    #[test]
    fn test_replaces_existing_thumbnail() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("roads.png");
        fs::write(&path, png(2, 2)).unwrap();

        let client = MockHttpClient::default().route("thumb", 200, &png(8, 6));
        task(client, &path).run().unwrap();
        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (8, 6));
    }

    #[test]
    fn test_exception_report_is_invalid_image() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("roads.png");
        let client = MockHttpClient::default().route("thumb", 200, EXCEPTION.as_bytes());

        let err = task(client, &path).run().unwrap_err();
        match err {
            FetchError::InvalidImage { reason, .. } => {
                assert_eq!(reason, "Layer 'roads' does not exist");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_garbage_is_invalid_image() {
        let temp = TempDir::new().unwrap();
        let client = MockHttpClient::default().route("thumb", 200, b"definitely not a png");
        let err = task(client, &temp.path().join("t.png")).run().unwrap_err();
        assert!(matches!(err, FetchError::InvalidImage { .. }));
    }

    #[test]
    fn test_status_error() {
        let temp = TempDir::new().unwrap();
        let client = MockHttpClient::default().route("thumb", 503, b"overloaded");
        let err = task(client, &temp.path().join("t.png")).run().unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_service_exception_detection() {
        assert!(service_exception(&png(1, 1)).is_none());
        assert_eq!(
            service_exception(b"<ServiceExceptionReport/>").as_deref(),
            Some("service exception report")
        );
    }
}
