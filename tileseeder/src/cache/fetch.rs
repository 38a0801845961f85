//! Fetch one backend URL into one cache file.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::backend::{FetchError, HttpClient, MAX_ERROR_BODY};

const COPY_BUFFER: usize = 64 * 1024;

/// Fetches `url` and writes the body to `path`, replacing any existing file.
///
/// The body is streamed into a temporary file next to `path` and renamed
/// over it once complete, so readers only ever see the old entry or the
/// full new one.
///
/// # Arguments
///
/// * `client` - HTTP client used for the GET request
/// * `url` - Fully built backend request URL
/// * `path` - Cache file to create or replace; missing parents are created
///
/// # Returns
///
/// The number of body bytes written.
///
/// # Errors
///
/// * [`FetchError::Status`] for a non-2xx answer; the cache is left untouched
/// * [`FetchError::Connection`] when the request fails or the body stream
///   breaks before its end; the existing entry is kept
/// * [`FetchError::Io`] when the cache directory or file cannot be written
pub fn cache_request(client: &dyn HttpClient, url: &str, path: &Path) -> Result<u64, FetchError> {
    let mut response = client.get(url)?;

    if !response.is_success() {
        let mut body = Vec::with_capacity(MAX_ERROR_BODY);
        let _ = response
            .body
            .by_ref()
            .take(MAX_ERROR_BODY as u64)
            .read_to_end(&mut body);
        return Err(FetchError::status(url, response.status, &body));
    }

    let io_err = |source: io::Error| FetchError::Io {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(io_err)?;

    let mut staged = NamedTempFile::new_in(parent).map_err(io_err)?;
    let written = stream_body(&mut response.body, staged.as_file_mut(), url, path)?;
    staged.persist(path).map_err(|e| io_err(e.error))?;

    debug!(url = %url, path = %path.display(), bytes = written, "Cached response");
    Ok(written)
}

/// Copies `body` into `file`, keeping read failures apart from write failures.
fn stream_body(
    body: &mut dyn Read,
    file: &mut fs::File,
    url: &str,
    path: &Path,
) -> Result<u64, FetchError> {
    let mut buffer = vec![0u8; COPY_BUFFER];
    let mut written = 0u64;
    loop {
        let n = match body.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(FetchError::Connection {
                    url: url.to_string(),
                    message: format!("response body interrupted after {written} bytes: {e}"),
                })
            }
        };
        file.write_all(&buffer[..n]).map_err(|source| FetchError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        written += n as u64;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{HttpResponse, MockHttpClient};
    use tempfile::TempDir;

    #[test]
    fn test_writes_body_and_creates_dirs() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("roads/default/1/0/0.png");
        let client = MockHttpClient::default().route("tile", 200, b"PNGDATA");

        let written = cache_request(&client, "http://qgis/tile", &path).unwrap();
        assert_eq!(written, 7);
        assert_eq!(fs::read(&path).unwrap(), b"PNGDATA");
    }

    #[test]
    fn test_overwrites_existing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("legend/default.png");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"an older and much longer legend image").unwrap();

        let client = MockHttpClient::default().route("legend", 200, b"new");
        cache_request(&client, "http://qgis/legend", &path).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn test_status_error_leaves_cache_untouched() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("roads/0/0/0.png");
        let client = MockHttpClient::default().route("tile", 500, b"render failed");

        let err = cache_request(&client, "http://qgis/tile", &path).unwrap_err();
        match err {
            FetchError::Status { status, body, .. } => {
                assert_eq!(status, 500);
                assert_eq!(body, "render failed");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!path.exists());
        assert!(!temp.path().join("roads").exists());
    }

    #[test]
    fn test_connection_error_propagates() {
        let temp = TempDir::new().unwrap();
        let client = MockHttpClient::refusing();
        let err = cache_request(&client, "http://qgis/tile", &temp.path().join("t.png"))
            .unwrap_err();
        assert!(err.is_connection());
    }

    #[test]
    fn test_unwritable_target_is_io_error() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("roads");
        fs::write(&blocker, b"a file where a directory should be").unwrap();

        let client = MockHttpClient::default().route("tile", 200, b"png");
        let err = cache_request(&client, "http://qgis/tile", &blocker.join("0/0/0.png"))
            .unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
    }

    /// Yields a prefix of the body, then fails as a dropped connection would.
    struct BrokenBody {
        prefix: Option<&'static [u8]>,
    }

    impl Read for BrokenBody {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.prefix.take() {
                Some(prefix) => {
                    buf[..prefix.len()].copy_from_slice(prefix);
                    Ok(prefix.len())
                }
                None => Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset mid-body")),
            }
        }
    }

    struct BrokenBodyClient;

    impl HttpClient for BrokenBodyClient {
        fn get(&self, _url: &str) -> Result<HttpResponse, FetchError> {
            Ok(HttpResponse::new(
                200,
                BrokenBody {
                    prefix: Some(b"PART"),
                },
            ))
        }
    }

    #[test]
    fn test_broken_body_keeps_existing_tile() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("roads/default/1/0");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("0.png");
        fs::write(&path, b"GOOD-OLD-TILE").unwrap();

        let err = cache_request(&BrokenBodyClient, "http://qgis/tile", &path).unwrap_err();

        assert!(err.is_connection(), "unexpected {err:?}");
        assert!(err.to_string().contains("after 4 bytes"));
        assert_eq!(fs::read(&path).unwrap(), b"GOOD-OLD-TILE");
        let leftovers: Vec<_> = fs::read_dir(&dir).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_broken_body_leaves_no_partial_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("roads/default/1/0/0.png");

        let err = cache_request(&BrokenBodyClient, "http://qgis/tile", &path).unwrap_err();

        assert!(err.is_connection());
        assert!(!path.exists());
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 0);
    }
}
