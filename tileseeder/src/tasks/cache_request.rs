//! Task that caches one backend response (tile or legend).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::backend::{FetchError, HttpClient};
use crate::cache::cache_request;
use crate::executor::{RetryPolicy, Task};

/// Fetches a URL into a cache file through [`cache_request`].
pub struct CacheRequestTask {
    name: String,
    client: Arc<dyn HttpClient>,
    url: String,
    path: PathBuf,
    retry: RetryPolicy,
}

impl CacheRequestTask {
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

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Task for CacheRequestTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.retry.clone()
    }

    fn run(&self) -> Result<u64, FetchError> {
        cache_request(self.client.as_ref(), &self.url, &self.path)
    }
}
