//! Task trait and task errors.

use thiserror::Error;

use super::policy::RetryPolicy;
use crate::backend::FetchError;

/// A blocking unit of work run by the [`TaskQueue`](super::TaskQueue).
///
/// `run` may be called more than once when the retry policy allows it,
/// so implementations must be idempotent.
pub trait Task: Send + Sync + 'static {
    /// Short description for logs, e.g. `tile roads 12/3265/2120`.
    fn name(&self) -> &str;

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::None
    }

    /// Runs one attempt. Returns the number of bytes cached.
    fn run(&self) -> Result<u64, FetchError>;
}

/// Why a task did not succeed.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The last attempt failed.
    #[error("{task} failed after {attempts} attempt(s): {source}")]
    Fetch {
        task: String,
        attempts: u32,
        #[source]
        source: FetchError,
    },

    /// The task panicked or its worker went away before replying.
    #[error("{task} was lost before completing")]
    Lost { task: String },

    /// The queue shut down while the task was waiting to retry.
    #[error("{task} was cancelled")]
    Cancelled { task: String },
}

impl TaskError {
    pub fn fetch_error(&self) -> Option<&FetchError> {
        match self {
            Self::Fetch { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn into_fetch_error(self) -> Result<FetchError, Self> {
        match self {
            Self::Fetch { source, .. } => Ok(source),
            other => Err(other),
        }
    }

    pub fn task(&self) -> &str {
        match self {
            Self::Fetch { task, .. } | Self::Lost { task } | Self::Cancelled { task } => task,
        }
    }
}
