//! In-process task queue.
//!
//! Work is submitted as [`Task`]s to a [`TaskQueue`], which runs them on a
//! fixed worker pool, retries retryable failures per [`RetryPolicy`], and
//! hands the result back through a blocking [`TaskHandle`].

mod policy;
mod queue;
mod task;

pub use policy::{
    Backoff, RetryPolicy, DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_FETCH_ATTEMPTS,
    DEFAULT_FETCH_DELAY_SECS, DEFAULT_MAX_DELAY_SECS,
};
pub use queue::{
    QueueClosed, QueueConfig, TaskHandle, TaskQueue, TaskResult, DEFAULT_CAPACITY,
    DEFAULT_WORKERS,
};
pub use task::{Task, TaskError};
