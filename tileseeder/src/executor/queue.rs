//! Worker pool draining a bounded task channel.
//!
//! The queue owns its own tokio runtime so synchronous callers can submit
//! work and block on the result. Task bodies are blocking and run on the
//! runtime's blocking pool; retry delays are async sleeps that end early
//! on shutdown.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::runtime::Runtime;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::task::{Task, TaskError};

/// Default number of workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Default channel capacity.
pub const DEFAULT_CAPACITY: usize = 256;

/// How long dropping the queue waits for running tasks.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Result delivered to a [`TaskHandle`].
pub type TaskResult = Result<u64, TaskError>;

#[derive(Debug, Error)]
#[error("task queue is shut down")]
pub struct QueueClosed;

/// Queue sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    pub workers: usize,
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

struct Envelope {
    task: Arc<dyn Task>,
    reply: oneshot::Sender<TaskResult>,
}

/// Waits for one submitted task.
#[derive(Debug)]
pub struct TaskHandle {
    name: String,
    rx: oneshot::Receiver<TaskResult>,
}

impl TaskHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Blocks the calling thread until the task finishes.
    ///
    /// Must not be called from inside an async context.
    pub fn wait(self) -> TaskResult {
        self.rx
            .blocking_recv()
            .unwrap_or(Err(TaskError::Lost { task: self.name }))
    }
}

/// Fixed pool of workers executing [`Task`]s with retries.
pub struct TaskQueue {
    runtime: Option<Runtime>,
    sender: mpsc::Sender<Envelope>,
    shutdown: CancellationToken,
    submitted: AtomicU64,
}

impl TaskQueue {
    pub fn new(config: QueueConfig) -> std::io::Result<Self> {
        let workers = config.workers.max(1);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(workers)
            .thread_name("tileseeder-queue")
            .enable_time()
            .build()?;

        let (sender, receiver) = mpsc::channel::<Envelope>(config.capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        let shutdown = CancellationToken::new();

        for id in 0..workers {
            runtime.spawn(worker(id, Arc::clone(&receiver), shutdown.clone()));
        }
        info!(workers, capacity = config.capacity, "Task queue started");

        Ok(Self {
            runtime: Some(runtime),
            sender,
            shutdown,
            submitted: AtomicU64::new(0),
        })
    }

    /// Enqueues a task, blocking while the channel is full.
    ///
    /// Must not be called from inside an async context.
    pub fn submit<T: Task>(&self, task: T) -> Result<TaskHandle, QueueClosed> {
        self.submit_arc(Arc::new(task))
    }

    pub fn submit_arc(&self, task: Arc<dyn Task>) -> Result<TaskHandle, QueueClosed> {
        if self.shutdown.is_cancelled() {
            return Err(QueueClosed);
        }
        let name = task.name().to_string();
        let (reply, rx) = oneshot::channel();
        self.sender
            .blocking_send(Envelope { task, reply })
            .map_err(|_| QueueClosed)?;
        self.submitted.fetch_add(1, Ordering::Relaxed);
        debug!(task = %name, "Task submitted");
        Ok(TaskHandle { name, rx })
    }

    /// Number of tasks accepted since the queue started.
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    /// Stops the workers and waits briefly for running tasks.
    ///
    /// Tasks still queued are dropped and their handles report
    /// [`TaskError::Lost`].
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.shutdown.cancel();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_timeout(SHUTDOWN_GRACE);
            info!(submitted = self.submitted(), "Task queue stopped");
        }
    }
}

impl Drop for TaskQueue {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn worker(
    id: usize,
    receiver: Arc<Mutex<mpsc::Receiver<Envelope>>>,
    shutdown: CancellationToken,
) {
    loop {
        let next = tokio::select! {
            biased;
            _ = shutdown.cancelled() => None,
            envelope = async { receiver.lock().await.recv().await } => envelope,
        };
        let Some(Envelope { task, reply }) = next else {
            break;
        };

        let result = run_with_retry(task, &shutdown).await;
        // The waiter may have given up; nothing to do then.
        let _ = reply.send(result);
    }
    debug!(worker = id, "Worker exiting");
}

async fn run_with_retry(task: Arc<dyn Task>, shutdown: &CancellationToken) -> TaskResult {
    let policy = task.retry_policy();
    let name = task.name().to_string();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let runner = Arc::clone(&task);
        let outcome = tokio::task::spawn_blocking(move || runner.run()).await;

        let error = match outcome {
            Ok(Ok(bytes)) => {
                debug!(task = %name, attempt, bytes, "Task succeeded");
                return Ok(bytes);
            }
            Ok(Err(error)) => error,
            Err(join_error) => {
                warn!(task = %name, error = %join_error, "Task panicked");
                return Err(TaskError::Lost { task: name });
            }
        };

        let delay = if error.is_retryable() {
            policy.delay_for_attempt(attempt)
        } else {
            None
        };
        let Some(delay) = delay else {
            return Err(TaskError::Fetch {
                task: name,
                attempts: attempt,
                source: error,
            });
        };

        warn!(
            task = %name,
            attempt,
            max_attempts = policy.max_attempts(),
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Task failed, retrying"
        );
        tokio::select! {
            _ = shutdown.cancelled() => return Err(TaskError::Cancelled { task: name }),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
