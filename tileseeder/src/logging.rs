//! Logging infrastructure.
//!
//! Writes to a log file that is cleared at the start of each session, and
//! optionally mirrors events to stderr. `RUST_LOG` overrides the level.

use std::fs;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard will flush and close the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the global subscriber.
///
/// Creates the log file's directory if needed and truncates the file.
/// With `debug` the default level is `debug` instead of `info`. With
/// `stderr` events are also printed to the terminal.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or the file cannot be cleared.
pub fn init_logging(log_file: &Path, debug: bool, stderr: bool) -> Result<LoggingGuard, io::Error> {
    let log_dir = match log_file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let file_name = log_file
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "log path has no file name"))?;

    prepare_log_file(log_file)?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true);

    let stderr_layer = stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_ansi(true)
            .with_target(false)
            .compact()
    });

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(debug)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn default_level(debug: bool) -> &'static str {
    if debug {
        "tileseeder=debug,info"
    } else {
        "info"
    }
}

/// Create the log directory and truncate the log file.
fn prepare_log_file(log_file: &Path) -> io::Result<()> {
    if let Some(parent) = log_file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(log_file, "")
}
