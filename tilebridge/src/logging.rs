//! Logging infrastructure.
//!
//! Sets up structured `tracing` output to both a log file and stdout:
//! - The log file is truncated at the start of each run
//! - File output is plain, stdout output is colored
//! - Level filtering honors `RUST_LOG`, defaulting to `info`

use std::fs;
use std::io;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

/// Logging setup failures.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Could not prepare the log directory or file.
    #[error("Failed to prepare log file: {0}")]
    Io(#[from] io::Error),

    /// A global subscriber is already installed.
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard will flush and close the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the global subscriber.
///
/// Creates the log directory if needed, clears the previous log file and
/// installs file and stdout layers.
///
/// # Errors
///
/// Returns an error if the log file cannot be prepared or if a global
/// subscriber has already been set.
pub fn init_logging(settings: &LoggingSettings) -> Result<LoggingGuard, LoggingError> {
    fs::create_dir_all(&settings.directory)?;

    let log_path = settings.directory.join(&settings.file);
    fs::write(&log_path, "")?;

    let file_appender = tracing_appender::rolling::never(&settings.directory, &settings.file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_ansi(true)
        .compact();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}
