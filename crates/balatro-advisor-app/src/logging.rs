//! Per-run file logging.
//!
//! Each launch writes one `<yyyymmdd_hhmmss>_log.txt` file next to the
//! executable. Events come from `tracing` across all workspace crates.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

use crate::config::ENV_LOG_FILTER;

/// Filter used when [`ENV_LOG_FILTER`] is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Logging setup errors.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Executable location could not be resolved.
    #[error("unable to resolve log directory: {0}")]
    Directory(String),
    /// Log file could not be created.
    #[error("unable to create log file '{path}': {source}")]
    File {
        /// Attempted path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// A global subscriber was already installed.
    #[error("logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Formats a UTC timestamp as `yyyymmdd_hhmmss`.
pub fn timestamp_compact(now: OffsetDateTime) -> String {
    format!(
        "{:04}{:02}{:02}_{:02}{:02}{:02}",
        now.year(),
        now.month() as u8,
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

/// File name of the run log started at `now`.
pub fn log_file_name(now: OffsetDateTime) -> String {
    format!("{}_log.txt", timestamp_compact(now))
}

/// Directory containing the running executable.
///
/// # Errors
/// Returns [`LoggingError::Directory`] when the path cannot be resolved.
pub fn executable_dir() -> Result<PathBuf, LoggingError> {
    let exe_path =
        std::env::current_exe().map_err(|error| LoggingError::Directory(error.to_string()))?;
    exe_path
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            LoggingError::Directory("executable parent directory is missing".to_string())
        })
}

/// Installs the global subscriber writing to a new log file in `dir`.
///
/// # Returns
/// Path of the created log file.
///
/// # Errors
/// Returns [`LoggingError`] when the file cannot be created or a subscriber is
/// already installed.
pub fn init_run_logging(dir: &Path) -> Result<PathBuf, LoggingError> {
    let path = dir.join(log_file_name(OffsetDateTime::now_utc()));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| LoggingError::File {
            path: path.clone(),
            source,
        })?;

    let filter = EnvFilter::try_from_env(ENV_LOG_FILTER)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|error| LoggingError::AlreadyInitialized(error.to_string()))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    //! Unit tests for log file naming.

    use super::*;

    #[test]
    fn log_file_name_is_sortable_timestamp() {
        // 2026-03-07 04:05:06 UTC
        let now = OffsetDateTime::from_unix_timestamp(1_772_856_306).expect("valid timestamp");
        assert_eq!(log_file_name(now), "20260307_040506_log.txt");
    }
}
