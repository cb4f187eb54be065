//! Logging infrastructure.
//!
//! Dual output: a non-blocking file appender (cleared on session start)
//! plus stdout for terminal tailing. `RUST_LOG` overrides the configured
//! level filter.

use std::fs;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "mapcomposition.log";

/// Keeps the file writer alive; dropping it flushes and closes the log.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Create the log directory and truncate the previous session's file.
fn prepare_log_file(log_dir: &Path, log_file: &str) -> io::Result<()> {
    fs::create_dir_all(log_dir)?;
    fs::write(log_dir.join(log_file), "")
}

/// Initialize the global subscriber.
///
/// # Arguments
///
/// * `log_dir` - Directory for log files
/// * `log_file` - Log file name
/// * `default_level` - Filter used when `RUST_LOG` is not set
///
/// # Errors
///
/// Returns an error when the log directory or file cannot be prepared.
pub fn init_logging(
    log_dir: &Path,
    log_file: &str,
    default_level: &str,
) -> Result<LoggingGuard, io::Error> {
    prepare_log_file(log_dir, log_file)?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .compact();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_timer(LocalTime::rfc_3339())
        .with_ansi(true);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_prepare_log_file_creates_directory() {
        let dir = TempDir::new().unwrap();
        let log_dir = dir.path().join("logs/nested");

        prepare_log_file(&log_dir, DEFAULT_LOG_FILE).unwrap();
        assert!(log_dir.join(DEFAULT_LOG_FILE).is_file());
    }

    #[test]
    fn test_prepare_log_file_truncates_previous() {
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join(DEFAULT_LOG_FILE);
        fs::write(&log_path, "previous session").unwrap();

        prepare_log_file(dir.path(), DEFAULT_LOG_FILE).unwrap();
        assert_eq!(fs::read_to_string(&log_path).unwrap(), "");
    }
}
