//! Logging configuration using the tracing ecosystem.
//!
//! Logs go to daily-rotated files, never stdout, so the TUI is not
//! corrupted by log output. The log level is configured through the
//! `RUST_LOG` environment variable.

use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Default log level if RUST_LOG is not set.
const DEFAULT_LOG_FILTER: &str = "issuedeck=info,warn";

/// Initialize the logging system.
///
/// Sets up tracing with a daily rotating file appender in the user's
/// local data directory and structured output including file/line
/// numbers and thread IDs.
///
/// # Log Directory
///
/// - Linux: `~/.local/share/issuedeck/logs/`
/// - macOS: `~/Library/Application Support/issuedeck/logs/`
/// - Windows: `C:\Users\<User>\AppData\Local\issuedeck\logs\`
///
/// # Errors
///
/// Returns an error if the log directory cannot be determined or created,
/// or if the tracing subscriber cannot be installed.
pub fn init() -> anyhow::Result<()> {
    let log_dir = get_log_directory()?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "issuedeck.log");

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let subscriber = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter);

    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "issuedeck starting up");
    tracing::debug!(log_dir = %log_dir.display(), "Log directory");

    Ok(())
}

/// Get the log directory path.
fn get_log_directory() -> anyhow::Result<PathBuf> {
    let base_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(base_dir.join("issuedeck").join("logs"))
}

/// Get the path where logs are stored, for display to users.
pub fn log_directory() -> Option<PathBuf> {
    get_log_directory().ok()
}

/// Log application shutdown.
pub fn shutdown() {
    tracing::info!("issuedeck shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_directory_has_expected_structure() {
        let dir = get_log_directory().unwrap();
        assert!(dir.ends_with("issuedeck/logs"));
    }

    #[test]
    fn test_log_directory_public_function() {
        let dir = log_directory();
        assert!(dir.is_some());
        assert!(dir.unwrap().ends_with("issuedeck/logs"));
    }
}
