//! Logging initialization and configuration.
//!
//! Logs are written to files under `~/.agent-shell/logs/` so they never mix
//! with command output on the console. Each run gets its own file.
//!
//! # Configuration
//!
//! The log level can be controlled via the `RUST_LOG` environment variable:
//! - `RUST_LOG=debug` - Show debug and higher level logs
//! - `RUST_LOG=info` - Show info and higher level logs
//! - `RUST_LOG=warn` - Show warnings and errors only (default)
//!
//! Without `RUST_LOG`, the `log_level` config key (or `--verbose`) decides.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::app_dir;

/// Level used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_LEVEL: &str = "warn";

pub fn log_dir() -> PathBuf {
    app_dir().join("logs")
}

/// File name for a run started now, e.g. `agent-shell.2024-12-06-14-30-25.log`.
fn log_file_name() -> String {
    let timestamp = Local::now().format("%Y-%m-%d-%H-%M-%S");
    format!("agent-shell.{}.log", timestamp)
}

/// Initialize the logging system.
///
/// Failures to set up the log file are reported on stderr and leave logging
/// disabled; they never stop the program.
pub fn init_logging(default_level: Option<&str>) {
    init_logging_in(&log_dir(), default_level.unwrap_or(DEFAULT_LEVEL));
}

fn init_logging_in(log_dir: &Path, default_level: &str) {
    if let Err(e) = fs::create_dir_all(log_dir) {
        eprintln!("Warning: Failed to create logs directory: {}", e);
        return;
    }

    let log_path = log_dir.join(log_file_name());
    let log_file = match fs::File::create(&log_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Warning: Failed to create log file: {}", e);
            return;
        }
    };

    // Use non-blocking writer so logging never stalls command output
    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if let Err(e) = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
    {
        eprintln!("Warning: Failed to install log subscriber: {}", e);
        return;
    }

    // The guard must live as long as the program or buffered lines are lost.
    std::mem::forget(guard);

    tracing::info!("Logging initialized - writing to {}", log_path.display());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_name_shape() {
        let name = log_file_name();
        assert!(name.starts_with("agent-shell."));
        assert!(name.ends_with(".log"));
    }

    #[test]
    fn test_init_creates_log_file() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        let logs = dir.path().join("logs");
        init_logging_in(&logs, "info");
        let files = fs::read_dir(&logs)?.count();
        assert_eq!(files, 1);
        Ok(())
    }
}
