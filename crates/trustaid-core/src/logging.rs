//! Logging setup.
//!
//! The TUI owns the terminal, so interactive sessions log to a file in the
//! user's data directory; one-shot commands log to stderr.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "TRUSTAID_LOG";
pub const LOG_FILE_NAME: &str = "trustaid.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// Append to `trustaid.log` inside this directory.
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub filter: String,
    pub target: LogTarget,
}

impl LogConfig {
    pub fn new(filter: impl Into<String>, target: LogTarget) -> Self {
        Self {
            filter: filter.into(),
            target,
        }
    }

    /// Filter from `TRUSTAID_LOG` (default `info`).
    pub fn from_env(target: LogTarget) -> Self {
        let filter = std::env::var(LOG_ENV).unwrap_or_else(|_| "info".to_string());
        Self::new(filter, target)
    }
}

/// Directory used for the interactive log file.
pub fn default_log_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow!("Could not determine data directory"))?;
    Ok(data_dir.join("trustaid"))
}

/// Install the global subscriber.
///
/// Keep the returned guard alive for the life of the process; dropping it
/// stops the background file writer.
pub fn setup_logging(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| anyhow!("invalid log filter {:?}: {}", config.filter, e))?;

    match &config.target {
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| anyhow!("failed to install logger: {}", e))?;
            Ok(None)
        }
        LogTarget::File(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|e| anyhow!("failed to install logger: {}", e))?;
            Ok(Some(guard))
        }
    }
}
