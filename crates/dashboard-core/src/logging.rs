//! File logging.
//!
//! Logs go to a daily rolling file in `<base>/logs/`; stdout and stderr stay
//! reserved for command output.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::{Config, paths};

/// Environment variable overriding the configured log filter.
pub const LOG_ENV: &str = "DASHBOARD_LOG";
const LOG_FILE_PREFIX: &str = "dashboard.log";

/// Resolves the filter: `DASHBOARD_LOG`, then `[log] level`, then `info`.
pub fn filter_for(config: &Config) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&config.log.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber writing to `<base>/logs`.
///
/// The returned guard must be held until exit so buffered lines are flushed.
///
/// # Errors
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init(config: &Config) -> Result<WorkerGuard> {
    init_in(&paths::logs_dir(), config)
}

/// Same as [`init`] with an explicit directory.
///
/// # Errors
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init_in(log_dir: &Path, config: &Config) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter_for(config))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .try_init()
        .context("Failed to install log subscriber")?;

    tracing::debug!(log_dir = %log_dir.display(), "logging initialized");
    Ok(guard)
}
