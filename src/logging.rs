//! # Logging Setup
//!
//! Installs the global `tracing` subscriber for the binaries.
//!
//! - Console output always, filtered by `RUST_LOG` or the configured level
//! - Optional daily rolling file in `[logging].dir`, written off-thread
//!
//! The returned [`WorkerGuard`] must be held until exit or buffered file
//! lines are lost.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{RelayError, Result};

/// File name prefix for rolling log files (`motion-relay.log.YYYY-MM-DD`).
pub const LOG_FILE_PREFIX: &str = "motion-relay.log";

/// Builds the filter: `RUST_LOG` when set and valid, otherwise `level`.
///
/// # Errors
///
/// Returns [`RelayError::InvalidConfig`] if `level` is not a valid directive.
pub fn build_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level)
        .map_err(|e| RelayError::InvalidConfig(format!("invalid log level '{}': {}", level, e)))
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns an error if the level is invalid or a subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = build_filter(&config.level)?;
    let console = fmt::layer().with_target(true);

    let (file, guard) = match &config.dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| RelayError::InvalidConfig(format!("logging already initialized: {}", e)))?;

    Ok(guard)
}
