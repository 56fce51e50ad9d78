//! Logging setup helpers.
//!
//! The SDK itself only emits `tracing` events; installing a subscriber is
//! the application's decision. These helpers wire the common setup: stdout
//! plus an optional daily-rolling log file.
//!
//! # Example Usage
//!
//! ```bash
//! # Debug only the rate limiter
//! RUST_LOG=nerdgraph_rust_sdk::rate_limiter=debug cargo run
//! ```

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Directory for rolled log files
    pub log_dir: PathBuf,
    /// File name prefix; files are rolled daily
    pub file_prefix: String,
    /// Also log to stdout (default: true)
    pub enable_stdout: bool,
    /// Fallback filter when RUST_LOG is unset
    pub default_level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            file_prefix: "app".to_string(),
            enable_stdout: true,
            default_level: "info".to_string(),
        }
    }
}

/// Install the global subscriber. Call once at startup.
///
/// Returns the guard that flushes the file writer; keep it alive for the
/// lifetime of the process.
pub fn init_logging(config: &LogConfig) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_level.clone()));

    let appender = RollingFileAppender::new(Rotation::DAILY, &config.log_dir, &config.file_prefix);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);
    let file_layer = fmt::layer().with_writer(file_writer).with_ansi(false);

    if config.enable_stdout {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(fmt::layer())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();
    }
    guard
}
