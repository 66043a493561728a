//! Structured logging to the console and a rotating log file.

use std::path::PathBuf;

use anyhow::Context;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Rotated log files kept on disk.
const MAX_LOG_FILES: usize = 7;

/// Log directory: `<data dir>/logs`.
pub fn log_dir() -> PathBuf {
    crate::config::data_dir().join("logs")
}

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `info`, or `debug` with
/// `verbose` (which also surfaces daemon output under the `daemon` target).
pub fn init(verbose: bool) -> anyhow::Result<PathBuf> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    let dir = log_dir();
    std::fs::create_dir_all(&dir).context("failed to create log directory")?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("clash-tray")
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(&dir)
        .context("failed to create log file appender")?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false),
        )
        .init();

    Ok(dir)
}
