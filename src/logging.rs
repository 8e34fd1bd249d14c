//! Logging setup.
//!
//! While the TUI owns the terminal, log lines go to a file; otherwise they go
//! to stderr so stdout stays clean for JSON output. The level comes from
//! `RUST_LOG` and defaults to `info`.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Where log output is written.
#[derive(Debug, Clone, Copy)]
pub enum LogTarget<'a> {
    /// Append to a file (TUI mode).
    File(&'a Path),
    /// Write to stderr (headless and export modes).
    Stderr,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// The returned guard flushes buffered file output when dropped; keep it
/// alive for the lifetime of the program.
pub fn init(target: LogTarget<'_>) -> Result<Option<WorkerGuard>> {
    match target {
        LogTarget::File(path) => {
            let dir = match path.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir,
                _ => Path::new("."),
            };
            let file_name = path
                .file_name()
                .with_context(|| format!("Invalid log file: {}", path.display()))?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_filter(env_filter()),
                )
                .try_init()
                .context("Logging already initialised")?;
            Ok(Some(guard))
        }
        LogTarget::Stderr => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_filter(env_filter()),
                )
                .try_init()
                .context("Logging already initialised")?;
            Ok(None)
        }
    }
}
