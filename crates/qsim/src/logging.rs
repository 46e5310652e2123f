//! Logging setup.
//!
//! Every run writes its own `qsimlog-<timestamp>.txt` into the configured log
//! directory. Stderr gets warnings only, or everything at info with `-v`.
//! The TUI turns the stderr layer off so it does not draw over the screen.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Where log output goes for this run.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Directory for the per-run log file; `None` disables the file.
    pub dir: Option<PathBuf>,
    /// Emit info-level events on stderr.
    pub verbose: bool,
    /// Keep stderr quiet entirely (TUI mode).
    pub quiet: bool,
}

/// Keeps the file writer alive; drop it to flush.
pub struct LogHandle {
    pub path: Option<PathBuf>,
    _guard: Option<WorkerGuard>,
}

/// `qsimlog-2026-10-15T093012.123456.txt`
pub fn log_file_name(now: DateTime<Local>) -> String {
    format!("qsimlog-{}.txt", now.format("%Y-%m-%dT%H%M%S%.6f"))
}

pub fn init_logging(options: &LogOptions) -> Result<LogHandle> {
    let (file_layer, guard, path) = match &options.dir {
        Some(dir) => {
            let (layer, guard, path) = file_layer(dir)?;
            (Some(layer), Some(guard), Some(path))
        }
        None => (None, None, None),
    };

    let stderr_layer = if options.quiet {
        None
    } else {
        let level = if options.verbose { "info" } else { "warn" };
        Some(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(EnvFilter::new(level)),
        )
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if let Some(path) = &path {
        tracing::debug!(path = %path.display(), "Logging to file");
    }

    Ok(LogHandle {
        path,
        _guard: guard,
    })
}

#[allow(clippy::type_complexity)]
fn file_layer(
    dir: &Path,
) -> Result<(
    Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>,
    WorkerGuard,
    PathBuf,
)> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let name = log_file_name(Local::now());
    let appender = tracing_appender::rolling::never(dir, &name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(filter)
        .boxed();

    Ok((layer, guard, dir.join(name)))
}
