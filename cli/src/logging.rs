//! Tracing setup: JSON lines on stderr, optionally mirrored to a daily
//! rotated log file.

use anyhow::{Context, Result};
use linodemcp_domain::config::SystemSettings;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global subscriber. `RUST_LOG` wins over `system.log_level`.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the process.
pub fn init(settings: &SystemSettings) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.as_str()));

    let stderr_layer = fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_current_span(false);

    let (file_layer, guard) = match log_file_target(&settings.log_file) {
        Some((dir, prefix)) => {
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(prefix)
                .max_log_files(settings.log_max_backups.max(1) as usize)
                .build(&dir)
                .with_context(|| format!("opening log file in {}", dir.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_ansi(false)
                .with_current_span(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("installing tracing subscriber")?;

    Ok(guard)
}

/// Split `log_file` into the directory and file-name prefix for the appender.
fn log_file_target(log_file: &str) -> Option<(PathBuf, String)> {
    let log_file = log_file.trim();
    if log_file.is_empty() {
        return None;
    }
    let path = Path::new(log_file);
    let prefix = path.file_name()?.to_string_lossy().into_owned();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Some((dir, prefix))
}
