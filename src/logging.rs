//! Logging setup for the command-line tool.
//!
//! - Writes JSON lines to `<root>/logs/mnenv.log`, filtered by `MNENV_LOG`
//!   (default `info`)
//! - Prints warnings and errors to stderr in a compact format
//! - Falls back to stderr only when the log file cannot be opened

use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, fmt};

use crate::config::{LOG_ENV, Layout};

/// Filter applied to the log file when `MNENV_LOG` is unset or invalid
const DEFAULT_FILE_FILTER: &str = "info";

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard flushes and closes the log file writer.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Install the global subscriber.
///
/// Never fails: problems with the log file are reported on stderr and
/// logging continues without it.
pub fn init(layout: &Layout) -> LoggingGuard {
    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .with_filter(LevelFilter::WARN);

    let (file_layer, file_guard) = match open_log_file(&layout.log_dir(), layout.log_file_name()) {
        Ok((writer, guard)) => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .json()
                .with_filter(file_filter(std::env::var(LOG_ENV).ok().as_deref()));
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!(
                "warning: cannot write log file under {}: {e}",
                layout.log_dir().display()
            );
            (None, None)
        }
    };

    let result = tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init();
    if let Err(e) = result {
        eprintln!("warning: logging already initialized: {e}");
    }

    LoggingGuard {
        _file_guard: file_guard,
    }
}

fn open_log_file(
    log_dir: &Path,
    file_name: &str,
) -> io::Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(log_dir)?;
    let appender = tracing_appender::rolling::RollingFileAppender::builder()
        .rotation(tracing_appender::rolling::Rotation::NEVER)
        .filename_prefix(file_name)
        .build(log_dir)
        .map_err(io::Error::other)?;
    Ok(tracing_appender::non_blocking(appender))
}

/// File filter from the `MNENV_LOG` value, falling back to `info`
fn file_filter(value: Option<&str>) -> EnvFilter {
    value
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILE_FILTER))
}
