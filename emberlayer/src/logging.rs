//! Tracing subscriber setup.
//!
//! Logs go to stderr, and additionally to a daily-rolling file when the
//! config names a log directory. `RUST_LOG` takes precedence over the
//! configured level.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingSection;

/// File name prefix for rolled log files.
pub const LOG_FILE_PREFIX: &str = "emberlayer.log";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log filter: {0}")]
    Filter(#[from] ParseError),

    #[error("Cannot create log directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Logging already initialized: {0}")]
    Init(#[from] TryInitError),
}

/// Keeps the background file writer alive. Dropping it flushes pending
/// records.
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug)]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Filter directive used when `RUST_LOG` is unset.
pub fn default_directive(section: &LoggingSection, verbose: bool) -> String {
    if verbose {
        "debug".to_string()
    } else {
        section.level.clone()
    }
}

/// Install the global subscriber.
pub fn init(section: &LoggingSection, verbose: bool) -> Result<LoggingGuard, LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directive(section, verbose))?,
    };

    let stderr = fmt::layer().with_writer(io::stderr).with_target(verbose);

    let (file, guard) = match section.directory {
        Some(ref dir) => {
            std::fs::create_dir_all(dir).map_err(|source| LoggingError::Directory {
                path: dir.clone(),
                source,
            })?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file)
        .try_init()?;

    Ok(LoggingGuard { _file: guard })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        let section = LoggingSection {
            level: "emberlayer=trace".to_string(),
            directory: None,
        };
        assert_eq!(default_directive(&section, false), "emberlayer=trace");
        assert_eq!(default_directive(&section, true), "debug");
    }

    #[test]
    fn test_init_creates_log_directory() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("logs");
        let section = LoggingSection {
            level: "info".to_string(),
            directory: Some(dir.clone()),
        };

        let guard = init(&section, false);
        assert!(dir.is_dir());
        drop(guard);
    }
}
