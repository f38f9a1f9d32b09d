//! Logging setup.
//!
//! Installs a global `tracing` subscriber filtered by `RUST_LOG` (default
//! `info`). The interactive form owns stdout, so in that mode logs go to a file
//! through a non-blocking writer; one-shot commands log to stderr.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

pub const ENV_LOG_FILE: &str = "DPF_LOG_FILE";
const DEFAULT_LOG_FILE: &str = "dpf.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static INSTALLED: OnceLock<()> = OnceLock::new();

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to open log file {path}: {source}")]
    OpenFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(target: LogTarget) -> Result<(), LoggingError> {
    if INSTALLED.get().is_some() {
        return Ok(());
    }

    match &target {
        LogTarget::Stderr => {
            let subscriber = Registry::default()
                .with(build_env_filter())
                .with(fmt::layer().with_writer(std::io::stderr));
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogTarget::File(path) => {
            let file = open_log_file(path)?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let subscriber = Registry::default()
                .with(build_env_filter())
                .with(fmt::layer().with_ansi(false).with_writer(writer));
            tracing::subscriber::set_global_default(subscriber)?;
            let _ = LOG_GUARD.set(guard);
        }
    }
    let _ = INSTALLED.set(());

    tracing::debug!(destination = ?target, "logging initialized");
    Ok(())
}

/// Log file for the interactive form: `$DPF_LOG_FILE` or `./dpf.log`.
pub fn log_file_path(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    lookup(ENV_LOG_FILE)
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
}

fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggingError::OpenFile {
            path: path.to_path_buf(),
            source,
        })
}

fn build_env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
