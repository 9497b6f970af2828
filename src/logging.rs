//! Tracing configuration and log routing.
//!
//! The server logs to stdout using a compact formatter and appends to the configured log file
//! (`ANALYST_LOG_FILE`, default `logs/analyst-ai.log`) through a non-blocking writer, so
//! OCR-heavy ingestion batches do not stall on log I/O. The offline CLI logs to stderr only.
use std::path::Path;
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Configure tracing subscribers for stdout and file logging.
///
/// - Respects `RUST_LOG` for filtering (defaults to `info`).
/// - Installs a compact stdout layer and, when `log_file` can be opened, a file layer.
/// - Keeps the non-blocking writer guard alive for the process lifetime.
pub fn init_tracing(log_file: &Path) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(false).compact();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer);

    match configure_file_writer(log_file) {
        Some(writer) => {
            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .compact();
            registry.with(file_layer).init();
        }
        None => registry.init(),
    }
    tracing::debug!(log_file = %log_file.display(), "Tracing initialized");
}

/// Configure stderr-only tracing for the offline CLI, whose stdout carries extraction output.
pub fn init_stderr_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

/// Build a non-blocking appending writer for `path`, creating its directory when missing.
///
/// Returns `None` when the directory cannot be created or the path has no file name.
fn configure_file_writer(path: &Path) -> Option<NonBlocking> {
    let Some(file_name) = path.file_name() else {
        eprintln!("Log file path {} has no file name", path.display());
        return None;
    };
    let directory = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    if let Err(err) = std::fs::create_dir_all(directory) {
        eprintln!("Failed to create log directory {}: {err}", directory.display());
        return None;
    }
    let file_appender = tracing_appender::rolling::never(directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);
    Some(non_blocking)
}
