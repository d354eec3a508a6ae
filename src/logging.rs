//! Tracing setup.
//!
//! Logs always go to stdout in compact form. A second, ANSI-free layer appends to
//! `DOCEMBED_LOG_FILE` (default `logs/docembed.log`) through a non‑blocking writer; setting
//! `DOCEMBED_LOG_FILE=off` disables it. `RUST_LOG` controls filtering and defaults to `info`.
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_LOG_FILE: &str = "logs/docembed.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global subscriber. Call once, before anything logs.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(false).compact();
    let file_layer = log_file_path().and_then(|path| file_writer(&path)).map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .compact()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();
}

fn log_file_path() -> Option<PathBuf> {
    match std::env::var("DOCEMBED_LOG_FILE") {
        Ok(value) if value.eq_ignore_ascii_case("off") => None,
        Ok(value) if !value.trim().is_empty() => Some(PathBuf::from(value)),
        _ => Some(PathBuf::from(DEFAULT_LOG_FILE)),
    }
}

/// Open `path` for appending, creating its parent directory. Failures are reported on stderr
/// and disable file logging rather than aborting startup.
fn file_writer(path: &Path) -> Option<NonBlocking> {
    let parent = path.parent().filter(|dir| !dir.as_os_str().is_empty());
    if let Some(dir) = parent
        && let Err(err) = std::fs::create_dir_all(dir)
    {
        eprintln!("Failed to create log directory {}: {err}", dir.display());
        return None;
    }

    match std::fs::OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let _ = LOG_GUARD.set(guard);
            Some(non_blocking)
        }
        Err(err) => {
            eprintln!("Failed to open log file {}: {err}", path.display());
            None
        }
    }
}
