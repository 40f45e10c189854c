//! Tracing subscriber setup.
//!
//! Commands log to stderr. The interactive view owns the terminal, so it logs
//! to a daily file under `${GCD_HOME}/logs` instead.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "GCD_LOG";

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Installs a stderr subscriber. A second call is a no-op.
pub fn init_stderr(default_filter: &str) {
    let _ = tracing_subscriber::registry()
        .with(env_filter(default_filter))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

/// Installs a subscriber writing to `<dir>/gcd.log.<date>`.
///
/// The returned guard flushes pending lines when dropped and must be held for
/// the lifetime of the program.
///
/// # Errors
/// Returns an error if the log directory cannot be created.
pub fn init_file(dir: &Path, default_filter: &str) -> Result<WorkerGuard> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::daily(dir, "gcd.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let _ = tracing_subscriber::registry()
        .with(env_filter(default_filter))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .try_init();

    Ok(guard)
}
