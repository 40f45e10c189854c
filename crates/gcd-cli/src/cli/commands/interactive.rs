//! Interactive mode handler.

use std::sync::Arc;

use anyhow::{Context, Result};
use gcd_core::config::{Config, paths};
use gcd_core::{SystemBrowser, logging};

use crate::modes;

/// Log filter for the interactive view when `GCD_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "gcd=info,gcd_core=info,gcd_tui=info";

pub async fn run(config: Config) -> Result<()> {
    // The view owns the terminal, so logs go to a file; the guard flushes on exit.
    let _log_guard = logging::init_file(&paths::logs_dir(), DEFAULT_LOG_FILTER)?;

    let client = super::client(config)?;
    modes::run_interactive(client, Arc::new(SystemBrowser))
        .await
        .context("interactive mode failed")?;

    Ok(())
}
