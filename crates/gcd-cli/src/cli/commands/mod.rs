//! CLI command handlers.

pub mod auth;
pub mod config;
pub mod courses;
pub mod download;
pub mod interactive;

use std::sync::Arc;

use anyhow::{Context, Result};
use gcd_core::config::Config;
use gcd_core::interrupt::{self, InterruptedError};
use gcd_core::{ApiError, ClassroomClient, CookieFile, ErrorKind};
use tokio_util::sync::CancellationToken;

/// Builds a client over the cookie file under `GCD_HOME`.
fn client(config: Config) -> Result<ClassroomClient> {
    ClassroomClient::new(config, Arc::new(CookieFile::default_location()))
        .context("create backend client")
}

/// A token that is cancelled by Ctrl+C.
fn interruptible() -> CancellationToken {
    let token = CancellationToken::new();
    interrupt::cancel_on_interrupt(token.clone());
    token
}

/// Turns a workflow error into the CLI's error, adding a hint for 401.
fn api_error(err: ApiError, action: &str) -> anyhow::Error {
    match err.kind() {
        ErrorKind::Cancelled => InterruptedError.into(),
        ErrorKind::Unauthenticated => {
            anyhow::anyhow!("{action}: not signed in. Run `gcd login` first.")
        }
        ErrorKind::Failure => anyhow::Error::new(err).context(action.to_string()),
    }
}
