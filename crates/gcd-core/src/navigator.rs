//! Hand-off to the system browser.
//!
//! Opening the authorization URL is the point where control leaves this
//! process; the workflow resumes only once a session cookie is supplied.

use anyhow::{Context, Result};

/// Set to any value to keep `gcd` from opening a browser (tests, headless hosts).
pub const NO_BROWSER_ENV: &str = "GCD_NO_BROWSER";

pub trait Navigator: Send + Sync {
    /// Performs a full navigation to an external URL.
    ///
    /// # Errors
    /// Returns an error if the URL could not be handed off.
    fn open_external(&self, url: &str) -> Result<()>;
}

/// Opens URLs with the platform's default handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl Navigator for SystemBrowser {
    fn open_external(&self, url: &str) -> Result<()> {
        if std::env::var_os(NO_BROWSER_ENV).is_some() {
            tracing::debug!("browser disabled by {NO_BROWSER_ENV}");
            return Ok(());
        }
        open::that(url).with_context(|| format!("Failed to open browser for {url}"))
    }
}
