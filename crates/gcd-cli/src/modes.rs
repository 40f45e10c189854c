//! Runtime execution modes.
//!
//! The full-screen course picker lives behind the `tui` feature; every other
//! command prints to stdout.

#[cfg(feature = "tui")]
pub use gcd_tui::run_interactive;

#[cfg(not(feature = "tui"))]
pub async fn run_interactive(
    _client: gcd_core::ClassroomClient,
    _navigator: std::sync::Arc<dyn gcd_core::Navigator>,
) -> anyhow::Result<()> {
    anyhow::bail!("TUI support is disabled in this build (feature \"tui\").");
}
