//! Full-screen terminal view for `gcd`.
//!
//! Elm-style: [`update::update`] is a pure reducer over [`state::AppState`]
//! returning [`effects::UiEffect`]s, which [`runtime::TuiRuntime`] executes.

pub mod effects;
pub mod events;
pub mod render;
pub mod runtime;
pub mod state;
pub mod task;
pub mod terminal;
pub mod update;

use std::io::{IsTerminal, stdout};
use std::sync::Arc;

use anyhow::Result;
use gcd_core::{ClassroomClient, Navigator};
pub use runtime::TuiRuntime;

/// Runs the interactive course picker until the user quits.
///
/// # Errors
/// Returns an error if stdout is not a terminal or the terminal fails.
pub async fn run_interactive(client: ClassroomClient, navigator: Arc<dyn Navigator>) -> Result<()> {
    if !stdout().is_terminal() {
        anyhow::bail!(
            "Interactive mode requires a terminal.\n\
             Use `gcd courses` and `gcd download` for non-interactive use."
        );
    }

    tracing::info!(server = %client.config().server_url, "starting interactive mode");
    let mut runtime = TuiRuntime::new(client, navigator)?;
    runtime.run()
}
