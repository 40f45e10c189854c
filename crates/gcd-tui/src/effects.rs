//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! The reducer never performs I/O or spawns tasks itself.

use gcd_core::workflow::ExportRequest;
use tokio_util::sync::CancellationToken;

use crate::task::{TaskId, TaskKind};

#[derive(Debug)]
pub enum UiEffect {
    Quit,

    /// Probe the session (and fetch the authorization URL on 401).
    Probe { task: TaskId },

    /// Open a URL in the system browser.
    OpenBrowser { url: String },

    /// Fetch the course list, running discovery first when `discover` is set.
    LoadCourses { task: TaskId, discover: bool },

    /// Ask the backend to prepare an archive.
    Export { task: TaskId, request: ExportRequest },

    /// Retrieve the most recently prepared archive.
    Download { task: TaskId },

    SignOut { task: TaskId },

    /// Persist a session cookie pasted by the user.
    StoreCookie { input: String },

    /// Cancel an in-progress task.
    CancelTask {
        kind: TaskKind,
        token: Option<CancellationToken>,
    },
}
