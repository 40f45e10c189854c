//! Events consumed by the reducer.

use crossterm::event::Event;
use gcd_core::ApiError;
use gcd_core::workflow::{Course, Delivered, ProbeOutcome, Termination};

use crate::task::{TaskId, TaskKind, TaskStarted};

#[derive(Debug)]
pub enum UiEvent {
    /// Periodic tick (spinner animation).
    Tick,
    Terminal(Event),

    TaskStarted {
        kind: TaskKind,
        started: TaskStarted,
    },

    ProbeCompleted {
        id: TaskId,
        result: Result<ProbeOutcome, ApiError>,
    },
    CoursesLoaded {
        id: TaskId,
        result: Result<Vec<Course>, ApiError>,
    },
    ExportCompleted {
        id: TaskId,
        result: Result<(), ApiError>,
    },
    DownloadCompleted {
        id: TaskId,
        result: Result<Delivered, ApiError>,
    },
    SignedOut {
        id: TaskId,
        termination: Termination,
    },

    /// The pasted session cookie was written (or not) to the store.
    CookieStored { result: Result<(), String> },
    /// The system browser could not be opened.
    BrowserFailed { message: String },
}
