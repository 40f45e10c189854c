//! Application state for the interactive view.
//!
//! ```text
//! AppState
//! ├── screen: Screen          (Checking | Redirecting | Failed | Catalog)
//! ├── catalog: Catalog        (fetch status + courses)
//! ├── selection: SelectionSet
//! ├── export: ExportTrigger   (busy state of the export control)
//! ├── cursor: usize           (highlighted row)
//! ├── notice: Option<Notice>  (one-line status message)
//! ├── task_seq / tasks        (async task lifecycle)
//! └── should_quit
//! ```

use gcd_core::workflow::{Catalog, Course, ExportTrigger, FetchStatus, SelectionSet};

use crate::task::{TaskSeq, Tasks};

/// Which view is active.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Screen {
    /// The session probe is running.
    #[default]
    Checking,
    /// The user was sent to the identity provider and must paste the
    /// session cookie to continue.
    Redirecting {
        url: String,
        pasted: String,
        error: Option<String>,
    },
    /// The probe failed; waiting for a retry.
    Failed { message: String },
    Catalog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct AppState {
    pub screen: Screen,
    pub catalog: Catalog,
    pub selection: SelectionSet,
    pub export: ExportTrigger,
    pub cursor: usize,
    pub notice: Option<Notice>,
    pub task_seq: TaskSeq,
    pub tasks: Tasks,
    pub spinner_frame: usize,
    pub should_quit: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn courses(&self) -> &[Course] {
        self.catalog.courses()
    }

    /// Course under the cursor, if the list is loaded and non-empty.
    pub fn highlighted(&self) -> Option<&Course> {
        self.courses().get(self.cursor)
    }

    pub fn export_enabled(&self) -> bool {
        self.catalog_settled() && self.export.is_enabled(&self.selection)
    }

    /// True once the course list has loaded and is not being replaced.
    pub fn catalog_settled(&self) -> bool {
        matches!(self.catalog.status(), FetchStatus::Success(_))
    }

    /// True while an archive is being prepared or transferred.
    pub fn transfer_running(&self) -> bool {
        self.export.is_busy() || self.tasks.download.is_running()
    }

    /// Keeps the cursor inside the current list.
    pub fn clamp_cursor(&mut self) {
        let len = self.courses().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }
}
