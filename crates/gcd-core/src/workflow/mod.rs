//! The session-gated selection and export workflow.
//!
//! Each component is a set of plain async functions over [`ClassroomClient`]
//! plus, where the user interacts with it, a small state type.
//!
//! [`ClassroomClient`]: crate::client::ClassroomClient

pub mod artifact;
pub mod catalog;
pub mod export;
pub mod prober;
pub mod selection;
pub mod terminator;

pub use artifact::{Delivered, DownloadAction};
pub use catalog::{Catalog, CatalogTransition, Course, FetchStatus};
pub use export::{ExportRejected, ExportRequest, ExportTrigger};
pub use prober::{ProbeOutcome, ProbeState};
pub use selection::SelectionSet;
pub use terminator::Termination;
