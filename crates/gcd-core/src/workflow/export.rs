//! Export requests.
//!
//! The trigger is exclusive: once a request is in flight, further attempts
//! are rejected until it settles.

use reqwest::Method;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::selection::SelectionSet;
use crate::client::ClassroomClient;
use crate::config::Endpoint;
use crate::error::ApiError;

/// Request body for the export endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRequest {
    #[serde(rename = "selectedCoursesIDs")]
    pub selected_course_ids: Vec<String>,
}

impl ExportRequest {
    /// Builds a request from a non-empty selection.
    pub fn from_selection(selection: &SelectionSet) -> Option<Self> {
        (!selection.is_empty()).then(|| Self {
            selected_course_ids: selection.ids().to_vec(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ExportRejected {
    #[error("no courses selected")]
    EmptySelection,
    #[error("an export is already in progress")]
    InFlight,
}

/// Busy state of the export control.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportTrigger {
    in_flight: bool,
}

impl ExportTrigger {
    /// True when an export could start now.
    pub fn is_enabled(&self, selection: &SelectionSet) -> bool {
        !self.in_flight && !selection.is_empty()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Claims the trigger for a new export.
    ///
    /// # Errors
    /// `EmptySelection` or `InFlight`; the trigger is unchanged in both cases.
    pub fn begin(&mut self, selection: &SelectionSet) -> Result<ExportRequest, ExportRejected> {
        if self.in_flight {
            return Err(ExportRejected::InFlight);
        }
        let request = ExportRequest::from_selection(selection).ok_or(ExportRejected::EmptySelection)?;
        self.in_flight = true;
        Ok(request)
    }

    /// Restores the trigger once the request has settled, however it ended.
    pub fn settle(&mut self) {
        self.in_flight = false;
    }
}

/// Asks the backend to prepare an archive of the requested courses.
///
/// Returns once the backend has accepted the request; the archive itself is
/// fetched separately.
///
/// # Errors
/// `Unauthenticated` on 401; transport, timeout, cancellation and status failures.
pub async fn request_export(
    client: &ClassroomClient,
    request: &ExportRequest,
    cancel: &CancellationToken,
) -> Result<(), ApiError> {
    let endpoint = Endpoint::CoursesDownload;
    let timeout = client.config().timeouts.export();
    let builder = client.request(Method::POST, endpoint)?.json(request);

    tracing::info!(
        courses = request.selected_course_ids.len(),
        "requesting course export"
    );
    client
        .send_checked(endpoint, builder, timeout, cancel)
        .await?;
    tracing::info!("export accepted");
    Ok(())
}
