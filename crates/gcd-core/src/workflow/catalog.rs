//! Course catalog loading.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::client::{ClassroomClient, check_status};
use crate::config::Endpoint;
use crate::error::{ApiError, ErrorKind};

/// A course as listed by the backend. Extra fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_link: Option<String>,
}

impl Course {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            section: None,
            course_state: None,
            alternate_link: None,
        }
    }

    /// Section label, if the backend sent a non-empty one.
    pub fn section_label(&self) -> Option<&str> {
        self.section
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Exactly one of loading, loaded, or failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    Loading,
    Success(Vec<Course>),
    Error(String),
}

/// What the owner of a catalog must do after a fetch settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogTransition {
    Loaded { count: usize },
    /// The session expired: go back to the entry state.
    RouteToEntry,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    status: FetchStatus,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// A catalog whose first fetch is about to start.
    pub fn new() -> Self {
        Self {
            status: FetchStatus::Loading,
        }
    }

    pub fn status(&self) -> &FetchStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, FetchStatus::Loading)
    }

    /// Courses from the last successful fetch (empty while loading or failed).
    pub fn courses(&self) -> &[Course] {
        match &self.status {
            FetchStatus::Success(courses) => courses,
            FetchStatus::Loading | FetchStatus::Error(_) => &[],
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.courses().iter().any(|c| c.id == id)
    }

    pub fn begin_loading(&mut self) {
        self.status = FetchStatus::Loading;
    }

    /// Applies a settled fetch. A success replaces the whole list.
    pub fn apply(&mut self, result: Result<Vec<Course>, ApiError>) -> CatalogTransition {
        match result {
            Ok(courses) => {
                let count = courses.len();
                self.status = FetchStatus::Success(courses);
                CatalogTransition::Loaded { count }
            }
            Err(err) => match err.kind() {
                ErrorKind::Unauthenticated => CatalogTransition::RouteToEntry,
                ErrorKind::Cancelled | ErrorKind::Failure => {
                    tracing::warn!("Error fetching courses: {err}");
                    self.status =
                        FetchStatus::Error("Error fetching courses. Please try again later.".into());
                    CatalogTransition::Failed
                }
            },
        }
    }
}

/// Fetches the full course list.
///
/// # Errors
/// `Unauthenticated` on 401; transport, status and decode failures otherwise.
pub async fn load_courses(
    client: &ClassroomClient,
    cancel: &CancellationToken,
) -> Result<Vec<Course>, ApiError> {
    let endpoint = Endpoint::CoursesList;
    let timeout = client.config().timeouts.request();
    let builder = client.request(Method::GET, endpoint)?;
    let response = client
        .send_checked(endpoint, builder, timeout, cancel)
        .await?;

    // The backend encodes an empty list as `null`.
    let courses: Option<Vec<Course>> = response
        .json()
        .await
        .map_err(|source| ApiError::Decode { endpoint, source })?;
    let courses = courses.unwrap_or_default();
    tracing::info!(count = courses.len(), "loaded courses");
    Ok(courses)
}

/// Asks the backend to import new courses from the provider.
///
/// The backend answers with a redirect to the frontend on success, so 3xx is
/// accepted here.
///
/// # Errors
/// `Unauthenticated` on 401; transport and status failures otherwise.
pub async fn discover(client: &ClassroomClient, cancel: &CancellationToken) -> Result<(), ApiError> {
    let endpoint = Endpoint::CoursesDiscover;
    let timeout = client.config().timeouts.request();
    let builder = client.request(Method::GET, endpoint)?;
    let response = client.send(endpoint, builder, timeout, cancel).await?;
    check_status(endpoint, response, cancel, |status| {
        status.is_success() || status.is_redirection()
    })
    .await?;
    tracing::info!("course discovery finished");
    Ok(())
}

/// Runs discovery, then reloads the full list.
///
/// # Errors
/// The first failure of either step.
pub async fn refresh(
    client: &ClassroomClient,
    cancel: &CancellationToken,
) -> Result<Vec<Course>, ApiError> {
    discover(client, cancel).await?;
    load_courses(client, cancel).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_deserializes_backend_shape() {
        let json = r#"{"id":"42","name":"Math","description":"","section":"","courseState":"ACTIVE","announcements":[],"ownerId":"7"}"#;
        let course: Course = serde_json::from_str(json).unwrap();
        assert_eq!(course.id, "42");
        assert_eq!(course.name, "Math");
        assert_eq!(course.section_label(), None);
        assert_eq!(course.course_state.as_deref(), Some("ACTIVE"));
    }

    #[test]
    fn test_success_replaces_list() {
        let mut catalog = Catalog::new();
        assert!(catalog.is_loading());

        catalog.apply(Ok(vec![Course::new("a", "Math"), Course::new("b", "Art")]));
        assert_eq!(catalog.courses().len(), 2);

        catalog.begin_loading();
        assert!(catalog.courses().is_empty());

        let transition = catalog.apply(Ok(vec![Course::new("c", "CS")]));
        assert_eq!(transition, CatalogTransition::Loaded { count: 1 });
        assert!(catalog.contains("c"));
        assert!(!catalog.contains("a"));
    }

    #[test]
    fn test_unauthenticated_routes_to_entry_from_any_status() {
        for mut catalog in [
            Catalog::new(),
            Catalog {
                status: FetchStatus::Success(vec![Course::new("a", "Math")]),
            },
            Catalog {
                status: FetchStatus::Error("boom".into()),
            },
        ] {
            let transition = catalog.apply(Err(ApiError::Unauthenticated {
                endpoint: Endpoint::CoursesList,
            }));
            assert_eq!(transition, CatalogTransition::RouteToEntry);
        }
    }

    #[test]
    fn test_failure_sets_error_status() {
        let mut catalog = Catalog::new();
        let transition = catalog.apply(Err(ApiError::Timeout {
            endpoint: Endpoint::CoursesList,
        }));
        assert_eq!(transition, CatalogTransition::Failed);
        assert!(matches!(catalog.status(), FetchStatus::Error(_)));
        assert!(catalog.courses().is_empty());
    }
}
