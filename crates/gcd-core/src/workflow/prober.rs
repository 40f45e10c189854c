//! Session probe.
//!
//! `Checking -> {Redirecting | Authenticated | Failed}`. A redirect hands the
//! user to the identity provider; nothing further runs until a session cookie
//! comes back.

use reqwest::Method;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::client::{ClassroomClient, check_status};
use crate::config::Endpoint;
use crate::error::ApiError;
use crate::navigator::Navigator;

/// Result of a successful probe round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Authenticated,
    /// No valid session: the user must visit `url` to authorize.
    Redirect { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeState {
    Checking,
    /// Terminal for this run: control has passed to the identity provider.
    Redirecting { url: String },
    Authenticated,
    /// Terminal until the user retries.
    Failed { message: String },
}

impl ProbeState {
    pub fn from_result(result: Result<ProbeOutcome, ApiError>) -> Self {
        match result {
            Ok(ProbeOutcome::Authenticated) => ProbeState::Authenticated,
            Ok(ProbeOutcome::Redirect { url }) => ProbeState::Redirecting { url },
            Err(err) => ProbeState::Failed {
                message: format!("Failed to initiate login: {err}"),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct AuthUrlResponse {
    url: String,
}

/// Tests whether the stored session is still accepted by the backend.
///
/// On 401 the authorization URL is fetched and returned as a redirect.
///
/// # Errors
/// Transport failures, timeouts, cancellation and unexpected statuses.
pub async fn probe(
    client: &ClassroomClient,
    cancel: &CancellationToken,
) -> Result<ProbeOutcome, ApiError> {
    let timeout = client.config().timeouts.request();
    let builder = client.request(Method::GET, Endpoint::Entry)?;
    let response = client.send(Endpoint::Entry, builder, timeout, cancel).await?;

    match check_status(Endpoint::Entry, response, cancel, |status| status.is_success()).await {
        Ok(_) => {
            tracing::info!("session is authenticated");
            Ok(ProbeOutcome::Authenticated)
        }
        Err(err) if err.is_unauthenticated() => {
            let url = authorization_url(client, cancel).await?;
            tracing::info!("session is not authenticated, redirecting to provider");
            Ok(ProbeOutcome::Redirect { url })
        }
        Err(err) => Err(err),
    }
}

/// Asks the backend for the identity provider's authorization URL.
///
/// The URL is opaque: it is passed on verbatim, never parsed.
///
/// # Errors
/// Transport failures, an unreadable body, or an empty URL.
pub async fn authorization_url(
    client: &ClassroomClient,
    cancel: &CancellationToken,
) -> Result<String, ApiError> {
    let endpoint = Endpoint::OAuthUrl;
    let timeout = client.config().timeouts.request();
    let builder = client.request(Method::GET, endpoint)?;
    let response = client
        .send_checked(endpoint, builder, timeout, cancel)
        .await?;

    let body: AuthUrlResponse = response
        .json()
        .await
        .map_err(|source| ApiError::Decode { endpoint, source })?;

    if body.url.trim().is_empty() {
        return Err(ApiError::InvalidUrl {
            endpoint,
            message: "empty authorization URL".to_string(),
        });
    }
    Ok(body.url)
}

/// Probes and, when unauthenticated, navigates to the authorization URL.
pub async fn probe_and_navigate(
    client: &ClassroomClient,
    navigator: &dyn Navigator,
    cancel: &CancellationToken,
) -> ProbeState {
    let state = ProbeState::from_result(probe(client, cancel).await);
    match &state {
        ProbeState::Redirecting { url } => {
            if let Err(err) = navigator.open_external(url) {
                tracing::warn!("{err:#}");
            }
        }
        ProbeState::Failed { message } => tracing::warn!("{message}"),
        ProbeState::Checking | ProbeState::Authenticated => {}
    }
    state
}
