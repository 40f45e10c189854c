//! Sign-out.
//!
//! The caller always returns to the entry state afterwards; nothing reported
//! here can prevent that.

use reqwest::Method;
use tokio_util::sync::CancellationToken;

use crate::client::{ClassroomClient, check_status};
use crate::config::{Endpoint, SignOutOrder};
use crate::error::ApiError;

/// Outcome of a sign-out attempt.
#[derive(Debug, Default)]
pub struct Termination {
    /// The sign-out request failed (ignored for navigation purposes).
    pub request_error: Option<ApiError>,
    /// The local cookie was overwritten with an expired value.
    pub cookie_cleared: bool,
    /// Writing the expired cookie failed.
    pub store_error: Option<String>,
}

impl Termination {
    /// Message to render locally, if anything went wrong on this side.
    ///
    /// A failed backend request is not surfaced: sign-out is fire-and-forget.
    pub fn user_message(&self) -> Option<String> {
        self.store_error
            .as_ref()
            .map(|err| format!("Could not clear the local session: {err}"))
    }
}

/// Signs out of the backend and expires the local session cookie, in the
/// order given by `order`.
pub async fn terminate(
    client: &ClassroomClient,
    order: SignOutOrder,
    cancel: &CancellationToken,
) -> Termination {
    let mut termination = Termination::default();

    match order {
        SignOutOrder::RequestThenClear => {
            termination.request_error = send_logout(client, cancel).await.err();
            clear_cookie(client, &mut termination);
        }
        SignOutOrder::ClearThenRequest => {
            clear_cookie(client, &mut termination);
            termination.request_error = send_logout(client, cancel).await.err();
        }
        SignOutOrder::ClearOnSuccess => {
            termination.request_error = send_logout(client, cancel).await.err();
            if termination.request_error.is_none() {
                clear_cookie(client, &mut termination);
            }
        }
    }

    if let Some(err) = &termination.request_error {
        tracing::warn!(order = order.display_name(), "sign-out request failed: {err}");
    }
    tracing::info!(
        order = order.display_name(),
        cookie_cleared = termination.cookie_cleared,
        "signed out"
    );
    termination
}

async fn send_logout(client: &ClassroomClient, cancel: &CancellationToken) -> Result<(), ApiError> {
    let endpoint = Endpoint::OAuthLogout;
    let timeout = client.config().timeouts.request();
    let builder = client.request(Method::POST, endpoint)?;
    let response = client.send(endpoint, builder, timeout, cancel).await?;
    // The backend redirects after logout.
    check_status(endpoint, response, cancel, |status| {
        status.is_success() || status.is_redirection()
    })
    .await?;
    Ok(())
}

fn clear_cookie(client: &ClassroomClient, termination: &mut Termination) {
    let session = &client.config().session;
    match client
        .store()
        .expire(&session.cookie_name, &session.cookie_path)
    {
        Ok(()) => termination.cookie_cleared = true,
        Err(err) => {
            tracing::warn!("failed to expire session cookie: {err:#}");
            termination.store_error = Some(format!("{err:#}"));
        }
    }
}
