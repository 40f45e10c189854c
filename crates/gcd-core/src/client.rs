//! HTTP client for the backend API.
//!
//! Every request carries the session cookie from the injected [`SessionStore`],
//! an optional per-operation timeout, and a cancellation token.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{COOKIE, HeaderValue};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::{Config, Endpoint};
use crate::cookie::SessionStore;
use crate::error::ApiError;

/// Backend client shared by the workflow components.
#[derive(Clone)]
pub struct ClassroomClient {
    http: reqwest::Client,
    config: Arc<Config>,
    store: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for ClassroomClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassroomClient")
            .field("server_url", &self.config.server_url)
            .finish_non_exhaustive()
    }
}

impl ClassroomClient {
    /// Creates a client.
    ///
    /// Redirects are not followed: a 3xx from the backend is reported to the
    /// caller rather than chased to the frontend it points at.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: Config, store: Arc<dyn SessionStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("gcd/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            config: Arc::new(config),
            store,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Resolves the absolute URL for an endpoint.
    ///
    /// # Errors
    /// Returns an error if the configured URL is invalid.
    pub fn endpoint_url(&self, endpoint: Endpoint) -> Result<Url, ApiError> {
        self.config
            .endpoint_url(endpoint)
            .map_err(|e| ApiError::InvalidUrl {
                endpoint,
                message: format!("{e:#}"),
            })
    }

    /// Builds a request carrying the current session credential, if any.
    pub(crate) fn request(
        &self,
        method: Method,
        endpoint: Endpoint,
    ) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint_url(endpoint)?;
        let mut builder = self.http.request(method, url);

        if let Some(cookie) = self.store.credential().map_err(ApiError::Store)? {
            let value = HeaderValue::from_str(&cookie.header_value()).map_err(|e| {
                ApiError::Store(anyhow::anyhow!("session cookie is not a valid header: {e}"))
            })?;
            builder = builder.header(COOKIE, value);
        } else {
            tracing::debug!(%endpoint, "no session credential available");
        }

        Ok(builder)
    }

    /// Sends a request, racing it against `cancel`.
    pub(crate) async fn send(
        &self,
        endpoint: Endpoint,
        builder: RequestBuilder,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<Response, ApiError> {
        let builder = match timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        };

        tracing::debug!(%endpoint, "sending request");
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::info!(%endpoint, "request cancelled");
                Err(ApiError::Cancelled { endpoint })
            }
            result = builder.send() => result.map_err(|e| ApiError::from_send(endpoint, e)),
        }
    }

    /// Sends a request and maps 401 and other non-success statuses to errors.
    pub(crate) async fn send_checked(
        &self,
        endpoint: Endpoint,
        builder: RequestBuilder,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<Response, ApiError> {
        let response = self.send(endpoint, builder, timeout, cancel).await?;
        check_status(endpoint, response, cancel, |status| status.is_success()).await
    }
}

/// Maps 401 to [`ApiError::Unauthenticated`] and statuses rejected by
/// `accept` to [`ApiError::Status`].
///
/// The error body is read under `cancel` as well.
pub(crate) async fn check_status(
    endpoint: Endpoint,
    response: Response,
    cancel: &CancellationToken,
    accept: impl Fn(StatusCode) -> bool,
) -> Result<Response, ApiError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        tracing::info!(%endpoint, "backend rejected the session");
        return Err(ApiError::Unauthenticated { endpoint });
    }
    if accept(status) {
        return Ok(response);
    }

    let body = tokio::select! {
        biased;
        () = cancel.cancelled() => {
            tracing::info!(%endpoint, "request cancelled while reading error body");
            return Err(ApiError::Cancelled { endpoint });
        }
        body = response.text() => body.unwrap_or_default(),
    };
    tracing::warn!(%endpoint, status = status.as_u16(), "unexpected status");
    Err(ApiError::Status {
        endpoint,
        status: status.as_u16(),
        body,
    })
}
