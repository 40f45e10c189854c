//! Errors returned by backend operations.

use std::path::PathBuf;

use crate::config::Endpoint;

/// Coarse classification driving the workflow state machines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The backend rejected the session (HTTP 401). Never shown as an error:
    /// callers route back to the entry state instead.
    Unauthenticated,
    /// The user cancelled the operation.
    Cancelled,
    /// Anything else that ends the current attempt.
    Failure,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{endpoint}: session is not authenticated")]
    Unauthenticated { endpoint: Endpoint },

    #[error("{endpoint}: request failed: {source}")]
    Transport {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint}: timed out")]
    Timeout { endpoint: Endpoint },

    #[error("{endpoint}: cancelled")]
    Cancelled { endpoint: Endpoint },

    #[error("{endpoint}: HTTP {status}{}", format_body(.body))]
    Status {
        endpoint: Endpoint,
        status: u16,
        body: String,
    },

    #[error("{endpoint}: unexpected response: {source}")]
    Decode {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint}: invalid URL: {message}")]
    InvalidUrl { endpoint: Endpoint, message: String },

    #[error("session store: {0:#}")]
    Store(anyhow::Error),

    #[error("{0:#}")]
    Navigation(anyhow::Error),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn format_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

impl ApiError {
    /// Maps a reqwest send error, separating timeouts from transport failures.
    pub(crate) fn from_send(endpoint: Endpoint, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            ApiError::Timeout { endpoint }
        } else {
            ApiError::Transport { endpoint, source }
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ApiError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Unauthenticated { .. } => ErrorKind::Unauthenticated,
            ApiError::Cancelled { .. } => ErrorKind::Cancelled,
            _ => ErrorKind::Failure,
        }
    }

    pub fn is_unauthenticated(&self) -> bool {
        self.kind() == ErrorKind::Unauthenticated
    }
}
