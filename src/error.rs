//! Error types for staysign.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

/// A non-2xx response from the API, classified by status.
///
/// Carries the decoded body (or the raw text as a JSON string when the body
/// was not JSON) so callers can branch without string matching.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    /// Message taken from the body's `message` or `error` field.
    pub message: String,
    /// HTTP status code.
    pub status: u16,
    /// Decoded response body; `Value::Null` when the body was empty.
    pub body: Value,
}

impl ApiError {
    /// Build a classified error from a status and decoded body.
    ///
    /// Falls back to a generic message when the body has neither a string
    /// `message` nor a string `error` field.
    pub fn from_response(status: u16, body: Value) -> Self {
        let message = ["message", "error"]
            .iter()
            .find_map(|key| body.get(key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| format!("Request failed with status {status}"));

        Self {
            message,
            status,
            body,
        }
    }

    /// True for 401 responses.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "API error {}: {}", self.status, self.message)
    }
}

impl std::error::Error for ApiError {}

/// The main error type for staysign.
#[derive(Debug, Error)]
pub enum Error {
    // ── API ──────────────────────────────────────────────────────────────────
    /// API returned a non-2xx response.
    #[error(transparent)]
    Api(#[from] ApiError),

    // ── Authentication ───────────────────────────────────────────────────────
    /// A refresh was requested but no refresh token is held.
    #[error("Not authenticated - no refresh token available")]
    NotAuthenticated,

    /// The token refresh call failed. Shared by every caller that waited on
    /// the same in-flight refresh.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(Arc<Error>),

    // ── Storage ──────────────────────────────────────────────────────────────
    /// Token storage backend error.
    #[error("Storage error: {0}")]
    Storage(String),

    // ── Infrastructure ───────────────────────────────────────────────────────
    /// Network/HTTP transport error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON encode/decode error, including non-JSON success bodies.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A background task (refresh, heartbeat) panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(String),

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// HTTP status of the underlying API error, looking through refresh
    /// failures.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(api) => Some(api.status),
            Error::RefreshFailed(inner) => inner.status(),
            Error::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The classified API error, if this is one.
    #[must_use]
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(api) => Some(api),
            _ => None,
        }
    }

    /// True when the API answered 401.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Api(api) if api.is_unauthorized())
    }

    /// Returns true if this error indicates the user must log in again.
    #[must_use]
    pub fn requires_reauth(&self) -> bool {
        matches!(self, Error::NotAuthenticated | Error::RefreshFailed(_)) || self.is_unauthorized()
    }
}

/// Convenience type alias.
pub type Result<T> = std::result::Result<T, Error>;
