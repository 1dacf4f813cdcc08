use serde_json::Value;
use thiserror::Error;

/// Errors returned by backend calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, DNS, timeout, body read).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// The backend answered with a non-2xx status.
    #[error("Request failed: {status} {status_text}")]
    Status {
        status: u16,
        status_text: String,
        /// Parsed JSON body, or the raw text when the body was not JSON.
        payload: Value,
    },
    /// A 2xx body did not match the expected response shape.
    #[error("unexpected response from {path}: {message}")]
    Decode { path: String, message: String },
}

impl ApiError {
    /// HTTP status code when the backend produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Network(err) => err.status().map(|status| status.as_u16()),
            Self::Decode { .. } => None,
        }
    }

    /// Backend-provided `detail` message, if the error payload carries one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Status { payload, .. } => payload.get("detail").and_then(Value::as_str),
            _ => None,
        }
    }
}

/// Result alias for backend calls.
pub type ApiResult<T> = Result<T, ApiError>;
