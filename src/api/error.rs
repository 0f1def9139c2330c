use reqwest::StatusCode;
use thiserror::Error;

use super::transport::TransportError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication failed with status {status}: {body}")]
    Auth { status: StatusCode, body: String },

    /// Refresh token missing or rejected. Inside the call wrapper this
    /// triggers the re-auth fallback and is not surfaced to the caller
    /// unless re-auth also fails.
    #[error("token refresh failed: {0}")]
    Refresh(String),

    /// Non-401 4xx/5xx. Never retried.
    #[error("api request failed with status {status}: {body}")]
    Http { status: StatusCode, body: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unexpected response payload: {0}")]
    Payload(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;
