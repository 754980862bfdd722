//! API error types for the tracker client.

use thiserror::Error;

/// Errors that can occur when talking to the tracker backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited: please wait before retrying")]
    RateLimited,

    /// Tracker server error.
    #[error("Tracker server error: {0}")]
    ServerError(String),

    /// Network or HTTP error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Invalid response from the API.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Connection validation failed.
    #[error("Connection validation failed: {0}")]
    ConnectionFailed(String),

    /// Failed to update an issue.
    #[error("Failed to update issue: {0}")]
    UpdateFailed(String),
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Create an error from an HTTP status code.
    ///
    /// The backend does not guarantee structured error codes, so only
    /// success/failure and not-found are distinguished; everything else
    /// folds into a server error carrying the response context.
    pub fn from_status(status: reqwest::StatusCode, context: &str) -> Self {
        match status.as_u16() {
            404 => ApiError::NotFound(context.to_string()),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(format!("HTTP {}: {}", status, context)),
            _ => ApiError::ServerError(format!("Unexpected HTTP {}: {}", status, context)),
        }
    }
}
