//! Centralized error types for issuedeck.
//!
//! This module provides a unified error hierarchy for the application
//! with user-friendly messages. All error types use `thiserror`.

use thiserror::Error;

use crate::api::error::ApiError;
use crate::config::ConfigError;
use crate::session::SessionError;

/// The main application error type.
///
/// Aggregates every error the application can hit, providing
/// user-friendly messages for the status line while preserving the
/// underlying error for the logs.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration-related errors.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// API-related errors.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Session validation errors.
    #[error("{0}")]
    Session(#[from] SessionError),

    /// IO errors (file system, etc.).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal-related errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Generic errors with a message.
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Create a terminal error.
    pub fn terminal(msg: impl Into<String>) -> Self {
        AppError::Terminal(msg.into())
    }

    /// Create a generic error.
    pub fn other(msg: impl Into<String>) -> Self {
        AppError::Other(msg.into())
    }

    /// Get a user-friendly message for the status line.
    ///
    /// No technical jargon, no stack traces; the full error goes to the
    /// log file instead.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(e) => match e {
                ConfigError::NoConfigDir => {
                    "Could not find configuration directory. Please check your system settings."
                        .to_string()
                }
                ConfigError::CreateDirError(_) => {
                    "Could not create configuration directory. Check file permissions.".to_string()
                }
                ConfigError::ReadError(_) => {
                    "Could not read configuration file. Please check the file exists and is readable.".to_string()
                }
                ConfigError::WriteError(_) => {
                    "Could not save configuration. Please check file permissions.".to_string()
                }
                ConfigError::ParseError(_) => {
                    "Configuration file is invalid. Please check the file format.".to_string()
                }
                ConfigError::SerializeError(_) => {
                    "Could not save configuration. Internal error.".to_string()
                }
                ConfigError::ValidationError(msg) => format!("Configuration error: {}", msg),
                ConfigError::ProfileNotFound(name) => {
                    format!("Profile '{}' not found.", name)
                }
            },
            AppError::Api(e) => match e {
                ApiError::NotFound(resource) => format!("{}.", resource),
                ApiError::RateLimited => {
                    "Too many requests. Please wait a moment and try again.".to_string()
                }
                ApiError::ServerError(_) => {
                    "Tracker server error. Please try again later.".to_string()
                }
                ApiError::Network(_) => {
                    "Connection failed. Please check your network.".to_string()
                }
                ApiError::InvalidResponse(_) => {
                    "Unexpected response from the tracker. Please try again.".to_string()
                }
                ApiError::ConnectionFailed(_) => {
                    "Could not connect to the tracker. Please check your URL and network."
                        .to_string()
                }
                ApiError::UpdateFailed(msg) => format!("Failed to update issue: {}", msg),
            },
            // Session errors are already written for users.
            AppError::Session(e) => e.to_string(),
            AppError::Io(_) => "A file operation failed. Please check file permissions.".to_string(),
            AppError::Terminal(msg) => format!("Terminal error: {}", msg),
            AppError::Other(msg) => msg.clone(),
        }
    }

    /// Check if this error is critical and requires user acknowledgment.
    ///
    /// Critical errors prevent the application from working at all, such
    /// as a broken configuration or an unreachable backend at startup.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            AppError::Config(_)
                | AppError::Api(ApiError::ConnectionFailed(_))
                | AppError::Terminal(_)
        )
    }

    /// Check if this error is recoverable.
    ///
    /// Recoverable errors can be retried or worked around while the
    /// application keeps running.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Api(ApiError::RateLimited)
                | AppError::Api(ApiError::ServerError(_))
                | AppError::Api(ApiError::Network(_))
                | AppError::Api(ApiError::NotFound(_))
                | AppError::Api(ApiError::UpdateFailed(_))
                | AppError::Session(_)
        )
    }
}

/// Result type for application operations.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_from_config_error() {
        let config_err = ConfigError::NoConfigDir;
        let app_err: AppError = config_err.into();
        assert!(matches!(app_err, AppError::Config(ConfigError::NoConfigDir)));
    }

    #[test]
    fn test_app_error_from_api_error() {
        let api_err = ApiError::RateLimited;
        let app_err: AppError = api_err.into();
        assert!(matches!(app_err, AppError::Api(ApiError::RateLimited)));
    }

    #[test]
    fn test_user_message_not_found() {
        let err = AppError::Api(ApiError::NotFound("Issue '42' not found".to_string()));
        let msg = err.user_message();
        assert!(msg.contains("42"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn test_user_message_connection_failed() {
        let err = AppError::Api(ApiError::ConnectionFailed("refused".to_string()));
        let msg = err.user_message();
        assert!(msg.contains("Could not connect to the tracker"));
    }

    #[test]
    fn test_user_message_config_validation() {
        let err = AppError::Config(ConfigError::ValidationError(
            "duplicate profile".to_string(),
        ));
        let msg = err.user_message();
        assert!(msg.contains("duplicate profile"));
    }

    #[test]
    fn test_user_message_session_error() {
        let err = AppError::Session(SessionError::UserNotFound("carol".to_string()));
        assert_eq!(err.user_message(), "User 'carol' not found");
    }

    #[test]
    fn test_is_critical_config() {
        let err = AppError::Config(ConfigError::NoConfigDir);
        assert!(err.is_critical());
    }

    #[test]
    fn test_is_critical_connection_failed() {
        let err = AppError::Api(ApiError::ConnectionFailed("refused".to_string()));
        assert!(err.is_critical());
    }

    #[test]
    fn test_is_not_critical_rate_limited() {
        let err = AppError::Api(ApiError::RateLimited);
        assert!(!err.is_critical());
    }

    #[test]
    fn test_is_recoverable_not_found() {
        let err = AppError::Api(ApiError::NotFound("TEST".to_string()));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_is_recoverable_session_validation() {
        let err = AppError::Session(SessionError::Validation("Title is required"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_terminal_error() {
        let err = AppError::terminal("test error");
        assert!(matches!(err, AppError::Terminal(_)));
        assert_eq!(err.user_message(), "Terminal error: test error");
    }

    #[test]
    fn test_other_error() {
        let err = AppError::other("something went wrong");
        assert!(matches!(err, AppError::Other(_)));
        assert_eq!(err.user_message(), "something went wrong");
    }
}
