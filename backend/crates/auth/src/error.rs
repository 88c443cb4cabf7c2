//! Auth Error Types
//!
//! Auth-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong user name or password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Too many failed logins from one address
    #[error("Too many failed login attempts")]
    TooManyAttempts,

    /// Unknown, expired or missing session token
    #[error("Session not found or expired")]
    SessionInvalid,

    /// The session mapping could not be written to durable storage
    #[error("Session persistence failed: {0}")]
    Persistence(#[from] std::io::Error),

    /// The session mapping could not be encoded or decoded
    #[error("Session serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Whether the session mapping may have diverged from durable storage
    pub fn is_persistence_failure(&self) -> bool {
        matches!(self, AuthError::Persistence(_) | AuthError::Serialization(_))
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials | AuthError::SessionInvalid => ErrorKind::Unauthorized,
            AuthError::TooManyAttempts => ErrorKind::TooManyRequests,
            AuthError::Persistence(_) | AuthError::Serialization(_) | AuthError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Convert to AppError; storage details stay in the logs
    pub fn to_app_error(&self) -> AppError {
        match self {
            AuthError::InvalidCredentials => AppError::unauthorized("Invalid credentials"),
            AuthError::SessionInvalid => AppError::unauthorized("Session not found or expired")
                .with_action("Log in again"),
            AuthError::TooManyAttempts => AppError::too_many_requests("Too many requests"),
            _ => AppError::internal("Internal error"),
        }
    }

    fn log(&self) {
        match self {
            AuthError::Persistence(e) => {
                tracing::error!(error = %e, "Session mapping could not be persisted");
            }
            AuthError::Serialization(e) => {
                tracing::error!(error = %e, "Session mapping could not be encoded");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::TooManyAttempts => {
                tracing::warn!("Login refused for locked out address");
            }
            AuthError::SessionInvalid => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        err.to_app_error()
    }
}

impl From<platform::password::PasswordError> for AuthError {
    fn from(err: platform::password::PasswordError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
