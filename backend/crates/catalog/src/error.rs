//! Catalog Error Types
//!
//! Engine-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.
//!
//! A repeated vote or report is deliberately absent: it is the expected
//! steady state of the dedup guard and surfaces as `false`, not as a fault.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::rate_limit::RequestClass;
use thiserror::Error;

/// Catalog-specific result type alias
pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// Daily quota of the request class exhausted
    #[error("Too many requests")]
    QuotaExceeded { class: RequestClass, count: u64 },

    /// Barcode has no visible ranked names
    #[error("Barcode not found")]
    NotFound,

    /// Malformed identifier or payload
    #[error("Bad request: {0}")]
    InvalidInput(String),

    /// No queued report carries the requested identifier
    #[error("Report not found")]
    ReportNotFound,

    /// Store failure surfaced under the fail-fast policy
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Raw store client error
    #[error("Store error: {0}")]
    Store(#[from] redis::RedisError),

    /// Product feed could not be fetched or decoded
    #[error("Product feed error: {0}")]
    Feed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CatalogError {
    /// Whether this error stems from the backing store
    pub fn is_store_failure(&self) -> bool {
        matches!(self, CatalogError::Store(_) | CatalogError::StoreUnavailable(_))
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::QuotaExceeded { .. } => ErrorKind::TooManyRequests,
            CatalogError::NotFound | CatalogError::ReportNotFound => ErrorKind::NotFound,
            CatalogError::InvalidInput(_) => ErrorKind::BadRequest,
            CatalogError::StoreUnavailable(_) | CatalogError::Store(_) => {
                ErrorKind::ServiceUnavailable
            }
            CatalogError::Feed(_) => ErrorKind::BadGateway,
            CatalogError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Client-facing message; never leaks store or feed details
    fn public_message(&self) -> &'static str {
        match self {
            CatalogError::QuotaExceeded { .. } => "Too many requests",
            CatalogError::NotFound => "Barcode not found",
            CatalogError::InvalidInput(_) => "Bad request",
            CatalogError::ReportNotFound => "Report not found",
            CatalogError::StoreUnavailable(_) | CatalogError::Store(_) => "Service unavailable",
            CatalogError::Feed(_) => "Upstream feed unavailable",
            CatalogError::Internal(_) => "Internal error",
        }
    }

    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.public_message());
        match self {
            CatalogError::QuotaExceeded { .. } => err.with_action("Retry after local midnight"),
            _ => err,
        }
    }

    fn log(&self) {
        match self {
            CatalogError::Store(e) => {
                tracing::error!(error = %e, "Catalog store error");
            }
            CatalogError::StoreUnavailable(msg) => {
                tracing::error!(message = %msg, "Catalog store unavailable");
            }
            CatalogError::Internal(msg) => {
                tracing::error!(message = %msg, "Catalog internal error");
            }
            CatalogError::Feed(msg) => {
                tracing::warn!(message = %msg, "Product feed error");
            }
            CatalogError::QuotaExceeded { class, count } => {
                tracing::warn!(class = %class, count = count, "Daily quota exceeded");
            }
            _ => {
                tracing::debug!(error = %self, "Catalog error");
            }
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        err.to_app_error()
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}
