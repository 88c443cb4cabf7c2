//! HTTP rendering of [`AppError`]
//!
//! Client installations read only `Result` and `ErrorMessage`; the other
//! fields are for the moderator pages and for humans reading responses.

use super::app_error::AppError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = serde_json::json!({
            "Result": "error",
            "ErrorMessage": self.message(),
            "status": self.status_code(),
            "title": self.kind().as_str(),
            "action": self.action(),
        });

        (status, Json(body)).into_response()
    }
}
