//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// API-level error type that maps to HTTP responses.
///
/// A purchase attempt that fails on the marketplace is not an `ApiError`;
/// it is reported as an `"error"` outcome with HTTP 200.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// The request body could not be read as a form or JSON.
    UnprocessableBody(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::UnprocessableBody(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
        };
        tracing::warn!(%status, error = %message, "request rejected");

        let body = serde_json::json!({ "status": "error", "message": message });
        (status, axum::Json(body)).into_response()
    }
}
