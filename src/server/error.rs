use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Error categories exposed by the API. Every stacker failure collapses into
/// `Internal`; the detail stays in the server log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    MethodNotAllowed,
    BadRequest,
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "Only POST requests are allowed",
            ),
            ApiError::BadRequest => (
                StatusCode::BAD_REQUEST,
                "Please provide an array of image URLs",
            ),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Error processing images"),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
