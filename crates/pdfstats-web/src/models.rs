use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pdfstats_core::DocumentError;
use serde::Serialize;

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorJson {
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthJson {
    pub status: &'static str,
    pub version: &'static str,
}

/// A failed request: HTTP status plus a human-readable message.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<DocumentError> for ApiError {
    fn from(err: DocumentError) -> Self {
        let status = if err.is_invalid_input() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "request failed");
        } else {
            tracing::warn!(status = %self.status, error = %self.message, "request rejected");
        }
        (
            self.status,
            Json(ErrorJson {
                error: self.message,
            }),
        )
            .into_response()
    }
}
