//! API error types and conversions

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rvi_core::GatewayError;
use serde::Serialize;

/// API error type that converts to HTTP responses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// 400 Bad Request
    Validation(String),
    /// 404 Not Found
    NotFound(String),
    /// 408 Request Timeout (no RVI reply in time)
    Timeout(String),
    /// 500 Internal Server Error
    Internal(String),
}

impl ApiError {
    pub fn validation() -> Self {
        ApiError::Validation("Invalid or missing request parameters.".to_string())
    }

    pub fn not_found() -> Self {
        ApiError::NotFound("The requested resource was not found.".to_string())
    }

    pub fn timeout() -> Self {
        ApiError::Timeout("The server timed out waiting for a response.".to_string())
    }

    pub fn internal() -> Self {
        ApiError::Internal("Unexpected server error, please try again.".to_string())
    }

    /// HTTP status and error name
    pub fn kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "resource_not_found"),
            ApiError::Timeout(_) => (StatusCode::REQUEST_TIMEOUT, "timeout_error"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "server_error"),
        }
    }
}

/// Standard error response format
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.kind();
        let message = match self {
            ApiError::Validation(msg)
            | ApiError::NotFound(msg)
            | ApiError::Timeout(msg)
            | ApiError::Internal(msg) => msg,
        };

        // Log errors at appropriate levels
        if status.is_server_error() {
            tracing::error!(error = error_type, %message, "API error");
        } else if status.is_client_error() {
            tracing::debug!(error = error_type, %message, "API client error");
        }

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Timeout { .. } => ApiError::timeout(),
            GatewayError::Abandoned => ApiError::internal(),
        }
    }
}
