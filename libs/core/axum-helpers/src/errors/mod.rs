pub mod codes;
pub mod responses;

pub use codes::ErrorCode;

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// Body of every error response.
///
/// - `code`: integer error code for logs and monitoring (e.g. 1004)
/// - `message`: human-readable summary
/// - `error`: failure detail (driver message, validation detail, or an
///   identifier such as `NOT_FOUND`)
/// - `details`: optional structured data, e.g. per-field validation errors
///
/// ```json
/// {
///   "code": 1004,
///   "message": "Goal not found",
///   "error": "NOT_FOUND"
/// }
/// ```
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: i32,
    pub message: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application error type that can be converted to HTTP responses.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Query extraction error: {0}")]
    QueryExtractorRejection(#[from] QueryRejection),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
}

impl AppError {
    fn parts(self) -> (StatusCode, ErrorCode, String, String, Option<serde_json::Value>) {
        match self {
            // Every unreadable body is a 400, whatever axum's own status would be
            AppError::JsonExtractorRejection(e) => (
                StatusCode::BAD_REQUEST,
                ErrorCode::JsonExtraction,
                ErrorCode::JsonExtraction.default_message().to_string(),
                e.body_text(),
                None,
            ),
            AppError::QueryExtractorRejection(e) => (
                StatusCode::BAD_REQUEST,
                ErrorCode::InvalidQuery,
                ErrorCode::InvalidQuery.default_message().to_string(),
                e.body_text(),
                None,
            ),
            AppError::ValidationError(e) => (
                StatusCode::BAD_REQUEST,
                ErrorCode::ValidationError,
                ErrorCode::ValidationError.default_message().to_string(),
                e.to_string(),
                serde_json::to_value(&e).ok(),
            ),
            AppError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                ErrorCode::NotFound,
                message,
                ErrorCode::NotFound.as_str().to_string(),
                None,
            ),
            AppError::Database(detail) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::DatabaseError,
                ErrorCode::DatabaseError.default_message().to_string(),
                detail,
                None,
            ),
            AppError::InternalServerError(detail) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalError,
                ErrorCode::InternalError.default_message().to_string(),
                detail,
                None,
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, error, details) = self.parts();

        if status.is_server_error() {
            tracing::error!(error_code = code.code(), %message, %error, "Request failed");
        } else {
            tracing::info!(error_code = code.code(), %message, %error, "Request rejected");
        }

        let body = Json(ErrorResponse {
            code: code.code(),
            message,
            error,
            details,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use validator::ValidationError;

    async fn body_of(error: AppError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let (status, body) = body_of(AppError::NotFound("View not found".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 1004);
        assert_eq!(body["message"], "View not found");
        assert_eq!(body["error"], "NOT_FOUND");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_database_error_passes_driver_message() {
        let (status, body) = body_of(AppError::Database("connection refused".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Server error");
        assert_eq!(body["error"], "connection refused");
    }


    #[tokio::test]
    async fn test_validation_errors_have_details() {
        let mut errors = ValidationErrors::new();
        errors.add("url", ValidationError::new("required"));

        let (status, body) = body_of(AppError::ValidationError(errors)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Request validation failed");
        assert!(body["error"].as_str().unwrap().contains("url"));
        assert_eq!(body["details"]["url"][0]["code"], "required");
    }
}
