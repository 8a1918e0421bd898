use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use validator::ValidationErrors;

use crate::kind::RecordKind;

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("{} not found: {id}", .kind.label())]
    NotFound { kind: RecordKind, id: String },

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type TrackingResult<T> = Result<T, TrackingError>;

impl TrackingError {
    pub fn not_found(kind: RecordKind, id: impl Into<String>) -> Self {
        TrackingError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Convert TrackingError to AppError for standardized error responses
impl From<TrackingError> for AppError {
    fn from(err: TrackingError) -> Self {
        match err {
            TrackingError::NotFound { kind, .. } => {
                AppError::NotFound(format!("{} not found", kind.label()))
            }
            TrackingError::Validation(errors) => AppError::ValidationError(errors),
            TrackingError::Database(msg) => AppError::Database(msg),
            TrackingError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for TrackingError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for TrackingError {
    fn from(err: mongodb::error::Error) -> Self {
        TrackingError::Database(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for TrackingError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        TrackingError::Database(err.to_string())
    }
}

impl From<mongodb::bson::de::Error> for TrackingError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        TrackingError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use validator::ValidationError;

    #[test]
    fn test_not_found_maps_to_404() {
        let response = TrackingError::not_found(RecordKind::Goal, "abc").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validation_maps_to_400() {
        let mut errors = ValidationErrors::new();
        errors.add("source", ValidationError::new("required"));
        let response = TrackingError::from(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_database_maps_to_500() {
        let response = TrackingError::Database("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_not_found_display_names_kind() {
        let err = TrackingError::not_found(RecordKind::View, "42");
        assert_eq!(err.to_string(), "View not found: 42");
    }
}
