//! API error types mapped to HTTP status codes.
//!
//! Each [`ApiError`] variant maps to a specific HTTP status code and
//! produces the error envelope `{"status": {"error": "message"}, "time": t}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pointsdb_core::error::StoreError;
use serde_json::json;

/// Application-level error type that implements `IntoResponse`.
///
/// Each variant maps to an HTTP status code:
/// - `NotFound` → 404
/// - `BadRequest` → 400
/// - `UnprocessableEntity` → 422
/// - `Conflict` → 409
/// - `Internal` → 500
#[derive(Debug)]
pub enum ApiError {
    /// Referenced point or collection is absent (404).
    NotFound(String),
    /// Request references something the schema does not declare (400).
    BadRequest(String),
    /// Request shape is invalid (422).
    UnprocessableEntity(String),
    /// Resource already exists (409).
    Conflict(String),
    /// Unexpected server error (500).
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let message = err.to_string();
        match err {
            StoreError::PointNotFound(_) | StoreError::CollectionNotFound(_) => {
                ApiError::NotFound(message)
            }
            StoreError::CollectionExists(_) => ApiError::Conflict(message),
            StoreError::WrongInput(_) => ApiError::BadRequest(message),
            StoreError::Validation { .. } => ApiError::UnprocessableEntity(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        let body = axum::Json(json!({ "status": { "error": message }, "time": 0.0 }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pointsdb_core::point::PointId;

    #[test]
    fn test_store_error_status_mapping() {
        assert!(matches!(
            ApiError::from(StoreError::PointNotFound(PointId::Num(1))),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::vector_name("a")),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::validation("points", "required")),
            ApiError::UnprocessableEntity(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::CollectionExists("c".into())),
            ApiError::Conflict(_)
        ));
    }
}
