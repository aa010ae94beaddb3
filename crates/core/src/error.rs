//! Error taxonomy for point mutation operations.
//!
//! Three failure classes cross the API boundary with distinct status codes:
//! not-found (a referenced point or collection is absent where existence is
//! required), wrong input (a referenced vector name is not declared in the
//! collection schema, or a dimension mismatch), and validation (the request
//! shape itself is invalid). Display strings are part of the API contract.

use crate::point::PointId;

/// Errors produced by the point store and batch executor.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// An operation required an existing point and it is absent. Maps to 404.
    #[error("Not found: No point with id {0} found")]
    PointNotFound(PointId),

    /// The addressed collection does not exist. Maps to 404.
    #[error("Not found: Collection '{0}' not found")]
    CollectionNotFound(String),

    /// Collection creation with a name that is already taken. Maps to 409.
    #[error("Collection '{0}' already exists")]
    CollectionExists(String),

    /// The operation references something the schema does not declare,
    /// e.g. an unknown vector name or a wrong dimension. Maps to 400.
    #[error("Wrong input: {0}")]
    WrongInput(String),

    /// The request shape is invalid; `field` is the offending path. Maps to 422.
    #[error("Validation error in JSON body: [{field}: {message}]")]
    Validation {
        /// Path of the offending field, e.g. `points[0].vector`.
        field: String,
        /// Human-readable description of the constraint.
        message: String,
    },
}

impl StoreError {
    /// WrongInput for a vector name not declared in the collection schema.
    pub fn vector_name(name: &str) -> Self {
        StoreError::WrongInput(format!("Not existing vector name error: {name}"))
    }

    /// WrongInput for a vector whose length does not match the declared dimension.
    pub fn vector_dimension(expected: usize, got: usize) -> Self {
        StoreError::WrongInput(format!(
            "Vector dimension error: expected dim: {expected}, got {got}"
        ))
    }

    /// Validation error with a field path and message.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Prefix the field path of a validation error, used to report which
    /// batch element failed (`[2].points[0].vector`). Other variants pass
    /// through unchanged.
    pub fn with_field_prefix(self, prefix: &str) -> Self {
        match self {
            StoreError::Validation { field, message } => StoreError::Validation {
                field: format!("{prefix}{field}"),
                message,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = StoreError::PointNotFound(PointId::Num(424242424242424242));
        assert_eq!(
            err.to_string(),
            "Not found: No point with id 424242424242424242 found"
        );
    }

    #[test]
    fn test_wrong_input_vector_name_message() {
        let err = StoreError::vector_name("a");
        assert_eq!(err.to_string(), "Wrong input: Not existing vector name error: a");
    }

    #[test]
    fn test_dimension_error_message() {
        let err = StoreError::vector_dimension(4, 3);
        assert_eq!(
            err.to_string(),
            "Wrong input: Vector dimension error: expected dim: 4, got 3"
        );
    }

    #[test]
    fn test_validation_message_includes_field_path() {
        let err = StoreError::validation("points[0].vector", "must specify vectors to update for point");
        assert_eq!(
            err.to_string(),
            "Validation error in JSON body: [points[0].vector: must specify vectors to update for point]"
        );
    }

    #[test]
    fn test_field_prefix_only_touches_validation() {
        let err = StoreError::validation("points[0].vector", "msg").with_field_prefix("[2].");
        assert_eq!(
            err.to_string(),
            "Validation error in JSON body: [[2].points[0].vector: msg]"
        );
        let err = StoreError::vector_name("a").with_field_prefix("[2].");
        assert_eq!(err, StoreError::vector_name("a"));
    }
}
