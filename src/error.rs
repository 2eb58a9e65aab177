use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::db::DatabaseError;

/// User-visible reasons a registration request is rejected. These surface
/// directly to the submitter; none of them cross the ledger boundary as a
/// panic or opaque failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("This workshop is not accepting registrations.")]
    WorkshopClosed,

    #[error("This workshop is full. Only {capacity} slots were available.")]
    WorkshopFull { capacity: i32 },

    #[error("Grade must be between 2 and 12.")]
    InvalidGrade,

    #[error("Contact number must be a valid Bangladesh mobile number (e.g. 01712345678).")]
    InvalidPhone,

    #[error("Email address is not well-formed.")]
    InvalidEmail,

    #[error("This email is already registered for this workshop.")]
    DuplicateRegistration,

    #[error("You must agree to the terms and conditions.")]
    TermsNotAccepted,
}

impl RegistrationError {
    /// Conflicts describe state of the world; validation errors describe
    /// the input.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::WorkshopClosed | Self::WorkshopFull { .. } | Self::DuplicateRegistration
        )
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("{0}")]
    Registration(#[from] RegistrationError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Database(err) => match err {
                DatabaseError::NotFound => (StatusCode::NOT_FOUND, "Resource not found"),
                DatabaseError::Duplicate => (StatusCode::CONFLICT, "Resource already exists"),
                DatabaseError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "Invalid input data"),
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred",
                ),
            },
            AppError::Registration(err) if err.is_conflict() => {
                (StatusCode::CONFLICT, "Registration conflict")
            }
            AppError::Registration(_) => (StatusCode::BAD_REQUEST, "Validation error"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "Resource not found"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "Resource conflict"),
            // Retryable from the caller's point of view; details stay in
            // the logs, never in the response.
            AppError::Gateway(_) => (
                StatusCode::BAD_GATEWAY,
                "Payment service is temporarily unavailable. Please try again.",
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred",
            ),
        };

        let details = match &self {
            // Gateway and internal errors must not leak identifiers or raw
            // provider payloads to the client.
            AppError::Gateway(_) | AppError::Internal(_) | AppError::Database(_) => {
                error_message.to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "details": details,
            }
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_classification() {
        assert!(RegistrationError::WorkshopClosed.is_conflict());
        assert!(RegistrationError::WorkshopFull { capacity: 5 }.is_conflict());
        assert!(RegistrationError::DuplicateRegistration.is_conflict());
        assert!(!RegistrationError::InvalidGrade.is_conflict());
        assert!(!RegistrationError::InvalidPhone.is_conflict());
        assert!(!RegistrationError::TermsNotAccepted.is_conflict());
    }

    #[test]
    fn full_message_includes_capacity() {
        let err = RegistrationError::WorkshopFull { capacity: 40 };
        assert!(err.to_string().contains("40"));
    }
}
