//! Error taxonomy for lifecycle operations.
//!
//! Every precondition failure aborts with one of these kinds and a
//! user-facing message. Some ambiguity is deliberate: expired and wrong
//! one-time secrets collapse into the same message, as do missing-user and
//! wrong-password on login.

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    /// Infrastructure failure (store unreachable, signing failure). The
    /// chain is logged at the boundary; callers see a generic message.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::NotFound(_) => StatusCode::NOT_FOUND,
            AuthError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
            AuthError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AuthError::Conflict(_) => StatusCode::CONFLICT,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn status_codes_match_kinds() {
        assert_eq!(
            AuthError::not_found("x").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AuthError::unauthorized("x").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::forbidden("x").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::bad_request("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AuthError::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AuthError::from(anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn message_is_display() {
        assert_eq!(
            AuthError::unauthorized("Invalid credentials").to_string(),
            "Invalid credentials"
        );
        assert_eq!(
            AuthError::bad_request("No OTP request found").to_string(),
            "No OTP request found"
        );
    }
}
