//! Error handling module for the HangSmart backend.
//!
//! Provides centralized error types with mapping to HTTP status codes and response envelopes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const NOT_A_MEMBER: &str = "NOT_A_MEMBER";
    pub const CONFLICT: &str = "CONFLICT";
    pub const AUTH_ERROR: &str = "AUTH_ERROR";
    pub const STORAGE_READ_ERROR: &str = "STORAGE_READ_ERROR";
    pub const STORAGE_WRITE_ERROR: &str = "STORAGE_WRITE_ERROR";
    pub const UPSTREAM_ERROR: &str = "UPSTREAM_ERROR";
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Bad caller input (empty group name, malformed fields)
    Validation(String),
    /// Referenced group or document does not exist
    NotFound(String),
    /// Caller is not a member of the group they are targeting
    NotAMember(String),
    /// Retries of an optimistic write exhausted
    Conflict(String),
    /// Sign-in/sign-up/session failure
    Auth(String),
    /// Transport-level failure reading from the store
    StorageRead(String),
    /// Transport-level failure writing to the store
    StorageWrite(String),
    /// Recommendation or place API failure
    Upstream(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::NotAMember(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::StorageRead(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::StorageWrite(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::NotAMember(_) => codes::NOT_A_MEMBER,
            AppError::Conflict(_) => codes::CONFLICT,
            AppError::Auth(_) => codes::AUTH_ERROR,
            AppError::StorageRead(_) => codes::STORAGE_READ_ERROR,
            AppError::StorageWrite(_) => codes::STORAGE_WRITE_ERROR,
            AppError::Upstream(_) => codes::UPSTREAM_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> &str {
        match self {
            AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::NotAMember(msg)
            | AppError::Conflict(msg)
            | AppError::Auth(msg)
            | AppError::StorageRead(msg)
            | AppError::StorageWrite(msg)
            | AppError::Upstream(msg) => msg,
        }
    }

    /// Wrap a database error from a read path.
    pub fn storage_read(err: sqlx::Error) -> Self {
        tracing::error!("Storage read error: {:?}", err);
        AppError::StorageRead(format!("Storage read error: {}", err))
    }

    /// Wrap a database error from a write path.
    pub fn storage_write(err: sqlx::Error) -> Self {
        tracing::error!("Storage write error: {:?}", err);
        AppError::StorageWrite(format!("Storage write error: {}", err))
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!("Upstream error: {:?}", err);
        AppError::Upstream(format!("Upstream request failed: {}", err))
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message().to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::NotAMember("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Auth("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Upstream("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            AppError::Validation("x".into()),
            AppError::NotFound("x".into()),
            AppError::NotAMember("x".into()),
            AppError::Conflict("x".into()),
            AppError::Auth("x".into()),
            AppError::StorageRead("x".into()),
            AppError::StorageWrite("x".into()),
            AppError::Upstream("x".into()),
        ];
        let mut codes: Vec<&str> = errors.iter().map(|e| e.error_code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_envelope_shape() {
        let err = AppError::NotAMember("not in this group".into());
        let body = ErrorResponse::new(&err);
        assert!(!body.success);
        assert_eq!(body.error.code, "NOT_A_MEMBER");
        assert_eq!(body.error.message, "not in this group");
    }
}
