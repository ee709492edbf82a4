//! Error types for the service layer and API responses

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::models::FailureEnvelope;

/// Result string carried by failure envelopes for validation errors
pub const RESULT_FAIL: &str = "fail";

/// Result string carried by failure envelopes for authentication errors
pub const RESULT_UNAUTHORIZED: &str = "400 Unauthorized error";

/// Errors reported by service implementations
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// API error types
///
/// Every variant renders as HTTP 400. The variants differ only in the
/// `result` string of the envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Validation, not-found and other service failures
    Fail(&'static str),
    /// Failed login or a missing/rejected access token
    Unauthorized(&'static str),
}

impl ApiError {
    /// The capability-specific message code
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Fail(code) | ApiError::Unauthorized(code) => *code,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let result = match self {
            ApiError::Fail(_) => RESULT_FAIL,
            ApiError::Unauthorized(_) => RESULT_UNAUTHORIZED,
        };

        let body = Json(FailureEnvelope {
            result: result.to_string(),
            message: self.code().to_string(),
        });

        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_display() {
        let err = ServiceError::NotFound {
            resource: "book",
            id: "42".to_string(),
        };
        assert_eq!(err.to_string(), "book not found: 42");
    }

    #[test]
    fn test_api_error_status_is_bad_request() {
        let response = ApiError::Fail("get_book_fail").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError::Unauthorized("login_fail").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_api_error_code() {
        assert_eq!(ApiError::Fail("invalid input").code(), "invalid input");
        assert_eq!(ApiError::Unauthorized("login_fail").code(), "login_fail");
    }
}
