//! Error types for the query service
//!
//! Cache, scheduler and sampler operations are total and never fail. Errors
//! exist only at the HTTP boundary and at the offloaded compute boundary.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Compute Error ==
/// Failure of the offloaded compute collaborator.
///
/// Always surfaced to the caller; a failed search is never reported as an
/// empty result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputeError {
    /// The backend reported a failure
    #[error("Compute failed: {0}")]
    Failed(String),

    /// The backend did not answer in time
    #[error("Compute timed out after {0:?}")]
    TimedOut(Duration),

    /// The backend task was dropped before completing
    #[error("Compute cancelled")]
    Cancelled,
}

// == App Error Enum ==
/// Unified error type for the HTTP surface.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Offloaded computation failed
    #[error(transparent)]
    Compute(#[from] ComputeError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Compute(ComputeError::TimedOut(_)) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Compute(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the query service.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (
                AppError::from(ComputeError::TimedOut(Duration::from_secs(1))),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                AppError::from(ComputeError::Failed("boom".into())),
                StatusCode::BAD_GATEWAY,
            ),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_compute_error_message() {
        let error = AppError::from(ComputeError::Failed("worker crashed".into()));
        assert_eq!(error.to_string(), "Compute failed: worker crashed");
    }
}
