//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use parkhub_core::error::{AppError, ErrorKind};
use parkhub_core::types::{ApiErrorResponse, OperationOutcome};

/// Handler error wrapper so `AppError` can become a response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

/// HTTP status and wire code for an error kind.
pub fn status_for(kind: ErrorKind) -> (StatusCode, &'static str) {
    match kind {
        ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
        ErrorKind::StateTransition => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_TRANSITION"),
        ErrorKind::ServiceUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
        ErrorKind::Database
        | ErrorKind::Configuration
        | ErrorKind::Serialization
        | ErrorKind::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let (status, error_code) = status_for(err.kind);
        if status.is_server_error() {
            tracing::error!(kind = %err.kind, error = %err.message, "Request failed");
        }

        let body = ApiErrorResponse {
            error: error_code.to_string(),
            message: err.message,
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

/// Outcome body with a status matching it: `success_status` when accepted,
/// otherwise the status of the rejection code's kind.
pub fn outcome_response<T: Serialize>(
    outcome: OperationOutcome<T>,
    success_status: StatusCode,
) -> Response {
    let status = match outcome.error_code {
        None => success_status,
        Some(code) => status_for(code.kind()).0,
    };
    (status, Json(outcome)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parkhub_core::events::RejectionCode;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::Validation).0, StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(ErrorKind::StateTransition).0,
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(ErrorKind::Database).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_rejected_outcome_uses_code_status() {
        let outcome: OperationOutcome<()> =
            OperationOutcome::rejected(RejectionCode::ExitAlreadyRegistered, "closed");
        let response = outcome_response(outcome, StatusCode::OK);
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
