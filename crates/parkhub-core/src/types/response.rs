//! Structured outcomes and API error bodies.

use serde::{Deserialize, Serialize};

use crate::events::RejectionCode;

/// Result of an entry, exit or reservation request.
///
/// Anticipated failures are carried as `success: false` with a
/// machine-readable code rather than as an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcome<T> {
    /// Whether the operation took effect.
    pub success: bool,
    /// Human-readable message.
    pub message: String,
    /// Rejection code, present only on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<RejectionCode>,
    /// Resulting record, present only on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> OperationOutcome<T> {
    /// A successful outcome carrying `data`.
    pub fn accepted(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            error_code: None,
            data: Some(data),
        }
    }

    /// A rejected outcome.
    pub fn rejected(code: RejectionCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error_code: Some(code),
            data: None,
        }
    }

    /// Map the carried data.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> OperationOutcome<U> {
        OperationOutcome {
            success: self.success,
            message: self.message,
            error_code: self.error_code,
            data: self.data.map(f),
        }
    }
}

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Optional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
