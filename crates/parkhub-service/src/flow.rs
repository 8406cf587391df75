//! Internal control flow for operations that answer with an
//! [`OperationOutcome`] instead of an error.

use parkhub_core::error::AppError;
use parkhub_core::events::RejectionCode;
use parkhub_core::result::AppResult;
use parkhub_core::types::OperationOutcome;

/// Either an anticipated rejection or an unexpected failure.
#[derive(Debug)]
pub(crate) enum Flow {
    Reject(RejectionCode, String),
    Fail(AppError),
}

impl From<AppError> for Flow {
    fn from(err: AppError) -> Self {
        Self::Fail(err)
    }
}

pub(crate) fn reject<T>(code: RejectionCode, message: impl Into<String>) -> Result<T, Flow> {
    Err(Flow::Reject(code, message.into()))
}

/// Turn a flow result into the caller-facing outcome. Only unanticipated
/// failures remain errors.
pub(crate) fn settle<T>(
    result: Result<T, Flow>,
    success_message: &str,
) -> AppResult<OperationOutcome<T>> {
    match result {
        Ok(data) => Ok(OperationOutcome::accepted(success_message, data)),
        Err(Flow::Reject(code, message)) => Ok(OperationOutcome::rejected(code, message)),
        Err(Flow::Fail(err)) => Err(err),
    }
}
