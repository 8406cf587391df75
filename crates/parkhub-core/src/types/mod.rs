//! Core type definitions used across the ParkHub workspace.

pub mod id;
pub mod interval;
pub mod response;

pub use id::*;
pub use interval::TimeWindow;
pub use response::{ApiErrorResponse, OperationOutcome};
