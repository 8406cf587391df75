//! Request DTOs with validation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use validator::{Validate, ValidationError};

/// Reservation status change.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    /// Target status, e.g. `active` or `cancelled`.
    #[validate(length(min = 1, message = "status is required"))]
    pub status: String,
}

/// Query for `GET /api/spots/available`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_window"))]
pub struct AvailableSpotsQuery {
    /// Window start.
    pub start: DateTime<Utc>,
    /// Window end.
    pub end: DateTime<Utc>,
    /// Also require the spot to be free right now.
    #[serde(default)]
    pub immediate: bool,
}

fn validate_window(query: &AvailableSpotsQuery) -> Result<(), ValidationError> {
    if query.start >= query.end {
        let mut err = ValidationError::new("window");
        err.message = Some("start must be before end".into());
        return Err(err);
    }
    Ok(())
}

/// Filters for `GET /api/reservations`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationQuery {
    /// Only this customer's reservations.
    pub customer_id: Option<String>,
    /// Start lower bound, with `customer_id`.
    pub from: Option<DateTime<Utc>>,
    /// Start upper bound, with `customer_id`.
    pub to: Option<DateTime<Utc>>,
    /// Only reservations starting on this day.
    pub date: Option<NaiveDate>,
    /// Comma-separated statuses, with `date`.
    pub status: Option<String>,
}

/// Filters for a customer's session history.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionHistoryQuery {
    /// Entered at or after.
    pub from: Option<DateTime<Utc>>,
    /// Entered before.
    pub to: Option<DateTime<Utc>>,
    /// Only sessions still open.
    #[serde(default)]
    pub open_only: bool,
}
