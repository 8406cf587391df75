//! Reservation lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "reservation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// Booked, not yet started.
    Pending,
    /// Holder is arriving or parked.
    Active,
    /// Cancelled by the customer, an operator, or the no-show sweep.
    Cancelled,
    /// The holder left.
    Completed,
}

impl ReservationStatus {
    /// Statuses that hold the spot for their window.
    pub const BLOCKING: [ReservationStatus; 2] = [Self::Pending, Self::Active];

    /// Whether this status holds the spot for its window.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Pending | Self::Active)
    }

    /// Check if the reservation is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }

    /// Legal transitions: pending to active or cancelled, active to
    /// cancelled or completed.
    pub fn can_transition_to(&self, next: ReservationStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Cancelled)
                | (Self::Pending, Self::Active)
                | (Self::Active, Self::Cancelled)
                | (Self::Active, Self::Completed)
        )
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown reservation status '{other}'")),
        }
    }
}
