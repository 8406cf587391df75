//! Reservation entity model.

use chrono::{DateTime, Utc};
use parkhub_core::types::{ReservationId, SpotId, TimeWindow, UserId, VehicleId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::ReservationStatus;

/// A booked time window on a spot.
///
/// For a given spot, no two pending/active reservations overlap. Rows are
/// never deleted; cancellation and completion are status changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    /// Unique reservation identifier.
    pub id: ReservationId,
    /// The booking customer.
    pub customer_id: UserId,
    /// The reserved spot.
    pub spot_id: SpotId,
    /// The vehicle the booking is for.
    pub vehicle_id: VehicleId,
    /// Inclusive start.
    pub start_time: DateTime<Utc>,
    /// Exclusive end.
    pub end_time: DateTime<Utc>,
    /// Lifecycle status.
    pub status: ReservationStatus,
    /// When the reservation was created.
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// The booked window.
    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.start_time,
            end: self.end_time,
        }
    }

    /// Whether `at` falls within `[start, end]`.
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        self.window().covers(at)
    }

    /// Whether the no-show grace period has run out at `now`.
    pub fn is_past_grace(&self, now: DateTime<Utc>, grace: chrono::Duration) -> bool {
        now > self.start_time + grace
    }
}

/// Data required to create a new reservation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReservation {
    /// The booking customer.
    pub customer_id: UserId,
    /// The chosen spot.
    pub spot_id: SpotId,
    /// The vehicle.
    pub vehicle_id: VehicleId,
    /// Inclusive start.
    pub start_time: DateTime<Utc>,
    /// Exclusive end.
    pub end_time: DateTime<Utc>,
    /// Initial status.
    pub status: ReservationStatus,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}
