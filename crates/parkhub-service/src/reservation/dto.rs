//! Reservation request types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use parkhub_core::types::{SpotId, UserId, VehicleId};

/// Booking request.
///
/// `spot_id` is a preference. When that spot is taken the booking silently
/// falls back to the first free spot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    /// The booking customer.
    pub customer_id: UserId,
    /// The vehicle the booking is for.
    pub vehicle_id: VehicleId,
    /// Preferred spot.
    #[serde(default, alias = "parkingId")]
    pub spot_id: Option<SpotId>,
    /// Inclusive start.
    pub start_time: DateTime<Utc>,
    /// Exclusive end.
    pub end_time: DateTime<Utc>,
}
