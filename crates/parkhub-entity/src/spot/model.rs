//! Spot entity model.

use parkhub_core::types::SpotId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A single physical parking space.
///
/// `occupied` is true while an occupancy session is open on the spot, or
/// while it is held for an imminent or immediate reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Spot {
    /// Unique spot identifier.
    pub id: SpotId,
    /// Short label painted on the ground, e.g. `"B-12"`.
    pub code: String,
    /// Free-text location description.
    pub location: String,
    /// Zone the spot belongs to.
    pub zone: String,
    /// Physical occupancy or pre-activation flag.
    pub occupied: bool,
}

impl Spot {
    /// Whether the spot is free to be claimed.
    pub fn is_free(&self) -> bool {
        !self.occupied
    }
}
