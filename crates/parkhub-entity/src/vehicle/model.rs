//! Vehicle entity model.

use chrono::{DateTime, Utc};
use parkhub_core::types::{UserId, VehicleId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A customer's registered vehicle. Read-only to the allocation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    /// Unique vehicle identifier.
    pub id: VehicleId,
    /// Registration plate, stored normalized.
    pub plate: String,
    /// Manufacturer.
    pub brand: String,
    /// Model name.
    pub model: String,
    /// Car, motorcycle, van, ...
    pub vehicle_type: String,
    /// Owning customer.
    pub customer_id: UserId,
    /// When the vehicle was registered.
    pub created_at: DateTime<Utc>,
}

/// Canonical plate form: trimmed, uppercase, inner whitespace and dashes
/// removed.
pub fn normalize_plate(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .flat_map(char::to_uppercase)
        .collect()
}
