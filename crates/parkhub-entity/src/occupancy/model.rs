//! Occupancy session entity model.

use chrono::{DateTime, Utc};
use parkhub_core::types::{ReservationId, SessionId, SpotId, VehicleId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::method::EntryMethod;

/// The record of one vehicle's physical stay in a spot.
///
/// Open while `exit_time` is `None`. At most one open session exists per
/// spot. The row is written once at entry and once at exit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OccupancySession {
    /// Unique session identifier.
    pub id: SessionId,
    /// Reservation consumed by this entry, if any.
    pub reservation_id: Option<ReservationId>,
    /// Registered vehicle, if identified.
    pub vehicle_id: Option<VehicleId>,
    /// The occupied spot.
    pub spot_id: SpotId,
    /// When the vehicle entered.
    pub entry_time: DateTime<Utc>,
    /// When the vehicle left.
    pub exit_time: Option<DateTime<Utc>>,
    /// Plate text as captured at the gate.
    pub plate: Option<String>,
    /// How the vehicle was identified.
    pub entry_method: EntryMethod,
    /// Visitor full name (manual entries).
    pub visitor_name: Option<String>,
    /// Visitor national id (manual entries).
    pub visitor_national_id: Option<String>,
    /// Visitor phone or email (manual entries).
    pub visitor_contact: Option<String>,
    /// Zone copied from the request.
    pub zone: Option<String>,
    /// Operator who registered the entry.
    pub registered_by: Option<String>,
}

impl OccupancySession {
    /// Whether the vehicle is still inside.
    pub fn is_open(&self) -> bool {
        self.exit_time.is_none()
    }

    /// Whether the session was keyed by camera.
    pub fn is_ocr(&self) -> bool {
        self.entry_method == EntryMethod::Ocr
    }

    /// Whether the session was keyed by QR scan.
    pub fn is_qr(&self) -> bool {
        self.entry_method == EntryMethod::Qr
    }

    /// Whether an operator keyed the session in.
    pub fn is_manual(&self) -> bool {
        self.entry_method == EntryMethod::Manual
    }
}

/// Data required to open a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSession {
    /// Reservation consumed by this entry, if any.
    pub reservation_id: Option<ReservationId>,
    /// Registered vehicle, if identified.
    pub vehicle_id: Option<VehicleId>,
    /// The spot.
    pub spot_id: SpotId,
    /// Entry instant.
    pub entry_time: DateTime<Utc>,
    /// Plate text.
    pub plate: Option<String>,
    /// Identification method.
    pub entry_method: EntryMethod,
    /// Visitor full name.
    pub visitor_name: Option<String>,
    /// Visitor national id.
    pub visitor_national_id: Option<String>,
    /// Visitor contact.
    pub visitor_contact: Option<String>,
    /// Zone.
    pub zone: Option<String>,
    /// Operator.
    pub registered_by: Option<String>,
}

/// Narrowing applied to session history queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFilter {
    /// Only sessions entering at or after this instant.
    pub from: Option<DateTime<Utc>>,
    /// Only sessions entering before this instant.
    pub to: Option<DateTime<Utc>>,
    /// Only sessions still open.
    #[serde(default)]
    pub open_only: bool,
}

impl SessionFilter {
    /// Whether `session` passes the filter.
    pub fn matches(&self, session: &OccupancySession) -> bool {
        if self.open_only && !session.is_open() {
            return false;
        }
        if let Some(from) = self.from {
            if session.entry_time < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if session.entry_time >= to {
                return false;
            }
        }
        true
    }
}
