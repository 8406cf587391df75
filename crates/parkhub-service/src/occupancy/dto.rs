//! Gate request types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use parkhub_core::types::{SessionId, SpotId, VehicleId};

/// A vehicle arriving at the gate.
///
/// `entry_type` is kept as text so an unknown method can be answered with
/// a structured rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRequest {
    /// `ocr`, `qr` or `manual`.
    pub entry_type: String,
    /// Plate text (ocr, manual).
    #[serde(default)]
    pub plate: Option<String>,
    /// Registered vehicle (qr).
    #[serde(default)]
    pub vehicle_id: Option<VehicleId>,
    /// Explicit spot.
    #[serde(default, alias = "parkingId")]
    pub spot_id: Option<SpotId>,
    /// Entry instant. Defaults to now.
    #[serde(default)]
    pub entry_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub visitor_name: Option<String>,
    #[serde(default)]
    pub visitor_national_id: Option<String>,
    #[serde(default)]
    pub visitor_contact: Option<String>,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub registered_by: Option<String>,
}

impl EntryRequest {
    /// Camera read of `plate`.
    pub fn ocr(plate: impl Into<String>) -> Self {
        Self {
            entry_type: "ocr".to_string(),
            plate: Some(plate.into()),
            ..Self::default()
        }
    }

    /// QR scan for `vehicle_id`.
    pub fn qr(vehicle_id: VehicleId) -> Self {
        Self {
            entry_type: "qr".to_string(),
            vehicle_id: Some(vehicle_id),
            ..Self::default()
        }
    }

    /// Operator-keyed visitor.
    pub fn manual(visitor_name: impl Into<String>, plate: impl Into<String>) -> Self {
        Self {
            entry_type: "manual".to_string(),
            plate: Some(plate.into()),
            visitor_name: Some(visitor_name.into()),
            ..Self::default()
        }
    }

    /// Ask for a specific spot.
    pub fn at_spot(mut self, spot_id: SpotId) -> Self {
        self.spot_id = Some(spot_id);
        self
    }
}

/// A vehicle leaving.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitRequest {
    /// `byId` or `byPlate`.
    pub exit_type: String,
    /// Session to close (byId).
    #[serde(default, alias = "parkingUsageId")]
    pub session_id: Option<SessionId>,
    /// Plate text (byPlate).
    #[serde(default)]
    pub plate: Option<String>,
}

impl ExitRequest {
    /// Close session `id`.
    pub fn by_id(id: SessionId) -> Self {
        Self {
            exit_type: "byId".to_string(),
            session_id: Some(id),
            plate: None,
        }
    }

    /// Close the open session of `plate`.
    pub fn by_plate(plate: impl Into<String>) -> Self {
        Self {
            exit_type: "byPlate".to_string(),
            session_id: None,
            plate: Some(plate.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_request_accepts_legacy_spot_field() {
        let req: EntryRequest = serde_json::from_value(serde_json::json!({
            "entryType": "manual",
            "plate": "XYZ-9",
            "visitorName": "Ana",
            "parkingId": 7
        }))
        .expect("deserialize");
        assert_eq!(req.spot_id, Some(SpotId(7)));
        assert!(req.vehicle_id.is_none());
    }

    #[test]
    fn test_exit_request_accepts_legacy_session_field() {
        let req: ExitRequest = serde_json::from_value(serde_json::json!({
            "exitType": "byId",
            "parkingUsageId": 12
        }))
        .expect("deserialize");
        assert_eq!(req.session_id, Some(SessionId(12)));
    }
}
