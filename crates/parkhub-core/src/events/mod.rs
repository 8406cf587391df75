//! Domain events emitted by ParkHub operations.
//!
//! Events are published through [`crate::traits::EventPublisher`] and
//! delivered by the real-time hub to admin and customer connections. The
//! serialized form is `{"type": "...", "payload": {...}}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::types::{ReservationId, SessionId, SpotId, UserId, VehicleId};

/// Machine-readable reason an entry, exit or reservation was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionCode {
    /// The entry method is not one of ocr, qr, manual.
    InvalidEntryType,
    /// The exit method is not one of id, plate.
    InvalidExitType,
    /// A plate was required and missing.
    PlateRequired,
    /// A vehicle id was required and missing.
    VehicleIdRequired,
    /// No registered vehicle matched.
    VehicleNotFound,
    /// The vehicle already has an open session.
    VehicleAlreadyActive,
    /// Manual entry without visitor name or plate.
    VisitorDataRequired,
    /// The requested spot cannot be used now.
    ParkingNotAvailable,
    /// Exit by id without an id.
    SessionIdRequired,
    /// No session with that id.
    SessionNotFound,
    /// No open session matched the plate.
    ActiveSessionNotFound,
    /// The session was already closed.
    ExitAlreadyRegistered,
    /// Reservation window is in the past or empty.
    InvalidInterval,
    /// No spot is free for the requested window.
    NoAvailableSpot,
    /// A referenced spot does not exist.
    SpotNotFound,
}

impl RejectionCode {
    /// Wire representation, e.g. `"VEHICLE_NOT_FOUND"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidEntryType => "INVALID_ENTRY_TYPE",
            Self::InvalidExitType => "INVALID_EXIT_TYPE",
            Self::PlateRequired => "PLATE_REQUIRED",
            Self::VehicleIdRequired => "VEHICLE_ID_REQUIRED",
            Self::VehicleNotFound => "VEHICLE_NOT_FOUND",
            Self::VehicleAlreadyActive => "VEHICLE_ALREADY_ACTIVE",
            Self::VisitorDataRequired => "VISITOR_DATA_REQUIRED",
            Self::ParkingNotAvailable => "PARKING_NOT_AVAILABLE",
            Self::SessionIdRequired => "SESSION_ID_REQUIRED",
            Self::SessionNotFound => "SESSION_NOT_FOUND",
            Self::ActiveSessionNotFound => "ACTIVE_SESSION_NOT_FOUND",
            Self::ExitAlreadyRegistered => "EXIT_ALREADY_REGISTERED",
            Self::InvalidInterval => "INVALID_INTERVAL",
            Self::NoAvailableSpot => "NO_AVAILABLE_SPOT",
            Self::SpotNotFound => "SPOT_NOT_FOUND",
        }
    }

    /// Error category the rejection falls under, used for HTTP status
    /// selection.
    pub fn kind(self) -> ErrorKind {
        match self {
            Self::InvalidEntryType
            | Self::InvalidExitType
            | Self::PlateRequired
            | Self::VehicleIdRequired
            | Self::VisitorDataRequired
            | Self::SessionIdRequired
            | Self::InvalidInterval => ErrorKind::Validation,
            Self::VehicleNotFound
            | Self::SessionNotFound
            | Self::ActiveSessionNotFound
            | Self::SpotNotFound => ErrorKind::NotFound,
            Self::VehicleAlreadyActive
            | Self::ParkingNotAvailable
            | Self::ExitAlreadyRegistered
            | Self::NoAvailableSpot => ErrorKind::Conflict,
        }
    }
}

impl std::fmt::Display for RejectionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events fanned out to live connections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ParkingEvent {
    /// An entry request opened a session.
    EntrySuccess {
        /// The request as received.
        request: serde_json::Value,
        /// The outcome returned to the caller.
        response: serde_json::Value,
    },
    /// An entry request was rejected.
    EntryRejected {
        /// The request as received.
        request: serde_json::Value,
        /// The outcome returned to the caller.
        response: serde_json::Value,
    },
    /// An exit request closed a session.
    ExitSuccess {
        /// The request as received.
        request: serde_json::Value,
        /// The outcome returned to the caller.
        response: serde_json::Value,
    },
    /// An exit request was rejected.
    ExitRejected {
        /// The request as received.
        request: serde_json::Value,
        /// The outcome returned to the caller.
        response: serde_json::Value,
    },
    /// A vehicle physically entered a spot just now.
    SessionOpened {
        /// The new session.
        session_id: SessionId,
        /// The occupied spot.
        spot_id: SpotId,
        /// The vehicle, if registered.
        #[serde(skip_serializing_if = "Option::is_none")]
        vehicle_id: Option<VehicleId>,
        /// Plate text as captured.
        #[serde(skip_serializing_if = "Option::is_none")]
        plate: Option<String>,
        /// When the vehicle entered.
        entry_time: DateTime<Utc>,
    },
    /// A pending reservation became active.
    ReservationActivated {
        /// The reservation.
        reservation_id: ReservationId,
        /// Its spot, now held.
        spot_id: SpotId,
        /// The booking customer.
        customer_id: UserId,
        /// Scheduled start.
        start_time: DateTime<Utc>,
    },
    /// A reservation was cancelled.
    ReservationCancelled {
        /// The reservation.
        reservation_id: ReservationId,
        /// Its spot.
        spot_id: SpotId,
        /// The booking customer.
        customer_id: UserId,
        /// Short reason, e.g. `"no_show"`.
        reason: String,
    },
    /// Free-form notification for a customer.
    NewNotification {
        /// Title line.
        title: String,
        /// Body text.
        message: String,
    },
}

impl ParkingEvent {
    /// The `type` tag this event serializes with.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::EntrySuccess { .. } => "entry_success",
            Self::EntryRejected { .. } => "entry_rejected",
            Self::ExitSuccess { .. } => "exit_success",
            Self::ExitRejected { .. } => "exit_rejected",
            Self::SessionOpened { .. } => "session_opened",
            Self::ReservationActivated { .. } => "reservation_activated",
            Self::ReservationCancelled { .. } => "reservation_cancelled",
            Self::NewNotification { .. } => "new_notification",
        }
    }

    /// The event body without the tag.
    pub fn payload(&self) -> serde_json::Value {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(mut map)) => {
                map.remove("payload").unwrap_or(serde_json::Value::Null)
            }
            _ => serde_json::Value::Null,
        }
    }
}
