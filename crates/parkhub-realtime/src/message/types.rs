//! Inbound and outbound WebSocket message type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use parkhub_core::events::ParkingEvent;
use parkhub_core::types::UserId;

/// Envelope for everything the server pushes: `{type, payload, timestamp}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Message type, e.g. `"entry_success"` or `"ping"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Type-specific body.
    pub payload: serde_json::Value,
    /// Server time at enqueue, RFC 3339.
    pub timestamp: DateTime<Utc>,
}

impl OutboundMessage {
    /// Wrap a domain event.
    pub fn event(event: &ParkingEvent, at: DateTime<Utc>) -> Self {
        Self {
            kind: event.event_type().to_string(),
            payload: event.payload(),
            timestamp: at,
        }
    }

    /// Greeting sent to a customer right after registration.
    pub fn welcome(user_id: &UserId, at: DateTime<Utc>) -> Self {
        Self {
            kind: "welcome".to_string(),
            payload: json!({
                "message": "Connected to ParkHub notifications",
                "userId": user_id,
            }),
            timestamp: at,
        }
    }

    /// Keepalive probe.
    pub fn ping(at: DateTime<Utc>) -> Self {
        Self {
            kind: "ping".to_string(),
            payload: serde_json::Value::Null,
            timestamp: at,
        }
    }

    /// Error reply to a malformed inbound frame.
    pub fn error(code: &str, message: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            kind: "error".to_string(),
            payload: json!({ "code": code, "message": message.into() }),
            timestamp: at,
        }
    }
}

/// Messages a client may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Reply to a server ping.
    Pong,
    /// The customer read a notification.
    MarkAsRead {
        /// Notification being acknowledged.
        #[serde(rename = "notificationId")]
        notification_id: serde_json::Value,
    },
    /// The customer asked for their stored notifications.
    GetUserNotifications,
    /// Anything else.
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use parkhub_core::types::{ReservationId, SpotId};

    #[test]
    fn test_event_envelope_shape() {
        let event = ParkingEvent::ReservationActivated {
            reservation_id: ReservationId(1),
            spot_id: SpotId(2),
            customer_id: UserId::from("c-1"),
            start_time: Utc::now(),
        };
        let msg = OutboundMessage::event(&event, Utc::now());
        let json = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(json["type"], "reservation_activated");
        assert_eq!(json["payload"]["spot_id"], 2);
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_welcome_carries_user() {
        let msg = OutboundMessage::welcome(&UserId::from("c-9"), Utc::now());
        assert_eq!(msg.kind, "welcome");
        assert_eq!(msg.payload["userId"], "c-9");
    }

    #[test]
    fn test_inbound_parsing() {
        let pong: InboundMessage = serde_json::from_str(r#"{"type":"pong"}"#).expect("pong");
        assert_eq!(pong, InboundMessage::Pong);

        let read: InboundMessage =
            serde_json::from_str(r#"{"type":"mark_as_read","notificationId":12}"#).expect("read");
        assert_eq!(
            read,
            InboundMessage::MarkAsRead {
                notification_id: serde_json::json!(12)
            }
        );

        let other: InboundMessage =
            serde_json::from_str(r#"{"type":"subscribe","channel":"x"}"#).expect("other");
        assert_eq!(other, InboundMessage::Unknown);
    }
}
