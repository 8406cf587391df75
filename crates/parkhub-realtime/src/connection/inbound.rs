//! Handling of frames received from clients.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::message::types::{InboundMessage, OutboundMessage};

use super::handle::ConnectionHandle;

/// Process one text frame. Any frame counts as proof of life.
pub fn handle_inbound(handle: &ConnectionHandle, raw: &str) {
    handle.touch();

    let msg: InboundMessage = match serde_json::from_str(raw) {
        Ok(m) => m,
        Err(e) => {
            debug!(conn_id = %handle.id, error = %e, "Unparsable inbound frame");
            let _ = handle.send(OutboundMessage::error(
                "INVALID_MESSAGE",
                format!("Failed to parse message: {e}"),
                Utc::now(),
            ));
            return;
        }
    };

    match msg {
        InboundMessage::Pong => {
            debug!(conn_id = %handle.id, "Pong received");
        }
        InboundMessage::MarkAsRead { notification_id } => {
            info!(
                conn_id = %handle.id,
                user_id = ?handle.user_id(),
                notification_id = %notification_id,
                "Notification marked as read"
            );
        }
        InboundMessage::GetUserNotifications => {
            debug!(
                conn_id = %handle.id,
                user_id = ?handle.user_id(),
                "Stored notifications requested"
            );
        }
        InboundMessage::Unknown => {
            warn!(conn_id = %handle.id, raw = %raw, "Unknown inbound message type");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::handle::ConnectionKind;

    #[tokio::test]
    async fn test_malformed_frame_gets_error_reply() {
        let (handle, mut rx) = ConnectionHandle::new(ConnectionKind::Admin, 4);
        handle_inbound(&handle, "not json");
        let reply = rx.try_recv().expect("error reply");
        assert_eq!(reply.kind, "error");
        assert_eq!(reply.payload["code"], "INVALID_MESSAGE");
    }

    #[tokio::test]
    async fn test_pong_produces_no_reply() {
        let (handle, mut rx) = ConnectionHandle::new(ConnectionKind::Admin, 4);
        handle_inbound(&handle, r#"{"type":"pong"}"#);
        assert!(rx.try_recv().is_err());
    }
}
