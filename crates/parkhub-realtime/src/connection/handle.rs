//! Individual connection handle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use parkhub_core::types::UserId;

use crate::message::types::OutboundMessage;

/// Unique connection identifier.
pub type ConnectionId = Uuid;

/// Which audience a connection belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionKind {
    /// Operator dashboard; receives every admin broadcast.
    Admin,
    /// A customer's device; receives only that customer's notifications.
    User(UserId),
}

/// Result of pushing onto the outbound queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Enqueued.
    Delivered,
    /// Queue full; message dropped.
    Full,
    /// Writer gone.
    Closed,
}

/// The hub's view of one live connection.
///
/// The socket writer task owns the receiving half of `sender`, and watches
/// `closed` to know when the hub has evicted it.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID.
    pub id: ConnectionId,
    /// Audience.
    pub kind: ConnectionKind,
    /// When the connection was registered.
    pub connected_at: DateTime<Utc>,
    sender: mpsc::Sender<OutboundMessage>,
    closed: CancellationToken,
    epoch: Instant,
    last_seen_ms: AtomicU64,
}

impl ConnectionHandle {
    /// Create a handle and the receiving end of its outbound queue.
    pub fn new(
        kind: ConnectionKind,
        queue_capacity: usize,
    ) -> (Self, mpsc::Receiver<OutboundMessage>) {
        let (sender, receiver) = mpsc::channel(queue_capacity.max(1));
        let handle = Self {
            id: Uuid::new_v4(),
            kind,
            connected_at: Utc::now(),
            sender,
            closed: CancellationToken::new(),
            epoch: Instant::now(),
            last_seen_ms: AtomicU64::new(0),
        };
        (handle, receiver)
    }

    /// Non-blocking enqueue.
    pub fn send(&self, msg: OutboundMessage) -> SendOutcome {
        if self.is_closed() {
            return SendOutcome::Closed;
        }
        match self.sender.try_send(msg) {
            Ok(()) => SendOutcome::Delivered,
            Err(mpsc::error::TrySendError::Full(_)) => SendOutcome::Full,
            Err(mpsc::error::TrySendError::Closed(_)) => SendOutcome::Closed,
        }
    }

    /// Record that the peer is alive.
    pub fn touch(&self) {
        let elapsed = self.epoch.elapsed().as_millis() as u64;
        self.last_seen_ms.store(elapsed, Ordering::SeqCst);
    }

    /// Time since the peer was last heard from.
    pub fn idle_for(&self) -> Duration {
        let last = Duration::from_millis(self.last_seen_ms.load(Ordering::SeqCst));
        self.epoch.elapsed().saturating_sub(last)
    }

    /// Signal the socket tasks to shut down.
    pub fn close(&self) {
        self.closed.cancel();
    }

    /// Whether the hub has evicted this connection.
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Resolves once the connection is closed.
    pub fn closed_token(&self) -> CancellationToken {
        self.closed.clone()
    }

    /// The customer this connection belongs to, if any.
    pub fn user_id(&self) -> Option<&UserId> {
        match &self.kind {
            ConnectionKind::User(id) => Some(id),
            ConnectionKind::Admin => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_full_queue_reports_full() {
        let (handle, _rx) = ConnectionHandle::new(ConnectionKind::Admin, 1);
        assert_eq!(handle.send(OutboundMessage::ping(Utc::now())), SendOutcome::Delivered);
        assert_eq!(handle.send(OutboundMessage::ping(Utc::now())), SendOutcome::Full);
    }

    #[tokio::test]
    async fn test_dropped_receiver_reports_closed() {
        let (handle, rx) = ConnectionHandle::new(ConnectionKind::Admin, 4);
        drop(rx);
        assert_eq!(handle.send(OutboundMessage::ping(Utc::now())), SendOutcome::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_tracks_touch() {
        let (handle, _rx) = ConnectionHandle::new(ConnectionKind::Admin, 4);
        tokio::time::advance(Duration::from_secs(20)).await;
        assert!(handle.idle_for() >= Duration::from_secs(20));
        handle.touch();
        assert!(handle.idle_for() < Duration::from_secs(1));
    }
}
