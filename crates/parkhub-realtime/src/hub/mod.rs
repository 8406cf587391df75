//! The notification hub: a cloneable front for the single actor task that
//! owns connection membership.
//!
//! Producer calls never block. Event delivery uses `try_send` on the
//! command channel and silently drops when it is full; per-connection
//! overflow disconnects that consumer.

pub mod actor;
pub mod command;

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use parkhub_core::config::RealtimeConfig;
use parkhub_core::error::AppError;
use parkhub_core::events::ParkingEvent;
use parkhub_core::traits::EventPublisher;
use parkhub_core::types::UserId;

use crate::connection::handle::{ConnectionHandle, ConnectionId, ConnectionKind};
use crate::message::types::OutboundMessage;

use self::actor::HubActor;
pub use self::command::{ConnectionCounts, HubCommand};

/// A freshly registered connection: the shared handle plus the receiving
/// end of its outbound queue, for the socket writer task.
#[derive(Debug)]
pub struct Registration {
    /// Shared handle.
    pub handle: Arc<ConnectionHandle>,
    /// Outbound queue.
    pub outbound: mpsc::Receiver<OutboundMessage>,
}

/// Handle to the hub actor.
#[derive(Debug, Clone)]
pub struct NotificationHub {
    commands: mpsc::Sender<HubCommand>,
    shutdown: CancellationToken,
    queue_capacity: usize,
}

impl NotificationHub {
    /// Spawn the hub task.
    pub fn start(config: &RealtimeConfig) -> Self {
        let (commands, receiver) = mpsc::channel(config.command_buffer_size.max(1));
        let shutdown = CancellationToken::new();
        let actor = HubActor::new(config.keepalive_interval(), config.stale_after());
        tokio::spawn(actor.run(receiver, shutdown.clone()));
        Self {
            commands,
            shutdown,
            queue_capacity: config.outbound_queue_capacity,
        }
    }

    /// Register an operator dashboard.
    pub async fn register_admin(&self) -> Result<Registration, AppError> {
        self.register(ConnectionKind::Admin).await
    }

    /// Register a customer; any previous connection of theirs is closed.
    pub async fn register_user(&self, user_id: UserId) -> Result<Registration, AppError> {
        self.register(ConnectionKind::User(user_id)).await
    }

    async fn register(&self, kind: ConnectionKind) -> Result<Registration, AppError> {
        let (handle, outbound) = ConnectionHandle::new(kind, self.queue_capacity);
        let handle = Arc::new(handle);
        self.commands
            .send(HubCommand::Register(handle.clone()))
            .await
            .map_err(|_| AppError::service_unavailable("Notification hub is not running"))?;
        Ok(Registration { handle, outbound })
    }

    /// Remove a connection. Safe to call for an already evicted one.
    pub async fn unregister(&self, id: ConnectionId) {
        let _ = self.commands.send(HubCommand::Unregister(id)).await;
    }

    /// Deliver `event` to every admin.
    pub fn broadcast_to_admins(&self, event: &ParkingEvent) {
        self.offer(HubCommand::BroadcastAdmins(OutboundMessage::event(
            event,
            Utc::now(),
        )));
    }

    /// Deliver `event` to one customer.
    pub fn notify_user(&self, user_id: &UserId, event: &ParkingEvent) {
        self.notify_users(std::slice::from_ref(user_id), event);
    }

    /// Deliver `event` to each listed customer.
    pub fn notify_users(&self, user_ids: &[UserId], event: &ParkingEvent) {
        if user_ids.is_empty() {
            return;
        }
        self.offer(HubCommand::NotifyUsers(
            user_ids.to_vec(),
            OutboundMessage::event(event, Utc::now()),
        ));
    }

    /// Customers with a live connection.
    pub async fn connected_user_ids(&self) -> Result<Vec<UserId>, AppError> {
        let (tx, rx) = oneshot::channel();
        self.query(HubCommand::ConnectedUsers(tx), rx).await
    }

    /// Live connection totals.
    pub async fn connection_counts(&self) -> Result<ConnectionCounts, AppError> {
        let (tx, rx) = oneshot::channel();
        self.query(HubCommand::Counts(tx), rx).await
    }

    /// Stop the hub task and close every connection.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn offer(&self, cmd: HubCommand) {
        if let Err(e) = self.commands.try_send(cmd) {
            warn!(error = %e, "Notification hub unavailable, dropping message");
        }
    }

    async fn query<T>(&self, cmd: HubCommand, rx: oneshot::Receiver<T>) -> Result<T, AppError> {
        self.commands
            .send(cmd)
            .await
            .map_err(|_| AppError::service_unavailable("Notification hub is not running"))?;
        rx.await
            .map_err(|_| AppError::service_unavailable("Notification hub dropped the query"))
    }
}

impl EventPublisher for NotificationHub {
    fn publish_to_admins(&self, event: ParkingEvent) {
        self.broadcast_to_admins(&event);
    }

    fn publish_to_user(&self, user_id: &UserId, event: ParkingEvent) {
        self.notify_user(user_id, &event);
    }
}
