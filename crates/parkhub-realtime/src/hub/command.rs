//! Messages accepted by the hub actor.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use parkhub_core::types::UserId;

use crate::connection::handle::{ConnectionHandle, ConnectionId};
use crate::message::types::OutboundMessage;

/// Connection totals reported by the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectionCounts {
    /// Live admin connections.
    pub admin_clients: usize,
    /// Live customer connections.
    pub user_clients: usize,
    /// Sum of both.
    pub total_clients: usize,
}

/// Commands processed in arrival order by the single hub task.
#[derive(Debug)]
pub enum HubCommand {
    /// Add a connection; a customer's previous connection is evicted.
    Register(Arc<ConnectionHandle>),
    /// Drop a connection.
    Unregister(ConnectionId),
    /// Push to every admin.
    BroadcastAdmins(OutboundMessage),
    /// Push to each listed customer that is connected.
    NotifyUsers(Vec<UserId>, OutboundMessage),
    /// Report connected customer ids.
    ConnectedUsers(oneshot::Sender<Vec<UserId>>),
    /// Report connection totals.
    Counts(oneshot::Sender<ConnectionCounts>),
}
