//! The hub's dispatch loop.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use parkhub_core::types::UserId;

use crate::connection::handle::{ConnectionHandle, ConnectionId, ConnectionKind, SendOutcome};
use crate::message::types::OutboundMessage;

use super::command::{ConnectionCounts, HubCommand};

/// Membership tables. Only the hub task touches them.
pub(crate) struct HubActor {
    admins: HashMap<ConnectionId, Arc<ConnectionHandle>>,
    users: HashMap<UserId, Arc<ConnectionHandle>>,
    keepalive: Duration,
    stale_after: Duration,
}

impl HubActor {
    pub(crate) fn new(keepalive: Duration, stale_after: Duration) -> Self {
        Self {
            admins: HashMap::new(),
            users: HashMap::new(),
            keepalive,
            stale_after,
        }
    }

    /// Run until `shutdown` fires or every producer is gone.
    pub(crate) async fn run(
        mut self,
        mut commands: mpsc::Receiver<HubCommand>,
        shutdown: CancellationToken,
    ) {
        let mut ticker = time::interval_at(Instant::now() + self.keepalive, self.keepalive);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Notification hub started");
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => self.keepalive_sweep(),
                cmd = commands.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                },
            }
        }

        for handle in self.admins.values().chain(self.users.values()) {
            handle.close();
        }
        info!(
            admins = self.admins.len(),
            users = self.users.len(),
            "Notification hub stopped"
        );
    }

    fn handle(&mut self, cmd: HubCommand) {
        match cmd {
            HubCommand::Register(handle) => self.register(handle),
            HubCommand::Unregister(id) => self.unregister(id),
            HubCommand::BroadcastAdmins(msg) => self.broadcast_admins(msg),
            HubCommand::NotifyUsers(user_ids, msg) => {
                for user_id in user_ids {
                    self.notify_user(&user_id, msg.clone());
                }
            }
            HubCommand::ConnectedUsers(reply) => {
                let _ = reply.send(self.users.keys().cloned().collect());
            }
            HubCommand::Counts(reply) => {
                let _ = reply.send(self.counts());
            }
        }
    }

    fn register(&mut self, handle: Arc<ConnectionHandle>) {
        match handle.kind.clone() {
            ConnectionKind::Admin => {
                info!(conn_id = %handle.id, "Admin connection registered");
                self.admins.insert(handle.id, handle);
            }
            ConnectionKind::User(user_id) => {
                let _ = handle.send(OutboundMessage::welcome(&user_id, Utc::now()));
                if let Some(previous) = self.users.insert(user_id.clone(), handle.clone()) {
                    info!(
                        user_id = %user_id,
                        old_conn_id = %previous.id,
                        "Replacing existing user connection"
                    );
                    previous.close();
                }
                info!(conn_id = %handle.id, user_id = %user_id, "User connection registered");
            }
        }
    }

    fn unregister(&mut self, id: ConnectionId) {
        if let Some(handle) = self.admins.remove(&id) {
            handle.close();
            info!(conn_id = %id, "Admin connection unregistered");
            return;
        }
        // A replaced connection unregistering must not evict its successor.
        let owner = self
            .users
            .iter()
            .find(|(_, h)| h.id == id)
            .map(|(user_id, _)| user_id.clone());
        if let Some(user_id) = owner {
            if let Some(handle) = self.users.remove(&user_id) {
                handle.close();
                info!(conn_id = %id, user_id = %user_id, "User connection unregistered");
            }
        }
    }

    fn broadcast_admins(&mut self, msg: OutboundMessage) {
        let mut dead = Vec::new();
        for (id, handle) in &self.admins {
            match handle.send(msg.clone()) {
                SendOutcome::Delivered => {}
                SendOutcome::Full => {
                    warn!(conn_id = %id, "Admin outbound queue full, disconnecting");
                    dead.push(*id);
                }
                SendOutcome::Closed => dead.push(*id),
            }
        }
        for id in dead {
            if let Some(handle) = self.admins.remove(&id) {
                handle.close();
            }
        }
    }

    fn notify_user(&mut self, user_id: &UserId, msg: OutboundMessage) {
        let Some(handle) = self.users.get(user_id) else {
            debug!(user_id = %user_id, kind = %msg.kind, "User not connected, dropping notification");
            return;
        };
        match handle.send(msg) {
            SendOutcome::Delivered => {}
            outcome => {
                if outcome == SendOutcome::Full {
                    warn!(user_id = %user_id, "User outbound queue full, disconnecting");
                }
                if let Some(handle) = self.users.remove(user_id) {
                    handle.close();
                }
            }
        }
    }

    fn keepalive_sweep(&mut self) {
        let stale_after = self.stale_after;
        let now = Utc::now();
        let check = |handle: &Arc<ConnectionHandle>| -> bool {
            if handle.is_closed() {
                return false;
            }
            if handle.idle_for() > stale_after {
                warn!(conn_id = %handle.id, idle = ?handle.idle_for(), "Stale connection, disconnecting");
                return false;
            }
            handle.send(OutboundMessage::ping(now)) == SendOutcome::Delivered
        };

        let before = self.admins.len() + self.users.len();
        let mut evicted = Vec::new();
        self.admins.retain(|_, h| {
            let keep = check(h);
            if !keep {
                evicted.push(h.clone());
            }
            keep
        });
        self.users.retain(|_, h| {
            let keep = check(h);
            if !keep {
                evicted.push(h.clone());
            }
            keep
        });
        for handle in &evicted {
            handle.close();
        }
        debug!(
            connections = before,
            evicted = evicted.len(),
            "Keepalive sweep finished"
        );
    }

    fn counts(&self) -> ConnectionCounts {
        ConnectionCounts {
            admin_clients: self.admins.len(),
            user_clients: self.users.len(),
            total_clients: self.admins.len() + self.users.len(),
        }
    }
}
