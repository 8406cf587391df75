//! Real-time notification hub configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) hub configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Per-connection outbound queue capacity. A full queue drops the
    /// message and disconnects the consumer.
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue_capacity: usize,
    /// Buffer of the hub's command channel.
    #[serde(default = "default_command_buffer")]
    pub command_buffer_size: usize,
    /// Keepalive ping interval in seconds.
    #[serde(default = "default_keepalive")]
    pub keepalive_interval_seconds: u64,
    /// Connections not heard from for this long are disconnected.
    #[serde(default = "default_stale_after")]
    pub stale_after_seconds: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            outbound_queue_capacity: default_outbound_queue(),
            command_buffer_size: default_command_buffer(),
            keepalive_interval_seconds: default_keepalive(),
            stale_after_seconds: default_stale_after(),
        }
    }
}

impl RealtimeConfig {
    /// Keepalive tick as a [`Duration`].
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_seconds.max(1))
    }

    /// Staleness threshold as a [`Duration`].
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_seconds)
    }
}

fn default_outbound_queue() -> usize {
    256
}

fn default_command_buffer() -> usize {
    1024
}

fn default_keepalive() -> u64 {
    30
}

fn default_stale_after() -> u64 {
    60
}
