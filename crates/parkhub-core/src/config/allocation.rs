//! Spot allocation windows.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Time windows consulted by the availability oracle and the entry path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationConfig {
    /// A free spot is withheld from walk-ins and non-immediate bookings when
    /// a pending reservation starts within this many minutes.
    #[serde(default = "default_lookahead")]
    pub lookahead_minutes: i64,
    /// Reservations starting within this many minutes are immediate.
    #[serde(default = "default_immediate_window")]
    pub immediate_window_minutes: i64,
    /// Entries whose entry time is within this many minutes of now are
    /// announced as real-time session openings.
    #[serde(default = "default_realtime_tolerance")]
    pub realtime_tolerance_minutes: i64,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            lookahead_minutes: default_lookahead(),
            immediate_window_minutes: default_immediate_window(),
            realtime_tolerance_minutes: default_realtime_tolerance(),
        }
    }
}

impl AllocationConfig {
    /// Lookahead guard window.
    pub fn lookahead(&self) -> Duration {
        Duration::minutes(self.lookahead_minutes)
    }

    /// Immediate-reservation window.
    pub fn immediate_window(&self) -> Duration {
        Duration::minutes(self.immediate_window_minutes)
    }

    /// Real-time entry tolerance.
    pub fn realtime_tolerance(&self) -> Duration {
        Duration::minutes(self.realtime_tolerance_minutes)
    }
}

fn default_lookahead() -> i64 {
    6 * 60
}

fn default_immediate_window() -> i64 {
    60
}

fn default_realtime_tolerance() -> i64 {
    5
}
