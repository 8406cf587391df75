//! Reconciliation scheduler configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Intervals and windows used by the two reconciliation tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Whether `serve` starts the scheduler.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Minutes between expiry sweeps.
    #[serde(default = "default_cancellation_interval")]
    pub cancellation_interval_minutes: u64,
    /// Minutes between activation passes.
    #[serde(default = "default_activation_interval")]
    pub activation_interval_minutes: u64,
    /// Minutes after start before a reservation counts as a no-show.
    #[serde(default = "default_grace_period")]
    pub grace_period_minutes: i64,
    /// Pending reservations starting within this many minutes get their
    /// spot pre-activated.
    #[serde(default = "default_activation_window")]
    pub activation_window_minutes: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            cancellation_interval_minutes: default_cancellation_interval(),
            activation_interval_minutes: default_activation_interval(),
            grace_period_minutes: default_grace_period(),
            activation_window_minutes: default_activation_window(),
        }
    }
}

impl SchedulerConfig {
    /// Period of the cancellation task.
    pub fn cancellation_interval(&self) -> Duration {
        Duration::from_secs(self.cancellation_interval_minutes.max(1) * 60)
    }

    /// Period of the activation task.
    pub fn activation_interval(&self) -> Duration {
        Duration::from_secs(self.activation_interval_minutes.max(1) * 60)
    }

    /// No-show grace period.
    pub fn grace_period(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.grace_period_minutes)
    }

    /// Pre-activation lookahead.
    pub fn activation_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.activation_window_minutes)
    }
}

fn default_enabled() -> bool {
    true
}

pub(crate) fn default_cancellation_interval() -> u64 {
    10
}

pub(crate) fn default_activation_interval() -> u64 {
    5
}

fn default_grace_period() -> i64 {
    15
}

fn default_activation_window() -> i64 {
    60
}
