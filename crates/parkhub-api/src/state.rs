//! Application state shared across all handlers.

use std::sync::Arc;
use std::time::Instant;

use parkhub_core::config::AppConfig;
use parkhub_realtime::NotificationHub;
use parkhub_service::{AvailabilityOracle, EntryExitProcessor, ReservationService, ServiceContext};

/// Everything a handler needs.
///
/// Passed to every Axum handler via `State<AppState>`. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Live connection hub
    pub hub: NotificationHub,
    /// Reservation service
    pub reservations: ReservationService,
    /// Entry/exit processor
    pub processor: EntryExitProcessor,
    /// Availability queries
    pub oracle: AvailabilityOracle,
    /// Process start, for uptime
    pub started_at: Instant,
}

impl AppState {
    /// Build the services over a shared context.
    pub fn new(config: Arc<AppConfig>, hub: NotificationHub, ctx: ServiceContext) -> Self {
        Self {
            config,
            hub,
            reservations: ReservationService::new(ctx.clone()),
            processor: EntryExitProcessor::new(ctx.clone()),
            oracle: AvailabilityOracle::new(ctx),
            started_at: Instant::now(),
        }
    }
}
