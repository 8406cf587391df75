//! Shared dependencies handed to every service.

use std::sync::Arc;

use tracing::{debug, warn};

use parkhub_core::config::{AllocationConfig, SchedulerConfig};
use parkhub_core::events::ParkingEvent;
use parkhub_core::traits::{Clock, EventPublisher};
use parkhub_core::result::AppResult;
use parkhub_core::types::{ReservationId, SpotId, UserId};
use parkhub_database::Repositories;

use crate::lock::KeyedLocks;

/// Repositories, time source, publisher and lock tables.
///
/// Cheap to clone; every field is shared.
#[derive(Clone)]
pub struct ServiceContext {
    /// Storage.
    pub repos: Repositories,
    /// Time source.
    pub clock: Arc<dyn Clock>,
    /// Event fan-out. `None` disables notifications.
    pub publisher: Option<Arc<dyn EventPublisher>>,
    /// Per-spot locks.
    pub spot_locks: Arc<KeyedLocks<SpotId>>,
    /// Per-vehicle locks keyed by normalized plate or vehicle id.
    pub vehicle_locks: Arc<KeyedLocks<String>>,
    /// Allocation windows.
    pub allocation: AllocationConfig,
    /// Grace period and activation window.
    pub scheduler: SchedulerConfig,
}

impl ServiceContext {
    /// Build a context with fresh lock tables.
    pub fn new(
        repos: Repositories,
        clock: Arc<dyn Clock>,
        publisher: Option<Arc<dyn EventPublisher>>,
        allocation: AllocationConfig,
        scheduler: SchedulerConfig,
    ) -> Self {
        Self {
            repos,
            clock,
            publisher,
            spot_locks: Arc::new(KeyedLocks::new()),
            vehicle_locks: Arc::new(KeyedLocks::new()),
            allocation,
            scheduler,
        }
    }

    /// Send to every admin, if a publisher is attached.
    pub fn publish_to_admins(&self, event: ParkingEvent) {
        match &self.publisher {
            Some(publisher) => publisher.publish_to_admins(event),
            None => debug!(kind = event.event_type(), "No publisher attached, event skipped"),
        }
    }

    /// Flip `occupied` from false to true. `false` if the spot was already
    /// taken.
    pub async fn claim_spot(&self, spot_id: SpotId) -> AppResult<bool> {
        self.repos.spots.set_occupied_if(spot_id, false, true).await
    }

    /// Clear `occupied` unless a vehicle is parked in the spot or an active
    /// reservation other than `released` has not yet ended. Pre-activated
    /// reservations that start later still hold the spot.
    ///
    /// Call with the spot lock held.
    pub async fn release_spot_unless_held(
        &self,
        spot_id: SpotId,
        released: Option<ReservationId>,
    ) -> AppResult<bool> {
        if let Some(session) = self.repos.sessions.find_open_for_spot(spot_id).await? {
            debug!(spot_id = %spot_id, session_id = %session.id, "Spot still has an open session, keeping it occupied");
            return Ok(false);
        }
        let now = self.clock.now();
        if let Some(holder) = self
            .repos
            .reservations
            .find_active_holding(spot_id, now)
            .await?
            .into_iter()
            .find(|r| Some(r.id) != released)
        {
            debug!(spot_id = %spot_id, reservation_id = %holder.id, "Spot held by another active reservation");
            return Ok(false);
        }
        let released_flag = self.repos.spots.set_occupied_if(spot_id, true, false).await?;
        if !released_flag {
            debug!(spot_id = %spot_id, "Spot was already free");
        }
        Ok(released_flag)
    }

    /// Undo a claim after a failed write. Failures are logged only.
    pub async fn rollback_claim(&self, spot_id: SpotId) {
        if let Err(err) = self.repos.spots.set_occupied_if(spot_id, true, false).await {
            warn!(spot_id = %spot_id, error = %err, "Failed to roll back spot claim");
        }
    }

    /// Send to one customer, if a publisher is attached.
    pub fn publish_to_user(&self, user_id: &UserId, event: ParkingEvent) {
        if let Some(publisher) = &self.publisher {
            publisher.publish_to_user(user_id, event);
        }
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("publisher", &self.publisher.is_some())
            .field("allocation", &self.allocation)
            .finish_non_exhaustive()
    }
}
