//! Entry/exit processor and session queries.

use serde::Serialize;

use parkhub_core::error::AppError;
use parkhub_core::events::ParkingEvent;
use parkhub_core::result::AppResult;
use parkhub_core::types::{OperationOutcome, SessionId, UserId, VehicleId};
use parkhub_entity::occupancy::{OccupancySession, SessionFilter};

use crate::availability::AvailabilityOracle;
use crate::context::ServiceContext;

/// Opens and closes occupancy sessions.
///
/// A spot's `occupied` flag flips to true when its session opens and back
/// to false when it closes, under the spot's lock.
#[derive(Debug, Clone)]
pub struct EntryExitProcessor {
    pub(super) ctx: ServiceContext,
    pub(super) oracle: AvailabilityOracle,
}

impl EntryExitProcessor {
    /// Create a new processor.
    pub fn new(ctx: ServiceContext) -> Self {
        let oracle = AvailabilityOracle::new(ctx.clone());
        Self { ctx, oracle }
    }

    /// Every open session, earliest entry first.
    pub async fn list_open_sessions(&self) -> AppResult<Vec<OccupancySession>> {
        self.ctx.repos.sessions.find_open().await
    }

    /// One session.
    pub async fn get_session(&self, id: SessionId) -> AppResult<OccupancySession> {
        self.ctx
            .repos
            .sessions
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Session {id} not found")))
    }

    /// Sessions of every vehicle the customer owns, newest first.
    pub async fn sessions_for_customer(
        &self,
        customer_id: &UserId,
        filter: &SessionFilter,
    ) -> AppResult<Vec<OccupancySession>> {
        let vehicle_ids: Vec<VehicleId> = self
            .ctx
            .repos
            .vehicles
            .find_by_customer(customer_id)
            .await?
            .into_iter()
            .map(|v| v.id)
            .collect();
        if vehicle_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.ctx
            .repos
            .sessions
            .find_for_vehicles(&vehicle_ids, filter)
            .await
    }

    /// Request/response pair as carried by gate events.
    pub(super) fn gate_event_parts<R: Serialize, T: Serialize>(
        request: &R,
        outcome: &OperationOutcome<T>,
    ) -> (serde_json::Value, serde_json::Value) {
        (
            serde_json::to_value(request).unwrap_or_default(),
            serde_json::to_value(outcome).unwrap_or_default(),
        )
    }

    pub(super) fn publish_session_opened(
        &self,
        session: &OccupancySession,
        customer: Option<&UserId>,
    ) {
        let event = ParkingEvent::SessionOpened {
            session_id: session.id,
            spot_id: session.spot_id,
            vehicle_id: session.vehicle_id,
            plate: session.plate.clone(),
            entry_time: session.entry_time,
        };
        if let Some(customer) = customer {
            self.ctx.publish_to_user(customer, event.clone());
        }
        self.ctx.publish_to_admins(event);
    }
}
