//! Read-only spot availability queries.
//!
//! Nothing here writes. Callers that act on an answer must hold the spot's
//! lock and ask again before writing.

use chrono::{DateTime, Utc};
use tracing::debug;

use parkhub_core::error::AppError;
use parkhub_core::result::AppResult;
use parkhub_core::types::{ReservationId, SpotId};
use parkhub_entity::spot::Spot;

use crate::context::ServiceContext;

/// Answer to "can a vehicle park in this spot right now?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImmediateAvailability {
    /// Whether the spot can take the vehicle.
    pub available: bool,
    /// When the spot is held by an active reservation covering now, that
    /// reservation. The entering vehicle is treated as its holder.
    pub bound_reservation: Option<ReservationId>,
}

impl ImmediateAvailability {
    fn unavailable() -> Self {
        Self {
            available: false,
            bound_reservation: None,
        }
    }
}

/// Availability and conflict queries over spots and reservations.
#[derive(Debug, Clone)]
pub struct AvailabilityOracle {
    ctx: ServiceContext,
}

impl AvailabilityOracle {
    /// Create a new oracle.
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Whether a vehicle can occupy `spot_id` now.
    ///
    /// A free spot is usable unless a pending reservation on it starts in
    /// `(now, now + lookahead]`. An occupied spot is usable only when an
    /// active reservation covers now and nobody is physically parked.
    pub async fn is_available_for_immediate_use(
        &self,
        spot_id: SpotId,
    ) -> AppResult<ImmediateAvailability> {
        let spot = self
            .ctx
            .repos
            .spots
            .get(spot_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Spot {spot_id} not found")))?;
        let now = self.ctx.clock.now();

        if self.spot_has_open_session(spot_id).await? {
            return Ok(ImmediateAvailability::unavailable());
        }

        if spot.occupied {
            let active = self
                .ctx
                .repos
                .reservations
                .find_active_covering(spot_id, now)
                .await?;
            return Ok(match active {
                Some(reservation) => ImmediateAvailability {
                    available: true,
                    bound_reservation: Some(reservation.id),
                },
                None => ImmediateAvailability::unavailable(),
            });
        }

        if self.has_pending_within_lookahead(spot_id, now).await? {
            return Ok(ImmediateAvailability::unavailable());
        }

        Ok(ImmediateAvailability {
            available: true,
            bound_reservation: None,
        })
    }

    /// Whether `spot` can be booked for `[start, end)`.
    pub async fn is_free_for_window(
        &self,
        spot: &Spot,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        immediate: bool,
    ) -> AppResult<bool> {
        if spot.occupied {
            return Ok(false);
        }
        let overlapping = self
            .ctx
            .repos
            .reservations
            .find_overlapping(spot.id, start, end)
            .await?;
        if !overlapping.is_empty() {
            return Ok(false);
        }
        if !immediate {
            let now = self.ctx.clock.now();
            if self.has_pending_within_lookahead(spot.id, now).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// First spot, in ascending id order, free for `[start, end)`.
    pub async fn find_available_spot(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        immediate: bool,
    ) -> AppResult<Spot> {
        for spot in self.ctx.repos.spots.list().await? {
            if self.is_free_for_window(&spot, start, end, immediate).await? {
                return Ok(spot);
            }
        }
        debug!(%start, %end, immediate, "No spot free for window");
        Err(AppError::conflict("No parking spot available for the requested window"))
    }

    /// Whether `spot` can take a walk-in now: unoccupied, no pending
    /// reservation within the lookahead, no open session.
    pub async fn is_walk_in_candidate(&self, spot: &Spot) -> AppResult<bool> {
        if spot.occupied {
            return Ok(false);
        }
        let now = self.ctx.clock.now();
        if self.has_pending_within_lookahead(spot.id, now).await? {
            return Ok(false);
        }
        Ok(!self.spot_has_open_session(spot.id).await?)
    }

    /// First walk-in candidate.
    pub async fn find_spot_for_walk_in(&self) -> AppResult<Spot> {
        for spot in self.ctx.repos.spots.list().await? {
            if self.is_walk_in_candidate(&spot).await? {
                return Ok(spot);
            }
        }
        Err(AppError::conflict("No parking spot available for a walk-in"))
    }

    /// Whether a vehicle is physically parked in `spot_id`.
    pub async fn spot_has_open_session(&self, spot_id: SpotId) -> AppResult<bool> {
        Ok(self
            .ctx
            .repos
            .sessions
            .find_open_for_spot(spot_id)
            .await?
            .is_some())
    }

    async fn has_pending_within_lookahead(
        &self,
        spot_id: SpotId,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let deadline = now + self.ctx.allocation.lookahead();
        Ok(self
            .ctx
            .repos
            .reservations
            .find_pending_for_spot_before(spot_id, now, deadline)
            .await?
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Fixture, at};
    use parkhub_core::error::ErrorKind;
    use parkhub_entity::reservation::ReservationStatus;

    #[tokio::test]
    async fn test_free_spot_is_immediately_available() {
        let fx = Fixture::new(at(8, 0), 2).await;
        let answer = fx
            .oracle()
            .is_available_for_immediate_use(fx.spots[0].id)
            .await
            .expect("query");
        assert!(answer.available);
        assert!(answer.bound_reservation.is_none());
    }

    #[tokio::test]
    async fn test_lookahead_guard_blocks_walk_in() {
        let fx = Fixture::new(at(8, 0), 2).await;
        fx.book(fx.spots[0].id, at(13, 0), at(14, 0), ReservationStatus::Pending)
            .await;

        let oracle = fx.oracle();
        let answer = oracle
            .is_available_for_immediate_use(fx.spots[0].id)
            .await
            .expect("query");
        assert!(!answer.available);

        let picked = oracle.find_spot_for_walk_in().await.expect("walk-in");
        assert_eq!(picked.id, fx.spots[1].id);
    }

    #[tokio::test]
    async fn test_pending_beyond_lookahead_does_not_block() {
        let fx = Fixture::new(at(8, 0), 1).await;
        fx.book(fx.spots[0].id, at(15, 0), at(16, 0), ReservationStatus::Pending)
            .await;

        let answer = fx
            .oracle()
            .is_available_for_immediate_use(fx.spots[0].id)
            .await
            .expect("query");
        assert!(answer.available);
    }

    #[tokio::test]
    async fn test_occupied_spot_with_covering_active_reservation_binds() {
        let fx = Fixture::new(at(8, 0), 1).await;
        let spot = fx.spots[0].id;
        let reservation = fx
            .book(spot, at(7, 45), at(9, 0), ReservationStatus::Active)
            .await;
        fx.set_occupied(spot, true).await;

        let answer = fx
            .oracle()
            .is_available_for_immediate_use(spot)
            .await
            .expect("query");
        assert!(answer.available);
        assert_eq!(answer.bound_reservation, Some(reservation.id));
    }

    #[tokio::test]
    async fn test_occupied_spot_without_reservation_is_unavailable() {
        let fx = Fixture::new(at(8, 0), 1).await;
        fx.set_occupied(fx.spots[0].id, true).await;

        let answer = fx
            .oracle()
            .is_available_for_immediate_use(fx.spots[0].id)
            .await
            .expect("query");
        assert!(!answer.available);
    }

    #[tokio::test]
    async fn test_find_available_spot_skips_overlaps() {
        let fx = Fixture::new(at(8, 0), 3).await;
        fx.book(fx.spots[0].id, at(20, 0), at(21, 0), ReservationStatus::Pending)
            .await;
        fx.set_occupied(fx.spots[1].id, true).await;

        let spot = fx
            .oracle()
            .find_available_spot(at(20, 30), at(22, 0), false)
            .await
            .expect("spot");
        assert_eq!(spot.id, fx.spots[2].id);
    }

    #[tokio::test]
    async fn test_find_available_spot_non_immediate_respects_lookahead() {
        let fx = Fixture::new(at(8, 0), 1).await;
        // Pending booking starting in two hours, window we ask for is later.
        fx.book(fx.spots[0].id, at(10, 0), at(11, 0), ReservationStatus::Pending)
            .await;

        let oracle = fx.oracle();
        let err = oracle
            .find_available_spot(at(18, 0), at(19, 0), false)
            .await
            .expect_err("blocked by lookahead");
        assert_eq!(err.kind, ErrorKind::Conflict);

        let immediate = oracle
            .find_available_spot(at(8, 30), at(9, 30), true)
            .await
            .expect("immediate ignores lookahead");
        assert_eq!(immediate.id, fx.spots[0].id);
    }

    #[tokio::test]
    async fn test_open_session_makes_spot_unavailable() {
        let fx = Fixture::new(at(8, 0), 1).await;
        fx.open_session(fx.spots[0].id, None).await;

        let oracle = fx.oracle();
        assert!(oracle.spot_has_open_session(fx.spots[0].id).await.expect("query"));
        let err = oracle.find_spot_for_walk_in().await.expect_err("no candidate");
        assert_eq!(err.kind, ErrorKind::Conflict);
    }
}
