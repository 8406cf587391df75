//! Reservation service: booking, status changes, the no-show sweep and
//! pre-activation.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, error, info, warn};

use parkhub_core::error::{AppError, ErrorKind};
use parkhub_core::events::{ParkingEvent, RejectionCode};
use parkhub_core::result::AppResult;
use parkhub_core::types::{OperationOutcome, ReservationId, UserId};
use parkhub_entity::reservation::{NewReservation, Reservation, ReservationStatus};
use parkhub_entity::spot::Spot;

use crate::availability::AvailabilityOracle;
use crate::context::ServiceContext;
use crate::flow::{Flow, reject, settle};

use super::dto::CreateReservationRequest;

/// Reason attached to sweep cancellations.
pub const NO_SHOW_REASON: &str = "no_show";

/// Result of trying to pre-activate one reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// The spot was claimed and the reservation is now active.
    Activated(Reservation),
    /// The spot was already occupied; nothing changed.
    SpotBusy,
    /// The reservation was no longer pending.
    Skipped,
}

/// Books spots and drives reservation status.
#[derive(Debug, Clone)]
pub struct ReservationService {
    ctx: ServiceContext,
    oracle: AvailabilityOracle,
}

impl ReservationService {
    /// Create a new reservation service.
    pub fn new(ctx: ServiceContext) -> Self {
        let oracle = AvailabilityOracle::new(ctx.clone());
        Self { ctx, oracle }
    }

    /// Book a spot for `[start_time, end_time)`.
    ///
    /// A booking starting within the immediate window becomes active at
    /// once and marks its spot occupied. Anything later is pending.
    pub async fn create_reservation(
        &self,
        req: CreateReservationRequest,
    ) -> AppResult<OperationOutcome<Reservation>> {
        let result = self.try_create(&req).await;
        if let Err(Flow::Reject(code, message)) = &result {
            info!(
                customer_id = %req.customer_id,
                code = %code,
                reason = %message,
                "Reservation rejected"
            );
        }
        settle(result, "Reservation created")
    }

    async fn try_create(&self, req: &CreateReservationRequest) -> Result<Reservation, Flow> {
        let now = self.ctx.clock.now();
        if req.start_time < now || req.end_time <= req.start_time {
            return reject(
                RejectionCode::InvalidInterval,
                "Start must not be in the past and end must be after start",
            );
        }

        if self.ctx.repos.vehicles.get(req.vehicle_id).await?.is_none() {
            return reject(
                RejectionCode::VehicleNotFound,
                format!("Vehicle {} not found", req.vehicle_id),
            );
        }

        let lead = req.start_time - now;
        let immediate =
            lead > chrono::Duration::zero() && lead < self.ctx.allocation.immediate_window();

        let mut candidates: Vec<Spot> = Vec::new();
        if let Some(requested) = req.spot_id {
            match self.ctx.repos.spots.get(requested).await? {
                Some(spot) => candidates.push(spot),
                None => {
                    return reject(
                        RejectionCode::SpotNotFound,
                        format!("Spot {requested} not found"),
                    );
                }
            }
        }
        candidates.extend(
            self.ctx
                .repos
                .spots
                .list()
                .await?
                .into_iter()
                .filter(|spot| Some(spot.id) != req.spot_id),
        );

        for candidate in candidates {
            let _guard = self.ctx.spot_locks.lock(candidate.id).await;
            let Some(spot) = self.ctx.repos.spots.get(candidate.id).await? else {
                continue;
            };
            if !self
                .oracle
                .is_free_for_window(&spot, req.start_time, req.end_time, immediate)
                .await?
            {
                if Some(spot.id) == req.spot_id {
                    debug!(spot_id = %spot.id, "Requested spot unavailable, falling back");
                }
                continue;
            }
            if let Some(reservation) = self.claim(&spot, req, immediate, now).await? {
                info!(
                    reservation_id = %reservation.id,
                    spot_id = %reservation.spot_id,
                    status = %reservation.status,
                    "Reservation created"
                );
                if immediate {
                    self.publish_activated(&reservation);
                }
                return Ok(reservation);
            }
        }

        reject(
            RejectionCode::NoAvailableSpot,
            "No parking spot available for the requested window",
        )
    }

    /// Write the reservation on `spot`. `None` when another writer got
    /// there first.
    async fn claim(
        &self,
        spot: &Spot,
        req: &CreateReservationRequest,
        immediate: bool,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Reservation>> {
        if immediate && !self.ctx.claim_spot(spot.id).await? {
            return Ok(None);
        }

        let new = NewReservation {
            customer_id: req.customer_id.clone(),
            spot_id: spot.id,
            vehicle_id: req.vehicle_id,
            start_time: req.start_time,
            end_time: req.end_time,
            status: if immediate {
                ReservationStatus::Active
            } else {
                ReservationStatus::Pending
            },
            created_at: now,
        };

        match self.ctx.repos.reservations.create(new).await {
            Ok(reservation) => Ok(Some(reservation)),
            Err(err) => {
                if immediate {
                    self.ctx.rollback_claim(spot.id).await;
                }
                if err.kind == ErrorKind::Conflict {
                    debug!(spot_id = %spot.id, "Lost race for spot, trying next");
                    Ok(None)
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Move a reservation to `new_status`.
    ///
    /// Cancelling or completing releases the spot unless a vehicle is
    /// parked there. Activating claims it.
    pub async fn update_status(
        &self,
        id: ReservationId,
        new_status: ReservationStatus,
    ) -> AppResult<Reservation> {
        let current = self.get_reservation(id).await?;
        let _guard = self.ctx.spot_locks.lock(current.spot_id).await;
        let current = self.get_reservation(id).await?;

        if !current.status.can_transition_to(new_status) {
            return Err(AppError::state_transition(format!(
                "Cannot move reservation {id} from {} to {new_status}",
                current.status
            )));
        }

        if new_status == ReservationStatus::Active {
            if !self.ctx.claim_spot(current.spot_id).await? {
                return Err(AppError::conflict(format!(
                    "Spot {} is already occupied",
                    current.spot_id
                )));
            }
            let Some(updated) = self
                .ctx
                .repos
                .reservations
                .transition_status(id, current.status, new_status)
                .await?
            else {
                self.ctx.rollback_claim(current.spot_id).await;
                return Err(AppError::state_transition(format!(
                    "Reservation {id} changed concurrently"
                )));
            };
            self.publish_activated(&updated);
            return Ok(updated);
        }

        let updated = self
            .ctx
            .repos
            .reservations
            .transition_status(id, current.status, new_status)
            .await?
            .ok_or_else(|| {
                AppError::state_transition(format!("Reservation {id} changed concurrently"))
            })?;
        // A pending reservation never claimed its spot.
        if current.status == ReservationStatus::Active {
            self.ctx
                .release_spot_unless_held(updated.spot_id, Some(updated.id))
                .await?;
        }

        info!(
            reservation_id = %id,
            from = %current.status,
            to = %new_status,
            "Reservation status changed"
        );
        if new_status == ReservationStatus::Cancelled {
            self.publish_cancelled(&updated, "cancelled");
        }
        Ok(updated)
    }

    /// Cancel pending and active reservations whose start plus the grace
    /// period has passed. Returns how many were cancelled.
    ///
    /// An active reservation whose holder is parked is left alone. Failures
    /// on one record are logged and the sweep moves on.
    pub async fn expire_stale(&self) -> AppResult<usize> {
        let now = self.ctx.clock.now();
        let grace = self.ctx.scheduler.grace_period();
        let candidates = self
            .ctx
            .repos
            .reservations
            .find_by_status(&ReservationStatus::BLOCKING)
            .await?;

        let mut cancelled = 0;
        for reservation in candidates
            .into_iter()
            .filter(|r| r.is_past_grace(now, grace))
        {
            match self.expire_one(&reservation).await {
                Ok(true) => cancelled += 1,
                Ok(false) => {}
                Err(err) => error!(
                    reservation_id = %reservation.id,
                    error = %err,
                    "Failed to expire reservation"
                ),
            }
        }

        if cancelled > 0 {
            info!(cancelled, "Expired stale reservations");
        }
        Ok(cancelled)
    }

    async fn expire_one(&self, reservation: &Reservation) -> AppResult<bool> {
        let _guard = self.ctx.spot_locks.lock(reservation.spot_id).await;

        if reservation.status == ReservationStatus::Active
            && self
                .ctx
                .repos
                .sessions
                .find_open_for_reservation(reservation.id)
                .await?
                .is_some()
        {
            debug!(reservation_id = %reservation.id, "Holder is parked, not expiring");
            return Ok(false);
        }

        let Some(cancelled) = self
            .ctx
            .repos
            .reservations
            .transition_status(
                reservation.id,
                reservation.status,
                ReservationStatus::Cancelled,
            )
            .await?
        else {
            return Ok(false);
        };

        if reservation.status == ReservationStatus::Active {
            self.ctx
                .release_spot_unless_held(cancelled.spot_id, Some(cancelled.id))
                .await?;
        }
        info!(
            reservation_id = %cancelled.id,
            spot_id = %cancelled.spot_id,
            "Reservation cancelled as no-show"
        );
        self.publish_cancelled(&cancelled, NO_SHOW_REASON);
        Ok(true)
    }

    /// Pending reservations starting within the activation window.
    pub async fn upcoming_for_activation(&self) -> AppResult<Vec<Reservation>> {
        let now = self.ctx.clock.now();
        let deadline = now + self.ctx.scheduler.activation_window();
        self.ctx
            .repos
            .reservations
            .find_starting_before(now, deadline)
            .await
    }

    /// Claim the spot for a pending reservation and mark it active.
    pub async fn activate_reservation(&self, id: ReservationId) -> AppResult<ActivationOutcome> {
        let reservation = self.get_reservation(id).await?;
        let _guard = self.ctx.spot_locks.lock(reservation.spot_id).await;
        let reservation = self.get_reservation(id).await?;

        if reservation.status != ReservationStatus::Pending {
            return Ok(ActivationOutcome::Skipped);
        }

        if !self.ctx.claim_spot(reservation.spot_id).await? {
            warn!(
                reservation_id = %id,
                spot_id = %reservation.spot_id,
                "Spot already occupied, cannot pre-activate reservation"
            );
            return Ok(ActivationOutcome::SpotBusy);
        }

        let activated = match self
            .ctx
            .repos
            .reservations
            .transition_status(id, ReservationStatus::Pending, ReservationStatus::Active)
            .await
        {
            Ok(Some(activated)) => activated,
            Ok(None) => {
                self.ctx.rollback_claim(reservation.spot_id).await;
                return Ok(ActivationOutcome::Skipped);
            }
            Err(err) => {
                self.ctx.rollback_claim(reservation.spot_id).await;
                return Err(err);
            }
        };

        info!(
            reservation_id = %id,
            spot_id = %activated.spot_id,
            "Reservation pre-activated"
        );
        self.publish_activated(&activated);
        Ok(ActivationOutcome::Activated(activated))
    }

    /// Every reservation, newest first.
    pub async fn list_reservations(&self) -> AppResult<Vec<Reservation>> {
        self.ctx.repos.reservations.list().await
    }

    /// One reservation.
    pub async fn get_reservation(&self, id: ReservationId) -> AppResult<Reservation> {
        self.ctx
            .repos
            .reservations
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Reservation {id} not found")))
    }

    /// A customer's reservations starting in `[from, to)`.
    pub async fn reservations_for_customer(
        &self,
        customer_id: &UserId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<Reservation>> {
        self.ctx
            .repos
            .reservations
            .find_for_customer(customer_id, from, to)
            .await
    }

    /// Reservations starting on `date`, optionally narrowed by status.
    pub async fn reservations_by_date_and_status(
        &self,
        date: NaiveDate,
        statuses: &[ReservationStatus],
    ) -> AppResult<Vec<Reservation>> {
        self.ctx
            .repos
            .reservations
            .find_by_date_and_status(date, statuses)
            .await
    }

    fn publish_activated(&self, reservation: &Reservation) {
        let event = ParkingEvent::ReservationActivated {
            reservation_id: reservation.id,
            spot_id: reservation.spot_id,
            customer_id: reservation.customer_id.clone(),
            start_time: reservation.start_time,
        };
        self.ctx.publish_to_user(&reservation.customer_id, event.clone());
        self.ctx.publish_to_admins(event);
    }

    fn publish_cancelled(&self, reservation: &Reservation, reason: &str) {
        let event = ParkingEvent::ReservationCancelled {
            reservation_id: reservation.id,
            spot_id: reservation.spot_id,
            customer_id: reservation.customer_id.clone(),
            reason: reason.to_string(),
        };
        self.ctx.publish_to_user(&reservation.customer_id, event.clone());
        self.ctx.publish_to_admins(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Fixture, at};
    use chrono::Duration;
    use parkhub_core::types::SpotId;

    fn request(
        vehicle: &parkhub_entity::vehicle::Vehicle,
        spot_id: Option<SpotId>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CreateReservationRequest {
        CreateReservationRequest {
            customer_id: vehicle.customer_id.clone(),
            vehicle_id: vehicle.id,
            spot_id,
            start_time: start,
            end_time: end,
        }
    }

    #[tokio::test]
    async fn test_booking_one_hour_ahead_is_pending() {
        let fx = Fixture::new(at(8, 0), 5).await;
        let vehicle = fx.vehicle("ABC123", "alice").await;
        let spot5 = fx.spots[4].id;

        let outcome = fx
            .reservations()
            .create_reservation(request(&vehicle, Some(spot5), at(9, 0), at(10, 0)))
            .await
            .expect("create");

        assert!(outcome.success);
        let reservation = outcome.data.expect("data");
        assert_eq!(reservation.spot_id, spot5);
        assert_eq!(reservation.status, ReservationStatus::Pending);
        assert!(!fx.spot(spot5).await.occupied);
    }

    #[tokio::test]
    async fn test_booking_within_the_hour_is_immediate() {
        let fx = Fixture::new(at(8, 0), 2).await;
        let vehicle = fx.vehicle("ABC123", "alice").await;

        let outcome = fx
            .reservations()
            .create_reservation(request(&vehicle, None, at(8, 30), at(9, 30)))
            .await
            .expect("create");

        let reservation = outcome.data.expect("data");
        assert_eq!(reservation.status, ReservationStatus::Active);
        assert!(fx.spot(reservation.spot_id).await.occupied);
        assert_eq!(fx.publisher.admin_types(), vec!["reservation_activated"]);
        assert_eq!(
            fx.publisher.user_types(&vehicle.customer_id),
            vec!["reservation_activated"]
        );
    }

    #[tokio::test]
    async fn test_invalid_interval_rejected() {
        let fx = Fixture::new(at(8, 0), 1).await;
        let vehicle = fx.vehicle("ABC123", "alice").await;
        let service = fx.reservations();

        let past = service
            .create_reservation(request(&vehicle, None, at(7, 0), at(9, 0)))
            .await
            .expect("create");
        assert_eq!(past.error_code, Some(RejectionCode::InvalidInterval));

        let inverted = service
            .create_reservation(request(&vehicle, None, at(10, 0), at(10, 0)))
            .await
            .expect("create");
        assert_eq!(inverted.error_code, Some(RejectionCode::InvalidInterval));
    }

    #[tokio::test]
    async fn test_unknown_vehicle_and_spot_rejected() {
        let fx = Fixture::new(at(8, 0), 1).await;
        let vehicle = fx.vehicle("ABC123", "alice").await;
        let service = fx.reservations();

        let mut req = request(&vehicle, None, at(12, 0), at(13, 0));
        req.vehicle_id = parkhub_core::types::VehicleId(9_999);
        let outcome = service.create_reservation(req).await.expect("create");
        assert_eq!(outcome.error_code, Some(RejectionCode::VehicleNotFound));

        let outcome = service
            .create_reservation(request(&vehicle, Some(SpotId(9_999)), at(12, 0), at(13, 0)))
            .await
            .expect("create");
        assert_eq!(outcome.error_code, Some(RejectionCode::SpotNotFound));
    }

    #[tokio::test]
    async fn test_requested_spot_conflict_falls_back() {
        let fx = Fixture::new(at(8, 0), 2).await;
        let vehicle = fx.vehicle("ABC123", "alice").await;
        let taken = fx.spots[0].id;
        fx.book(taken, at(20, 0), at(22, 0), ReservationStatus::Pending)
            .await;

        let outcome = fx
            .reservations()
            .create_reservation(request(&vehicle, Some(taken), at(21, 0), at(23, 0)))
            .await
            .expect("create");

        assert_eq!(outcome.data.expect("data").spot_id, fx.spots[1].id);
    }

    #[tokio::test]
    async fn test_overlap_never_double_books() {
        let fx = Fixture::new(at(8, 0), 1).await;
        let vehicle = fx.vehicle("ABC123", "alice").await;
        let service = fx.reservations();

        let first = service
            .create_reservation(request(&vehicle, None, at(20, 0), at(21, 0)))
            .await
            .expect("create");
        assert!(first.success);

        let second = service
            .create_reservation(request(&vehicle, None, at(20, 30), at(21, 30)))
            .await
            .expect("create");
        assert_eq!(second.error_code, Some(RejectionCode::NoAvailableSpot));

        // Back-to-back windows do not overlap.
        let adjacent = service
            .create_reservation(request(&vehicle, None, at(21, 0), at(22, 0)))
            .await
            .expect("create");
        assert!(adjacent.success);
    }

    #[tokio::test]
    async fn test_concurrent_immediate_bookings_take_distinct_spots() {
        let fx = Fixture::new(at(8, 0), 2).await;
        let vehicle = fx.vehicle("ABC123", "alice").await;
        let service = fx.reservations();

        let mut handles = Vec::new();
        for _ in 0..3 {
            let service = service.clone();
            let req = request(&vehicle, None, at(8, 10), at(9, 0));
            handles.push(tokio::spawn(async move {
                service.create_reservation(req).await
            }));
        }

        let mut spots = Vec::new();
        let mut rejected = 0;
        for handle in handles {
            let outcome = handle.await.expect("join").expect("create");
            match outcome.data {
                Some(reservation) => spots.push(reservation.spot_id),
                None => rejected += 1,
            }
        }
        spots.sort();
        spots.dedup();
        assert_eq!(spots.len(), 2);
        assert_eq!(rejected, 1);
    }

    #[tokio::test]
    async fn test_update_status_rules() {
        let fx = Fixture::new(at(8, 0), 1).await;
        let spot = fx.spots[0].id;
        let reservation = fx
            .book(spot, at(12, 0), at(13, 0), ReservationStatus::Pending)
            .await;
        let service = fx.reservations();

        let err = service
            .update_status(reservation.id, ReservationStatus::Completed)
            .await
            .expect_err("pending cannot complete");
        assert_eq!(err.kind, ErrorKind::StateTransition);

        let active = service
            .update_status(reservation.id, ReservationStatus::Active)
            .await
            .expect("activate");
        assert_eq!(active.status, ReservationStatus::Active);
        assert!(fx.spot(spot).await.occupied);

        let cancelled = service
            .update_status(reservation.id, ReservationStatus::Cancelled)
            .await
            .expect("cancel");
        assert_eq!(cancelled.status, ReservationStatus::Cancelled);
        assert!(!fx.spot(spot).await.occupied);

        let err = service
            .update_status(ReservationId(9_999), ReservationStatus::Cancelled)
            .await
            .expect_err("missing");
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_cancel_keeps_spot_with_open_session() {
        let fx = Fixture::new(at(8, 0), 1).await;
        let spot = fx.spots[0].id;
        let reservation = fx
            .book(spot, at(7, 50), at(9, 0), ReservationStatus::Active)
            .await;
        fx.set_occupied(spot, true).await;
        fx.open_session(spot, None).await;

        fx.reservations()
            .update_status(reservation.id, ReservationStatus::Cancelled)
            .await
            .expect("cancel");
        assert!(fx.spot(spot).await.occupied);
    }

    #[tokio::test]
    async fn test_sweep_cancels_no_show_and_frees_spot() {
        let fx = Fixture::new(at(8, 0), 1).await;
        let spot = fx.spots[0].id;
        // Pre-activated by the activation pass.
        let reservation = fx
            .book(spot, at(9, 0), at(10, 0), ReservationStatus::Active)
            .await;
        fx.set_occupied(spot, true).await;

        fx.clock.set(at(9, 16));
        let service = fx.reservations();
        assert_eq!(service.expire_stale().await.expect("sweep"), 1);

        assert_eq!(
            fx.reservation(&reservation).await.status,
            ReservationStatus::Cancelled
        );
        assert!(!fx.spot(spot).await.occupied);
        assert_eq!(fx.publisher.admin_types(), vec!["reservation_cancelled"]);

        // Second run finds nothing.
        assert_eq!(service.expire_stale().await.expect("sweep"), 0);
    }

    #[tokio::test]
    async fn test_cancelling_other_booking_keeps_pre_activated_hold() {
        let fx = Fixture::new(at(9, 10), 1).await;
        let spot = fx.spots[0].id;
        let vehicle = fx.vehicle("HOLD01", "alice").await;
        let held = fx
            .book_for(
                spot,
                vehicle.id,
                "alice",
                at(10, 0),
                at(11, 0),
                ReservationStatus::Pending,
            )
            .await;
        let later = fx
            .book(spot, at(12, 0), at(13, 0), ReservationStatus::Pending)
            .await;

        let service = fx.reservations();
        assert!(matches!(
            service.activate_reservation(held.id).await.expect("activate"),
            ActivationOutcome::Activated(_)
        ));
        service
            .update_status(later.id, ReservationStatus::Cancelled)
            .await
            .expect("cancel");
        assert!(fx.spot(spot).await.occupied);

        let processor = fx.processor();
        let walk_in = processor
            .process_entry(crate::occupancy::EntryRequest::manual("Ana", "XYZ9"))
            .await
            .expect("walk-in");
        assert_eq!(walk_in.error_code, Some(RejectionCode::NoAvailableSpot));

        fx.clock.set(at(10, 0));
        let holder = processor
            .process_entry(crate::occupancy::EntryRequest::ocr("HOLD01"))
            .await
            .expect("holder");
        assert!(holder.success);
        assert_eq!(holder.data.expect("session").spot_id, spot);
    }

    #[tokio::test]
    async fn test_sweep_of_pending_keeps_pre_activated_hold() {
        let fx = Fixture::new(at(8, 0), 1).await;
        let spot = fx.spots[0].id;
        let no_show = fx
            .book(spot, at(9, 0), at(9, 30), ReservationStatus::Pending)
            .await;
        let next = fx
            .book(spot, at(10, 0), at(11, 0), ReservationStatus::Pending)
            .await;

        fx.clock.set(at(9, 16));
        let service = fx.reservations();
        assert!(matches!(
            service.activate_reservation(next.id).await.expect("activate"),
            ActivationOutcome::Activated(_)
        ));
        assert_eq!(service.expire_stale().await.expect("sweep"), 1);

        assert_eq!(
            fx.reservation(&no_show).await.status,
            ReservationStatus::Cancelled
        );
        assert!(fx.spot(spot).await.occupied);
    }

    #[tokio::test]
    async fn test_sweep_respects_grace_period() {
        let fx = Fixture::new(at(9, 15), 1).await;
        let reservation = fx
            .book(fx.spots[0].id, at(9, 0), at(10, 0), ReservationStatus::Pending)
            .await;

        assert_eq!(fx.reservations().expire_stale().await.expect("sweep"), 0);
        assert_eq!(
            fx.reservation(&reservation).await.status,
            ReservationStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_sweep_skips_active_with_parked_holder() {
        let fx = Fixture::new(at(8, 0), 1).await;
        let spot = fx.spots[0].id;
        let vehicle = fx.vehicle("ABC123", "alice").await;
        let reservation = fx
            .book_for(
                spot,
                vehicle.id,
                "alice",
                at(8, 0),
                at(12, 0),
                ReservationStatus::Pending,
            )
            .await;

        let processor = fx.processor();
        let entry = processor
            .process_entry(crate::occupancy::EntryRequest::ocr("ABC123"))
            .await
            .expect("entry");
        assert!(entry.success);

        fx.clock.advance(Duration::hours(1));
        assert_eq!(fx.reservations().expire_stale().await.expect("sweep"), 0);
        assert_eq!(
            fx.reservation(&reservation).await.status,
            ReservationStatus::Active
        );
    }

    #[tokio::test]
    async fn test_activation_claims_spot() {
        let fx = Fixture::new(at(8, 0), 2).await;
        let free = fx
            .book(fx.spots[0].id, at(8, 30), at(9, 30), ReservationStatus::Pending)
            .await;
        let busy = fx
            .book(fx.spots[1].id, at(8, 40), at(9, 30), ReservationStatus::Pending)
            .await;
        fx.set_occupied(fx.spots[1].id, true).await;

        let service = fx.reservations();
        let upcoming = service.upcoming_for_activation().await.expect("upcoming");
        assert_eq!(upcoming.len(), 2);

        match service.activate_reservation(free.id).await.expect("activate") {
            ActivationOutcome::Activated(r) => assert_eq!(r.status, ReservationStatus::Active),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(fx.spot(fx.spots[0].id).await.occupied);

        assert_eq!(
            service.activate_reservation(busy.id).await.expect("activate"),
            ActivationOutcome::SpotBusy
        );
        assert_eq!(
            fx.reservation(&busy).await.status,
            ReservationStatus::Pending
        );

        assert_eq!(
            service.activate_reservation(free.id).await.expect("again"),
            ActivationOutcome::Skipped
        );
    }

    #[tokio::test]
    async fn test_customer_and_date_queries() {
        let fx = Fixture::new(at(8, 0), 2).await;
        let vehicle = fx.vehicle("ABC123", "alice").await;
        fx.book_for(
            fx.spots[0].id,
            vehicle.id,
            "alice",
            at(12, 0),
            at(13, 0),
            ReservationStatus::Pending,
        )
        .await;
        fx.book_for(
            fx.spots[1].id,
            vehicle.id,
            "bob",
            at(12, 0),
            at(13, 0),
            ReservationStatus::Pending,
        )
        .await;

        let service = fx.reservations();
        let alice = service
            .reservations_for_customer(&UserId::from("alice"), None, None)
            .await
            .expect("query");
        assert_eq!(alice.len(), 1);

        let today = service
            .reservations_by_date_and_status(at(0, 0).date_naive(), &[ReservationStatus::Pending])
            .await
            .expect("query");
        assert_eq!(today.len(), 2);
        assert_eq!(service.list_reservations().await.expect("list").len(), 2);
    }
}
