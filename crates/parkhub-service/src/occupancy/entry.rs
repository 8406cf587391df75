//! Entry flow.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use parkhub_core::error::ErrorKind;
use parkhub_core::events::{ParkingEvent, RejectionCode};
use parkhub_core::result::AppResult;
use parkhub_core::types::{OperationOutcome, ReservationId, SpotId, UserId, VehicleId};
use parkhub_entity::occupancy::{EntryMethod, NewSession, OccupancySession};
use parkhub_entity::reservation::{Reservation, ReservationStatus};
use parkhub_entity::vehicle::{Vehicle, normalize_plate};

use crate::flow::{Flow, reject, settle};

use super::dto::EntryRequest;
use super::processor::EntryExitProcessor;

/// Walk-in candidates tried before giving up when racing other entries.
const WALK_IN_ATTEMPTS: usize = 8;

/// Who is at the gate.
struct Arrival {
    method: EntryMethod,
    vehicle: Option<Vehicle>,
    plate: Option<String>,
}

impl Arrival {
    fn lock_key(&self) -> String {
        match (&self.vehicle, &self.plate) {
            (Some(vehicle), _) => format!("vehicle:{}", vehicle.id),
            (None, Some(plate)) => format!("plate:{plate}"),
            (None, None) => "anonymous".to_string(),
        }
    }

    fn vehicle_id(&self) -> Option<VehicleId> {
        self.vehicle.as_ref().map(|v| v.id)
    }

    fn customer(&self) -> Option<UserId> {
        self.vehicle.as_ref().map(|v| v.customer_id.clone())
    }
}

/// Where the session goes and what it does to reservations.
struct Placement {
    spot_id: SpotId,
    /// Whether this entry flipped `occupied` and must undo it on failure.
    claimed: bool,
    /// Reservation recorded on the session.
    bound: Option<ReservationId>,
    /// Pending reservation to mark active once the session exists.
    consume: Option<ReservationId>,
}

struct Admitted {
    session: OccupancySession,
    customer: Option<UserId>,
}

impl EntryExitProcessor {
    /// Register a vehicle entering.
    ///
    /// Anticipated failures come back as a rejected outcome; only storage
    /// failures are errors. Admins see every attempt.
    pub async fn process_entry(
        &self,
        req: EntryRequest,
    ) -> AppResult<OperationOutcome<OccupancySession>> {
        let result = self.try_entry(&req).await;
        self.ctx.vehicle_locks.prune_idle();

        let customer = result.as_ref().ok().and_then(|a| a.customer.clone());
        let outcome = settle(result.map(|a| a.session), "Entry registered")?;
        let (request, response) = Self::gate_event_parts(&req, &outcome);

        match &outcome.data {
            Some(session) => {
                info!(
                    session_id = %session.id,
                    spot_id = %session.spot_id,
                    method = %session.entry_method,
                    "Vehicle entered"
                );
                self.ctx
                    .publish_to_admins(ParkingEvent::EntrySuccess { request, response });
                let drift = (session.entry_time - self.ctx.clock.now()).abs();
                if drift <= self.ctx.allocation.realtime_tolerance() {
                    self.publish_session_opened(session, customer.as_ref());
                }
            }
            None => {
                info!(
                    entry_type = %req.entry_type,
                    code = ?outcome.error_code,
                    reason = %outcome.message,
                    "Entry rejected"
                );
                self.ctx
                    .publish_to_admins(ParkingEvent::EntryRejected { request, response });
            }
        }
        Ok(outcome)
    }

    async fn try_entry(&self, req: &EntryRequest) -> Result<Admitted, Flow> {
        let Ok(method) = req.entry_type.parse::<EntryMethod>() else {
            return reject(
                RejectionCode::InvalidEntryType,
                format!("Unknown entry type '{}'", req.entry_type),
            );
        };
        let arrival = self.identify(method, req).await?;

        let _vehicle_guard = self.ctx.vehicle_locks.lock(arrival.lock_key()).await;
        self.ensure_not_inside(&arrival).await?;

        let now = self.ctx.clock.now();
        let reservation = match arrival.vehicle_id() {
            Some(vehicle_id) => self.reservation_for_entry(vehicle_id, now).await?,
            None => None,
        };
        let entry_time = req.entry_time.unwrap_or(now);

        let session = if let Some(spot_id) = req.spot_id {
            let _guard = self.ctx.spot_locks.lock(spot_id).await;
            let placement = self
                .place_explicit(spot_id, reservation.as_ref())
                .await?;
            self.open(placement, &arrival, req, entry_time).await?
        } else if let Some(reservation) = &reservation {
            let _guard = self.ctx.spot_locks.lock(reservation.spot_id).await;
            let placement = self.place_reserved(reservation).await?;
            self.open(placement, &arrival, req, entry_time).await?
        } else {
            self.enter_walk_in(&arrival, req, entry_time).await?
        };

        Ok(Admitted {
            session,
            customer: arrival.customer(),
        })
    }

    async fn identify(&self, method: EntryMethod, req: &EntryRequest) -> Result<Arrival, Flow> {
        let plate = req
            .plate
            .as_deref()
            .map(normalize_plate)
            .filter(|p| !p.is_empty());

        match method {
            EntryMethod::Ocr => {
                let Some(plate) = plate else {
                    return reject(RejectionCode::PlateRequired, "A plate is required");
                };
                let Some(vehicle) = self.ctx.repos.vehicles.find_by_plate(&plate).await? else {
                    return reject(
                        RejectionCode::VehicleNotFound,
                        format!("No vehicle registered with plate {plate}"),
                    );
                };
                Ok(Arrival {
                    method,
                    vehicle: Some(vehicle),
                    plate: Some(plate),
                })
            }
            EntryMethod::Qr => {
                let Some(vehicle_id) = req.vehicle_id else {
                    return reject(RejectionCode::VehicleIdRequired, "A vehicle id is required");
                };
                let Some(vehicle) = self.ctx.repos.vehicles.get(vehicle_id).await? else {
                    return reject(
                        RejectionCode::VehicleNotFound,
                        format!("Vehicle {vehicle_id} not found"),
                    );
                };
                let plate = Some(vehicle.plate.clone());
                Ok(Arrival {
                    method,
                    vehicle: Some(vehicle),
                    plate,
                })
            }
            EntryMethod::Manual => {
                let has_name = req
                    .visitor_name
                    .as_deref()
                    .is_some_and(|n| !n.trim().is_empty());
                let Some(plate) = plate.filter(|_| has_name) else {
                    return reject(
                        RejectionCode::VisitorDataRequired,
                        "Visitor name and plate are required",
                    );
                };
                let vehicle = self.ctx.repos.vehicles.find_by_plate(&plate).await?;
                Ok(Arrival {
                    method,
                    vehicle,
                    plate: Some(plate),
                })
            }
        }
    }

    async fn ensure_not_inside(&self, arrival: &Arrival) -> Result<(), Flow> {
        let sessions = &self.ctx.repos.sessions;
        let mut inside = false;
        if let Some(vehicle_id) = arrival.vehicle_id() {
            inside = sessions.find_open_for_vehicle(vehicle_id).await?.is_some();
        }
        if !inside {
            if let Some(plate) = &arrival.plate {
                inside = sessions.find_open_by_plate(plate).await?.is_some();
            }
        }
        if inside {
            return reject(
                RejectionCode::VehicleAlreadyActive,
                "Vehicle already has an open session",
            );
        }
        Ok(())
    }

    /// The vehicle's earliest pending reservation covering now, or failing
    /// that an active one.
    async fn reservation_for_entry(
        &self,
        vehicle_id: VehicleId,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Reservation>> {
        let reservations = &self.ctx.repos.reservations;
        if let Some(pending) = reservations
            .find_pending_for_vehicle(vehicle_id, now)
            .await?
            .into_iter()
            .next()
        {
            return Ok(Some(pending));
        }
        Ok(reservations
            .find_active_for_vehicle(vehicle_id, now)
            .await?
            .into_iter()
            .next())
    }

    /// Spot named in the request. Call with the spot lock held.
    async fn place_explicit(
        &self,
        spot_id: SpotId,
        reservation: Option<&Reservation>,
    ) -> Result<Placement, Flow> {
        let availability = match self.oracle.is_available_for_immediate_use(spot_id).await {
            Ok(availability) => availability,
            Err(err) if err.kind == ErrorKind::NotFound => {
                return reject(RejectionCode::SpotNotFound, format!("Spot {spot_id} not found"));
            }
            Err(err) => return Err(err.into()),
        };
        if !availability.available {
            return reject(
                RejectionCode::ParkingNotAvailable,
                format!("Spot {spot_id} is not available"),
            );
        }

        if let Some(bound) = availability.bound_reservation {
            return Ok(Placement {
                spot_id,
                claimed: false,
                bound: Some(bound),
                consume: None,
            });
        }

        if !self.ctx.claim_spot(spot_id).await? {
            return reject(
                RejectionCode::ParkingNotAvailable,
                format!("Spot {spot_id} was taken"),
            );
        }

        let own = reservation.filter(|r| r.spot_id == spot_id);
        Ok(Placement {
            spot_id,
            claimed: true,
            bound: own.map(|r| r.id),
            consume: own
                .filter(|r| r.status == ReservationStatus::Pending)
                .map(|r| r.id),
        })
    }

    /// The vehicle's own reservation. Call with the spot lock held.
    async fn place_reserved(&self, reservation: &Reservation) -> Result<Placement, Flow> {
        let spot_id = reservation.spot_id;
        if self.oracle.spot_has_open_session(spot_id).await? {
            return reject(
                RejectionCode::ParkingNotAvailable,
                format!("Reserved spot {spot_id} is still occupied"),
            );
        }

        let pending = reservation.status == ReservationStatus::Pending;
        let claimed = self.ctx.claim_spot(spot_id).await?;
        if !claimed && pending {
            return reject(
                RejectionCode::ParkingNotAvailable,
                format!("Reserved spot {spot_id} is occupied"),
            );
        }

        Ok(Placement {
            spot_id,
            claimed,
            bound: Some(reservation.id),
            consume: pending.then_some(reservation.id),
        })
    }

    async fn enter_walk_in(
        &self,
        arrival: &Arrival,
        req: &EntryRequest,
        entry_time: DateTime<Utc>,
    ) -> Result<OccupancySession, Flow> {
        for _ in 0..WALK_IN_ATTEMPTS {
            let candidate = match self.oracle.find_spot_for_walk_in().await {
                Ok(spot) => spot,
                Err(err) if err.kind == ErrorKind::Conflict => break,
                Err(err) => return Err(err.into()),
            };
            // Another entry may take the candidate before we hold its lock.
            let _guard = self.ctx.spot_locks.lock(candidate.id).await;
            let Some(spot) = self.ctx.repos.spots.get(candidate.id).await? else {
                continue;
            };
            if !self.oracle.is_walk_in_candidate(&spot).await? {
                continue;
            }
            if !self.ctx.claim_spot(spot.id).await? {
                continue;
            }
            let placement = Placement {
                spot_id: spot.id,
                claimed: true,
                bound: None,
                consume: None,
            };
            return self.open(placement, arrival, req, entry_time).await;
        }
        reject(
            RejectionCode::NoAvailableSpot,
            "No parking spot available for a walk-in",
        )
    }

    /// Write the session. Call with the spot lock held.
    async fn open(
        &self,
        placement: Placement,
        arrival: &Arrival,
        req: &EntryRequest,
        entry_time: DateTime<Utc>,
    ) -> Result<OccupancySession, Flow> {
        let new = NewSession {
            reservation_id: placement.bound,
            vehicle_id: arrival.vehicle_id(),
            spot_id: placement.spot_id,
            entry_time,
            plate: arrival.plate.clone(),
            entry_method: arrival.method,
            visitor_name: req.visitor_name.clone(),
            visitor_national_id: req.visitor_national_id.clone(),
            visitor_contact: req.visitor_contact.clone(),
            zone: req.zone.clone(),
            registered_by: req.registered_by.clone(),
        };

        let session = match self.ctx.repos.sessions.create(new).await {
            Ok(session) => session,
            Err(err) => {
                if placement.claimed {
                    self.ctx.rollback_claim(placement.spot_id).await;
                }
                if err.kind == ErrorKind::Conflict {
                    return reject(
                        RejectionCode::ParkingNotAvailable,
                        format!("Spot {} already has a vehicle", placement.spot_id),
                    );
                }
                return Err(err.into());
            }
        };

        if let Some(reservation_id) = placement.consume {
            match self
                .ctx
                .repos
                .reservations
                .transition_status(
                    reservation_id,
                    ReservationStatus::Pending,
                    ReservationStatus::Active,
                )
                .await?
            {
                Some(_) => debug!(reservation_id = %reservation_id, "Reservation consumed by entry"),
                None => warn!(
                    reservation_id = %reservation_id,
                    "Reservation was no longer pending at entry"
                ),
            }
        }

        Ok(session)
    }
}
