//! Process-local store implementing every repository trait.
//!
//! Enforces the same constraints the PostgreSQL schema does: no overlapping
//! blocking reservations on a spot and at most one open session per spot.
//! Suitable for single-node deployments and tests only.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use parkhub_core::error::AppError;
use parkhub_core::result::AppResult;
use parkhub_core::types::{ReservationId, SessionId, SpotId, UserId, VehicleId, interval};
use parkhub_entity::occupancy::{NewSession, OccupancySession, SessionFilter};
use parkhub_entity::reservation::{NewReservation, Reservation, ReservationStatus};
use parkhub_entity::spot::Spot;
use parkhub_entity::vehicle::{Vehicle, normalize_plate};

use crate::repositories::{
    OccupancyRepository, ReservationRepository, SpotRepository, VehicleRepository,
};

#[derive(Debug, Default)]
struct InnerState {
    spots: BTreeMap<i64, Spot>,
    reservations: BTreeMap<i64, Reservation>,
    sessions: BTreeMap<i64, OccupancySession>,
    vehicles: BTreeMap<i64, Vehicle>,
    next_id: i64,
}

impl InnerState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory store guarded by a Tokio mutex.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<InnerState>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a free spot.
    pub async fn add_spot(&self, code: &str, location: &str, zone: &str) -> Spot {
        let mut state = self.state.lock().await;
        let id = SpotId(state.next_id());
        let spot = Spot {
            id,
            code: code.to_string(),
            location: location.to_string(),
            zone: zone.to_string(),
            occupied: false,
        };
        state.spots.insert(id.get(), spot.clone());
        spot
    }

    /// Add `count` free spots labelled `S-1`, `S-2`, ...
    pub async fn seed_spots(&self, count: u32) -> Vec<Spot> {
        let mut spots = Vec::with_capacity(count as usize);
        for n in 1..=count {
            spots.push(self.add_spot(&format!("S-{n}"), "", "default").await);
        }
        debug!(count, "Seeded in-memory spots");
        spots
    }

    /// Register a vehicle. The plate is stored normalized.
    pub async fn add_vehicle(&self, plate: &str, customer_id: &UserId) -> Vehicle {
        let mut state = self.state.lock().await;
        let id = VehicleId(state.next_id());
        let vehicle = Vehicle {
            id,
            plate: normalize_plate(plate),
            brand: String::new(),
            model: String::new(),
            vehicle_type: "car".to_string(),
            customer_id: customer_id.clone(),
            created_at: Utc::now(),
        };
        state.vehicles.insert(id.get(), vehicle.clone());
        vehicle
    }
}

fn sorted_by_start(mut rows: Vec<Reservation>) -> Vec<Reservation> {
    rows.sort_by_key(|r| (r.start_time, r.id));
    rows
}

#[async_trait]
impl SpotRepository for MemoryStore {
    async fn get(&self, id: SpotId) -> AppResult<Option<Spot>> {
        Ok(self.state.lock().await.spots.get(&id.get()).cloned())
    }

    async fn list(&self) -> AppResult<Vec<Spot>> {
        Ok(self.state.lock().await.spots.values().cloned().collect())
    }

    async fn set_occupied_if(&self, id: SpotId, expected: bool, new: bool) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        match state.spots.get_mut(&id.get()) {
            Some(spot) if spot.occupied == expected => {
                spot.occupied = new;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl ReservationRepository for MemoryStore {
    async fn create(&self, new: NewReservation) -> AppResult<Reservation> {
        let mut state = self.state.lock().await;
        if new.status.is_blocking() {
            let clash = state.reservations.values().any(|r| {
                r.spot_id == new.spot_id
                    && r.status.is_blocking()
                    && interval::overlaps(r.start_time, r.end_time, new.start_time, new.end_time)
            });
            if clash {
                return Err(AppError::conflict(format!(
                    "Spot {} already booked for an overlapping window",
                    new.spot_id
                )));
            }
        }
        let id = ReservationId(state.next_id());
        let reservation = Reservation {
            id,
            customer_id: new.customer_id,
            spot_id: new.spot_id,
            vehicle_id: new.vehicle_id,
            start_time: new.start_time,
            end_time: new.end_time,
            status: new.status,
            created_at: new.created_at,
        };
        state.reservations.insert(id.get(), reservation.clone());
        Ok(reservation)
    }

    async fn get(&self, id: ReservationId) -> AppResult<Option<Reservation>> {
        Ok(self.state.lock().await.reservations.get(&id.get()).cloned())
    }

    async fn transition_status(
        &self,
        id: ReservationId,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> AppResult<Option<Reservation>> {
        let mut state = self.state.lock().await;
        match state.reservations.get_mut(&id.get()) {
            Some(r) if r.status == from => {
                r.status = to;
                Ok(Some(r.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn list(&self) -> AppResult<Vec<Reservation>> {
        let state = self.state.lock().await;
        let mut rows: Vec<Reservation> = state.reservations.values().cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn find_overlapping(
        &self,
        spot_id: SpotId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Reservation>> {
        let state = self.state.lock().await;
        Ok(sorted_by_start(
            state
                .reservations
                .values()
                .filter(|r| {
                    r.spot_id == spot_id
                        && r.status.is_blocking()
                        && interval::overlaps(r.start_time, r.end_time, start, end)
                })
                .cloned()
                .collect(),
        ))
    }

    async fn find_pending_for_spot_before(
        &self,
        spot_id: SpotId,
        after: DateTime<Utc>,
        deadline: DateTime<Utc>,
    ) -> AppResult<Option<Reservation>> {
        let state = self.state.lock().await;
        Ok(state
            .reservations
            .values()
            .filter(|r| {
                r.spot_id == spot_id
                    && r.status == ReservationStatus::Pending
                    && r.start_time > after
                    && r.start_time <= deadline
            })
            .min_by_key(|r| (r.start_time, r.id))
            .cloned())
    }

    async fn find_active_holding(
        &self,
        spot_id: SpotId,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Reservation>> {
        let state = self.state.lock().await;
        Ok(sorted_by_start(
            state
                .reservations
                .values()
                .filter(|r| {
                    r.spot_id == spot_id
                        && r.status == ReservationStatus::Active
                        && r.end_time > now
                })
                .cloned()
                .collect(),
        ))
    }

    async fn find_active_covering(
        &self,
        spot_id: SpotId,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Reservation>> {
        let state = self.state.lock().await;
        Ok(state
            .reservations
            .values()
            .filter(|r| {
                r.spot_id == spot_id && r.status == ReservationStatus::Active && r.covers(at)
            })
            .min_by_key(|r| (r.start_time, r.id))
            .cloned())
    }

    async fn find_starting_before(
        &self,
        after: DateTime<Utc>,
        deadline: DateTime<Utc>,
    ) -> AppResult<Vec<Reservation>> {
        let state = self.state.lock().await;
        Ok(sorted_by_start(
            state
                .reservations
                .values()
                .filter(|r| {
                    r.status == ReservationStatus::Pending
                        && r.start_time > after
                        && r.start_time <= deadline
                })
                .cloned()
                .collect(),
        ))
    }

    async fn find_by_status(&self, statuses: &[ReservationStatus]) -> AppResult<Vec<Reservation>> {
        let state = self.state.lock().await;
        Ok(sorted_by_start(
            state
                .reservations
                .values()
                .filter(|r| statuses.contains(&r.status))
                .cloned()
                .collect(),
        ))
    }

    async fn find_pending_for_vehicle(
        &self,
        vehicle_id: VehicleId,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Reservation>> {
        let state = self.state.lock().await;
        Ok(sorted_by_start(
            state
                .reservations
                .values()
                .filter(|r| {
                    r.vehicle_id == vehicle_id
                        && r.status == ReservationStatus::Pending
                        && r.covers(now)
                })
                .cloned()
                .collect(),
        ))
    }

    async fn find_active_for_vehicle(
        &self,
        vehicle_id: VehicleId,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Reservation>> {
        let state = self.state.lock().await;
        Ok(sorted_by_start(
            state
                .reservations
                .values()
                .filter(|r| {
                    r.vehicle_id == vehicle_id
                        && r.status == ReservationStatus::Active
                        && r.covers(now)
                })
                .cloned()
                .collect(),
        ))
    }

    async fn find_for_customer(
        &self,
        customer_id: &UserId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<Reservation>> {
        let state = self.state.lock().await;
        Ok(sorted_by_start(
            state
                .reservations
                .values()
                .filter(|r| {
                    &r.customer_id == customer_id
                        && from.is_none_or(|f| r.start_time >= f)
                        && to.is_none_or(|t| r.start_time < t)
                })
                .cloned()
                .collect(),
        ))
    }

    async fn find_by_date_and_status(
        &self,
        date: NaiveDate,
        statuses: &[ReservationStatus],
    ) -> AppResult<Vec<Reservation>> {
        let state = self.state.lock().await;
        Ok(sorted_by_start(
            state
                .reservations
                .values()
                .filter(|r| {
                    r.start_time.date_naive() == date
                        && (statuses.is_empty() || statuses.contains(&r.status))
                })
                .cloned()
                .collect(),
        ))
    }
}

#[async_trait]
impl OccupancyRepository for MemoryStore {
    async fn create(&self, new: NewSession) -> AppResult<OccupancySession> {
        let mut state = self.state.lock().await;
        if state
            .sessions
            .values()
            .any(|s| s.spot_id == new.spot_id && s.is_open())
        {
            return Err(AppError::conflict(format!(
                "Spot {} already has an open session",
                new.spot_id
            )));
        }
        let id = SessionId(state.next_id());
        let session = OccupancySession {
            id,
            reservation_id: new.reservation_id,
            vehicle_id: new.vehicle_id,
            spot_id: new.spot_id,
            entry_time: new.entry_time,
            exit_time: None,
            plate: new.plate,
            entry_method: new.entry_method,
            visitor_name: new.visitor_name,
            visitor_national_id: new.visitor_national_id,
            visitor_contact: new.visitor_contact,
            zone: new.zone,
            registered_by: new.registered_by,
        };
        state.sessions.insert(id.get(), session.clone());
        Ok(session)
    }

    async fn get(&self, id: SessionId) -> AppResult<Option<OccupancySession>> {
        Ok(self.state.lock().await.sessions.get(&id.get()).cloned())
    }

    async fn close_if_open(
        &self,
        id: SessionId,
        exit_time: DateTime<Utc>,
    ) -> AppResult<Option<OccupancySession>> {
        let mut state = self.state.lock().await;
        match state.sessions.get_mut(&id.get()) {
            Some(session) if session.is_open() => {
                session.exit_time = Some(exit_time);
                Ok(Some(session.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn find_open(&self) -> AppResult<Vec<OccupancySession>> {
        let state = self.state.lock().await;
        let mut rows: Vec<OccupancySession> =
            state.sessions.values().filter(|s| s.is_open()).cloned().collect();
        rows.sort_by_key(|s| (s.entry_time, s.id));
        Ok(rows)
    }

    async fn find_open_for_spot(&self, spot_id: SpotId) -> AppResult<Option<OccupancySession>> {
        let state = self.state.lock().await;
        Ok(state
            .sessions
            .values()
            .find(|s| s.spot_id == spot_id && s.is_open())
            .cloned())
    }

    async fn find_open_for_vehicle(
        &self,
        vehicle_id: VehicleId,
    ) -> AppResult<Option<OccupancySession>> {
        let state = self.state.lock().await;
        Ok(state
            .sessions
            .values()
            .filter(|s| s.vehicle_id == Some(vehicle_id) && s.is_open())
            .max_by_key(|s| (s.entry_time, s.id))
            .cloned())
    }

    async fn find_open_by_plate(&self, plate: &str) -> AppResult<Option<OccupancySession>> {
        let state = self.state.lock().await;
        Ok(state
            .sessions
            .values()
            .filter(|s| s.plate.as_deref() == Some(plate) && s.is_open())
            .max_by_key(|s| (s.entry_time, s.id))
            .cloned())
    }

    async fn find_open_for_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> AppResult<Option<OccupancySession>> {
        let state = self.state.lock().await;
        Ok(state
            .sessions
            .values()
            .find(|s| s.reservation_id == Some(reservation_id) && s.is_open())
            .cloned())
    }

    async fn find_for_vehicles(
        &self,
        vehicle_ids: &[VehicleId],
        filter: &SessionFilter,
    ) -> AppResult<Vec<OccupancySession>> {
        let state = self.state.lock().await;
        let mut rows: Vec<OccupancySession> = state
            .sessions
            .values()
            .filter(|s| s.vehicle_id.is_some_and(|v| vehicle_ids.contains(&v)))
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.entry_time.cmp(&a.entry_time).then(b.id.cmp(&a.id)));
        Ok(rows)
    }
}

#[async_trait]
impl VehicleRepository for MemoryStore {
    async fn get(&self, id: VehicleId) -> AppResult<Option<Vehicle>> {
        Ok(self.state.lock().await.vehicles.get(&id.get()).cloned())
    }

    async fn find_by_plate(&self, plate: &str) -> AppResult<Option<Vehicle>> {
        let state = self.state.lock().await;
        Ok(state.vehicles.values().find(|v| v.plate == plate).cloned())
    }

    async fn find_by_customer(&self, customer_id: &UserId) -> AppResult<Vec<Vehicle>> {
        let state = self.state.lock().await;
        Ok(state
            .vehicles
            .values()
            .filter(|v| &v.customer_id == customer_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use parkhub_entity::occupancy::EntryMethod;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).single().expect("valid")
    }

    fn booking(spot_id: SpotId, start: u32, end: u32) -> NewReservation {
        NewReservation {
            customer_id: UserId::from("cust-1"),
            spot_id,
            vehicle_id: VehicleId(99),
            start_time: at(start),
            end_time: at(end),
            status: ReservationStatus::Pending,
            created_at: at(7),
        }
    }

    fn walk_in(spot_id: SpotId) -> NewSession {
        NewSession {
            reservation_id: None,
            vehicle_id: None,
            spot_id,
            entry_time: at(9),
            plate: Some("ZZ9999".to_string()),
            entry_method: EntryMethod::Manual,
            visitor_name: Some("Visitor".to_string()),
            visitor_national_id: None,
            visitor_contact: None,
            zone: None,
            registered_by: None,
        }
    }

    #[tokio::test]
    async fn test_set_occupied_if_is_compare_and_set() {
        let store = MemoryStore::new();
        let spot = store.add_spot("A-1", "north", "A").await;

        assert!(store.set_occupied_if(spot.id, false, true).await.expect("cas"));
        assert!(!store.set_occupied_if(spot.id, false, true).await.expect("cas"));
        assert!(!store.set_occupied_if(SpotId(404), false, true).await.expect("cas"));

        let reloaded = SpotRepository::get(&store, spot.id).await.expect("get").expect("spot");
        assert!(reloaded.occupied);
    }

    #[tokio::test]
    async fn test_overlapping_blocking_reservation_rejected() {
        let store = MemoryStore::new();
        let spot = store.add_spot("A-1", "", "A").await;

        ReservationRepository::create(&store, booking(spot.id, 9, 10)).await.expect("first");
        let err = ReservationRepository::create(&store, booking(spot.id, 9, 11))
            .await
            .expect_err("overlap");
        assert_eq!(err.kind, parkhub_core::error::ErrorKind::Conflict);

        // Adjacent window is fine.
        ReservationRepository::create(&store, booking(spot.id, 10, 11)).await.expect("adjacent");
    }

    #[tokio::test]
    async fn test_transition_status_requires_expected_state() {
        let store = MemoryStore::new();
        let spot = store.add_spot("A-1", "", "A").await;
        let r = ReservationRepository::create(&store, booking(spot.id, 9, 10)).await.expect("create");

        let moved = store
            .transition_status(r.id, ReservationStatus::Pending, ReservationStatus::Cancelled)
            .await
            .expect("transition");
        assert_eq!(moved.map(|r| r.status), Some(ReservationStatus::Cancelled));

        let again = store
            .transition_status(r.id, ReservationStatus::Pending, ReservationStatus::Active)
            .await
            .expect("transition");
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn test_one_open_session_per_spot() {
        let store = MemoryStore::new();
        let spot = store.add_spot("A-1", "", "A").await;

        let first = OccupancyRepository::create(&store, walk_in(spot.id)).await.expect("open");
        assert!(OccupancyRepository::create(&store, walk_in(spot.id)).await.is_err());

        let closed = store
            .close_if_open(first.id, at(10))
            .await
            .expect("close")
            .expect("was open");
        assert_eq!(closed.exit_time, Some(at(10)));
        assert!(store.close_if_open(first.id, at(11)).await.expect("close").is_none());

        OccupancyRepository::create(&store, walk_in(spot.id)).await.expect("reopen");
    }

    #[tokio::test]
    async fn test_pending_window_lookup_is_half_open_on_the_left() {
        let store = MemoryStore::new();
        let spot = store.add_spot("A-1", "", "A").await;
        ReservationRepository::create(&store, booking(spot.id, 9, 10)).await.expect("create");

        let none = store
            .find_pending_for_spot_before(spot.id, at(9), at(9) + Duration::hours(6))
            .await
            .expect("query");
        assert!(none.is_none());

        let found = store
            .find_pending_for_spot_before(spot.id, at(8), at(9))
            .await
            .expect("query");
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_vehicle_plate_is_normalized() {
        let store = MemoryStore::new();
        let owner = UserId::from("cust-7");
        store.add_vehicle("ab-cd 12", &owner).await;

        let found = store.find_by_plate("ABCD12").await.expect("query");
        assert!(found.is_some());
        assert_eq!(store.find_by_customer(&owner).await.expect("query").len(), 1);
    }
}
