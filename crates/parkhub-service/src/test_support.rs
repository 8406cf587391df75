//! Shared fixtures for service tests.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

use parkhub_core::config::{AllocationConfig, SchedulerConfig};
use parkhub_core::events::ParkingEvent;
use parkhub_core::traits::{Clock, EventPublisher, ManualClock};
use parkhub_core::types::{SpotId, UserId, VehicleId};
use parkhub_database::memory::MemoryStore;
use parkhub_database::repositories::{OccupancyRepository, ReservationRepository, SpotRepository};
use parkhub_database::Repositories;
use parkhub_entity::occupancy::{EntryMethod, NewSession, OccupancySession};
use parkhub_entity::reservation::{NewReservation, Reservation, ReservationStatus};
use parkhub_entity::spot::Spot;
use parkhub_entity::vehicle::Vehicle;

use crate::availability::AvailabilityOracle;
use crate::context::ServiceContext;
use crate::occupancy::EntryExitProcessor;
use crate::reservation::ReservationService;

/// `2024-06-01 hh:mm:00 UTC`.
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, hour, minute, 0)
        .single()
        .expect("valid fixture time")
}

/// Publisher that records everything it is given.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<(Option<UserId>, ParkingEvent)>>,
}

impl RecordingPublisher {
    /// Event type tags sent to admins, in order.
    pub fn admin_types(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .expect("lock")
            .iter()
            .filter(|(user, _)| user.is_none())
            .map(|(_, event)| event.event_type())
            .collect()
    }

    /// Event type tags sent to `user`, in order.
    pub fn user_types(&self, user: &UserId) -> Vec<&'static str> {
        self.events
            .lock()
            .expect("lock")
            .iter()
            .filter(|(to, _)| to.as_ref() == Some(user))
            .map(|(_, event)| event.event_type())
            .collect()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish_to_admins(&self, event: ParkingEvent) {
        self.events.lock().expect("lock").push((None, event));
    }

    fn publish_to_user(&self, user_id: &UserId, event: ParkingEvent) {
        self.events
            .lock()
            .expect("lock")
            .push((Some(user_id.clone()), event));
    }
}

/// In-memory store, manual clock and recording publisher wired together.
pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub publisher: Arc<RecordingPublisher>,
    pub ctx: ServiceContext,
    pub spots: Vec<Spot>,
}

impl Fixture {
    /// `spot_count` free spots with the clock at `now`.
    pub async fn new(now: DateTime<Utc>, spot_count: u32) -> Self {
        let store = Arc::new(MemoryStore::new());
        let spots = store.seed_spots(spot_count).await;
        let clock = Arc::new(ManualClock::new(now));
        let publisher = Arc::new(RecordingPublisher::default());
        let ctx = ServiceContext::new(
            Repositories::memory(store.clone()),
            clock.clone(),
            Some(publisher.clone()),
            AllocationConfig::default(),
            SchedulerConfig::default(),
        );
        Self {
            store,
            clock,
            publisher,
            ctx,
            spots,
        }
    }

    /// Drop the publisher so operations run with nobody listening.
    pub fn without_publisher(mut self) -> Self {
        self.ctx.publisher = None;
        self
    }

    pub fn oracle(&self) -> AvailabilityOracle {
        AvailabilityOracle::new(self.ctx.clone())
    }

    pub fn reservations(&self) -> ReservationService {
        ReservationService::new(self.ctx.clone())
    }

    pub fn processor(&self) -> EntryExitProcessor {
        EntryExitProcessor::new(self.ctx.clone())
    }

    pub async fn vehicle(&self, plate: &str, customer: &str) -> Vehicle {
        self.store.add_vehicle(plate, &UserId::from(customer)).await
    }

    /// Insert a reservation directly, bypassing allocation.
    pub async fn book(
        &self,
        spot_id: SpotId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        status: ReservationStatus,
    ) -> Reservation {
        self.book_for(spot_id, VehicleId(0), "customer-1", start, end, status)
            .await
    }

    pub async fn book_for(
        &self,
        spot_id: SpotId,
        vehicle_id: VehicleId,
        customer: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        status: ReservationStatus,
    ) -> Reservation {
        ReservationRepository::create(
            self.store.as_ref(),
            NewReservation {
                customer_id: UserId::from(customer),
                spot_id,
                vehicle_id,
                start_time: start,
                end_time: end,
                status,
                created_at: start,
            },
        )
        .await
        .expect("fixture reservation")
    }

    pub async fn set_occupied(&self, spot_id: SpotId, occupied: bool) {
        let changed = self
            .store
            .set_occupied_if(spot_id, !occupied, occupied)
            .await
            .expect("set occupied");
        assert!(changed, "spot {spot_id} already had occupied={occupied}");
    }

    pub async fn spot(&self, spot_id: SpotId) -> Spot {
        SpotRepository::get(self.store.as_ref(), spot_id)
            .await
            .expect("get spot")
            .expect("spot exists")
    }

    pub async fn reservation(&self, reservation: &Reservation) -> Reservation {
        ReservationRepository::get(self.store.as_ref(), reservation.id)
            .await
            .expect("get reservation")
            .expect("reservation exists")
    }

    /// Open a manual session directly, bypassing the entry flow.
    pub async fn open_session(
        &self,
        spot_id: SpotId,
        vehicle_id: Option<VehicleId>,
    ) -> OccupancySession {
        OccupancyRepository::create(
            self.store.as_ref(),
            NewSession {
                reservation_id: None,
                vehicle_id,
                spot_id,
                entry_time: self.clock.now(),
                plate: None,
                entry_method: EntryMethod::Manual,
                visitor_name: None,
                visitor_national_id: None,
                visitor_contact: None,
                zone: None,
                registered_by: None,
            },
        )
        .await
        .expect("fixture session")
    }
}
