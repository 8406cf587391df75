//! Repository traits and their PostgreSQL implementations.
//!
//! Services depend on the traits only; [`Repositories`] bundles one
//! implementation of each so the binary can switch between PostgreSQL and
//! the in-memory store at startup.

pub mod occupancy;
pub mod reservation;
pub mod spot;
pub mod vehicle;

use std::sync::Arc;

use sqlx::PgPool;

use parkhub_core::error::{AppError, ErrorKind};

use crate::memory::MemoryStore;

pub use occupancy::{OccupancyRepository, PgOccupancyRepository};
pub use reservation::{PgReservationRepository, ReservationRepository};
pub use spot::{PgSpotRepository, SpotRepository};
pub use vehicle::{PgVehicleRepository, VehicleRepository};

/// One handle per repository, shared by every service.
#[derive(Clone)]
pub struct Repositories {
    /// Spot storage.
    pub spots: Arc<dyn SpotRepository>,
    /// Reservation storage.
    pub reservations: Arc<dyn ReservationRepository>,
    /// Occupancy session storage.
    pub sessions: Arc<dyn OccupancyRepository>,
    /// Vehicle lookups.
    pub vehicles: Arc<dyn VehicleRepository>,
}

impl Repositories {
    /// PostgreSQL-backed repositories sharing one pool.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            spots: Arc::new(PgSpotRepository::new(pool.clone())),
            reservations: Arc::new(PgReservationRepository::new(pool.clone())),
            sessions: Arc::new(PgOccupancyRepository::new(pool.clone())),
            vehicles: Arc::new(PgVehicleRepository::new(pool)),
        }
    }

    /// Repositories backed by a single in-memory store.
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            spots: store.clone(),
            reservations: store.clone(),
            sessions: store.clone(),
            vehicles: store,
        }
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}

/// Wrap a sqlx error with context. Exclusion and unique violations become
/// conflicts; everything else is a storage failure.
pub(crate) fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        let conflict = e
            .as_database_error()
            .and_then(|d| d.code())
            .is_some_and(|code| code == "23P01" || code == "23505");
        let kind = if conflict {
            ErrorKind::Conflict
        } else {
            ErrorKind::Database
        };
        AppError::with_source(kind, context, e)
    }
}
