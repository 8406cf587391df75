//! Occupancy session repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use parkhub_core::result::AppResult;
use parkhub_core::types::{ReservationId, SessionId, SpotId, VehicleId};
use parkhub_entity::occupancy::{NewSession, OccupancySession, SessionFilter};

use super::db_error;

/// Storage contract for occupancy sessions.
#[async_trait]
pub trait OccupancyRepository: Send + Sync {
    /// Insert an open session.
    async fn create(&self, new: NewSession) -> AppResult<OccupancySession>;

    /// Find a session by ID.
    async fn get(&self, id: SessionId) -> AppResult<Option<OccupancySession>>;

    /// Set `exit_time` on `id` if it is still open. Returns the closed row,
    /// or `None` if it was already closed or does not exist.
    async fn close_if_open(
        &self,
        id: SessionId,
        exit_time: DateTime<Utc>,
    ) -> AppResult<Option<OccupancySession>>;

    /// Every open session, earliest entry first.
    async fn find_open(&self) -> AppResult<Vec<OccupancySession>>;

    /// The open session on `spot_id`, if any.
    async fn find_open_for_spot(&self, spot_id: SpotId) -> AppResult<Option<OccupancySession>>;

    /// The open session of `vehicle_id`, if any.
    async fn find_open_for_vehicle(
        &self,
        vehicle_id: VehicleId,
    ) -> AppResult<Option<OccupancySession>>;

    /// An open session whose captured plate equals `plate`.
    async fn find_open_by_plate(&self, plate: &str) -> AppResult<Option<OccupancySession>>;

    /// The open session bound to `reservation_id`, if any.
    async fn find_open_for_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> AppResult<Option<OccupancySession>>;

    /// Sessions of any of `vehicle_ids` passing `filter`, newest entry
    /// first.
    async fn find_for_vehicles(
        &self,
        vehicle_ids: &[VehicleId],
        filter: &SessionFilter,
    ) -> AppResult<Vec<OccupancySession>>;
}

/// PostgreSQL implementation of [`OccupancyRepository`].
#[derive(Debug, Clone)]
pub struct PgOccupancyRepository {
    pool: PgPool,
}

impl PgOccupancyRepository {
    /// Create a new occupancy repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OccupancyRepository for PgOccupancyRepository {
    async fn create(&self, new: NewSession) -> AppResult<OccupancySession> {
        sqlx::query_as::<_, OccupancySession>(
            "INSERT INTO occupancy_sessions \
             (reservation_id, vehicle_id, spot_id, entry_time, plate, entry_method, \
              visitor_name, visitor_national_id, visitor_contact, zone, registered_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING *",
        )
        .bind(new.reservation_id)
        .bind(new.vehicle_id)
        .bind(new.spot_id)
        .bind(new.entry_time)
        .bind(&new.plate)
        .bind(new.entry_method)
        .bind(&new.visitor_name)
        .bind(&new.visitor_national_id)
        .bind(&new.visitor_contact)
        .bind(&new.zone)
        .bind(&new.registered_by)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to create occupancy session"))
    }

    async fn get(&self, id: SessionId) -> AppResult<Option<OccupancySession>> {
        sqlx::query_as::<_, OccupancySession>("SELECT * FROM occupancy_sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find occupancy session"))
    }

    async fn close_if_open(
        &self,
        id: SessionId,
        exit_time: DateTime<Utc>,
    ) -> AppResult<Option<OccupancySession>> {
        sqlx::query_as::<_, OccupancySession>(
            "UPDATE occupancy_sessions SET exit_time = $2 \
             WHERE id = $1 AND exit_time IS NULL RETURNING *",
        )
        .bind(id)
        .bind(exit_time)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to close occupancy session"))
    }

    async fn find_open(&self) -> AppResult<Vec<OccupancySession>> {
        sqlx::query_as::<_, OccupancySession>(
            "SELECT * FROM occupancy_sessions WHERE exit_time IS NULL ORDER BY entry_time ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list open sessions"))
    }

    async fn find_open_for_spot(&self, spot_id: SpotId) -> AppResult<Option<OccupancySession>> {
        sqlx::query_as::<_, OccupancySession>(
            "SELECT * FROM occupancy_sessions WHERE spot_id = $1 AND exit_time IS NULL LIMIT 1",
        )
        .bind(spot_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find open session for spot"))
    }

    async fn find_open_for_vehicle(
        &self,
        vehicle_id: VehicleId,
    ) -> AppResult<Option<OccupancySession>> {
        sqlx::query_as::<_, OccupancySession>(
            "SELECT * FROM occupancy_sessions WHERE vehicle_id = $1 AND exit_time IS NULL \
             ORDER BY entry_time DESC LIMIT 1",
        )
        .bind(vehicle_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find open session for vehicle"))
    }

    async fn find_open_by_plate(&self, plate: &str) -> AppResult<Option<OccupancySession>> {
        sqlx::query_as::<_, OccupancySession>(
            "SELECT * FROM occupancy_sessions WHERE plate = $1 AND exit_time IS NULL \
             ORDER BY entry_time DESC LIMIT 1",
        )
        .bind(plate)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find open session by plate"))
    }

    async fn find_open_for_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> AppResult<Option<OccupancySession>> {
        sqlx::query_as::<_, OccupancySession>(
            "SELECT * FROM occupancy_sessions WHERE reservation_id = $1 AND exit_time IS NULL \
             LIMIT 1",
        )
        .bind(reservation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find open session for reservation"))
    }

    async fn find_for_vehicles(
        &self,
        vehicle_ids: &[VehicleId],
        filter: &SessionFilter,
    ) -> AppResult<Vec<OccupancySession>> {
        if vehicle_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = vehicle_ids.iter().map(|id| id.get()).collect();
        sqlx::query_as::<_, OccupancySession>(
            "SELECT * FROM occupancy_sessions WHERE vehicle_id = ANY($1) \
             AND ($2::timestamptz IS NULL OR entry_time >= $2) \
             AND ($3::timestamptz IS NULL OR entry_time < $3) \
             AND (NOT $4 OR exit_time IS NULL) \
             ORDER BY entry_time DESC",
        )
        .bind(ids)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.open_only)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to find sessions for vehicles"))
    }
}
