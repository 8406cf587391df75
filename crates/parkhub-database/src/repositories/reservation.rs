//! Reservation repository.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use parkhub_core::result::AppResult;
use parkhub_core::types::{ReservationId, SpotId, UserId, VehicleId};
use parkhub_entity::reservation::{NewReservation, Reservation, ReservationStatus};

use super::db_error;

/// Storage contract for reservations.
///
/// "Blocking" below means status `pending` or `active`.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Insert a reservation and return it with its assigned id.
    async fn create(&self, new: NewReservation) -> AppResult<Reservation>;

    /// Find a reservation by ID.
    async fn get(&self, id: ReservationId) -> AppResult<Option<Reservation>>;

    /// Move `id` from `from` to `to` only if it is still in `from`.
    /// Returns the updated row, or `None` if the status had changed.
    async fn transition_status(
        &self,
        id: ReservationId,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> AppResult<Option<Reservation>>;

    /// Every reservation, newest first.
    async fn list(&self) -> AppResult<Vec<Reservation>>;

    /// Blocking reservations on `spot_id` whose window overlaps
    /// `[start, end)`.
    async fn find_overlapping(
        &self,
        spot_id: SpotId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Reservation>>;

    /// Pending reservations on `spot_id` starting in `(after, deadline]`.
    async fn find_pending_for_spot_before(
        &self,
        spot_id: SpotId,
        after: DateTime<Utc>,
        deadline: DateTime<Utc>,
    ) -> AppResult<Option<Reservation>>;

    /// The active reservation on `spot_id` with `start <= at <= end`.
    async fn find_active_covering(
        &self,
        spot_id: SpotId,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Reservation>>;

    /// Active reservations on `spot_id` not yet ended at `now`, including
    /// pre-activated ones that start later. Earliest start first.
    async fn find_active_holding(
        &self,
        spot_id: SpotId,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Reservation>>;

    /// Pending reservations starting in `(after, deadline]`, earliest first.
    async fn find_starting_before(
        &self,
        after: DateTime<Utc>,
        deadline: DateTime<Utc>,
    ) -> AppResult<Vec<Reservation>>;

    /// Reservations in any of `statuses`, earliest start first.
    async fn find_by_status(&self, statuses: &[ReservationStatus]) -> AppResult<Vec<Reservation>>;

    /// Pending reservations of `vehicle_id` covering `now`, earliest first.
    async fn find_pending_for_vehicle(
        &self,
        vehicle_id: VehicleId,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Reservation>>;

    /// Active reservations of `vehicle_id` covering `now`, earliest first.
    async fn find_active_for_vehicle(
        &self,
        vehicle_id: VehicleId,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Reservation>>;

    /// A customer's reservations starting in `[from, to)`, either bound
    /// optional.
    async fn find_for_customer(
        &self,
        customer_id: &UserId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<Reservation>>;

    /// Reservations starting on the UTC calendar `date` in any of
    /// `statuses` (all statuses when empty).
    async fn find_by_date_and_status(
        &self,
        date: NaiveDate,
        statuses: &[ReservationStatus],
    ) -> AppResult<Vec<Reservation>>;
}

/// PostgreSQL implementation of [`ReservationRepository`].
#[derive(Debug, Clone)]
pub struct PgReservationRepository {
    pool: PgPool,
}

impl PgReservationRepository {
    /// Create a new reservation repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn status_names(statuses: &[ReservationStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

#[async_trait]
impl ReservationRepository for PgReservationRepository {
    async fn create(&self, new: NewReservation) -> AppResult<Reservation> {
        sqlx::query_as::<_, Reservation>(
            "INSERT INTO reservations \
             (customer_id, spot_id, vehicle_id, start_time, end_time, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(&new.customer_id)
        .bind(new.spot_id)
        .bind(new.vehicle_id)
        .bind(new.start_time)
        .bind(new.end_time)
        .bind(new.status)
        .bind(new.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to create reservation"))
    }

    async fn get(&self, id: ReservationId) -> AppResult<Option<Reservation>> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find reservation"))
    }

    async fn transition_status(
        &self,
        id: ReservationId,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> AppResult<Option<Reservation>> {
        sqlx::query_as::<_, Reservation>(
            "UPDATE reservations SET status = $3 WHERE id = $1 AND status = $2 RETURNING *",
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to update reservation status"))
    }

    async fn list(&self) -> AppResult<Vec<Reservation>> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list reservations"))
    }

    async fn find_overlapping(
        &self,
        spot_id: SpotId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Reservation>> {
        sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE spot_id = $1 \
             AND status IN ('pending', 'active') \
             AND NOT (end_time <= $2 OR start_time >= $3) \
             ORDER BY start_time ASC",
        )
        .bind(spot_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to find overlapping reservations"))
    }

    async fn find_pending_for_spot_before(
        &self,
        spot_id: SpotId,
        after: DateTime<Utc>,
        deadline: DateTime<Utc>,
    ) -> AppResult<Option<Reservation>> {
        sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE spot_id = $1 AND status = 'pending' \
             AND start_time > $2 AND start_time <= $3 \
             ORDER BY start_time ASC LIMIT 1",
        )
        .bind(spot_id)
        .bind(after)
        .bind(deadline)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find upcoming reservation for spot"))
    }

    async fn find_active_covering(
        &self,
        spot_id: SpotId,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Reservation>> {
        sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE spot_id = $1 AND status = 'active' \
             AND start_time <= $2 AND end_time >= $2 \
             ORDER BY start_time ASC LIMIT 1",
        )
        .bind(spot_id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find active reservation for spot"))
    }

    async fn find_active_holding(
        &self,
        spot_id: SpotId,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Reservation>> {
        sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE spot_id = $1 AND status = 'active' \
             AND end_time > $2 \
             ORDER BY start_time ASC, id ASC",
        )
        .bind(spot_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to find active reservations holding spot"))
    }

    async fn find_starting_before(
        &self,
        after: DateTime<Utc>,
        deadline: DateTime<Utc>,
    ) -> AppResult<Vec<Reservation>> {
        sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE status = 'pending' \
             AND start_time > $1 AND start_time <= $2 \
             ORDER BY start_time ASC",
        )
        .bind(after)
        .bind(deadline)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to find upcoming reservations"))
    }

    async fn find_by_status(&self, statuses: &[ReservationStatus]) -> AppResult<Vec<Reservation>> {
        sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE status::text = ANY($1) ORDER BY start_time ASC",
        )
        .bind(status_names(statuses))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to find reservations by status"))
    }

    async fn find_pending_for_vehicle(
        &self,
        vehicle_id: VehicleId,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Reservation>> {
        sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE vehicle_id = $1 AND status = 'pending' \
             AND start_time <= $2 AND end_time >= $2 \
             ORDER BY start_time ASC",
        )
        .bind(vehicle_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to find pending reservations for vehicle"))
    }

    async fn find_active_for_vehicle(
        &self,
        vehicle_id: VehicleId,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Reservation>> {
        sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE vehicle_id = $1 AND status = 'active' \
             AND start_time <= $2 AND end_time >= $2 \
             ORDER BY start_time ASC",
        )
        .bind(vehicle_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to find active reservations for vehicle"))
    }

    async fn find_for_customer(
        &self,
        customer_id: &UserId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<Reservation>> {
        sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE customer_id = $1 \
             AND ($2::timestamptz IS NULL OR start_time >= $2) \
             AND ($3::timestamptz IS NULL OR start_time < $3) \
             ORDER BY start_time ASC",
        )
        .bind(customer_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to find customer reservations"))
    }

    async fn find_by_date_and_status(
        &self,
        date: NaiveDate,
        statuses: &[ReservationStatus],
    ) -> AppResult<Vec<Reservation>> {
        sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations \
             WHERE (start_time AT TIME ZONE 'UTC')::date = $1 \
             AND (cardinality($2::text[]) = 0 OR status::text = ANY($2)) \
             ORDER BY start_time ASC",
        )
        .bind(date)
        .bind(status_names(statuses))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to find reservations by date"))
    }
}
