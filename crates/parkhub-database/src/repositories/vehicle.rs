//! Vehicle repository (read-only).

use async_trait::async_trait;
use sqlx::PgPool;

use parkhub_core::result::AppResult;
use parkhub_core::types::{UserId, VehicleId};
use parkhub_entity::vehicle::Vehicle;

use super::db_error;

/// Lookups over registered vehicles.
#[async_trait]
pub trait VehicleRepository: Send + Sync {
    /// Find a vehicle by ID.
    async fn get(&self, id: VehicleId) -> AppResult<Option<Vehicle>>;

    /// Find a vehicle by its normalized plate.
    async fn find_by_plate(&self, plate: &str) -> AppResult<Option<Vehicle>>;

    /// Every vehicle a customer owns.
    async fn find_by_customer(&self, customer_id: &UserId) -> AppResult<Vec<Vehicle>>;
}

/// PostgreSQL implementation of [`VehicleRepository`].
#[derive(Debug, Clone)]
pub struct PgVehicleRepository {
    pool: PgPool,
}

impl PgVehicleRepository {
    /// Create a new vehicle repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VehicleRepository for PgVehicleRepository {
    async fn get(&self, id: VehicleId) -> AppResult<Option<Vehicle>> {
        sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find vehicle"))
    }

    async fn find_by_plate(&self, plate: &str) -> AppResult<Option<Vehicle>> {
        sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE plate = $1")
            .bind(plate)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find vehicle by plate"))
    }

    async fn find_by_customer(&self, customer_id: &UserId) -> AppResult<Vec<Vehicle>> {
        sqlx::query_as::<_, Vehicle>(
            "SELECT * FROM vehicles WHERE customer_id = $1 ORDER BY id ASC",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to find customer vehicles"))
    }
}
