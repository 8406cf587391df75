//! Spot repository.

use async_trait::async_trait;
use sqlx::PgPool;

use parkhub_core::result::AppResult;
use parkhub_core::types::SpotId;
use parkhub_entity::spot::Spot;

use super::db_error;

/// Storage contract for parking spots.
#[async_trait]
pub trait SpotRepository: Send + Sync {
    /// Find a spot by ID.
    async fn get(&self, id: SpotId) -> AppResult<Option<Spot>>;

    /// All spots in ascending id order.
    async fn list(&self) -> AppResult<Vec<Spot>>;

    /// Set `occupied = new` only if it currently equals `expected`.
    /// Returns whether the row changed.
    async fn set_occupied_if(&self, id: SpotId, expected: bool, new: bool) -> AppResult<bool>;
}

/// PostgreSQL implementation of [`SpotRepository`].
#[derive(Debug, Clone)]
pub struct PgSpotRepository {
    pool: PgPool,
}

impl PgSpotRepository {
    /// Create a new spot repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SpotRepository for PgSpotRepository {
    async fn get(&self, id: SpotId) -> AppResult<Option<Spot>> {
        sqlx::query_as::<_, Spot>("SELECT * FROM spots WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find spot"))
    }

    async fn list(&self) -> AppResult<Vec<Spot>> {
        sqlx::query_as::<_, Spot>("SELECT * FROM spots ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list spots"))
    }

    async fn set_occupied_if(&self, id: SpotId, expected: bool, new: bool) -> AppResult<bool> {
        let result = sqlx::query("UPDATE spots SET occupied = $3 WHERE id = $1 AND occupied = $2")
            .bind(id)
            .bind(expected)
            .bind(new)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to update spot occupancy"))?;
        Ok(result.rows_affected() == 1)
    }
}
