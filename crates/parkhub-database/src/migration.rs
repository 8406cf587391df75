//! Schema migrations embedded at compile time from `migrations/`.

use sqlx::PgPool;
use tracing::info;

use parkhub_core::error::{AppError, ErrorKind};

/// Apply every migration not yet recorded in `_sqlx_migrations`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    info!("Applying database migrations");

    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to run migrations", e))?;

    info!("Database schema is current");
    Ok(())
}
