//! Spot availability handler.

use axum::Json;
use axum::extract::{Query, State};
use validator::Validate;

use parkhub_core::error::AppError;
use parkhub_entity::spot::Spot;

use crate::dto::request::AvailableSpotsQuery;
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/spots/available?start=..&end=..&immediate=..
///
/// The first spot free for `[start, end)`, or 409 when none is.
pub async fn available_spot(
    State(state): State<AppState>,
    Query(query): Query<AvailableSpotsQuery>,
) -> Result<Json<ApiResponse<Spot>>, ApiError> {
    query
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let spot = state
        .oracle
        .find_available_spot(query.start, query.end, query.immediate)
        .await?;
    Ok(Json(ApiResponse::ok(spot)))
}
