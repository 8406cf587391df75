//! Gate handlers: entry, exit and session queries.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;

use parkhub_core::types::{SessionId, UserId};
use parkhub_entity::occupancy::{OccupancySession, SessionFilter};
use parkhub_service::{EntryRequest, ExitRequest};

use crate::dto::request::SessionHistoryQuery;
use crate::dto::response::ApiResponse;
use crate::error::{ApiError, outcome_response};
use crate::state::AppState;

/// POST /api/parking-usages/entry
pub async fn process_entry(
    State(state): State<AppState>,
    Json(req): Json<EntryRequest>,
) -> Result<Response, ApiError> {
    let outcome = state.processor.process_entry(req).await?;
    Ok(outcome_response(outcome, StatusCode::CREATED))
}

/// POST /api/parking-usages/exit
pub async fn process_exit(
    State(state): State<AppState>,
    Json(req): Json<ExitRequest>,
) -> Result<Response, ApiError> {
    let outcome = state.processor.process_exit(req).await?;
    Ok(outcome_response(outcome, StatusCode::OK))
}

/// GET /api/parking-usages/active
pub async fn list_open_sessions(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<OccupancySession>>>, ApiError> {
    let sessions = state.processor.list_open_sessions().await?;
    Ok(Json(ApiResponse::ok(sessions)))
}

/// GET /api/parking-usages/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> Result<Json<ApiResponse<OccupancySession>>, ApiError> {
    let session = state.processor.get_session(id).await?;
    Ok(Json(ApiResponse::ok(session)))
}

/// GET /api/customers/{customerId}/parking-usages
pub async fn customer_sessions(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    Query(query): Query<SessionHistoryQuery>,
) -> Result<Json<ApiResponse<Vec<OccupancySession>>>, ApiError> {
    let filter = SessionFilter {
        from: query.from,
        to: query.to,
        open_only: query.open_only,
    };
    let sessions = state
        .processor
        .sessions_for_customer(&UserId::new(customer_id), &filter)
        .await?;
    Ok(Json(ApiResponse::ok(sessions)))
}
