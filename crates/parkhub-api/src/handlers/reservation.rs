//! Reservation handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use validator::Validate;

use parkhub_core::error::AppError;
use parkhub_core::types::{ReservationId, UserId};
use parkhub_entity::reservation::{Reservation, ReservationStatus};
use parkhub_service::CreateReservationRequest;

use crate::dto::request::{ReservationQuery, UpdateStatusRequest};
use crate::dto::response::ApiResponse;
use crate::error::{ApiError, outcome_response};
use crate::state::AppState;

/// POST /api/reservations
pub async fn create_reservation(
    State(state): State<AppState>,
    Json(req): Json<CreateReservationRequest>,
) -> Result<Response, ApiError> {
    let outcome = state.reservations.create_reservation(req).await?;
    Ok(outcome_response(outcome, StatusCode::CREATED))
}

/// GET /api/reservations
///
/// `customerId` narrows to one customer (with optional `from`/`to`);
/// otherwise `date` narrows to one day (with optional `status` list).
pub async fn list_reservations(
    State(state): State<AppState>,
    Query(query): Query<ReservationQuery>,
) -> Result<Json<ApiResponse<Vec<Reservation>>>, ApiError> {
    let reservations = if let Some(customer) = query.customer_id {
        state
            .reservations
            .reservations_for_customer(&UserId::new(customer), query.from, query.to)
            .await?
    } else if let Some(date) = query.date {
        let statuses = parse_statuses(query.status.as_deref())?;
        state
            .reservations
            .reservations_by_date_and_status(date, &statuses)
            .await?
    } else {
        state.reservations.list_reservations().await?
    };
    Ok(Json(ApiResponse::ok(reservations)))
}

/// GET /api/reservations/{id}
pub async fn get_reservation(
    State(state): State<AppState>,
    Path(id): Path<ReservationId>,
) -> Result<Json<ApiResponse<Reservation>>, ApiError> {
    let reservation = state.reservations.get_reservation(id).await?;
    Ok(Json(ApiResponse::ok(reservation)))
}

/// PATCH /api/reservations/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<ReservationId>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<Reservation>>, ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let status = req
        .status
        .parse::<ReservationStatus>()
        .map_err(|_| AppError::validation(format!("Unknown status '{}'", req.status)))?;

    let reservation = state.reservations.update_status(id, status).await?;
    Ok(Json(ApiResponse::ok(reservation)))
}

fn parse_statuses(raw: Option<&str>) -> Result<Vec<ReservationStatus>, AppError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<ReservationStatus>()
                .map_err(|_| AppError::validation(format!("Unknown status '{s}'")))
        })
        .collect()
}
