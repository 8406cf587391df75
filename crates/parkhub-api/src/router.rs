//! Route definitions for the ParkHub HTTP API.

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::handlers;
use crate::state::AppState;

/// Build the router with every route, bound to `state`.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(reservation_routes())
        .merge(parking_routes())
        .route("/spots/available", get(handlers::spot::available_spot))
        .route("/ws/stats", get(handlers::ws::stats))
        .route("/health", get(handlers::health::health));

    let ws_routes = Router::new()
        .route("/ws/admin", get(handlers::ws::admin_upgrade))
        .route("/ws/notifications/{user_id}", get(handlers::ws::user_upgrade));

    Router::new()
        .nest("/api", api_routes)
        .merge(ws_routes)
        .with_state(state)
}

fn reservation_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/reservations",
            post(handlers::reservation::create_reservation)
                .get(handlers::reservation::list_reservations),
        )
        .route("/reservations/{id}", get(handlers::reservation::get_reservation))
        .route(
            "/reservations/{id}/status",
            patch(handlers::reservation::update_status),
        )
}

fn parking_routes() -> Router<AppState> {
    Router::new()
        .route("/parking-usages/entry", post(handlers::parking::process_entry))
        .route("/parking-usages/exit", post(handlers::parking::process_exit))
        .route(
            "/parking-usages/active",
            get(handlers::parking::list_open_sessions),
        )
        .route("/parking-usages/{id}", get(handlers::parking::get_session))
        .route(
            "/customers/{customer_id}/parking-usages",
            get(handlers::parking::customer_sessions),
        )
}
