//! WebSocket upgrade handlers and connection stats.

use axum::Json;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use parkhub_core::types::UserId;
use parkhub_realtime::Registration;
use parkhub_realtime::connection::handle_inbound;

use crate::dto::response::{ApiResponse, ConnectionStatsResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// GET /ws/admin
pub async fn admin_upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let registration = state.hub.register_admin().await?;
    Ok(ws.on_upgrade(move |socket| serve_socket(state, registration, socket)))
}

/// GET /ws/notifications/{userId}
pub async fn user_upgrade(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let registration = state.hub.register_user(UserId::new(user_id)).await?;
    Ok(ws.on_upgrade(move |socket| serve_socket(state, registration, socket)))
}

/// GET /api/ws/stats
pub async fn stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ConnectionStatsResponse>>, ApiError> {
    let counts = state.hub.connection_counts().await?;
    let users = state.hub.connected_user_ids().await?;
    Ok(Json(ApiResponse::ok(ConnectionStatsResponse {
        admin_clients: counts.admin_clients,
        user_clients: counts.user_clients,
        total_clients: counts.total_clients,
        connected_users: users.into_iter().map(|u| u.0).collect(),
    })))
}

/// Pumps one established socket until either side closes.
async fn serve_socket(state: AppState, registration: Registration, socket: WebSocket) {
    let Registration {
        handle,
        mut outbound,
    } = registration;
    let conn_id = handle.id;
    let (mut ws_tx, mut ws_rx) = socket.split();

    info!(conn_id = %conn_id, user_id = ?handle.user_id(), "WebSocket connection established");

    // Outbound forwarder; stops when the hub closes the connection.
    let closed = handle.closed_token();
    let writer = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                _ = closed.cancelled() => break,
                msg = outbound.recv() => match msg {
                    Some(msg) => msg,
                    None => break,
                },
            };
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Failed to encode outbound message");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.send(Message::Close(None)).await;
    });

    let closed = handle.closed_token();
    loop {
        let frame = tokio::select! {
            _ = closed.cancelled() => break,
            frame = ws_rx.next() => frame,
        };
        match frame {
            Some(Ok(Message::Text(text))) => handle_inbound(&handle, text.as_str()),
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => handle.touch(),
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(Message::Binary(_))) => {
                debug!(conn_id = %conn_id, "Ignoring binary frame");
            }
            Some(Err(e)) => {
                debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    state.hub.unregister(conn_id).await;
    handle.close();
    if let Err(e) = writer.await {
        warn!(conn_id = %conn_id, error = %e, "Outbound forwarder ended abnormally");
    }
    info!(conn_id = %conn_id, "WebSocket connection closed");
}
