//! # parkhub-api
//!
//! HTTP API layer for ParkHub built on Axum.
//!
//! Provides the reservation, gate and spot endpoints, the admin and
//! customer WebSocket upgrades, DTOs, and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use error::ApiError;
pub use state::AppState;
