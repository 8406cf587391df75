//! Reservation creation, status changes and reconciliation.

pub mod dto;
pub mod service;

pub use dto::CreateReservationRequest;
pub use service::{ActivationOutcome, ReservationService};
