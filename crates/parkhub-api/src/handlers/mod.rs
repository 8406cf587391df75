//! Request handlers organized by domain.

pub mod health;
pub mod parking;
pub mod reservation;
pub mod spot;
pub mod ws;
