//! # parkhub-entity
//!
//! Domain entity models for ParkHub. Every struct in this crate represents
//! a database table row or a domain value object. All entities derive
//! `Debug`, `Clone`, `Serialize`, `Deserialize`, and database entities
//! additionally derive `sqlx::FromRow`.

pub mod occupancy;
pub mod reservation;
pub mod spot;
pub mod vehicle;
