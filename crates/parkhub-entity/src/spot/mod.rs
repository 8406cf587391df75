//! Parking spot domain entities.

pub mod model;

pub use model::Spot;
