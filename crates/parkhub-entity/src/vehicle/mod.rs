//! Vehicle domain entities.

pub mod model;

pub use model::{Vehicle, normalize_plate};
