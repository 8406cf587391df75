//! Occupancy session (parking-usage) domain entities.

pub mod method;
pub mod model;

pub use method::{EntryMethod, ExitMethod};
pub use model::{NewSession, OccupancySession, SessionFilter};
