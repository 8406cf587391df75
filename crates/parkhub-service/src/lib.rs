//! # parkhub-service
//!
//! Business logic for ParkHub's allocation engine:
//!
//! - [`AvailabilityOracle`]: read-only "is this spot free" queries
//! - [`ReservationService`]: reservation creation, status changes, the
//!   no-show sweep and pre-activation
//! - [`EntryExitProcessor`]: the occupancy-session state machine
//!
//! Every read-decide-write on a spot runs under that spot's lock from
//! [`KeyedLocks`]; the `occupied` flag is written with a storage-level
//! compare-and-set so several processes can share one database.

pub mod availability;
pub mod context;
pub mod lock;
pub mod occupancy;
pub mod reservation;

mod flow;
#[cfg(test)]
mod test_support;

pub use availability::{AvailabilityOracle, ImmediateAvailability};
pub use context::ServiceContext;
pub use lock::KeyedLocks;
pub use occupancy::{EntryExitProcessor, EntryRequest, ExitRequest};
pub use reservation::{ActivationOutcome, CreateReservationRequest, ReservationService};
