//! Core traits defined in `parkhub-core` and implemented by other crates.

pub mod clock;
pub mod publisher;

pub use clock::{Clock, ManualClock, SystemClock};
pub use publisher::{EventPublisher, NoopPublisher};
