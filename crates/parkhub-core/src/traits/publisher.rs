//! Outbound event publishing seam.

use crate::events::ParkingEvent;
use crate::types::UserId;

/// Best-effort fan-out of domain events.
///
/// Implementations must not block the caller: a publisher that cannot
/// deliver drops the event.
pub trait EventPublisher: Send + Sync {
    /// Deliver to every admin connection.
    fn publish_to_admins(&self, event: ParkingEvent);

    /// Deliver to one customer's connection, if any.
    fn publish_to_user(&self, user_id: &UserId, event: ParkingEvent);
}

/// Publisher that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

impl EventPublisher for NoopPublisher {
    fn publish_to_admins(&self, _event: ParkingEvent) {}

    fn publish_to_user(&self, _user_id: &UserId, _event: ParkingEvent) {}
}
