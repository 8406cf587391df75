//! Per-connection state shared between the hub and the socket tasks.

pub mod handle;
pub mod inbound;

pub use handle::{ConnectionHandle, ConnectionId, ConnectionKind, SendOutcome};
pub use inbound::handle_inbound;
