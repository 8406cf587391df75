//! Wire messages exchanged over hub connections.

pub mod types;

pub use types::{InboundMessage, OutboundMessage};
