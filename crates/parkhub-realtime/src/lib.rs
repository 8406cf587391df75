//! # parkhub-realtime
//!
//! Real-time notification hub for ParkHub. Provides:
//!
//! - A single actor task that owns every live connection (one admin group,
//!   one connection per customer)
//! - Bounded per-connection outbound queues with drop-and-disconnect on
//!   overflow
//! - Keepalive pings and stale-connection sweeps
//! - Typed inbound/outbound message envelopes

pub mod connection;
pub mod hub;
pub mod message;

pub use connection::handle::{ConnectionHandle, ConnectionId, ConnectionKind};
pub use hub::{ConnectionCounts, NotificationHub, Registration};
pub use message::types::{InboundMessage, OutboundMessage};
