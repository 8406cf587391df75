//! The occupancy-session state machine: a session opens on entry and
//! closes on exit.

pub mod dto;
mod entry;
mod exit;
pub mod processor;

pub use dto::{EntryRequest, ExitRequest};
pub use processor::EntryExitProcessor;
