//! Periodic reconciliation for ParkHub.
//!
//! This crate provides:
//! - A scheduler that runs each reconciliation job once at start, then on
//!   its own interval until stopped
//! - The no-show cancellation job
//! - The pre-activation job

pub mod executor;
pub mod jobs;
pub mod scheduler;

pub use executor::{JobExecutionError, JobReport, ReconciliationJob};
pub use scheduler::ReconciliationScheduler;
