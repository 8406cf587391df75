//! Built-in reconciliation jobs.

pub mod activation;
pub mod cancellation;

pub use activation::ActivationJob;
pub use cancellation::CancellationJob;
