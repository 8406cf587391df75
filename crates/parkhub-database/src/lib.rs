//! # parkhub-database
//!
//! PostgreSQL connection management, repository traits with their `sqlx`
//! implementations, and an in-memory store implementing the same traits
//! for single-node demos and tests.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use repositories::Repositories;
