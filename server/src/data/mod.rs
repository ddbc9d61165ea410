//! Data layer
//!
//! Provides the store and messaging services for the application:
//! - `postgres` - pooled PostgreSQL client and the stat repository
//! - `topics` - in-process flush event bus
//! - `types` - shared data types (stat records, flush events)
//! - `traits` - store capability trait
//! - `error` - unified error type

pub mod error;
pub mod postgres;
pub mod topics;
pub mod traits;
pub mod types;

// Re-export the store service
pub use postgres::PostgresService;

// Re-export unified error type
pub use error::DataError;

// Re-export the store capability trait
pub use traits::StatStore;

// Re-export shared types for convenient access
pub use types::{FlushEvent, FlushPayload, StatRecord, StatType};
