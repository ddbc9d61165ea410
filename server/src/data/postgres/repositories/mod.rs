//! PostgreSQL repositories

mod stat;

pub use stat::{PgStatRepository, StatRow};
