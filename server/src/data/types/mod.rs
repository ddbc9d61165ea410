//! Shared data types for the stats pipeline and store layer

mod flush;
mod stat;

pub use flush::{FlushEvent, FlushPayload};
pub use stat::{StatRecord, StatType};
