//! Domain logic for stat persistence
//!
//! - `stats` - statsd flush normalization and persistence pipeline

pub mod stats;

pub use stats::StatsPipeline;

use crate::core::TopicMessage;
use crate::data::types::FlushEvent;

impl TopicMessage for FlushEvent {
    fn size_bytes(&self) -> usize {
        // Rough per-entry estimate: key + value + map overhead
        (self.payload.len() * 128).max(100)
    }
}
