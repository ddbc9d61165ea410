//! Flush event types
//!
//! The inbound unit of work: one flush event per aggregator interval,
//! carrying every metric aggregated since the previous flush. The aggregator
//! is the sole source of truth for interval data; nothing here survives
//! across flushes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Raw flush payload: one map per statsd category, keyed by raw metric name.
///
/// Map iteration follows insertion order (serde_json `preserve_order`), which
/// keeps a single run deterministic; upstream guarantees nothing about the
/// order itself. `timer_data` carries the aggregator's derived timer
/// statistics (mean, upper_95, ...) for wire parity; the pipeline persists
/// the raw `timers` observations instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlushPayload {
    #[serde(default)]
    pub counters: Map<String, JsonValue>,
    #[serde(default)]
    pub gauges: Map<String, JsonValue>,
    #[serde(default)]
    pub sets: Map<String, JsonValue>,
    #[serde(default)]
    pub timers: Map<String, JsonValue>,
    #[serde(default)]
    pub timer_data: Map<String, JsonValue>,
}

impl FlushPayload {
    /// Total number of raw entries across all categories
    pub fn len(&self) -> usize {
        self.counters.len()
            + self.gauges.len()
            + self.sets.len()
            + self.timers.len()
            + self.timer_data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single flush event from the aggregator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlushEvent {
    /// Flush time in seconds since Unix epoch
    pub timestamp: i64,
    pub payload: FlushPayload,
}
