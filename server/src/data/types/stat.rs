//! Normalized stat record types
//!
//! A `StatRecord` is the persistence-ready form of one aggregated metric
//! sample. Records are built fresh per flush event, live for one pipeline
//! pass, and are dropped once persisted or deduplicated.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ============================================================================
// STAT TYPE
// ============================================================================

/// The four aggregated sample categories a statsd flush carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatType {
    Count,
    Gauge,
    Set,
    Timer,
}

impl StatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Gauge => "gauge",
            Self::Set => "set",
            Self::Timer => "timer",
        }
    }
}

// ============================================================================
// STAT RECORD
// ============================================================================

/// Normalized stat record, one per surviving flush sample
///
/// The five name fields are positional (topic < category < subcategory <
/// identity < metric); a position the raw name did not reach is `None`,
/// never an empty string. `value` is carried opaquely: counters, gauges and
/// sets hold the reported number, timers hold the array of observations.
#[derive(Debug, Clone, PartialEq)]
pub struct StatRecord {
    pub collected: DateTime<Utc>,
    pub topic: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub identity: Option<String>,
    pub metric: Option<String>,
    pub stat_type: StatType,
    pub value: JsonValue,
    /// Tag name -> tag value; `true` for bare tags, string otherwise.
    /// BTreeMap so canonical serialization is order-stable.
    pub tags: BTreeMap<String, JsonValue>,
    /// SHA-256 hex digest over the record's coordinates (value excluded).
    /// Empty until the identity hasher has run.
    pub identity_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_type_as_str() {
        assert_eq!(StatType::Count.as_str(), "count");
        assert_eq!(StatType::Gauge.as_str(), "gauge");
        assert_eq!(StatType::Set.as_str(), "set");
        assert_eq!(StatType::Timer.as_str(), "timer");
    }

    #[test]
    fn test_stat_type_serde_wire_names() {
        assert_eq!(serde_json::to_string(&StatType::Count).unwrap(), "\"count\"");
        assert_eq!(
            serde_json::from_str::<StatType>("\"timer\"").unwrap(),
            StatType::Timer
        );
    }
}
