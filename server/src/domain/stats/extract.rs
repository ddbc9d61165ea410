//! Stat extraction from flush payloads
//!
//! Walks one raw category map at a time and produces normalized stat
//! records. Aggregator self-metrics, undecomposable names, and empty-by-type
//! values never become records. Pure over its inputs; record order follows
//! the payload map's iteration order.

use serde_json::{Map, Value as JsonValue};

use crate::core::constants::IGNORED_AGGREGATOR_METRICS;
use crate::data::types::{FlushEvent, StatRecord, StatType};
use crate::utils::time::epoch_secs_to_datetime;

use super::fields::parse_fields;

/// Extract and normalize every category of a flush event.
///
/// Category order is fixed (counters, gauges, sets, timers) so a run is
/// deterministic; `timer_data` is derived bookkeeping and not extracted.
pub fn extract_flush(event: &FlushEvent) -> Vec<StatRecord> {
    let payload = &event.payload;
    let mut records = extract(event.timestamp, &payload.counters, StatType::Count);
    records.extend(extract(event.timestamp, &payload.gauges, StatType::Gauge));
    records.extend(extract(event.timestamp, &payload.sets, StatType::Set));
    records.extend(extract(event.timestamp, &payload.timers, StatType::Timer));
    records
}

/// Extract one category map into stat records
pub fn extract(
    flush_epoch_secs: i64,
    stats: &Map<String, JsonValue>,
    stat_type: StatType,
) -> Vec<StatRecord> {
    let collected = epoch_secs_to_datetime(flush_epoch_secs);
    let mut results = Vec::new();

    for (raw_name, value) in stats {
        if IGNORED_AGGREGATOR_METRICS.contains(&raw_name.as_str()) {
            continue;
        }
        // Names without a dot cannot be decomposed into the schema.
        // Permissive legacy behavior: skipped, not an error.
        if !raw_name.contains('.') {
            continue;
        }
        if is_empty_value(stat_type, value) {
            tracing::debug!(
                metric = %raw_name,
                stat_type = stat_type.as_str(),
                "Skipping empty sample"
            );
            continue;
        }

        let fields = parse_fields(raw_name);
        results.push(StatRecord {
            collected,
            topic: fields.topic,
            category: fields.category,
            subcategory: fields.subcategory,
            identity: fields.identity,
            metric: fields.metric,
            stat_type,
            value: value.clone(),
            tags: fields.tags,
            identity_hash: String::new(),
        });
    }

    results
}

/// A sample that carries no signal for its type:
/// a zero count, or a timer with no observations this interval.
fn is_empty_value(stat_type: StatType, value: &JsonValue) -> bool {
    match stat_type {
        StatType::Count => value.as_f64() == Some(0.0),
        StatType::Timer => value.as_array().is_some_and(|a| a.is_empty()),
        StatType::Gauge | StatType::Set => false,
    }
}
