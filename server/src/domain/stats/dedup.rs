//! In-batch deduplication
//!
//! Single-pass, order-preserving filter over identity hashes. The seen-set
//! lives for one batch only; there is no cross-batch memory. First record
//! for a hash wins; later ones are dropped and logged, never errored.

use std::collections::HashSet;

use crate::data::types::StatRecord;

/// Remove records whose identity hash already appeared in this batch.
///
/// Returns the kept records (a subsequence of the input) and the number of
/// duplicates dropped.
pub fn dedupe(records: Vec<StatRecord>) -> (Vec<StatRecord>, usize) {
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    let mut kept = Vec::with_capacity(records.len());
    let mut dropped = 0usize;

    for record in records {
        if seen.insert(record.identity_hash.clone()) {
            kept.push(record);
        } else {
            dropped += 1;
            tracing::info!(
                identity_hash = %record.identity_hash,
                metric = record.metric.as_deref().unwrap_or_default(),
                "Dropping duplicate stat record within flush batch"
            );
        }
    }

    (kept, dropped)
}
