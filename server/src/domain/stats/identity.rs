//! Stat record identity hashing
//!
//! The identity hash is the dedup key: a SHA-256 digest over a canonical
//! pre-image of the record's coordinates. The reported value is deliberately
//! excluded: two samples at the same coordinate within one batch are the
//! same identity no matter what they measured. Determinism here is the sole
//! correctness basis for deduplication.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

use crate::data::types::StatRecord;
use crate::utils::crypto::sha256_hex;
use crate::utils::time::datetime_to_iso_millis;

/// Compute the identity hash for a record (64 lowercase hex chars)
pub fn identity_hash(record: &StatRecord) -> String {
    sha256_hex(&identity_preimage(record))
}

/// Canonical pre-image: the seven coordinates joined with `.` in fixed
/// order, then `;` + the canonical tag list when tags exist. Absent name
/// fields render as empty strings so positions never shift.
fn identity_preimage(record: &StatRecord) -> String {
    let field = |f: &Option<String>| f.clone().unwrap_or_default();

    let mut preimage = [
        datetime_to_iso_millis(record.collected),
        field(&record.topic),
        field(&record.category),
        field(&record.subcategory),
        field(&record.identity),
        field(&record.metric),
        record.stat_type.as_str().to_string(),
    ]
    .join(".");

    if !record.tags.is_empty() {
        preimage.push(';');
        preimage.push_str(&canonical_tags(&record.tags));
    }

    preimage
}

/// Serialize tags in BTreeMap (key-sorted) order: bare `key` for boolean
/// true, `key=value` otherwise.
fn canonical_tags(tags: &BTreeMap<String, JsonValue>) -> String {
    tags.iter()
        .map(|(key, value)| match value {
            JsonValue::Bool(true) => key.clone(),
            JsonValue::String(s) => format!("{}={}", key, s),
            other => format!("{}={}", key, other),
        })
        .collect::<Vec<_>>()
        .join(";")
}
