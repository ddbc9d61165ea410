//! Time utility functions

use chrono::{DateTime, TimeZone, Utc};

/// Convert seconds since Unix epoch to DateTime<Utc>
pub fn epoch_secs_to_datetime(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_else(|| {
        tracing::warn!(secs, "Invalid flush timestamp, using epoch");
        DateTime::UNIX_EPOCH
    })
}

/// Render a DateTime<Utc> as ISO 8601 with millisecond precision (`Z` suffix)
///
/// This is the canonical `collected` rendering: the identity hash pre-image
/// and the store row both use it, so it must stay byte-stable.
pub fn datetime_to_iso_millis(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
