//! Stat batch persistence
//!
//! Two write paths, exactly one configured per deployment:
//! - batch: one atomic store call for the whole batch; a failure aborts the
//!   batch and surfaces once (retry, if any, is the caller's collaborator).
//! - per-record: sequential submissions with per-record error isolation;
//!   partial success is expected and normal.

use crate::core::config::WriteMode;
use crate::data::error::DataError;
use crate::data::traits::StatStore;
use crate::data::types::StatRecord;

/// Submit a deduplicated batch through the store capability.
///
/// Returns the number of records the store accepted. Only batch mode can
/// fail as a whole; per-record mode logs each rejection and keeps going.
pub async fn persist(
    store: &dyn StatStore,
    mode: WriteMode,
    records: &[StatRecord],
) -> Result<u64, DataError> {
    if records.is_empty() {
        return Ok(0);
    }

    match mode {
        WriteMode::Batch => store.submit_batch(records).await,
        WriteMode::PerRecord => {
            let mut persisted = 0u64;
            for record in records {
                match store.submit_one(record).await {
                    Ok(()) => persisted += 1,
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            metric = record.metric.as_deref().unwrap_or_default(),
                            "Failed to persist stat record, continuing with remainder"
                        );
                    }
                }
            }
            Ok(persisted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::StatType;
    use crate::utils::time::epoch_secs_to_datetime;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::collections::BTreeMap;

    /// Store double that records submissions and fails where told to
    struct RecordingStore {
        submitted: Mutex<Vec<String>>,
        fail_hashes: Vec<String>,
        fail_batch: bool,
    }

    impl RecordingStore {
        fn new() -> Self {
            Self {
                submitted: Mutex::new(Vec::new()),
                fail_hashes: Vec::new(),
                fail_batch: false,
            }
        }

        fn failing_on(hashes: &[&str]) -> Self {
            Self {
                fail_hashes: hashes.iter().map(|s| s.to_string()).collect(),
                ..Self::new()
            }
        }

        fn failing_batch() -> Self {
            Self {
                fail_batch: true,
                ..Self::new()
            }
        }

        fn submitted(&self) -> Vec<String> {
            self.submitted.lock().clone()
        }
    }

    #[async_trait]
    impl StatStore for RecordingStore {
        async fn submit_batch(&self, records: &[StatRecord]) -> Result<u64, DataError> {
            if self.fail_batch {
                return Err(DataError::pool_exhausted("postgres"));
            }
            let mut submitted = self.submitted.lock();
            for record in records {
                submitted.push(record.identity_hash.clone());
            }
            Ok(records.len() as u64)
        }

        async fn submit_one(&self, record: &StatRecord) -> Result<(), DataError> {
            if self.fail_hashes.contains(&record.identity_hash) {
                return Err(DataError::timeout("postgres", 1));
            }
            self.submitted.lock().push(record.identity_hash.clone());
            Ok(())
        }
    }

    fn record(hash: &str) -> StatRecord {
        StatRecord {
            collected: epoch_secs_to_datetime(1700000000),
            topic: Some("svcA".into()),
            category: Some("web".into()),
            subcategory: Some("req".into()),
            identity: Some("login".into()),
            metric: Some("count".into()),
            stat_type: StatType::Count,
            value: json!(1),
            tags: BTreeMap::new(),
            identity_hash: hash.into(),
        }
    }

    #[tokio::test]
    async fn test_batch_mode_submits_once() {
        let store = RecordingStore::new();
        let records = vec![record("h1"), record("h2"), record("h3")];
        let count = persist(&store, WriteMode::Batch, &records).await.unwrap();
        assert_eq!(count, 3);
        assert_eq!(store.submitted(), vec!["h1", "h2", "h3"]);
    }

    #[tokio::test]
    async fn test_batch_mode_failure_aborts_whole_batch() {
        let store = RecordingStore::failing_batch();
        let records = vec![record("h1"), record("h2")];
        let result = persist(&store, WriteMode::Batch, &records).await;
        assert!(result.is_err());
        assert!(store.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_per_record_mode_isolates_failures() {
        // Second record fails; first and third still go through
        let store = RecordingStore::failing_on(&["h2"]);
        let records = vec![record("h1"), record("h2"), record("h3")];
        let count = persist(&store, WriteMode::PerRecord, &records)
            .await
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(store.submitted(), vec!["h1", "h3"]);
    }

    #[tokio::test]
    async fn test_per_record_mode_all_failures_is_ok_zero() {
        let store = RecordingStore::failing_on(&["h1", "h2"]);
        let records = vec![record("h1"), record("h2")];
        let count = persist(&store, WriteMode::PerRecord, &records)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_empty_batch_short_circuits() {
        let store = RecordingStore::failing_batch();
        let count = persist(&store, WriteMode::Batch, &[]).await.unwrap();
        assert_eq!(count, 0);
    }
}
