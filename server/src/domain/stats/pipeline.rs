//! Stats Processing Pipeline
//!
//! Subscribes to the flush topic and runs each event through
//! extract -> hash -> dedupe -> persist.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::core::config::WriteMode;
use crate::data::error::DataError;
use crate::data::topics::{Topic, TopicError};
use crate::data::traits::StatStore;
use crate::data::types::FlushEvent;

use super::dedup::dedupe;
use super::extract::extract_flush;
use super::identity::identity_hash;
use super::persist::persist;

pub struct StatsPipeline {
    store: Arc<dyn StatStore>,
    mode: WriteMode,
}

impl StatsPipeline {
    pub fn new(store: Arc<dyn StatStore>, mode: WriteMode) -> Self {
        Self { store, mode }
    }

    pub fn start(
        self,
        topic: Topic<FlushEvent>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let mut subscriber = topic.subscribe();

        tokio::spawn(async move {
            let mut shutdown_requested = false;

            loop {
                if shutdown_requested {
                    // Drain remaining events before shutdown
                    match tokio::time::timeout(Duration::from_millis(100), subscriber.recv()).await
                    {
                        Ok(Ok(event)) => {
                            self.run(&event).await;
                            continue;
                        }
                        Ok(Err(TopicError::Lagged(n))) => {
                            tracing::warn!(lagged = n, "StatsPipeline lagged during drain");
                            continue;
                        }
                        _ => break,
                    }
                }

                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::debug!("StatsPipeline received shutdown, draining...");
                            shutdown_requested = true;
                        }
                    }
                    result = subscriber.recv() => {
                        match result {
                            Ok(event) => self.run(&event).await,
                            Err(TopicError::Lagged(n)) => {
                                tracing::warn!(lagged = n, "StatsPipeline lagged");
                            }
                            Err(TopicError::ChannelClosed) => break,
                            Err(_) => break,
                        }
                    }
                }
            }
            tracing::debug!("StatsPipeline shutdown complete");
        })
    }

    async fn run(&self, event: &FlushEvent) {
        match self.process(event).await {
            Ok(persisted) => {
                if persisted > 0 {
                    tracing::debug!(persisted, "Flush batch persisted");
                }
            }
            Err(e) => {
                // Batch-mode failure: one error for the whole batch, no
                // partial retry here. The next flush interval proceeds
                // regardless.
                tracing::error!(error = %e, "Failed to persist flush batch");
            }
        }
    }

    /// One full pipeline pass over a flush event.
    ///
    /// Returns the number of records the store accepted.
    async fn process(&self, event: &FlushEvent) -> Result<u64, DataError> {
        let mut records = extract_flush(event);
        if records.is_empty() {
            return Ok(0);
        }

        for record in &mut records {
            record.identity_hash = identity_hash(record);
        }

        let (kept, dropped) = dedupe(records);
        if dropped > 0 {
            tracing::debug!(
                kept = kept.len(),
                dropped,
                "Deduplicated flush batch"
            );
        }

        persist(self.store.as_ref(), self.mode, &kept).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::topics::TopicService;
    use crate::data::types::{StatRecord, StatType};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    /// Store double capturing every submitted batch
    struct CapturingStore {
        batches: Mutex<Vec<Vec<StatRecord>>>,
    }

    impl CapturingStore {
        fn new() -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
            }
        }

        fn batches(&self) -> Vec<Vec<StatRecord>> {
            self.batches.lock().clone()
        }
    }

    #[async_trait]
    impl StatStore for CapturingStore {
        async fn submit_batch(&self, records: &[StatRecord]) -> Result<u64, DataError> {
            self.batches.lock().push(records.to_vec());
            Ok(records.len() as u64)
        }

        async fn submit_one(&self, record: &StatRecord) -> Result<(), DataError> {
            self.batches.lock().push(vec![record.clone()]);
            Ok(())
        }
    }

    fn flush_event(payload: serde_json::Value) -> FlushEvent {
        serde_json::from_value(json!({
            "timestamp": 1700000000,
            "payload": payload
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_process_end_to_end_scenario() {
        let store = Arc::new(CapturingStore::new());
        let pipeline = StatsPipeline::new(store.clone(), WriteMode::Batch);

        let event = flush_event(json!({
            "counters": {
                "svcA.web.req.login.count": 3,
                "svcA.web.req.login.count2": 0
            }
        }));

        let persisted = pipeline.process(&event).await.unwrap();
        assert_eq!(persisted, 1);

        // Exactly one record, submitted once
        let batches = store.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 1);

        let record = &batches[0][0];
        assert_eq!(
            crate::utils::time::datetime_to_iso_millis(record.collected),
            "2023-11-14T22:13:20.000Z"
        );
        assert_eq!(record.topic.as_deref(), Some("svcA"));
        assert_eq!(record.category.as_deref(), Some("web"));
        assert_eq!(record.subcategory.as_deref(), Some("req"));
        assert_eq!(record.identity.as_deref(), Some("login"));
        assert_eq!(record.metric.as_deref(), Some("count"));
        assert_eq!(record.stat_type, StatType::Count);
        assert_eq!(record.value, json!(3));
        assert_eq!(record.identity_hash.len(), 64);
    }

    #[tokio::test]
    async fn test_process_deduplicates_same_coordinate() {
        let store = Arc::new(CapturingStore::new());
        let pipeline = StatsPipeline::new(store.clone(), WriteMode::Batch);

        // Distinct raw keys that normalize to the same coordinate: the
        // repeated tag token collapses in the tag map
        let event = flush_event(json!({
            "counters": {
                "svcA.web.req.login.count;env=prod": 3,
                "svcA.web.req.login.count;env=prod;env=prod": 8
            }
        }));

        let persisted = pipeline.process(&event).await.unwrap();
        assert_eq!(persisted, 1);

        // First record by input order survives
        let batches = store.batches();
        assert_eq!(batches[0].len(), 1);
        assert_eq!(batches[0][0].value, json!(3));
    }

    #[tokio::test]
    async fn test_process_empty_flush_skips_store() {
        let store = Arc::new(CapturingStore::new());
        let pipeline = StatsPipeline::new(store.clone(), WriteMode::Batch);

        let event = flush_event(json!({
            "counters": { "svcA.web.req.login.count2": 0 }
        }));

        let persisted = pipeline.process(&event).await.unwrap();
        assert_eq!(persisted, 0);
        assert!(store.batches().is_empty());
    }

    #[tokio::test]
    async fn test_pipeline_consumes_topic_and_drains_on_shutdown() {
        let service = TopicService::new();
        let topic = service.topic::<FlushEvent>("stats.flush").unwrap();
        let store = Arc::new(CapturingStore::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let pipeline = StatsPipeline::new(store.clone(), WriteMode::Batch);
        let handle = pipeline.start(topic.clone(), shutdown_rx);

        topic
            .publish(flush_event(json!({
                "counters": { "svcA.web.req.login.count": 3 }
            })))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();

        let batches = store.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0][0].metric.as_deref(), Some("count"));
    }
}
