//! Store capability trait
//!
//! The stats pipeline never opens or closes connections itself; it is handed
//! a `StatStore` value and only issues submissions through it. The store owns
//! uniqueness and conflict handling at the storage layer; in-batch dedup is
//! the pipeline's only duplicate defense.

use async_trait::async_trait;

use crate::data::error::DataError;
use crate::data::types::StatRecord;

/// Submission capabilities the persistence writer needs from a store
#[async_trait]
pub trait StatStore: Send + Sync {
    /// Submit a full batch as one atomic call. Returns the number of rows
    /// submitted. Any failure aborts the whole batch; no partial commit.
    async fn submit_batch(&self, records: &[StatRecord]) -> Result<u64, DataError>;

    /// Submit a single record (degraded path). Callers isolate failures
    /// per record; one rejection must not stop the remainder.
    async fn submit_one(&self, record: &StatRecord) -> Result<(), DataError>;
}
