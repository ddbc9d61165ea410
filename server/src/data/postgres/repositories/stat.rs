//! PostgreSQL stat repository
//!
//! Submits normalized stat records through the store's `add_stat` routines.
//! Fields are passed positionally; conflict handling lives in the store.

use serde::Serialize;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use sqlx::types::Json;

use async_trait::async_trait;

use crate::data::error::DataError;
use crate::data::traits::StatStore;
use crate::data::types::StatRecord;
use crate::utils::time::datetime_to_iso_millis;

/// Positional row shape for the `add_stat` / `add_stat_batch` routines
#[derive(Debug, Serialize)]
pub struct StatRow {
    pub collected: String,
    pub topic: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub identity: Option<String>,
    pub metric: Option<String>,
    #[serde(rename = "type")]
    pub stat_type: &'static str,
    pub value: JsonValue,
    pub tags: JsonValue,
    pub identity_hash: String,
}

impl From<&StatRecord> for StatRow {
    fn from(record: &StatRecord) -> Self {
        Self {
            collected: datetime_to_iso_millis(record.collected),
            topic: record.topic.clone(),
            category: record.category.clone(),
            subcategory: record.subcategory.clone(),
            identity: record.identity.clone(),
            metric: record.metric.clone(),
            stat_type: record.stat_type.as_str(),
            value: record.value.clone(),
            tags: JsonValue::Object(record.tags.clone().into_iter().collect()),
            identity_hash: record.identity_hash.clone(),
        }
    }
}

/// Stat repository over the shared pool
pub struct PgStatRepository {
    pool: PgPool,
}

impl PgStatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatStore for PgStatRepository {
    /// Submit the whole batch as one `add_stat_batch` call.
    ///
    /// The store executes the routine as a single statement, so the batch
    /// commits or fails as a unit.
    async fn submit_batch(&self, records: &[StatRecord]) -> Result<u64, DataError> {
        if records.is_empty() {
            return Ok(0);
        }

        let rows: Vec<StatRow> = records.iter().map(StatRow::from).collect();
        let payload =
            serde_json::to_value(&rows).map_err(|e| DataError::Serialization(e.to_string()))?;

        sqlx::query("SELECT add_stat_batch($1::jsonb)")
            .bind(Json(payload))
            .execute(&self.pool)
            .await
            .map_err(DataError::from_postgres)?;

        Ok(rows.len() as u64)
    }

    async fn submit_one(&self, record: &StatRecord) -> Result<(), DataError> {
        let row = StatRow::from(record);

        sqlx::query(
            "SELECT add_stat($1::timestamptz, $2, $3, $4, $5, $6, $7, $8::jsonb, $9::jsonb, $10)",
        )
        .bind(&row.collected)
        .bind(&row.topic)
        .bind(&row.category)
        .bind(&row.subcategory)
        .bind(&row.identity)
        .bind(&row.metric)
        .bind(row.stat_type)
        .bind(Json(&row.value))
        .bind(Json(&row.tags))
        .bind(&row.identity_hash)
        .execute(&self.pool)
        .await
        .map_err(DataError::from_postgres)?;

        Ok(())
    }
}
