use crate::models::CustomerId;
use crate::records::models::{Record, RecordPage, RecordQuery, UpsertOutcome};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Durable store for cached records.
///
/// Implementations must enforce the `(customer_id, record_type, record_id)`
/// natural key with a unique constraint; dedup is the store's job, not the
/// caller's.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert unless the natural key already exists. Returns `true` when a
    /// row was inserted, `false` when an existing row was left untouched.
    /// Atomic: concurrent callers cannot both insert.
    async fn insert_if_absent(&self, record: &Record) -> Result<bool>;

    /// Push-path upsert keyed by `(customer_id, record_id)` — the incoming
    /// record type overwrites the stored one. The write is skipped when the
    /// comparable projections are equal.
    async fn upsert_record(&self, incoming: Record, now: DateTime<Utc>) -> Result<UpsertOutcome>;

    /// Look up a single record by natural key.
    async fn get(
        &self,
        customer_id: &CustomerId,
        record_type: &str,
        record_id: &str,
    ) -> Result<Option<Record>>;

    /// Filtered, offset-paginated listing. Fetches one row beyond the page
    /// size to decide whether a further page exists.
    async fn list(&self, query: &RecordQuery) -> Result<RecordPage>;
}
