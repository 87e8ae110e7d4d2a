//! SQLite-backed RecordStore implementation.
//!
//! One `records` table with the document payload in a JSON TEXT column and a
//! unique index on the natural key, so import dedup is a single atomic
//! `INSERT ... ON CONFLICT DO NOTHING` and the push-path upsert runs inside a
//! transaction.

use crate::error::{Error as CoreError, Result as CoreResult};
use crate::models::CustomerId;
use crate::records::models::{
    Record, RecordPage, RecordQuery, UpsertOutcome, UpsertStatus, comparable_view,
};
use crate::records::store::RecordStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    doc_id TEXT PRIMARY KEY,
    customer_id TEXT NOT NULL,
    record_type TEXT NOT NULL,
    record_id TEXT NOT NULL,
    name TEXT NOT NULL,
    created_time TEXT,
    updated_time TEXT,
    uri TEXT,
    fields TEXT NOT NULL,
    integration_key TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS records_natural_key
    ON records(customer_id, record_type, record_id);
CREATE INDEX IF NOT EXISTS records_customer_record
    ON records(customer_id, record_id);
CREATE INDEX IF NOT EXISTS records_customer_type_integration
    ON records(customer_id, record_type, integration_key);
"#;

const SELECT_COLUMNS: &str = "doc_id, customer_id, record_type, record_id, name, \
     created_time, updated_time, uri, fields, integration_key";

impl SqliteRecordStore {
    /// Wrap a pool and apply the internal schema migration.
    pub async fn new(pool: SqlitePool) -> CoreResult<Self> {
        for stmt in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(stmt).execute(&pool).await.map_err(db_err)?;
        }
        Ok(Self { pool })
    }
}

fn db_err(e: sqlx::Error) -> CoreError {
    CoreError::backend("sqlite_record_store", e)
}

fn row_to_record(row: &SqliteRow) -> CoreResult<Record> {
    let doc_id: String = row.get("doc_id");
    let customer_id: String = row.get("customer_id");
    let fields: String = row.get("fields");

    Ok(Record {
        doc_id: Uuid::parse_str(&doc_id).map_err(|e| CoreError::backend("parse record row", e))?,
        record_id: row.get("record_id"),
        name: row.get("name"),
        created_time: row.get("created_time"),
        updated_time: row.get("updated_time"),
        uri: row.get("uri"),
        fields: serde_json::from_str(&fields).map_err(|e| CoreError::backend("parse record row", e))?,
        record_type: row.get("record_type"),
        customer_id: CustomerId::from_str(&customer_id)
            .map_err(|e| CoreError::backend("parse record row", e))?,
        integration_key: row.get("integration_key"),
    })
}

/// Escape LIKE metacharacters and wrap the lowercased term in wildcards.
fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for ch in term.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    #[tracing::instrument(level = "debug", skip(self, record), fields(record_id = %record.record_id))]
    async fn insert_if_absent(&self, record: &Record) -> CoreResult<bool> {
        let now = Utc::now().to_rfc3339();
        let fields = serde_json::to_string(&record.fields)
            .map_err(|e| CoreError::backend("serialize record fields", e))?;

        let result = sqlx::query(
            "INSERT INTO records \
               (doc_id, customer_id, record_type, record_id, name, created_time, updated_time, \
                uri, fields, integration_key, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12) \
             ON CONFLICT(customer_id, record_type, record_id) DO NOTHING",
        )
        .bind(record.doc_id.to_string())
        .bind(record.customer_id.as_str())
        .bind(&record.record_type)
        .bind(&record.record_id)
        .bind(&record.name)
        .bind(&record.created_time)
        .bind(&record.updated_time)
        .bind(&record.uri)
        .bind(fields)
        .bind(&record.integration_key)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(level = "debug", skip(self, incoming), fields(record_id = %incoming.record_id))]
    async fn upsert_record(
        &self,
        incoming: Record,
        now: DateTime<Utc>,
    ) -> CoreResult<UpsertOutcome> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let existing = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM records \
             WHERE customer_id = ?1 AND record_id = ?2 \
             ORDER BY rowid LIMIT 1"
        ))
        .bind(incoming.customer_id.as_str())
        .bind(&incoming.record_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        let existing = match existing {
            Some(row) => Some(row_to_record(&row)?),
            None => None,
        };

        let Some(existing) = existing else {
            let mut record = incoming;
            record.updated_time = Some(now.to_rfc3339());

            let fields = serde_json::to_string(&record.fields)
                .map_err(|e| CoreError::backend("serialize record fields", e))?;
            sqlx::query(
                "INSERT INTO records \
                   (doc_id, customer_id, record_type, record_id, name, created_time, \
                    updated_time, uri, fields, integration_key, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )
            .bind(record.doc_id.to_string())
            .bind(record.customer_id.as_str())
            .bind(&record.record_type)
            .bind(&record.record_id)
            .bind(&record.name)
            .bind(&record.created_time)
            .bind(&record.updated_time)
            .bind(&record.uri)
            .bind(fields)
            .bind(&record.integration_key)
            .bind(now.to_rfc3339())
            .bind(now.to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
            tx.commit().await.map_err(db_err)?;

            return Ok(UpsertOutcome {
                status: UpsertStatus::Created,
                record,
            });
        };

        let mut candidate = incoming;
        candidate.doc_id = existing.doc_id;

        if comparable_view(&candidate) == comparable_view(&existing) {
            tx.commit().await.map_err(db_err)?;
            return Ok(UpsertOutcome {
                status: UpsertStatus::Unchanged,
                record: existing,
            });
        }

        candidate.updated_time = Some(now.to_rfc3339());
        let fields = serde_json::to_string(&candidate.fields)
            .map_err(|e| CoreError::backend("serialize record fields", e))?;
        sqlx::query(
            "UPDATE records SET \
               record_type = ?1, name = ?2, created_time = ?3, updated_time = ?4, uri = ?5, \
               fields = ?6, integration_key = ?7, updated_at = ?8 \
             WHERE doc_id = ?9",
        )
        .bind(&candidate.record_type)
        .bind(&candidate.name)
        .bind(&candidate.created_time)
        .bind(&candidate.updated_time)
        .bind(&candidate.uri)
        .bind(fields)
        .bind(&candidate.integration_key)
        .bind(now.to_rfc3339())
        .bind(candidate.doc_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;

        Ok(UpsertOutcome {
            status: UpsertStatus::Updated,
            record: candidate,
        })
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn get(
        &self,
        customer_id: &CustomerId,
        record_type: &str,
        record_id: &str,
    ) -> CoreResult<Option<Record>> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM records \
             WHERE customer_id = ?1 AND record_type = ?2 AND record_id = ?3"
        ))
        .bind(customer_id.as_str())
        .bind(record_type)
        .bind(record_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(row_to_record).transpose()
    }

    #[tracing::instrument(level = "debug", skip(self, query), fields(record_type = %query.record_type))]
    async fn list(&self, query: &RecordQuery) -> CoreResult<RecordPage> {
        let mut sql = format!(
            "SELECT {SELECT_COLUMNS} FROM records \
             WHERE customer_id = ?1 AND record_type = ?2"
        );
        let mut params: Vec<String> = vec![
            query.customer_id.as_str().to_string(),
            query.record_type.clone(),
        ];

        if let Some(key) = query
            .integration_key
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            params.push(key.to_string());
            sql.push_str(&format!(" AND integration_key = ?{}", params.len()));
        }

        if let Some(term) = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            params.push(like_pattern(term));
            let n = params.len();
            sql.push_str(&format!(
                " AND (LOWER(record_id) LIKE ?{n} ESCAPE '\\' \
                   OR LOWER(name) LIKE ?{n} ESCAPE '\\' \
                   OR LOWER(COALESCE(json_extract(fields, '$.industry'), '')) LIKE ?{n} ESCAPE '\\' \
                   OR LOWER(COALESCE(json_extract(fields, '$.domain'), '')) LIKE ?{n} ESCAPE '\\')"
            ));
        }

        // One row beyond the page to detect a further page.
        sql.push_str(&format!(
            " ORDER BY rowid LIMIT ?{} OFFSET ?{}",
            params.len() + 1,
            params.len() + 2
        ));

        let mut q = sqlx::query(&sql);
        for p in &params {
            q = q.bind(p);
        }
        q = q
            .bind(query.page_size as i64 + 1)
            .bind(query.offset as i64);

        let rows = q.fetch_all(&self.pool).await.map_err(db_err)?;

        let has_more = rows.len() > query.page_size;
        let mut records = Vec::with_capacity(rows.len().min(query.page_size));
        for row in rows.iter().take(query.page_size) {
            records.push(row_to_record(row)?);
        }

        let next_offset = has_more.then(|| query.offset + query.page_size as u64);
        Ok(RecordPage {
            records,
            next_offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;
    use serde_json::json;

    async fn mem_store() -> SqliteRecordStore {
        let pool = connect_in_memory().await.expect("pool");
        SqliteRecordStore::new(pool).await.expect("store")
    }

    fn customer() -> CustomerId {
        "cust-1".parse().expect("customer id")
    }

    fn make_record(record_id: &str, name: &str) -> Record {
        let mut fields = serde_json::Map::new();
        fields.insert("industry".to_string(), json!("Technology"));
        fields.insert("domain".to_string(), json!("example.com"));
        Record::new(
            customer(),
            "get-leads",
            record_id,
            name,
            Some("2024-01-01T00:00:00Z".to_string()),
            None,
            None,
            fields,
            Some("hubspot".to_string()),
        )
        .expect("record")
    }

    #[tokio::test]
    async fn insert_if_absent_dedups_on_natural_key() {
        let store = mem_store().await;
        let record = make_record("r1", "Alice");

        assert!(store.insert_if_absent(&record).await.expect("first"));

        // Same natural key, different doc_id: must be skipped.
        let again = make_record("r1", "Alice renamed");
        assert!(!store.insert_if_absent(&again).await.expect("second"));

        let stored = store
            .get(&customer(), "get-leads", "r1")
            .await
            .expect("get")
            .expect("present");
        assert_eq!(stored.name, "Alice");
    }

    #[tokio::test]
    async fn same_record_id_different_type_is_distinct() {
        let store = mem_store().await;
        let lead = make_record("r1", "Alice");
        let mut task = make_record("r1", "Alice");
        task.record_type = "tasks".to_string();

        assert!(store.insert_if_absent(&lead).await.expect("lead"));
        assert!(store.insert_if_absent(&task).await.expect("task"));
    }

    #[tokio::test]
    async fn cursor_walk_yields_full_set_without_gaps_or_duplicates() {
        let store = mem_store().await;
        for i in 0..25 {
            let record = make_record(&format!("r{i:03}"), &format!("Record {i}"));
            assert!(store.insert_if_absent(&record).await.expect("insert"));
        }

        let mut seen = std::collections::BTreeSet::new();
        let mut offset = 0u64;
        loop {
            let page = store
                .list(&RecordQuery {
                    customer_id: customer(),
                    record_type: "get-leads".to_string(),
                    integration_key: None,
                    search: None,
                    offset,
                    page_size: 10,
                })
                .await
                .expect("page");

            for record in &page.records {
                assert!(seen.insert(record.record_id.clone()), "duplicate in walk");
            }

            match page.next_offset {
                Some(next) => offset = next,
                None => break,
            }
        }

        assert_eq!(seen.len(), 25);
    }

    #[tokio::test]
    async fn empty_search_equals_no_search() {
        let store = mem_store().await;
        for i in 0..5 {
            let record = make_record(&format!("r{i}"), &format!("Record {i}"));
            store.insert_if_absent(&record).await.expect("insert");
        }

        let base = RecordQuery {
            customer_id: customer(),
            record_type: "get-leads".to_string(),
            integration_key: None,
            search: None,
            offset: 0,
            page_size: 100,
        };

        let without = store.list(&base).await.expect("no search");
        let with_empty = store
            .list(&RecordQuery {
                search: Some("   ".to_string()),
                ..base
            })
            .await
            .expect("empty search");

        let ids = |page: &RecordPage| {
            page.records
                .iter()
                .map(|r| r.record_id.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(&without), ids(&with_empty));
    }

    #[tokio::test]
    async fn search_matches_nested_fields_case_insensitively() {
        let store = mem_store().await;
        let mut a = make_record("r1", "Acme");
        a.fields
            .insert("industry".to_string(), json!("Healthcare"));
        let b = make_record("r2", "Globex");

        store.insert_if_absent(&a).await.expect("a");
        store.insert_if_absent(&b).await.expect("b");

        let page = store
            .list(&RecordQuery {
                customer_id: customer(),
                record_type: "get-leads".to_string(),
                integration_key: None,
                search: Some("healthCARE".to_string()),
                offset: 0,
                page_size: 100,
            })
            .await
            .expect("search");

        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].record_id, "r1");
    }

    #[tokio::test]
    async fn search_escapes_like_metacharacters() {
        let store = mem_store().await;
        let mut odd = make_record("r1", "100%_done");
        odd.fields.clear();
        let plain = make_record("r2", "plain");

        store.insert_if_absent(&odd).await.expect("odd");
        store.insert_if_absent(&plain).await.expect("plain");

        let page = store
            .list(&RecordQuery {
                customer_id: customer(),
                record_type: "get-leads".to_string(),
                integration_key: None,
                search: Some("%_".to_string()),
                offset: 0,
                page_size: 100,
            })
            .await
            .expect("search");

        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].record_id, "r1");
    }

    #[tokio::test]
    async fn integration_key_filter_applies() {
        let store = mem_store().await;
        let hubspot = make_record("r1", "Alice");
        let mut salesforce = make_record("r2", "Bob");
        salesforce.integration_key = Some("salesforce".to_string());

        store.insert_if_absent(&hubspot).await.expect("hubspot");
        store.insert_if_absent(&salesforce).await.expect("salesforce");

        let page = store
            .list(&RecordQuery {
                customer_id: customer(),
                record_type: "get-leads".to_string(),
                integration_key: Some("salesforce".to_string()),
                search: None,
                offset: 0,
                page_size: 100,
            })
            .await
            .expect("list");

        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].record_id, "r2");
    }

    #[tokio::test]
    async fn upsert_creates_then_reports_unchanged_then_updates() {
        let store = mem_store().await;
        let now = Utc::now();

        let first = store
            .upsert_record(make_record("r1", "Alice"), now)
            .await
            .expect("create");
        assert_eq!(first.status, UpsertStatus::Created);

        // Identical payload again: unchanged, same doc.
        let second = store
            .upsert_record(make_record("r1", "Alice"), Utc::now())
            .await
            .expect("unchanged");
        assert_eq!(second.status, UpsertStatus::Unchanged);
        assert_eq!(second.record.doc_id, first.record.doc_id);

        // Changed payload: updated in place.
        let third = store
            .upsert_record(make_record("r1", "Alice Cooper"), Utc::now())
            .await
            .expect("update");
        assert_eq!(third.status, UpsertStatus::Updated);
        assert_eq!(third.record.doc_id, first.record.doc_id);

        let stored = store
            .get(&customer(), "get-leads", "r1")
            .await
            .expect("get")
            .expect("present");
        assert_eq!(stored.name, "Alice Cooper");
    }
}
