//! SQLite-backed schema + form stores.
//!
//! Properties and required lists are stored as JSON text, one row per
//! `(customer_id, record_type)` / `(customer_id, form_id)`.

use crate::error::{Error as CoreError, Result as CoreResult};
use crate::models::CustomerId;
use crate::schema::models::{FieldSchema, FormDefinition};
use crate::schema::store::{FormStore, SchemaStore};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

#[derive(Clone)]
pub struct SqliteSchemaStore {
    pool: SqlitePool,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS field_schemas (
    customer_id TEXT NOT NULL,
    record_type TEXT NOT NULL,
    properties TEXT NOT NULL,
    required TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (customer_id, record_type)
);

CREATE TABLE IF NOT EXISTS forms (
    customer_id TEXT NOT NULL,
    form_id TEXT NOT NULL,
    form_title TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (customer_id, form_id)
);
"#;

impl SqliteSchemaStore {
    pub async fn new(pool: SqlitePool) -> CoreResult<Self> {
        for stmt in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(stmt).execute(&pool).await.map_err(db_err)?;
        }
        Ok(Self { pool })
    }
}

fn db_err(e: sqlx::Error) -> CoreError {
    CoreError::backend("sqlite_schema_store", e)
}

#[async_trait]
impl SchemaStore for SqliteSchemaStore {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn get(
        &self,
        customer_id: &CustomerId,
        record_type: &str,
    ) -> CoreResult<Option<FieldSchema>> {
        let row = sqlx::query(
            "SELECT properties, required FROM field_schemas \
             WHERE customer_id = ?1 AND record_type = ?2",
        )
        .bind(customer_id.as_str())
        .bind(record_type)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let properties: String = row.get("properties");
        let required: String = row.get("required");
        Ok(Some(FieldSchema {
            customer_id: customer_id.clone(),
            record_type: record_type.to_string(),
            properties: serde_json::from_str(&properties)
                .map_err(|e| CoreError::backend("parse schema row", e))?,
            required: serde_json::from_str(&required)
                .map_err(|e| CoreError::backend("parse schema row", e))?,
        }))
    }

    #[tracing::instrument(level = "debug", skip(self, schema), fields(record_type = %schema.record_type))]
    async fn upsert(&self, schema: &FieldSchema) -> CoreResult<()> {
        let now = Utc::now().to_rfc3339();
        let properties = serde_json::to_string(&schema.properties)
            .map_err(|e| CoreError::backend("serialize schema properties", e))?;
        let required = serde_json::to_string(&schema.required)
            .map_err(|e| CoreError::backend("serialize schema required", e))?;

        sqlx::query(
            "INSERT INTO field_schemas \
               (customer_id, record_type, properties, required, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
             ON CONFLICT(customer_id, record_type) DO UPDATE SET \
               properties = excluded.properties, \
               required = excluded.required, \
               updated_at = excluded.updated_at",
        )
        .bind(schema.customer_id.as_str())
        .bind(&schema.record_type)
        .bind(properties)
        .bind(required)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }
}

#[async_trait]
impl FormStore for SqliteSchemaStore {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn get(
        &self,
        customer_id: &CustomerId,
        form_id: &str,
    ) -> CoreResult<Option<FormDefinition>> {
        let row = sqlx::query(
            "SELECT customer_id, form_id, form_title FROM forms \
             WHERE customer_id = ?1 AND form_id = ?2",
        )
        .bind(customer_id.as_str())
        .bind(form_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(|row| form_from_row(&row)).transpose()
    }

    #[tracing::instrument(level = "debug", skip(self, form), fields(form_id = %form.form_id))]
    async fn upsert(&self, form: &FormDefinition) -> CoreResult<()> {
        sqlx::query(
            "INSERT INTO forms (customer_id, form_id, form_title, created_at) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(customer_id, form_id) DO UPDATE SET \
               form_title = excluded.form_title",
        )
        .bind(form.customer_id.as_str())
        .bind(&form.form_id)
        .bind(&form.form_title)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn list(&self, customer_id: &CustomerId) -> CoreResult<Vec<FormDefinition>> {
        let rows = sqlx::query(
            "SELECT customer_id, form_id, form_title FROM forms \
             WHERE customer_id = ?1 ORDER BY form_id",
        )
        .bind(customer_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(form_from_row).collect()
    }
}

fn form_from_row(row: &sqlx::sqlite::SqliteRow) -> CoreResult<FormDefinition> {
    let customer_id: String = row.get("customer_id");
    Ok(FormDefinition {
        customer_id: CustomerId::from_str(&customer_id)
            .map_err(|e| CoreError::backend("parse form row", e))?,
        form_id: row.get("form_id"),
        form_title: row.get("form_title"),
    })
}
