use crate::models::CustomerId;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A cached record imported from an external integration.
///
/// Natural key: `(customer_id, record_type, record_id)`, enforced by a unique
/// index in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub doc_id: Uuid,
    #[serde(rename = "id")]
    pub record_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default)]
    pub fields: Map<String, Value>,
    pub record_type: String,
    pub customer_id: CustomerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration_key: Option<String>,
}

impl Record {
    #[tracing::instrument(level = "debug", skip(fields))]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        customer_id: CustomerId,
        record_type: impl Into<String> + std::fmt::Debug,
        record_id: impl Into<String> + std::fmt::Debug,
        name: impl Into<String> + std::fmt::Debug,
        created_time: Option<String>,
        updated_time: Option<String>,
        uri: Option<String>,
        fields: Map<String, Value>,
        integration_key: Option<String>,
    ) -> Result<Self> {
        let record_type = record_type.into();
        if record_type.trim().is_empty() {
            return Err(Error::InvalidInput("record_type is empty".to_string()));
        }

        let record_id = record_id.into();
        if record_id.trim().is_empty() {
            return Err(Error::InvalidInput("record id is empty".to_string()));
        }

        let name = name.into();
        let name = if name.trim().is_empty() {
            record_id.clone()
        } else {
            name
        };

        Ok(Self {
            doc_id: Uuid::new_v4(),
            record_id,
            name,
            created_time,
            updated_time,
            uri,
            fields,
            record_type,
            customer_id,
            integration_key,
        })
    }
}

/// Wire shape of a record arriving from the platform or a webhook push.
///
/// Everything is optional; `id` may be a JSON string or number.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPayload {
    pub id: Option<Value>,
    pub name: Option<String>,
    pub created_time: Option<String>,
    pub updated_time: Option<String>,
    pub uri: Option<String>,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RecordPayload {
    /// The record id normalized to a string, if present and usable.
    pub fn record_id(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() { None } else { Some(s.to_string()) }
            }
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Lower into a `Record`. Unrecognized top-level keys fold into `fields`
    /// so push payloads survive the trip intact; `name` falls back to the id.
    pub fn into_record(
        self,
        customer_id: CustomerId,
        record_type: impl Into<String> + std::fmt::Debug,
        integration_key: Option<String>,
    ) -> Result<Record> {
        let record_id = self
            .record_id()
            .ok_or_else(|| Error::InvalidInput("record id is missing".to_string()))?;

        let mut fields = self.fields;
        for (key, value) in self.extra {
            fields.entry(key).or_insert(value);
        }

        Record::new(
            customer_id,
            record_type,
            record_id.clone(),
            self.name.unwrap_or_default(),
            self.created_time,
            self.updated_time,
            self.uri,
            fields,
            integration_key,
        )
    }
}

/// Projection used for the push-path change check: the full document minus
/// volatile fields (`docId`, `updatedTime`). Structural equality of the two
/// projections means the write is skipped.
pub fn comparable_view(record: &Record) -> Value {
    let mut value = serde_json::to_value(record).unwrap_or(Value::Null);
    if let Value::Object(map) = &mut value {
        map.remove("docId");
        map.remove("updatedTime");
    }
    value
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertStatus {
    Created,
    Updated,
    Unchanged,
}

/// Result of a push-path upsert.
#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    pub status: UpsertStatus,
    pub record: Record,
}

/// Filter + pagination for the list/search path.
#[derive(Debug, Clone)]
pub struct RecordQuery {
    pub customer_id: CustomerId,
    pub record_type: String,
    pub integration_key: Option<String>,
    /// Case-insensitive substring match over id, name, `fields.industry`,
    /// `fields.domain`. Empty or whitespace-only means no filtering.
    pub search: Option<String>,
    /// Row offset (the serialized cursor).
    pub offset: u64,
    pub page_size: usize,
}

#[derive(Debug, Clone)]
pub struct RecordPage {
    pub records: Vec<Record>,
    /// Offset of the next page; `None` on the last page.
    pub next_offset: Option<u64>,
}
