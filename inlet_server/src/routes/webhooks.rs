use crate::error::ApiError;
use crate::server::AppState;
use axum::body::Bytes;
use axum::routing::post;
use axum::{Extension, Json};
use chrono::Utc;
use inlet_core::CustomerId;
use inlet_core::records::models::{RecordPayload, UpsertStatus};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

#[tracing::instrument(level = "debug", skip_all)]
pub fn router() -> axum::Router {
    axum::Router::new().route("/webhooks", post(receive))
}

/// Push notification body. Platforms wrap the record in `data` and may carry
/// connection metadata at the top level.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookBody {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub record_type: Option<String>,
    #[serde(default)]
    pub integration_key: Option<String>,
    #[serde(default)]
    pub data: Option<RecordPayload>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WebhookBody {
    /// Integration key: the explicit field, else connection metadata embedded
    /// in the payload.
    fn resolve_integration_key(&self) -> Option<String> {
        if let Some(key) = self
            .integration_key
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            return Some(key.to_string());
        }
        self.extra
            .get("connection")
            .and_then(|conn| conn.pointer("/integration/key"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub success: bool,
    pub record_id: String,
    pub doc_id: Uuid,
    pub customer_id: CustomerId,
    pub record_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration_key: Option<String>,
    pub status: UpsertStatus,
}

#[tracing::instrument(level = "info", skip_all)]
pub async fn receive(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    let payload: WebhookBody = serde_json::from_slice(&body)
        .map_err(|e| ApiError::InvalidInput(format!("invalid json body: {e}")))?;

    let customer_id = payload
        .customer_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::InvalidInput("missing required fields".to_string()))
        .and_then(|raw| {
            CustomerId::from_str(raw).map_err(|e| ApiError::InvalidInput(e.to_string()))
        })?;

    let record_type = payload
        .record_type
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::InvalidInput("missing required fields".to_string()))?
        .to_string();

    let integration_key = payload.resolve_integration_key();
    let data = payload
        .data
        .ok_or_else(|| ApiError::InvalidInput("missing required fields".to_string()))?;
    if data.record_id().is_none() {
        return Err(ApiError::InvalidInput("missing required fields".to_string()));
    }

    let record = data.into_record(customer_id.clone(), record_type.clone(), integration_key)?;
    let outcome = state.records.upsert_record(record, Utc::now()).await?;

    tracing::info!(
        record_id = %outcome.record.record_id,
        status = ?outcome.status,
        "webhook upsert processed"
    );

    Ok(Json(WebhookResponse {
        success: true,
        record_id: outcome.record.record_id.clone(),
        doc_id: outcome.record.doc_id,
        customer_id,
        record_type: outcome.record.record_type.clone(),
        integration_key: outcome.record.integration_key.clone(),
        status: outcome.status,
    }))
}
