use crate::error::ApiError;
use crate::extract::CustomerIdHeader;
use crate::server::AppState;
use axum::extract::Query;
use axum::routing::get;
use axum::{Extension, Json};
use inlet_core::records::models::{Record, RecordQuery};
use inlet_core::sync::actions::resolve_record_type;
use inlet_core::sync::engine::{ImportOutcome, ImportRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[tracing::instrument(level = "debug", skip_all)]
pub fn router() -> axum::Router {
    axum::Router::new()
        .route("/records", get(list_records))
        .route("/records/import", get(import_records))
}

#[derive(Debug, Deserialize)]
pub struct RecordsQuery {
    pub action: Option<String>,
    #[serde(rename = "instanceKey")]
    pub instance_key: Option<String>,
    pub cursor: Option<String>,
    pub search: Option<String>,
    #[serde(rename = "integrationKey")]
    pub integration_key: Option<String>,
}

impl RecordsQuery {
    fn action(&self) -> Result<&str, ApiError> {
        self.action
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::InvalidInput("action is required".to_string()))
    }
}

#[derive(Debug, Serialize)]
pub struct RecordsResponse {
    pub records: Vec<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

#[tracing::instrument(level = "debug", skip_all)]
pub async fn list_records(
    CustomerIdHeader(customer_id): CustomerIdHeader,
    Extension(state): Extension<Arc<AppState>>,
    Query(q): Query<RecordsQuery>,
) -> Result<Json<RecordsResponse>, ApiError> {
    let action = q.action()?;
    let record_type = resolve_record_type(action, q.instance_key.as_deref())?;

    let offset = match q.cursor.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(cursor) => cursor
            .parse::<u64>()
            .map_err(|_| ApiError::InvalidInput(format!("invalid cursor: {cursor}")))?,
        None => 0,
    };

    let page = state
        .records
        .list(&RecordQuery {
            customer_id,
            record_type,
            integration_key: q.integration_key.clone(),
            search: q.search.clone(),
            offset,
            page_size: state.list_page_size,
        })
        .await?;

    Ok(Json(RecordsResponse {
        records: page.records,
        cursor: page.next_offset.map(|offset| offset.to_string()),
    }))
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: ImportOutcome,
}

#[tracing::instrument(level = "info", skip_all)]
pub async fn import_records(
    CustomerIdHeader(customer_id): CustomerIdHeader,
    Extension(state): Extension<Arc<AppState>>,
    Query(q): Query<RecordsQuery>,
) -> Result<Json<ImportResponse>, ApiError> {
    let action = q.action()?;

    let outcome = state
        .import_engine
        .run(&ImportRequest {
            customer_id,
            action_key: action.to_string(),
            instance_key: q
                .instance_key
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            integration_key: q
                .integration_key
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        })
        .await?;

    Ok(Json(ImportResponse {
        success: true,
        outcome,
    }))
}
