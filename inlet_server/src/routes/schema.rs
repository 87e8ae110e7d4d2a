use crate::error::ApiError;
use crate::server::AppState;
use axum::body::Bytes;
use axum::extract::Path;
use axum::routing::get;
use axum::{Extension, Json};
use inlet_core::CustomerId;
use inlet_core::schema::models::FieldSpec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

#[tracing::instrument(level = "debug", skip_all)]
pub fn router() -> axum::Router {
    axum::Router::new().route(
        "/schema/{record_type}/{customer_id}",
        get(get_schema).post(add_field).delete(delete_field),
    )
}

#[derive(Debug, Serialize)]
pub struct SchemaResponse {
    pub schema: serde_json::Value,
}

fn parse_customer(raw: &str) -> Result<CustomerId, ApiError> {
    CustomerId::from_str(raw).map_err(|e| ApiError::InvalidInput(e.to_string()))
}

#[tracing::instrument(level = "debug", skip_all, fields(record_type = %record_type))]
pub async fn get_schema(
    Extension(state): Extension<Arc<AppState>>,
    Path((record_type, customer_id)): Path<(String, String)>,
) -> Result<Json<SchemaResponse>, ApiError> {
    let customer_id = parse_customer(&customer_id)?;
    let schema = state.schemas.get_or_seed(&customer_id, &record_type).await?;
    Ok(Json(SchemaResponse {
        schema: schema.to_object_schema(),
    }))
}

#[derive(Debug, Deserialize)]
struct AddFieldBody {
    field: FieldSpec,
}

#[tracing::instrument(level = "info", skip_all, fields(record_type = %record_type))]
pub async fn add_field(
    Extension(state): Extension<Arc<AppState>>,
    Path((record_type, customer_id)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<SchemaResponse>, ApiError> {
    let customer_id = parse_customer(&customer_id)?;
    let body: AddFieldBody = serde_json::from_slice(&body)
        .map_err(|e| ApiError::InvalidInput(format!("invalid field data: {e}")))?;

    let schema = state
        .schemas
        .add_field(&customer_id, &record_type, body.field)
        .await?;
    Ok(Json(SchemaResponse {
        schema: schema.to_object_schema(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteFieldBody {
    field_name: String,
}

#[tracing::instrument(level = "info", skip_all, fields(record_type = %record_type))]
pub async fn delete_field(
    Extension(state): Extension<Arc<AppState>>,
    Path((record_type, customer_id)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<SchemaResponse>, ApiError> {
    let customer_id = parse_customer(&customer_id)?;
    let body: DeleteFieldBody = serde_json::from_slice(&body)
        .map_err(|e| ApiError::InvalidInput(format!("invalid json body: {e}")))?;

    let schema = state
        .schemas
        .remove_field(&customer_id, &record_type, &body.field_name)
        .await?;
    Ok(Json(SchemaResponse {
        schema: schema.to_object_schema(),
    }))
}
