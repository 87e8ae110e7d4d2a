use crate::error::ApiError;
use crate::extract::CustomerIdHeader;
use crate::server::AppState;
use axum::body::Bytes;
use axum::routing::{get, post};
use axum::{Extension, Json};
use inlet_core::schema::models::FormDefinition;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[tracing::instrument(level = "debug", skip_all)]
pub fn router() -> axum::Router {
    axum::Router::new()
        .route("/forms", post(create_form).get(list_forms))
        .route("/forms/defaults", post(seed_default_forms))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateFormBody {
    form_id: String,
    #[serde(default)]
    form_title: Option<String>,
}

#[tracing::instrument(level = "info", skip_all)]
pub async fn create_form(
    CustomerIdHeader(customer_id): CustomerIdHeader,
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<FormDefinition>, ApiError> {
    let body: CreateFormBody = serde_json::from_slice(&body)
        .map_err(|e| ApiError::InvalidInput(format!("invalid json body: {e}")))?;

    let form = FormDefinition::new(
        customer_id,
        body.form_id,
        body.form_title.unwrap_or_default(),
    )?;
    let form = state.schemas.register_form(form).await?;
    Ok(Json(form))
}

#[derive(Debug, Serialize)]
pub struct FormsResponse {
    pub items: Vec<FormDefinition>,
}

#[tracing::instrument(level = "debug", skip_all)]
pub async fn list_forms(
    CustomerIdHeader(customer_id): CustomerIdHeader,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<FormsResponse>, ApiError> {
    let items = state.schemas.list_forms(&customer_id).await?;
    Ok(Json(FormsResponse { items }))
}

#[tracing::instrument(level = "info", skip_all)]
pub async fn seed_default_forms(
    CustomerIdHeader(customer_id): CustomerIdHeader,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<FormsResponse>, ApiError> {
    let items = state.schemas.register_default_forms(&customer_id).await?;
    Ok(Json(FormsResponse { items }))
}
