use crate::error::ApiError;
use crate::extract::CustomerIdHeader;
use crate::server::AppState;
use axum::extract::Path;
use axum::routing::{delete, get, post};
use axum::{Extension, Json};
use inlet_core::Error as CoreError;
use inlet_core::sync::traits::{Connection, IntegrationSummary};
use serde::Serialize;
use std::sync::Arc;

#[tracing::instrument(level = "debug", skip_all)]
pub fn router() -> axum::Router {
    axum::Router::new()
        .route("/integrations", get(list_integrations))
        .route("/integrations/{key}/sync-actions", post(sync_actions))
        .route("/connections", get(list_connections))
        .route("/connections/{id}", delete(disconnect))
}

#[derive(Debug, Serialize)]
pub struct IntegrationsResponse {
    pub items: Vec<IntegrationSummary>,
}

#[tracing::instrument(level = "debug", skip_all)]
pub async fn list_integrations(
    CustomerIdHeader(customer_id): CustomerIdHeader,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<IntegrationsResponse>, ApiError> {
    let items = state
        .integration_client
        .list_integrations(&customer_id)
        .await?;
    Ok(Json(IntegrationsResponse { items }))
}

#[derive(Debug, Serialize)]
pub struct ConnectionsResponse {
    pub items: Vec<Connection>,
}

#[tracing::instrument(level = "debug", skip_all)]
pub async fn list_connections(
    CustomerIdHeader(customer_id): CustomerIdHeader,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<ConnectionsResponse>, ApiError> {
    let items = state
        .integration_client
        .list_connections(&customer_id)
        .await?;
    Ok(Json(ConnectionsResponse { items }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncActionsResponse {
    pub integration_key: String,
    pub actions_found: usize,
    pub instances_created: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// Ensure a per-connection instance of every action the integration exposes.
/// Failures are accounted per action, not fatal for the batch.
#[tracing::instrument(level = "info", skip_all, fields(integration = %key))]
pub async fn sync_actions(
    CustomerIdHeader(customer_id): CustomerIdHeader,
    Extension(state): Extension<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<SyncActionsResponse>, ApiError> {
    let integrations = state
        .integration_client
        .list_integrations(&customer_id)
        .await?;
    let integration = integrations
        .into_iter()
        .find(|integration| integration.key == key)
        .ok_or_else(|| {
            ApiError::Core(CoreError::NotFound(format!(
                "integration '{key}' not found"
            )))
        })?;

    let connection = integration.connection.as_ref().ok_or_else(|| {
        ApiError::Core(CoreError::NotFound(format!(
            "no connection found for integration: {key}"
        )))
    })?;

    let actions = state
        .integration_client
        .list_actions(&customer_id, &integration.id)
        .await?;

    let mut created = 0usize;
    let mut failed = 0usize;
    let mut errors = Vec::new();
    for action in &actions {
        match state
            .integration_client
            .ensure_action_instance(&customer_id, &connection.id, &action.key)
            .await
        {
            Ok(()) => created += 1,
            Err(e) => {
                tracing::warn!(action = %action.key, error = %e, "failed to create action instance");
                failed += 1;
                errors.push(format!("{}: {e}", action.key));
            }
        }
    }

    Ok(Json(SyncActionsResponse {
        integration_key: key,
        actions_found: actions.len(),
        instances_created: created,
        failed,
        errors,
    }))
}

#[derive(Debug, Serialize)]
pub struct DisconnectResponse {
    pub success: bool,
}

#[tracing::instrument(level = "info", skip_all, fields(connection = %id))]
pub async fn disconnect(
    CustomerIdHeader(customer_id): CustomerIdHeader,
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DisconnectResponse>, ApiError> {
    state
        .integration_client
        .archive_connection(&customer_id, &id)
        .await?;
    Ok(Json(DisconnectResponse { success: true }))
}
