use crate::models::CustomerId;
use crate::records::models::RecordPayload;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Reference to the integration behind a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// An authorized link between a customer and one external integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration: Option<IntegrationRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRef {
    pub id: String,
}

/// An integration as listed by the platform, with its connection when one
/// exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationSummary {
    pub id: String,
    pub key: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnectionRef>,
}

/// A named operation exposed by an integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One page pulled from the platform.
#[derive(Debug, Clone, Default)]
pub struct PullPage {
    pub records: Vec<RecordPayload>,
    /// Opaque cursor for the next page; `None` when exhausted.
    pub next_cursor: Option<String>,
}

/// Client for the hosted integration platform.
///
/// The platform's internals are opaque; implementations live in
/// `inlet_integrations` (or test code) and normalize its response shapes
/// before records reach the engine.
#[async_trait]
pub trait IntegrationClient: Send + Sync {
    async fn list_integrations(&self, customer_id: &CustomerId)
    -> Result<Vec<IntegrationSummary>>;

    async fn list_connections(&self, customer_id: &CustomerId) -> Result<Vec<Connection>>;

    async fn list_actions(
        &self,
        customer_id: &CustomerId,
        integration_id: &str,
    ) -> Result<Vec<ActionDescriptor>>;

    /// Fetch (auto-creating when absent) the per-connection instance of an
    /// action.
    async fn ensure_action_instance(
        &self,
        customer_id: &CustomerId,
        connection_id: &str,
        action_key: &str,
    ) -> Result<()>;

    /// Archive a connection (disconnect).
    async fn archive_connection(
        &self,
        customer_id: &CustomerId,
        connection_id: &str,
    ) -> Result<()>;

    /// Primary read path: run an action against a connection.
    async fn run_action(
        &self,
        customer_id: &CustomerId,
        connection_id: &str,
        action_key: &str,
        instance_key: Option<&str>,
        cursor: Option<&str>,
    ) -> Result<PullPage>;

    /// Alternate read path: list a data source directly.
    async fn list_data_source(
        &self,
        customer_id: &CustomerId,
        connection_id: &str,
        data_source_key: &str,
        cursor: Option<&str>,
    ) -> Result<PullPage>;
}
