//! Hosted integration platform client.
//!
//! Speaks the platform's JSON API on behalf of one workspace: connections,
//! integrations, actions, action runs, and the alternate data-source read
//! path. Action-run responses are not shape-stable across integrations, so
//! every pull goes through `normalize_pull_page` before records reach the
//! engine.

use async_trait::async_trait;
use inlet_core::models::CustomerId;
use inlet_core::records::models::RecordPayload;
use inlet_core::sync::traits::{
    ActionDescriptor, Connection, IntegrationClient, IntegrationSummary, PullPage,
};
use inlet_core::{Error, PlatformConfig, Result};
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

#[derive(Debug, Deserialize)]
struct ItemsResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Clone)]
pub struct PlatformClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl PlatformClient {
    pub fn new(cfg: &PlatformConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(Error::backend_reqwest)?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
        })
    }

    fn request(&self, method: Method, path: &str, customer_id: &CustomerId) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self
            .client
            .request(method, url)
            .header("x-customer-id", customer_id.as_str());
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        req
    }

    async fn send_json(&self, req: RequestBuilder, path: &str) -> Result<Value> {
        let resp = req.send().await.map_err(Error::backend_reqwest)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::BackendMessage(format!(
                "platform {path} returned {status}"
            )));
        }
        resp.json().await.map_err(Error::backend_reqwest)
    }
}

#[async_trait]
impl IntegrationClient for PlatformClient {
    #[instrument(level = "debug", skip(self))]
    async fn list_integrations(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<IntegrationSummary>> {
        let value = self
            .send_json(
                self.request(Method::GET, "/integrations", customer_id),
                "/integrations",
            )
            .await?;
        let parsed: ItemsResponse<IntegrationSummary> =
            serde_json::from_value(value).map_err(|e| Error::backend("parse integrations", e))?;
        Ok(parsed.items)
    }

    #[instrument(level = "debug", skip(self))]
    async fn list_connections(&self, customer_id: &CustomerId) -> Result<Vec<Connection>> {
        let value = self
            .send_json(
                self.request(Method::GET, "/connections", customer_id),
                "/connections",
            )
            .await?;
        let parsed: ItemsResponse<Connection> =
            serde_json::from_value(value).map_err(|e| Error::backend("parse connections", e))?;
        Ok(parsed.items)
    }

    #[instrument(level = "debug", skip(self))]
    async fn list_actions(
        &self,
        customer_id: &CustomerId,
        integration_id: &str,
    ) -> Result<Vec<ActionDescriptor>> {
        let path = "/actions";
        let value = self
            .send_json(
                self.request(Method::GET, path, customer_id)
                    .query(&[("integrationId", integration_id)]),
                path,
            )
            .await?;
        let parsed: ItemsResponse<ActionDescriptor> =
            serde_json::from_value(value).map_err(|e| Error::backend("parse actions", e))?;
        Ok(parsed.items)
    }

    #[instrument(level = "debug", skip(self))]
    async fn ensure_action_instance(
        &self,
        customer_id: &CustomerId,
        connection_id: &str,
        action_key: &str,
    ) -> Result<()> {
        let path = format!("/connections/{connection_id}/actions/{action_key}");
        self.send_json(
            self.request(Method::GET, &path, customer_id)
                .query(&[("autoCreate", "true")]),
            &path,
        )
        .await?;
        Ok(())
    }

    #[instrument(level = "info", skip(self))]
    async fn archive_connection(
        &self,
        customer_id: &CustomerId,
        connection_id: &str,
    ) -> Result<()> {
        let path = format!("/connections/{connection_id}/archive");
        self.send_json(self.request(Method::POST, &path, customer_id), &path)
            .await?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    async fn run_action(
        &self,
        customer_id: &CustomerId,
        connection_id: &str,
        action_key: &str,
        instance_key: Option<&str>,
        cursor: Option<&str>,
    ) -> Result<PullPage> {
        let path = format!("/connections/{connection_id}/actions/{action_key}/run");
        let body = serde_json::json!({
            "instanceKey": instance_key,
            "input": { "cursor": cursor },
        });
        let value = self
            .send_json(
                self.request(Method::POST, &path, customer_id).json(&body),
                &path,
            )
            .await?;
        Ok(normalize_pull_page(value))
    }

    #[instrument(level = "debug", skip(self))]
    async fn list_data_source(
        &self,
        customer_id: &CustomerId,
        connection_id: &str,
        data_source_key: &str,
        cursor: Option<&str>,
    ) -> Result<PullPage> {
        let path = format!("/connections/{connection_id}/data-sources/{data_source_key}/list");
        let body = serde_json::json!({ "cursor": cursor });
        let value = self
            .send_json(
                self.request(Method::POST, &path, customer_id).json(&body),
                &path,
            )
            .await?;
        Ok(normalize_pull_page(value))
    }
}

/// Normalize the platform's inconsistent pull shapes into one page.
///
/// Records live at `output.records`, at `records`, or the payload is itself
/// an array; the cursor at `output.cursor` or `cursor` (string or number).
/// Anything else normalizes to an empty page.
pub fn normalize_pull_page(value: Value) -> PullPage {
    let records_value = value
        .pointer("/output/records")
        .or_else(|| value.get("records"))
        .cloned()
        .or_else(|| value.as_array().map(|_| value.clone()));

    let records = match records_value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<RecordPayload>(item) {
                Ok(payload) => Some(payload),
                Err(e) => {
                    tracing::warn!(error = %e, "dropping malformed record in pull response");
                    None
                }
            })
            .collect(),
        Some(other) => {
            tracing::warn!(shape = %value_shape(&other), "unexpected records shape in pull response");
            Vec::new()
        }
        None => {
            tracing::warn!(shape = %value_shape(&value), "unexpected pull response shape");
            Vec::new()
        }
    };

    let next_cursor = value
        .pointer("/output/cursor")
        .or_else(|| value.get("cursor"))
        .and_then(cursor_to_string);

    PullPage {
        records,
        next_cursor,
    }
}

fn cursor_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() { None } else { Some(s.to_string()) }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
