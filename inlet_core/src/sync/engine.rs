use crate::models::CustomerId;
use crate::records::store::RecordStore;
use crate::sync::actions::{data_source_key, resolve_record_type};
use crate::sync::traits::{Connection, IntegrationClient, PullPage};
use crate::{Error, Result};
use serde::Serialize;
use std::sync::Arc;

/// One import request, as resolved from the HTTP surface.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub customer_id: CustomerId,
    pub action_key: String,
    pub instance_key: Option<String>,
    pub integration_key: Option<String>,
}

/// Accounting for a completed import run.
///
/// Invariant: `new_records_count + existing_records_count == records_count`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub records_count: u64,
    pub new_records_count: u64,
    pub existing_records_count: u64,
    pub pages_fetched: u32,
}

/// Pulls records from the integration platform page by page and persists
/// them with natural-key dedup.
pub struct ImportEngine {
    client: Arc<dyn IntegrationClient>,
    store: Arc<dyn RecordStore>,
    max_pages: usize,
}

impl ImportEngine {
    pub fn new(
        client: Arc<dyn IntegrationClient>,
        store: Arc<dyn RecordStore>,
        max_pages: usize,
    ) -> Self {
        Self {
            client,
            store,
            max_pages: max_pages.max(1),
        }
    }

    /// Pick the target connection: the one matching the requested integration
    /// key, else the first available.
    fn pick_connection<'a>(
        connections: &'a [Connection],
        integration_key: Option<&str>,
    ) -> Option<&'a Connection> {
        if let Some(key) = integration_key {
            if let Some(found) = connections.iter().find(|conn| {
                conn.integration
                    .as_ref()
                    .is_some_and(|integration| integration.key == key)
            }) {
                return Some(found);
            }
        }
        connections.first()
    }

    /// Primary read path with the data-source fallback. When both paths fail
    /// the original (primary) error is surfaced.
    #[tracing::instrument(level = "debug", skip(self))]
    async fn fetch_page(
        &self,
        customer_id: &CustomerId,
        connection_id: &str,
        action_key: &str,
        instance_key: Option<&str>,
        cursor: Option<&str>,
    ) -> Result<PullPage> {
        let primary_err = match self
            .client
            .run_action(customer_id, connection_id, action_key, instance_key, cursor)
            .await
        {
            Ok(page) => return Ok(page),
            Err(e) => e,
        };

        tracing::warn!(action_key, error = %primary_err, "action run failed, trying data source path");

        let Some(ds_key) = data_source_key(action_key, instance_key) else {
            return Err(primary_err);
        };

        match self
            .client
            .list_data_source(customer_id, connection_id, &ds_key, cursor)
            .await
        {
            Ok(page) => {
                tracing::info!(data_source = %ds_key, "data source fallback succeeded");
                Ok(page)
            }
            Err(fallback_err) => {
                tracing::warn!(data_source = %ds_key, error = %fallback_err, "data source fallback also failed");
                Err(primary_err)
            }
        }
    }

    #[tracing::instrument(level = "info", skip(self, request), fields(action = %request.action_key))]
    pub async fn run(&self, request: &ImportRequest) -> Result<ImportOutcome> {
        let record_type =
            resolve_record_type(&request.action_key, request.instance_key.as_deref())?;

        let connections = self.client.list_connections(&request.customer_id).await?;
        let target = Self::pick_connection(&connections, request.integration_key.as_deref())
            .ok_or_else(|| match &request.integration_key {
                Some(key) => {
                    Error::NotFound(format!("no connection found for integration: {key}"))
                }
                None => Error::NotFound("no connection found".to_string()),
            })?;

        let integration_key = request.integration_key.clone().or_else(|| {
            target
                .integration
                .as_ref()
                .map(|integration| integration.key.clone())
        });
        if integration_key.is_none() {
            tracing::warn!(connection_id = %target.id, "no integration key available for imported records");
        }

        let mut outcome = ImportOutcome::default();
        let mut cursor: Option<String> = None;

        loop {
            let page = self
                .fetch_page(
                    &request.customer_id,
                    &target.id,
                    &request.action_key,
                    request.instance_key.as_deref(),
                    cursor.as_deref(),
                )
                .await?;
            outcome.pages_fetched += 1;

            for payload in page.records {
                if payload.record_id().is_none() {
                    tracing::warn!(record_type = %record_type, "skipping record without a usable id");
                    continue;
                }
                let record = payload.into_record(
                    request.customer_id.clone(),
                    record_type.clone(),
                    integration_key.clone(),
                )?;

                outcome.records_count += 1;
                if self.store.insert_if_absent(&record).await? {
                    outcome.new_records_count += 1;
                } else {
                    outcome.existing_records_count += 1;
                }
            }

            cursor = page
                .next_cursor
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty());
            if cursor.is_none() {
                break;
            }
            if outcome.pages_fetched as usize >= self.max_pages {
                tracing::warn!(
                    max_pages = self.max_pages,
                    "import stopped at page bound with a cursor remaining"
                );
                break;
            }
        }

        tracing::info!(
            records = outcome.records_count,
            new = outcome.new_records_count,
            existing = outcome.existing_records_count,
            pages = outcome.pages_fetched,
            "import completed"
        );
        Ok(outcome)
    }
}
