use axum::Router;

pub mod forms;
pub mod health;
pub mod integrations;
pub mod records;
pub mod schema;
pub mod webhooks;

#[tracing::instrument(level = "debug", skip_all)]
pub fn router() -> Router {
    Router::new().nest(
        "/api",
        Router::new()
            .merge(records::router())
            .merge(webhooks::router())
            .merge(schema::router())
            .merge(integrations::router())
            .merge(forms::router()),
    )
}

#[cfg(test)]
mod tests {
    use crate::server::{AppState, router};
    use async_trait::async_trait;
    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use inlet_core::db::connect_in_memory;
    use inlet_core::records::sqlite::SqliteRecordStore;
    use inlet_core::schema::registry::SchemaRegistry;
    use inlet_core::schema::sqlite::SqliteSchemaStore;
    use inlet_core::schema::store::{FormStore, SchemaStore};
    use inlet_core::sync::engine::ImportEngine;
    use inlet_core::sync::traits::{
        ActionDescriptor, Connection, IntegrationClient, IntegrationRef, IntegrationSummary,
        PullPage,
    };
    use inlet_core::{CustomerId, RecordPayload, Result as CoreResult};
    use serde_json::{Value, json};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    /// Scripted platform client: pops one pull page per action run.
    #[derive(Default)]
    struct FakeClient {
        connections: Vec<Connection>,
        action_pages: Mutex<VecDeque<CoreResult<PullPage>>>,
    }

    impl FakeClient {
        fn queue_action(&self, page: PullPage) {
            self.action_pages.lock().expect("lock").push_back(Ok(page));
        }
    }

    #[async_trait]
    impl IntegrationClient for FakeClient {
        async fn list_integrations(
            &self,
            _customer_id: &CustomerId,
        ) -> CoreResult<Vec<IntegrationSummary>> {
            Ok(vec![])
        }

        async fn list_connections(&self, _customer_id: &CustomerId) -> CoreResult<Vec<Connection>> {
            Ok(self.connections.clone())
        }

        async fn list_actions(
            &self,
            _customer_id: &CustomerId,
            _integration_id: &str,
        ) -> CoreResult<Vec<ActionDescriptor>> {
            Ok(vec![])
        }

        async fn ensure_action_instance(
            &self,
            _customer_id: &CustomerId,
            _connection_id: &str,
            _action_key: &str,
        ) -> CoreResult<()> {
            Ok(())
        }

        async fn archive_connection(
            &self,
            _customer_id: &CustomerId,
            _connection_id: &str,
        ) -> CoreResult<()> {
            Ok(())
        }

        async fn run_action(
            &self,
            _customer_id: &CustomerId,
            _connection_id: &str,
            _action_key: &str,
            _instance_key: Option<&str>,
            _cursor: Option<&str>,
        ) -> CoreResult<PullPage> {
            self.action_pages
                .lock()
                .expect("lock")
                .pop_front()
                .unwrap_or_else(|| Ok(PullPage::default()))
        }

        async fn list_data_source(
            &self,
            _customer_id: &CustomerId,
            _connection_id: &str,
            _data_source_key: &str,
            _cursor: Option<&str>,
        ) -> CoreResult<PullPage> {
            Ok(PullPage::default())
        }
    }

    async fn test_router_with(client: Arc<FakeClient>, page_size: usize) -> Router {
        let pool = connect_in_memory().await.expect("pool");
        let records = Arc::new(SqliteRecordStore::new(pool.clone()).await.expect("records"));
        let schema_store = Arc::new(SqliteSchemaStore::new(pool).await.expect("schemas"));
        let schemas: Arc<dyn SchemaStore> = schema_store.clone();
        let forms: Arc<dyn FormStore> = schema_store;

        let engine = Arc::new(ImportEngine::new(client.clone(), records.clone(), 50));
        let state = AppState::new(
            records,
            SchemaRegistry::new(schemas, forms),
            client,
            engine,
            page_size,
        );
        router(state)
    }

    fn connected_client() -> Arc<FakeClient> {
        Arc::new(FakeClient {
            connections: vec![Connection {
                id: "conn-1".to_string(),
                integration: Some(IntegrationRef {
                    id: None,
                    key: "hubspot".to_string(),
                    name: None,
                }),
            }],
            action_pages: Mutex::new(VecDeque::new()),
        })
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("x-customer-id", "cust-1")
            .body(Body::empty())
            .expect("request")
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-customer-id", "cust-1")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    fn delete_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-customer-id", "cust-1")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn pull_page(ids: &[&str], next_cursor: Option<&str>) -> PullPage {
        PullPage {
            records: ids
                .iter()
                .map(|id| {
                    serde_json::from_value::<RecordPayload>(json!({
                        "id": id,
                        "name": format!("Record {id}"),
                    }))
                    .expect("payload")
                })
                .collect(),
            next_cursor: next_cursor.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = test_router_with(connected_client(), 100).await;
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn records_require_customer_identity() {
        let app = test_router_with(connected_client(), 100).await;
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/records?action=get-leads")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn records_require_an_action() {
        let app = test_router_with(connected_client(), 100).await;
        let response = app.oneshot(get("/api/records")).await.expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn custom_form_listing_requires_instance_key() {
        let app = test_router_with(connected_client(), 100).await;
        let response = app
            .oneshot(get("/api/records?action=get-objects"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn import_then_list_roundtrip() {
        let client = connected_client();
        client.queue_action(pull_page(&["r1", "r2"], None));
        let app = test_router_with(client, 100).await;

        let response = app
            .clone()
            .oneshot(get("/api/records/import?action=get-leads"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["recordsCount"], json!(2));
        assert_eq!(body["newRecordsCount"], json!(2));
        assert_eq!(body["existingRecordsCount"], json!(0));

        let response = app
            .oneshot(get("/api/records?action=get-leads"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let records = body["records"].as_array().expect("records array");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["integrationKey"], json!("hubspot"));
        assert!(body.get("cursor").is_none());
    }

    #[tokio::test]
    async fn import_without_connection_is_not_found() {
        let client = Arc::new(FakeClient::default());
        let app = test_router_with(client, 100).await;
        let response = app
            .oneshot(get("/api/records/import?action=get-leads"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_cursor_walk_over_http() {
        let client = connected_client();
        client.queue_action(pull_page(&["r1", "r2", "r3", "r4", "r5"], None));
        let app = test_router_with(client, 2).await;

        let response = app
            .clone()
            .oneshot(get("/api/records/import?action=get-leads"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let mut seen = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let uri = match &cursor {
                Some(c) => format!("/api/records?action=get-leads&cursor={c}"),
                None => "/api/records?action=get-leads".to_string(),
            };
            let body = body_json(
                app.clone()
                    .oneshot(get(&uri))
                    .await
                    .expect("response"),
            )
            .await;
            for record in body["records"].as_array().expect("records") {
                seen.push(record["id"].as_str().expect("id").to_string());
            }
            match body.get("cursor").and_then(Value::as_str) {
                Some(next) => cursor = Some(next.to_string()),
                None => break,
            }
        }

        assert_eq!(seen, vec!["r1", "r2", "r3", "r4", "r5"]);
    }

    #[tokio::test]
    async fn webhook_upsert_statuses() {
        let app = test_router_with(connected_client(), 100).await;
        let payload = json!({
            "customerId": "cust-1",
            "recordType": "get-leads",
            "integrationKey": "hubspot",
            "data": { "id": "r1", "name": "Alice", "fields": { "industry": "Tech" } },
        });

        let body = body_json(
            app.clone()
                .oneshot(post_json("/api/webhooks", payload.clone()))
                .await
                .expect("response"),
        )
        .await;
        assert_eq!(body["status"], json!("created"));
        assert_eq!(body["recordId"], json!("r1"));

        let body = body_json(
            app.clone()
                .oneshot(post_json("/api/webhooks", payload))
                .await
                .expect("response"),
        )
        .await;
        assert_eq!(body["status"], json!("unchanged"));

        let changed = json!({
            "customerId": "cust-1",
            "recordType": "get-leads",
            "integrationKey": "hubspot",
            "data": { "id": "r1", "name": "Alice Cooper", "fields": { "industry": "Tech" } },
        });
        let body = body_json(
            app.oneshot(post_json("/api/webhooks", changed))
                .await
                .expect("response"),
        )
        .await;
        assert_eq!(body["status"], json!("updated"));
    }

    #[tokio::test]
    async fn webhook_resolves_integration_key_from_connection_metadata() {
        let app = test_router_with(connected_client(), 100).await;
        let payload = json!({
            "customerId": "cust-1",
            "recordType": "get-leads",
            "connection": { "integration": { "key": "salesforce" } },
            "data": { "id": "r9" },
        });

        let body = body_json(
            app.oneshot(post_json("/api/webhooks", payload))
                .await
                .expect("response"),
        )
        .await;
        assert_eq!(body["integrationKey"], json!("salesforce"));
    }

    #[tokio::test]
    async fn webhook_missing_fields_is_bad_request() {
        let app = test_router_with(connected_client(), 100).await;
        let payload = json!({
            "recordType": "get-leads",
            "data": { "id": "r1" },
        });

        let response = app
            .oneshot(post_json("/api/webhooks", payload))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn schema_flow_gates_on_form_then_edits() {
        let app = test_router_with(connected_client(), 100).await;

        // No form registered yet: 404.
        let response = app
            .clone()
            .oneshot(get("/api/schema/AI_Engagement_Conversation__c/cust-1"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // Seed the default forms, then the schema materializes lazily.
        let response = app
            .clone()
            .oneshot(post_json("/api/forms/defaults", json!({})))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(
            app.clone()
                .oneshot(get("/api/schema/AI_Engagement_Conversation__c/cust-1"))
                .await
                .expect("response"),
        )
        .await;
        assert_eq!(body["schema"]["type"], json!("object"));
        assert!(body["schema"]["properties"]["Lead__c"].is_object());

        // Select without options is rejected.
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/schema/AI_Engagement_Conversation__c/cust-1",
                json!({ "field": { "name": "Stage__c", "title": "Stage", "type": "select" } }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Adding a select with options lowers to string + enum.
        let body = body_json(
            app.clone()
                .oneshot(post_json(
                    "/api/schema/AI_Engagement_Conversation__c/cust-1",
                    json!({ "field": {
                        "name": "Stage__c",
                        "title": "Stage",
                        "type": "select",
                        "enum": ["Open", "Closed"],
                    } }),
                ))
                .await
                .expect("response"),
        )
        .await;
        assert_eq!(
            body["schema"]["properties"]["Stage__c"]["enum"],
            json!(["Open", "Closed"])
        );

        // Core default fields cannot be deleted.
        let response = app
            .clone()
            .oneshot(delete_json(
                "/api/schema/AI_Engagement_Conversation__c/cust-1",
                json!({ "fieldName": "Email__c" }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Custom fields can.
        let body = body_json(
            app.oneshot(delete_json(
                "/api/schema/AI_Engagement_Conversation__c/cust-1",
                json!({ "fieldName": "Stage__c" }),
            ))
            .await
            .expect("response"),
        )
        .await;
        assert!(body["schema"]["properties"].get("Stage__c").is_none());
    }
}
