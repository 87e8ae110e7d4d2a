use crate::routes;
use axum::routing::get;
use axum::{Extension, Router};
use inlet_core::records::store::RecordStore;
use inlet_core::schema::registry::SchemaRegistry;
use inlet_core::sync::engine::ImportEngine;
use inlet_core::sync::traits::IntegrationClient;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub records: Arc<dyn RecordStore>,
    pub schemas: SchemaRegistry,
    pub integration_client: Arc<dyn IntegrationClient>,
    pub import_engine: Arc<ImportEngine>,
    pub list_page_size: usize,
    pub started_at: Instant,
}

impl AppState {
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn new(
        records: Arc<dyn RecordStore>,
        schemas: SchemaRegistry,
        integration_client: Arc<dyn IntegrationClient>,
        import_engine: Arc<ImportEngine>,
        list_page_size: usize,
    ) -> Self {
        Self {
            records,
            schemas,
            integration_client,
            import_engine,
            list_page_size,
            started_at: Instant::now(),
        }
    }
}

#[tracing::instrument(level = "debug", skip_all)]
pub fn router(state: AppState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .merge(routes::router())
        .route("/health", get(routes::health::get_health))
        .layer(Extension(state))
        .layer(SetRequestIdLayer::new(
            axum::http::HeaderName::from_static("x-request-id"),
            MakeRequestUuid,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

#[tracing::instrument(level = "info", skip_all)]
pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "inlet server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
