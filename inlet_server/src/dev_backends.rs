//! Backend wiring for a single-node deployment: one SQLite file for records,
//! schemas, and forms, plus the hosted platform client.

use crate::server::AppState;
use inlet_core::InletConfig;
use inlet_core::db;
use inlet_core::records::sqlite::SqliteRecordStore;
use inlet_core::schema::registry::SchemaRegistry;
use inlet_core::schema::sqlite::SqliteSchemaStore;
use inlet_core::schema::store::{FormStore, SchemaStore};
use inlet_core::sync::engine::ImportEngine;
use inlet_core::sync::traits::IntegrationClient;
use inlet_integrations::PlatformClient;
use std::path::PathBuf;
use std::sync::Arc;

#[tracing::instrument(level = "info", skip_all)]
pub async fn build_state(data_dir: PathBuf) -> anyhow::Result<AppState> {
    let mut cfg = InletConfig::from_env()?;
    cfg.data_dir = data_dir;

    let store_path = cfg.store_path();
    tracing::info!(path = %store_path.display(), "opening sqlite store");
    let pool = db::connect(&store_path).await?;

    let records = Arc::new(SqliteRecordStore::new(pool.clone()).await?);
    let schema_store = Arc::new(SqliteSchemaStore::new(pool).await?);
    let schemas: Arc<dyn SchemaStore> = schema_store.clone();
    let forms: Arc<dyn FormStore> = schema_store;

    let client: Arc<dyn IntegrationClient> = Arc::new(PlatformClient::new(&cfg.platform)?);
    if cfg.platform.api_key.is_none() {
        tracing::warn!("INLET_PLATFORM_API_KEY is not set; platform calls will be unauthenticated");
    }

    let import_engine = Arc::new(ImportEngine::new(
        client.clone(),
        records.clone(),
        cfg.import_max_pages,
    ));

    Ok(AppState::new(
        records,
        SchemaRegistry::new(schemas, forms),
        client,
        import_engine,
        cfg.list_page_size,
    ))
}
