//! Inlet core library: record store, schema registry, and the import engine.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod o11y;
pub mod records;
pub mod schema;
pub mod sync;

pub use config::{InletConfig, PlatformConfig};
pub use error::{Error, Result};
pub use models::CustomerId;
pub use records::models::{
    Record, RecordPage, RecordPayload, RecordQuery, UpsertOutcome, UpsertStatus,
};
pub use records::store::RecordStore;
pub use schema::models::{FieldKind, FieldProperty, FieldSchema, FieldSpec, FormDefinition};
pub use schema::registry::SchemaRegistry;
pub use sync::engine::{ImportEngine, ImportOutcome, ImportRequest};
pub use sync::traits::{
    ActionDescriptor, Connection, ConnectionRef, IntegrationClient, IntegrationRef,
    IntegrationSummary, PullPage,
};
