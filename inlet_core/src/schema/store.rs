use crate::models::CustomerId;
use crate::schema::models::{FieldSchema, FormDefinition};
use crate::Result;
use async_trait::async_trait;

/// Durable store for per-customer field schemas.
#[async_trait]
pub trait SchemaStore: Send + Sync {
    async fn get(
        &self,
        customer_id: &CustomerId,
        record_type: &str,
    ) -> Result<Option<FieldSchema>>;

    async fn upsert(&self, schema: &FieldSchema) -> Result<()>;
}

/// Durable store for registered form definitions.
#[async_trait]
pub trait FormStore: Send + Sync {
    async fn get(
        &self,
        customer_id: &CustomerId,
        form_id: &str,
    ) -> Result<Option<FormDefinition>>;

    async fn upsert(&self, form: &FormDefinition) -> Result<()>;

    async fn list(&self, customer_id: &CustomerId) -> Result<Vec<FormDefinition>>;
}
