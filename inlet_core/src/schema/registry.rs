use crate::models::CustomerId;
use crate::schema::defaults::{default_forms, default_schema, protected_fields};
use crate::schema::models::{FieldKind, FieldSchema, FieldSpec, FormDefinition};
use crate::schema::store::{FormStore, SchemaStore};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Schema editing rules on top of the stores: form-existence gating, lazy
/// seeding from the hardcoded defaults, and the protected-field set.
#[derive(Clone)]
pub struct SchemaRegistry {
    schemas: Arc<dyn SchemaStore>,
    forms: Arc<dyn FormStore>,
}

impl SchemaRegistry {
    pub fn new(schemas: Arc<dyn SchemaStore>, forms: Arc<dyn FormStore>) -> Self {
        Self { schemas, forms }
    }

    /// Every schema operation is gated on a registered form for the record
    /// type.
    #[tracing::instrument(level = "debug", skip(self))]
    async fn require_form(&self, customer_id: &CustomerId, record_type: &str) -> Result<()> {
        let form = self.forms.get(customer_id, record_type).await?;
        if form.is_none() {
            return Err(Error::NotFound(format!(
                "form '{record_type}' not found"
            )));
        }
        Ok(())
    }

    fn seeded(customer_id: &CustomerId, record_type: &str) -> FieldSchema {
        let (properties, required) = match default_schema(record_type) {
            Some(defaults) => (defaults.properties, defaults.required),
            None => (BTreeMap::new(), Vec::new()),
        };
        FieldSchema {
            customer_id: customer_id.clone(),
            record_type: record_type.to_string(),
            properties,
            required,
        }
    }

    /// Fetch the schema, materializing it from the defaults on first touch.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get_or_seed(
        &self,
        customer_id: &CustomerId,
        record_type: &str,
    ) -> Result<FieldSchema> {
        self.require_form(customer_id, record_type).await?;

        if let Some(schema) = self.schemas.get(customer_id, record_type).await? {
            return Ok(schema);
        }

        let schema = Self::seeded(customer_id, record_type);
        self.schemas.upsert(&schema).await?;
        Ok(schema)
    }

    /// Add (or replace) a field.
    #[tracing::instrument(level = "info", skip(self, spec), fields(field = %spec.name))]
    pub async fn add_field(
        &self,
        customer_id: &CustomerId,
        record_type: &str,
        spec: FieldSpec,
    ) -> Result<FieldSchema> {
        let name = spec.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::InvalidInput("field name is empty".to_string()));
        }
        if spec.title.trim().is_empty() {
            return Err(Error::InvalidInput("field title is empty".to_string()));
        }
        let kind = FieldKind::parse(&spec.type_name, spec.options.clone())?;

        let mut schema = self.get_or_seed(customer_id, record_type).await?;
        schema
            .properties
            .insert(name.clone(), kind.to_property(spec.title.trim(), spec.default));

        if spec.required && !schema.required.contains(&name) {
            schema.required.push(name);
        }

        self.schemas.upsert(&schema).await?;
        Ok(schema)
    }

    /// Remove a field. Fields from the record type's default schema are
    /// protected and cannot be removed, whether or not they are required.
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn remove_field(
        &self,
        customer_id: &CustomerId,
        record_type: &str,
        field_name: &str,
    ) -> Result<FieldSchema> {
        self.require_form(customer_id, record_type).await?;

        let mut schema = self
            .schemas
            .get(customer_id, record_type)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!("schema '{record_type}' not found"))
            })?;

        if protected_fields(record_type)
            .iter()
            .any(|core| core == field_name)
        {
            return Err(Error::InvalidInput(format!(
                "cannot delete core field '{field_name}' from the {record_type} schema"
            )));
        }

        schema.properties.remove(field_name);
        schema.required.retain(|name| name != field_name);

        self.schemas.upsert(&schema).await?;
        Ok(schema)
    }

    /// Register or update a form definition.
    #[tracing::instrument(level = "info", skip(self, form), fields(form_id = %form.form_id))]
    pub async fn register_form(&self, form: FormDefinition) -> Result<FormDefinition> {
        self.forms.upsert(&form).await?;
        Ok(form)
    }

    /// Register the default forms for a customer. Idempotent.
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn register_default_forms(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<FormDefinition>> {
        let mut out = Vec::new();
        for (form_id, form_title) in default_forms() {
            let form = FormDefinition::new(customer_id.clone(), form_id, form_title)?;
            self.forms.upsert(&form).await?;
            out.push(form);
        }
        Ok(out)
    }

    /// List the customer's registered forms.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn list_forms(&self, customer_id: &CustomerId) -> Result<Vec<FormDefinition>> {
        self.forms.list(customer_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;
    use crate::schema::sqlite::SqliteSchemaStore;

    async fn registry() -> SchemaRegistry {
        let pool = connect_in_memory().await.expect("pool");
        let store = Arc::new(SqliteSchemaStore::new(pool).await.expect("store"));
        SchemaRegistry::new(store.clone(), store)
    }

    fn customer() -> CustomerId {
        "cust-1".parse().expect("customer id")
    }

    async fn with_default_forms(registry: &SchemaRegistry) {
        registry
            .register_default_forms(&customer())
            .await
            .expect("default forms");
    }

    fn field(name: &str, type_name: &str, options: Option<Vec<String>>) -> FieldSpec {
        FieldSpec {
            name: name.to_string(),
            title: name.to_string(),
            type_name: type_name.to_string(),
            required: false,
            options,
            default: None,
        }
    }

    #[tokio::test]
    async fn schema_requires_registered_form() {
        let registry = registry().await;
        let err = registry
            .get_or_seed(&customer(), "contacts")
            .await
            .expect_err("no form registered");
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn first_read_seeds_from_defaults() {
        let registry = registry().await;
        with_default_forms(&registry).await;

        let schema = registry
            .get_or_seed(&customer(), "leads")
            .await
            .expect("seeded");
        assert!(schema.properties.contains_key("Id"));
        assert_eq!(schema.required, vec!["Id".to_string()]);

        // Second read returns the stored schema, not a fresh seed.
        let again = registry
            .get_or_seed(&customer(), "leads")
            .await
            .expect("stored");
        assert_eq!(schema, again);
    }

    #[tokio::test]
    async fn select_field_without_options_is_rejected() {
        let registry = registry().await;
        with_default_forms(&registry).await;

        let err = registry
            .add_field(&customer(), "leads", field("Stage__c", "select", None))
            .await
            .expect_err("select without options");
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = registry
            .add_field(
                &customer(),
                "leads",
                field("Stage__c", "select", Some(vec![])),
            )
            .await
            .expect_err("select with empty options");
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn add_field_lowers_kind_and_dedups_required() {
        let registry = registry().await;
        with_default_forms(&registry).await;

        let mut spec = field("Contact_Email__c", "email", None);
        spec.required = true;

        let schema = registry
            .add_field(&customer(), "leads", spec.clone())
            .await
            .expect("add");
        let prop = schema.properties.get("Contact_Email__c").expect("present");
        assert_eq!(prop.type_name, "string");
        assert_eq!(prop.format.as_deref(), Some("email"));

        // Adding the same required field twice must not duplicate it.
        let schema = registry
            .add_field(&customer(), "leads", spec)
            .await
            .expect("re-add");
        let count = schema
            .required
            .iter()
            .filter(|name| *name == "Contact_Email__c")
            .count();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn deleting_core_field_is_rejected_regardless_of_required() {
        let registry = registry().await;
        with_default_forms(&registry).await;
        registry
            .get_or_seed(&customer(), "AI_Engagement_Conversation__c")
            .await
            .expect("seed");

        // Email__c is a core default field but not in `required`.
        let err = registry
            .remove_field(&customer(), "AI_Engagement_Conversation__c", "Email__c")
            .await
            .expect_err("core field");
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn deleting_custom_field_also_drops_it_from_required() {
        let registry = registry().await;
        with_default_forms(&registry).await;

        let mut spec = field("Region__c", "string", None);
        spec.required = true;
        registry
            .add_field(&customer(), "leads", spec)
            .await
            .expect("add");

        let schema = registry
            .remove_field(&customer(), "leads", "Region__c")
            .await
            .expect("remove");
        assert!(!schema.properties.contains_key("Region__c"));
        assert!(!schema.required.iter().any(|name| name == "Region__c"));
    }

    #[tokio::test]
    async fn remove_field_without_stored_schema_is_not_found() {
        let registry = registry().await;
        with_default_forms(&registry).await;

        let err = registry
            .remove_field(&customer(), "leads", "Whatever__c")
            .await
            .expect_err("no stored schema yet");
        assert!(matches!(err, Error::NotFound(_)));
    }
}
