use crate::models::CustomerId;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A stored field descriptor, JSON-Schema flavored:
/// `{type, title, format?, enum?, default?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldProperty {
    #[serde(rename = "type")]
    pub type_name: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl FieldProperty {
    /// Drop degenerate values (empty enum lists) so serialized schemas stay
    /// clean.
    pub fn normalized(mut self) -> Self {
        if self.options.as_ref().is_some_and(|opts| opts.is_empty()) {
            self.options = None;
        }
        self
    }
}

/// The kind of a field as requested by the editor.
///
/// Select carries its options; everything else lowers to a string type with
/// an optional format. Kinds this editor does not know pass through with
/// their type name intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Phone,
    Currency,
    Date,
    Select { options: Vec<String> },
    Other(String),
}

impl FieldKind {
    pub fn parse(type_name: &str, options: Option<Vec<String>>) -> Result<Self> {
        let type_name = type_name.trim();
        if type_name.is_empty() {
            return Err(Error::InvalidInput("field type is empty".to_string()));
        }

        match type_name {
            "select" => {
                let options = options.unwrap_or_default();
                if options.is_empty() {
                    return Err(Error::InvalidInput(
                        "select fields must have options".to_string(),
                    ));
                }
                Ok(FieldKind::Select { options })
            }
            "email" => Ok(FieldKind::Email),
            "phone" => Ok(FieldKind::Phone),
            "currency" => Ok(FieldKind::Currency),
            "date" => Ok(FieldKind::Date),
            "string" | "text" => Ok(FieldKind::Text),
            other => Ok(FieldKind::Other(other.to_string())),
        }
    }

    pub fn to_property(&self, title: impl Into<String>, default: Option<String>) -> FieldProperty {
        let title = title.into();
        let (type_name, format, options) = match self {
            FieldKind::Text => ("string".to_string(), None, None),
            FieldKind::Email => ("string".to_string(), Some("email".to_string()), None),
            FieldKind::Phone => ("string".to_string(), Some("phone".to_string()), None),
            FieldKind::Currency => ("string".to_string(), Some("currency".to_string()), None),
            FieldKind::Date => ("string".to_string(), Some("date".to_string()), None),
            FieldKind::Select { options } => {
                ("string".to_string(), None, Some(options.clone()))
            }
            FieldKind::Other(name) => (name.clone(), None, None),
        };

        FieldProperty {
            type_name,
            title,
            format,
            options,
            default,
        }
        .normalized()
    }
}

/// An add-field request from the editor.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub title: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "enum")]
    pub options: Option<Vec<String>>,
    pub default: Option<String>,
}

/// Per-customer, per-record-type dynamic field schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub customer_id: CustomerId,
    pub record_type: String,
    pub properties: BTreeMap<String, FieldProperty>,
    pub required: Vec<String>,
}

impl FieldSchema {
    /// The `{type: "object", properties, required}` wire form.
    pub fn to_object_schema(&self) -> serde_json::Value {
        let properties: BTreeMap<&String, FieldProperty> = self
            .properties
            .iter()
            .map(|(name, prop)| (name, prop.clone().normalized()))
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": self.required,
        })
    }
}

/// A registered form gating schema reads and mutations for a record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDefinition {
    pub customer_id: CustomerId,
    pub form_id: String,
    pub form_title: String,
}

impl FormDefinition {
    #[tracing::instrument(level = "debug")]
    pub fn new(
        customer_id: CustomerId,
        form_id: impl Into<String> + std::fmt::Debug,
        form_title: impl Into<String> + std::fmt::Debug,
    ) -> Result<Self> {
        let form_id = form_id.into();
        if form_id.trim().is_empty() {
            return Err(Error::InvalidInput("form_id is empty".to_string()));
        }
        let form_title = form_title.into();
        let form_title = if form_title.trim().is_empty() {
            form_id.clone()
        } else {
            form_title
        };
        Ok(Self {
            customer_id,
            form_id,
            form_title,
        })
    }
}
