//! Raw catalog config types, deserialized from JSON (built-in catalog or `RESOURCES_PATH`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    /// Reference to another record's id.
    Id,
    Array,
    Object,
    /// Epoch milliseconds.
    Timestamp,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Id => "id",
            FieldKind::Array => "array",
            FieldKind::Object => "object",
            FieldKind::Timestamp => "timestamp",
        }
    }

    /// Whether a JSON value fits this kind. Null always fits (it clears the field).
    pub fn accepts(&self, v: &Value) -> bool {
        match (self, v) {
            (_, Value::Null) => true,
            (FieldKind::String | FieldKind::Id, Value::String(_)) => true,
            (FieldKind::Number, Value::Number(_)) => true,
            (FieldKind::Timestamp, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (FieldKind::Boolean, Value::Bool(_)) => true,
            (FieldKind::Array, Value::Array(_)) => true,
            (FieldKind::Object, Value::Object(_)) => true,
            _ => false,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(default)]
    pub required: Option<bool>,
    /// `slug`, `email` or `url`.
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub allowed: Option<Vec<Value>>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Applied on create when the field is absent.
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub validation: Option<ValidationRule>,
}

fn default_order_field() -> String {
    "sortOrder".into()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReorderConfig {
    #[serde(default = "default_order_field")]
    pub field: String,
    /// Siblings share this field's value (e.g. `productId` for images). None: whole collection.
    #[serde(default)]
    pub scope_field: Option<String>,
}

fn default_status_field() -> String {
    "status".into()
}

fn default_published_at_field() -> String {
    "publishedAt".into()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublishConfig {
    #[serde(default = "default_status_field")]
    pub status_field: String,
    #[serde(default = "default_published_at_field")]
    pub published_at_field: String,
}

/// Records of `resource` whose `field` holds a parent's id are deleted with the parent.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChildConfig {
    pub resource: String,
    pub field: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Collection name and API path segment.
    pub name: String,
    /// Display name for the dashboard (Vietnamese).
    #[serde(default)]
    pub label: Option<String>,
    pub fields: Vec<FieldConfig>,
    #[serde(default)]
    pub search_fields: Vec<String>,
    /// Priority order for suggest labels. Empty: search fields.
    #[serde(default)]
    pub label_fields: Vec<String>,
    #[serde(default)]
    pub unique_fields: Vec<String>,
    /// Boolean fields that may be flipped through `toggle`.
    #[serde(default)]
    pub toggle_fields: Vec<String>,
    #[serde(default)]
    pub reorder: Option<ReorderConfig>,
    #[serde(default)]
    pub publish: Option<PublishConfig>,
    #[serde(default)]
    pub children: Vec<ChildConfig>,
    #[serde(default)]
    pub singleton: bool,
    /// Default key for `upsert`. Must be a unique field.
    #[serde(default)]
    pub upsert_key: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub resources: Vec<ResourceConfig>,
}
