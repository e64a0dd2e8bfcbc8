//! Resolved catalog: config validated and flattened for runtime use.

use crate::config::{ChildConfig, FieldKind, ValidationRule};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct FieldInfo {
    pub name: String,
    pub kind: FieldKind,
}

#[derive(Clone, Debug)]
pub struct ReorderInfo {
    pub field: String,
    pub scope_field: Option<String>,
}

#[derive(Clone, Debug)]
pub struct PublishInfo {
    pub status_field: String,
    pub published_at_field: String,
}

pub const STATUS_PUBLISHED: &str = "published";
pub const STATUS_DRAFT: &str = "draft";

#[derive(Clone, Debug)]
pub struct ResolvedResource {
    pub name: String,
    pub label: String,
    pub fields: Vec<FieldInfo>,
    pub validation: HashMap<String, ValidationRule>,
    /// Compiled `pattern` rules, by field.
    pub patterns: HashMap<String, Regex>,
    /// Values applied on create for absent fields.
    pub defaults: Map<String, Value>,
    pub search_fields: Vec<String>,
    pub label_fields: Vec<String>,
    pub unique_fields: Vec<String>,
    pub toggle_fields: Vec<String>,
    pub reorder: Option<ReorderInfo>,
    pub publish: Option<PublishInfo>,
    pub children: Vec<ChildConfig>,
    pub singleton: bool,
    pub upsert_key: Option<String>,
}

impl ResolvedResource {
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

#[derive(Clone, Debug, Default)]
pub struct ResolvedCatalog {
    pub resources: Vec<ResolvedResource>,
    pub resource_by_name: HashMap<String, ResolvedResource>,
}

impl ResolvedCatalog {
    pub fn resource(&self, name: &str) -> Option<&ResolvedResource> {
        self.resource_by_name.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.resources.iter().map(|r| r.name.as_str())
    }
}
