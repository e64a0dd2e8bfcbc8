//! Load the catalog from the built-in definition or a JSON file, and resolve it.

use crate::config::resolved::{FieldInfo, PublishInfo, ReorderInfo, ResolvedCatalog, ResolvedResource};
use crate::config::{validate, CatalogConfig};
use crate::error::ConfigError;
use regex::Regex;
use serde_json::Map;
use std::collections::HashMap;
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("catalog.json");

/// The storefront's own resources: products, categories, posts, service websites,
/// FAQs, reviews, images and site settings.
pub fn builtin_catalog() -> Result<CatalogConfig, ConfigError> {
    serde_json::from_str(BUILTIN_CATALOG).map_err(|e| ConfigError::Load(format!("builtin catalog: {}", e)))
}

/// Read a catalog JSON file (`{"resources": [...]}`).
pub async fn load_from_path(path: impl AsRef<Path>) -> Result<CatalogConfig, ConfigError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&raw).map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))
}

/// Build the resolved catalog from config (validates first).
pub fn resolve(config: &CatalogConfig) -> Result<ResolvedCatalog, ConfigError> {
    validate(config)?;

    let mut resources = Vec::with_capacity(config.resources.len());
    let mut resource_by_name = HashMap::new();
    for res in &config.resources {
        let fields = res
            .fields
            .iter()
            .map(|f| FieldInfo {
                name: f.name.clone(),
                kind: f.kind,
            })
            .collect();
        let validation = res
            .fields
            .iter()
            .filter_map(|f| f.validation.clone().map(|rule| (f.name.clone(), rule)))
            .collect();
        let mut patterns = HashMap::new();
        for f in &res.fields {
            if let Some(pattern) = f.validation.as_ref().and_then(|v| v.pattern.as_deref()) {
                let re = Regex::new(pattern)
                    .map_err(|e| ConfigError::Validation(format!("{}.{}: invalid pattern: {}", res.name, f.name, e)))?;
                patterns.insert(f.name.clone(), re);
            }
        }
        let defaults: Map<_, _> = res
            .fields
            .iter()
            .filter_map(|f| f.default.clone().map(|v| (f.name.clone(), v)))
            .collect();
        let label_fields = if res.label_fields.is_empty() {
            res.search_fields.clone()
        } else {
            res.label_fields.clone()
        };
        let resource = ResolvedResource {
            name: res.name.clone(),
            label: res.label.clone().unwrap_or_else(|| res.name.clone()),
            fields,
            validation,
            patterns,
            defaults,
            search_fields: res.search_fields.clone(),
            label_fields,
            unique_fields: res.unique_fields.clone(),
            toggle_fields: res.toggle_fields.clone(),
            reorder: res.reorder.as_ref().map(|r| ReorderInfo {
                field: r.field.clone(),
                scope_field: r.scope_field.clone(),
            }),
            publish: res.publish.as_ref().map(|p| PublishInfo {
                status_field: p.status_field.clone(),
                published_at_field: p.published_at_field.clone(),
            }),
            children: res.children.clone(),
            singleton: res.singleton,
            upsert_key: res.upsert_key.clone(),
        };
        resource_by_name.insert(resource.name.clone(), resource.clone());
        resources.push(resource);
    }
    tracing::debug!(count = resources.len(), "catalog resolved");
    Ok(ResolvedCatalog {
        resources,
        resource_by_name,
    })
}
