//! Catalog validation: names, field references and feature consistency.

use crate::config::{CatalogConfig, FieldKind, ResourceConfig};
use crate::error::ConfigError;
use crate::record::SYSTEM_KEYS;
use regex::Regex;
use std::collections::{HashMap, HashSet};

fn valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && name.len() <= 63
}

fn field_ref(resource: &str, field: &str) -> ConfigError {
    ConfigError::MissingReference {
        kind: "field",
        id: format!("{}.{}", resource, field),
    }
}

fn check_declared<'a>(
    res: &ResourceConfig,
    kinds: &HashMap<&str, FieldKind>,
    names: impl IntoIterator<Item = &'a String>,
) -> Result<(), ConfigError> {
    for name in names {
        if !kinds.contains_key(name.as_str()) {
            return Err(field_ref(&res.name, name));
        }
    }
    Ok(())
}

pub fn validate(config: &CatalogConfig) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    for res in &config.resources {
        if !valid_identifier(&res.name) {
            return Err(ConfigError::Validation(format!(
                "resource name '{}' must be lowercase letters, digits and underscores",
                res.name
            )));
        }
        if !names.insert(res.name.as_str()) {
            return Err(ConfigError::DuplicateResource(res.name.clone()));
        }
    }

    let field_kinds: HashMap<&str, HashMap<&str, FieldKind>> = config
        .resources
        .iter()
        .map(|r| (r.name.as_str(), r.fields.iter().map(|f| (f.name.as_str(), f.kind)).collect()))
        .collect();

    for res in &config.resources {
        validate_resource(res, &field_kinds)?;
    }
    Ok(())
}

fn validate_resource(
    res: &ResourceConfig,
    field_kinds: &HashMap<&str, HashMap<&str, FieldKind>>,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for f in &res.fields {
        if f.name.is_empty() || SYSTEM_KEYS.contains(&f.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "{}: field name '{}' is reserved",
                res.name, f.name
            )));
        }
        if !seen.insert(f.name.as_str()) {
            return Err(ConfigError::DuplicateField {
                resource: res.name.clone(),
                field: f.name.clone(),
            });
        }
        if let Some(pattern) = f.validation.as_ref().and_then(|v| v.pattern.as_deref()) {
            Regex::new(pattern).map_err(|e| {
                ConfigError::Validation(format!("{}.{}: invalid pattern: {}", res.name, f.name, e))
            })?;
        }
        if let Some(default) = &f.default {
            if !f.kind.accepts(default) {
                return Err(ConfigError::Validation(format!(
                    "{}.{}: default does not match type {}",
                    res.name,
                    f.name,
                    f.kind.as_str()
                )));
            }
        }
    }

    let kinds = &field_kinds[res.name.as_str()];
    check_declared(res, kinds, &res.search_fields)?;
    check_declared(res, kinds, &res.label_fields)?;
    check_declared(res, kinds, &res.unique_fields)?;
    check_declared(res, kinds, &res.toggle_fields)?;

    for f in &res.toggle_fields {
        if kinds.get(f.as_str()) != Some(&FieldKind::Boolean) {
            return Err(ConfigError::Validation(format!(
                "{}.{}: toggle fields must be boolean",
                res.name, f
            )));
        }
    }

    if let Some(reorder) = &res.reorder {
        if kinds.get(reorder.field.as_str()) != Some(&FieldKind::Number) {
            return Err(ConfigError::Validation(format!(
                "{}.{}: reorder field must be a declared number",
                res.name, reorder.field
            )));
        }
        check_declared(res, kinds, reorder.scope_field.iter())?;
    }

    if let Some(publish) = &res.publish {
        if kinds.get(publish.status_field.as_str()) != Some(&FieldKind::String) {
            return Err(field_ref(&res.name, &publish.status_field));
        }
        if kinds.get(publish.published_at_field.as_str()) != Some(&FieldKind::Timestamp) {
            return Err(field_ref(&res.name, &publish.published_at_field));
        }
    }

    for child in &res.children {
        if child.resource == res.name {
            return Err(ConfigError::Validation(format!("{}: resource cannot be its own child", res.name)));
        }
        let child_kinds = field_kinds.get(child.resource.as_str()).ok_or_else(|| ConfigError::MissingReference {
            kind: "resource",
            id: child.resource.clone(),
        })?;
        if !child_kinds.contains_key(child.field.as_str()) {
            return Err(field_ref(&child.resource, &child.field));
        }
    }

    if let Some(key) = &res.upsert_key {
        if !res.unique_fields.contains(key) {
            return Err(ConfigError::Validation(format!(
                "{}: upsert key '{}' must be a unique field",
                res.name, key
            )));
        }
    }

    if res.singleton && (res.reorder.is_some() || !res.unique_fields.is_empty()) {
        return Err(ConfigError::Validation(format!(
            "{}: singleton resources cannot be reordered or declare unique fields",
            res.name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog(v: serde_json::Value) -> CatalogConfig {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn rejects_undeclared_search_field() {
        let c = catalog(json!({"resources": [
            {"name": "faqs", "fields": [{"name": "question", "type": "string"}], "search_fields": ["answer"]}
        ]}));
        assert!(matches!(validate(&c), Err(ConfigError::MissingReference { kind: "field", .. })));
    }

    #[test]
    fn rejects_duplicate_resource() {
        let c = catalog(json!({"resources": [
            {"name": "faqs", "fields": []},
            {"name": "faqs", "fields": []}
        ]}));
        assert!(matches!(validate(&c), Err(ConfigError::DuplicateResource(_))));
    }

    #[test]
    fn rejects_non_boolean_toggle() {
        let c = catalog(json!({"resources": [
            {"name": "posts", "fields": [{"name": "title", "type": "string"}], "toggle_fields": ["title"]}
        ]}));
        assert!(matches!(validate(&c), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn rejects_reserved_and_bad_names() {
        let reserved = catalog(json!({"resources": [{"name": "posts", "fields": [{"name": "id", "type": "string"}]}]}));
        assert!(validate(&reserved).is_err());
        let bad = catalog(json!({"resources": [{"name": "Bài viết", "fields": []}]}));
        assert!(validate(&bad).is_err());
    }

    #[test]
    fn children_must_exist() {
        let c = catalog(json!({"resources": [
            {"name": "products", "fields": [], "children": [{"resource": "images", "field": "productId"}]}
        ]}));
        assert!(matches!(validate(&c), Err(ConfigError::MissingReference { kind: "resource", .. })));
    }
}
