//! Write-payload checks against a resource's declared fields and rules.

use crate::config::{ResolvedResource, ValidationRule};
use crate::error::AppError;
use crate::record::strip_system_keys;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

pub struct RequestValidator;

impl RequestValidator {
    /// Strip store-owned keys, then reject undeclared fields and values of the wrong kind.
    pub fn sanitize(resource: &ResolvedResource, body: &mut Map<String, Value>) -> Result<(), AppError> {
        strip_system_keys(body);
        for (key, value) in body.iter() {
            let Some(field) = resource.field(key) else {
                return Err(AppError::Validation(format!("unknown field '{}' for {}", key, resource.name)));
            };
            if !field.kind.accepts(value) {
                return Err(AppError::Validation(format!("{} must be of type {}", key, field.kind.as_str())));
            }
        }
        Ok(())
    }

    /// Full check for a new record: every required field must carry a value.
    pub fn validate(resource: &ResolvedResource, body: &Map<String, Value>) -> Result<(), AppError> {
        for (name, rule) in &resource.validation {
            let value = body.get(name);
            if rule.required == Some(true) && is_blank(value) {
                return Err(AppError::Validation(format!("{} is required", name)));
            }
            if let Some(v) = value {
                check_value(resource, name, v, rule)?;
            }
        }
        Ok(())
    }

    /// Check only the keys present in a patch. Absent required fields are fine;
    /// clearing one is not.
    pub fn validate_partial(resource: &ResolvedResource, body: &Map<String, Value>) -> Result<(), AppError> {
        for (name, v) in body {
            let Some(rule) = resource.validation.get(name) else {
                continue;
            };
            if rule.required == Some(true) && is_blank(Some(v)) {
                return Err(AppError::Validation(format!("{} is required", name)));
            }
            check_value(resource, name, v, rule)?;
        }
        Ok(())
    }
}

fn is_blank(v: Option<&Value>) -> bool {
    match v {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        _ => false,
    }
}

fn check_value(resource: &ResolvedResource, name: &str, v: &Value, rule: &ValidationRule) -> Result<(), AppError> {
    match v {
        Value::Null => return Ok(()),
        Value::String(s) => check_text(resource, name, s, rule)?,
        Value::Number(n) => check_number(name, n.as_f64().unwrap_or(f64::NAN), rule)?,
        _ => {}
    }
    check_allowed(name, v, rule)
}

fn check_text(resource: &ResolvedResource, name: &str, s: &str, rule: &ValidationRule) -> Result<(), AppError> {
    let len = s.chars().count();
    if let Some(max) = rule.max_length {
        if len > max as usize {
            return Err(AppError::Validation(format!("{} must be at most {} characters", name, max)));
        }
    }
    if let Some(min) = rule.min_length {
        if len < min as usize {
            return Err(AppError::Validation(format!("{} must be at least {} characters", name, min)));
        }
    }
    if let Some(re) = resource.patterns.get(name) {
        if !re.is_match(s) {
            return Err(AppError::Validation(format!("{} does not match required pattern", name)));
        }
    }
    match rule.format.as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("slug") if !slug_regex().is_match(s) => Err(AppError::Validation(format!(
            "{} must be a slug (lowercase letters, digits and hyphens)",
            name
        ))),
        Some("email") if !looks_like_email(s) => Err(AppError::Validation(format!("{} must be a valid email", name))),
        Some("url") if !looks_like_url(s) => Err(AppError::Validation(format!("{} must be an http(s) URL", name))),
        _ => Ok(()),
    }
}

fn check_number(name: &str, n: f64, rule: &ValidationRule) -> Result<(), AppError> {
    if let Some(min) = rule.minimum {
        if n < min {
            return Err(AppError::Validation(format!("{} must be at least {}", name, min)));
        }
    }
    if let Some(max) = rule.maximum {
        if n > max {
            return Err(AppError::Validation(format!("{} must be at most {}", name, max)));
        }
    }
    Ok(())
}

fn check_allowed(name: &str, v: &Value, rule: &ValidationRule) -> Result<(), AppError> {
    let Some(allowed) = &rule.allowed else {
        return Ok(());
    };
    let same = |a: &Value| match (a, v) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == v,
    };
    if v.is_null() || allowed.iter().any(same) {
        return Ok(());
    }
    let shown: Vec<String> = allowed.iter().take(5).map(Value::to_string).collect();
    Err(AppError::Validation(format!("{} must be one of: {}", name, shown.join(", "))))
}

fn slug_regex() -> &'static Regex {
    static SLUG: OnceLock<Regex> = OnceLock::new();
    SLUG.get_or_init(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap_or_else(|_| unreachable!()))
}

fn looks_like_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.ends_with('.'),
        None => false,
    }
}

fn looks_like_url(s: &str) -> bool {
    ["https://", "http://"]
        .iter()
        .find_map(|scheme| s.strip_prefix(scheme))
        .is_some_and(|rest| rest.contains('.') && !rest.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve, CatalogConfig};
    use serde_json::json;

    fn resource(fields: Value) -> ResolvedResource {
        let config: CatalogConfig =
            serde_json::from_value(json!({"resources": [{"name": "items", "fields": fields}]})).unwrap();
        resolve(&config).unwrap().resource("items").unwrap().clone()
    }

    fn body(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => Map::new(),
        }
    }

    #[test]
    fn required_rejects_blank_strings() {
        let r = resource(json!([{"name": "name", "type": "string", "validation": {"required": true}}]));
        assert!(RequestValidator::validate(&r, &body(json!({"name": "  "}))).is_err());
        assert!(RequestValidator::validate(&r, &body(json!({}))).is_err());
        assert!(RequestValidator::validate(&r, &body(json!({"name": "Áo"}))).is_ok());
    }

    #[test]
    fn partial_skips_absent_required() {
        let r = resource(json!([{"name": "name", "type": "string", "validation": {"required": true}}]));
        assert!(RequestValidator::validate_partial(&r, &body(json!({}))).is_ok());
        assert!(RequestValidator::validate_partial(&r, &body(json!({"name": null}))).is_err());
    }

    #[test]
    fn formats() {
        let r = resource(json!([
            {"name": "slug", "type": "string", "validation": {"format": "slug"}},
            {"name": "email", "type": "string", "validation": {"format": "email"}},
            {"name": "site", "type": "string", "validation": {"format": "url"}}
        ]));
        let ok = |v: Value| RequestValidator::validate_partial(&r, &body(v)).is_ok();
        assert!(ok(json!({"slug": "ao-thun-nam"})));
        assert!(!ok(json!({"slug": "Áo thun"})));
        assert!(!ok(json!({"slug": "a--b"})));
        assert!(ok(json!({"email": "lan@shop.vn"})));
        assert!(!ok(json!({"email": "lan@shop"})));
        assert!(ok(json!({"site": "https://shop.vn"})));
        assert!(!ok(json!({"site": "ftp://shop.vn"})));
    }

    #[test]
    fn lengths_count_characters_and_patterns_apply() {
        let r = resource(json!([
            {"name": "title", "type": "string", "validation": {"max_length": 3}},
            {"name": "sku", "type": "string", "validation": {"pattern": "^SKU-[0-9]+$"}}
        ]));
        assert!(RequestValidator::validate(&r, &body(json!({"title": "Đẹp"}))).is_ok());
        assert!(RequestValidator::validate(&r, &body(json!({"sku": "SKU-12"}))).is_ok());
        assert!(RequestValidator::validate(&r, &body(json!({"sku": "12"}))).is_err());
    }

    #[test]
    fn numeric_bounds_and_allowed_values() {
        let r = resource(json!([
            {"name": "rating", "type": "number", "validation": {"minimum": 1, "maximum": 5}},
            {"name": "status", "type": "string", "validation": {"allowed": ["draft", "published"]}}
        ]));
        let ok = |v: Value| RequestValidator::validate(&r, &body(v)).is_ok();
        assert!(!ok(json!({"rating": 0})));
        assert!(ok(json!({"rating": 5})));
        assert!(!ok(json!({"rating": 6})));
        assert!(ok(json!({"status": "draft"})));
        assert!(!ok(json!({"status": "deleted"})));
    }

    #[test]
    fn sanitize_strips_system_keys_and_checks_kinds() {
        let r = resource(json!([{"name": "price", "type": "number"}]));
        let mut b = body(json!({"id": "x", "_creationTime": 1, "price": 10}));
        RequestValidator::sanitize(&r, &mut b).unwrap();
        assert_eq!(b, body(json!({"price": 10})));
        assert!(RequestValidator::sanitize(&r, &mut body(json!({"price": "10"}))).is_err());
        assert!(RequestValidator::sanitize(&r, &mut body(json!({"color": "red"}))).is_err());
    }
}
