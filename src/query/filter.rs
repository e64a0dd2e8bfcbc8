//! Field filters with comparison operators. A filter set is a logical AND.

use crate::query::{FieldValue, Fields};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::cmp::Ordering;
use std::convert::Infallible;
use std::str::FromStr;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FilterOp {
    #[default]
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Contains,
    StartsWith,
    EndsWith,
    /// Operator name not recognized. Evaluates to a match (fail-open).
    Unknown(String),
}

impl FilterOp {
    pub fn as_str(&self) -> &str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Ne => "ne",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::In => "in",
            FilterOp::Contains => "contains",
            FilterOp::StartsWith => "startsWith",
            FilterOp::EndsWith => "endsWith",
            FilterOp::Unknown(name) => name,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, FilterOp::Unknown(_))
    }
}

impl From<&str> for FilterOp {
    fn from(s: &str) -> Self {
        match s {
            "eq" => FilterOp::Eq,
            "ne" => FilterOp::Ne,
            "gt" => FilterOp::Gt,
            "gte" => FilterOp::Gte,
            "lt" => FilterOp::Lt,
            "lte" => FilterOp::Lte,
            "in" => FilterOp::In,
            "contains" => FilterOp::Contains,
            "startsWith" => FilterOp::StartsWith,
            "endsWith" => FilterOp::EndsWith,
            other => FilterOp::Unknown(other.to_string()),
        }
    }
}

impl FromStr for FilterOp {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(FilterOp::from(s))
    }
}

impl Serialize for FilterOp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FilterOp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(FilterOp::from(s.as_str()))
    }
}

/// `{field, op?, value}`; `op` defaults to `eq`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    #[serde(default)]
    pub op: FilterOp,
    #[serde(default)]
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: Value) -> Self {
        Filter {
            field: field.into(),
            op,
            value,
        }
    }

    pub fn equals(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }
}

fn lower_pair(actual: &FieldValue<'_>, expected: &FieldValue<'_>) -> Option<(String, String)> {
    match (actual.as_text(), expected.as_text()) {
        (Some(a), Some(e)) => Some((a.to_lowercase(), e.to_lowercase())),
        _ => None,
    }
}

/// Evaluate one filter against a record.
pub fn matches_filter<R: Fields + ?Sized>(record: &R, filter: &Filter) -> bool {
    let actual = record.field(&filter.field);
    let expected = FieldValue::from_json(&filter.value);
    match &filter.op {
        FilterOp::Eq => actual.loose_eq(&expected),
        FilterOp::Ne => !actual.loose_eq(&expected),
        FilterOp::Gt => matches!(actual.compare(&expected), Some(Ordering::Greater)),
        FilterOp::Gte => matches!(actual.compare(&expected), Some(Ordering::Greater | Ordering::Equal)),
        FilterOp::Lt => matches!(actual.compare(&expected), Some(Ordering::Less)),
        FilterOp::Lte => matches!(actual.compare(&expected), Some(Ordering::Less | Ordering::Equal)),
        // null and a missing key are both Undefined, so `[null]` selects records without the field.
        FilterOp::In => match &filter.value {
            Value::Array(candidates) => candidates
                .iter()
                .any(|c| actual.loose_eq(&FieldValue::from_json(c))),
            _ => false,
        },
        FilterOp::Contains => match lower_pair(&actual, &expected) {
            Some((a, e)) => a.contains(&e),
            None => match actual {
                FieldValue::Array(items) => items.iter().any(|v| FieldValue::from_json(v).loose_eq(&expected)),
                _ => false,
            },
        },
        FilterOp::StartsWith => lower_pair(&actual, &expected)
            .map(|(a, e)| a.starts_with(&e))
            .unwrap_or(false),
        FilterOp::EndsWith => lower_pair(&actual, &expected)
            .map(|(a, e)| a.ends_with(&e))
            .unwrap_or(false),
        FilterOp::Unknown(_) => true,
    }
}

/// True when the record satisfies every filter. An empty set always matches.
pub fn matches_filters<R: Fields + ?Sized>(record: &R, filters: &[Filter]) -> bool {
    filters.iter().all(|f| matches_filter(record, f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn op_defaults_to_eq() {
        let f: Filter = serde_json::from_value(json!({"field": "status", "value": "published"})).unwrap();
        assert_eq!(f.op, FilterOp::Eq);
    }

    #[test]
    fn unknown_op_round_trips_its_name() {
        let f: Filter = serde_json::from_value(json!({"field": "a", "op": "regex", "value": "x"})).unwrap();
        assert_eq!(f.op, FilterOp::Unknown("regex".into()));
        assert_eq!(serde_json::to_value(&f).unwrap()["op"], "regex");
    }

    #[test]
    fn in_requires_array_value() {
        let r = json!({"status": "draft"});
        assert!(matches_filter(&r, &Filter::new("status", FilterOp::In, json!(["draft", "published"]))));
        assert!(!matches_filter(&r, &Filter::new("status", FilterOp::In, json!("draft"))));
    }

    #[test]
    fn in_with_null_selects_records_without_the_field() {
        let f = Filter::new("category", FilterOp::In, json!([null, "sale"]));
        assert!(matches_filter(&json!({"name": "Áo"}), &f));
        assert!(matches_filter(&json!({"category": null}), &f));
        assert!(matches_filter(&json!({"category": "sale"}), &f));
        assert!(!matches_filter(&json!({"category": "new"}), &f));
    }

    #[test]
    fn contains_on_arrays_is_membership() {
        let r = json!({"tags": ["sale", "new"]});
        assert!(matches_filter(&r, &Filter::new("tags", FilterOp::Contains, json!("sale"))));
        assert!(!matches_filter(&r, &Filter::new("tags", FilterOp::Contains, json!("SALE"))));
    }

    #[test]
    fn prefix_and_suffix_ignore_case() {
        let r = json!({"slug": "Ao-Thun-Nam"});
        assert!(matches_filter(&r, &Filter::new("slug", FilterOp::StartsWith, json!("ao-"))));
        assert!(matches_filter(&r, &Filter::new("slug", FilterOp::EndsWith, json!("NAM"))));
        assert!(!matches_filter(&r, &Filter::new("missing", FilterOp::StartsWith, json!(""))));
    }

    #[test]
    fn comparisons_on_missing_fields_are_false() {
        let r = json!({});
        for op in [FilterOp::Gt, FilterOp::Gte, FilterOp::Lt, FilterOp::Lte] {
            assert!(!matches_filter(&r, &Filter::new("price", op, json!(0))));
        }
    }
}
