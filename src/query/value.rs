//! Tagged view of a record field. Operators are written once against this
//! variant instead of against per-resource shapes.

use serde_json::{Map, Value};
use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldValue<'a> {
    /// Missing key or JSON null.
    Undefined,
    Bool(bool),
    Number(f64),
    String(&'a str),
    Id(&'a str),
    Array(&'a [Value]),
    Object(&'a Map<String, Value>),
}

/// Read access to named fields of a record.
pub trait Fields {
    fn field(&self, name: &str) -> FieldValue<'_>;

    /// Identifier of the record, when it has one.
    fn record_id(&self) -> Option<&str>;
}

impl<'a> FieldValue<'a> {
    pub fn from_json(v: &'a Value) -> Self {
        match v {
            Value::Null => FieldValue::Undefined,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => n.as_f64().map(FieldValue::Number).unwrap_or(FieldValue::Undefined),
            Value::String(s) => FieldValue::String(s),
            Value::Array(items) => FieldValue::Array(items),
            Value::Object(map) => FieldValue::Object(map),
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, FieldValue::Undefined)
    }

    /// Text of a string or id value.
    pub fn as_text(&self) -> Option<&'a str> {
        match self {
            FieldValue::String(s) | FieldValue::Id(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Equality used by `eq`, `ne`, `in` and uniqueness checks. Numbers compare by
    /// value, an id equals a string with the same text, arrays and objects compare
    /// element-wise.
    pub fn loose_eq(&self, other: &FieldValue<'_>) -> bool {
        match (self, other) {
            (FieldValue::Undefined, FieldValue::Undefined) => true,
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a == b,
            (FieldValue::Number(a), FieldValue::Number(b)) => a == b,
            (FieldValue::Array(a), FieldValue::Array(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|(x, y)| FieldValue::from_json(x).loose_eq(&FieldValue::from_json(y)))
            }
            (FieldValue::Object(a), FieldValue::Object(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, x)| {
                        b.get(k)
                            .map(|y| FieldValue::from_json(x).loose_eq(&FieldValue::from_json(y)))
                            .unwrap_or(false)
                    })
            }
            _ => match (self.as_text(), other.as_text()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    /// Ordering for `gt`/`gte`/`lt`/`lte`: only between two numbers, two texts or
    /// two booleans. Anything else is incomparable and every comparison is false.
    pub fn compare(&self, other: &FieldValue<'_>) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Number(a), FieldValue::Number(b)) => a.partial_cmp(b),
            (FieldValue::Bool(a), FieldValue::Bool(b)) => Some(a.cmp(b)),
            _ => match (self.as_text(), other.as_text()) {
                (Some(a), Some(b)) => Some(a.cmp(b)),
                _ => None,
            },
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            FieldValue::Undefined => 0,
            FieldValue::Bool(_) => 1,
            FieldValue::Number(_) => 2,
            FieldValue::String(_) | FieldValue::Id(_) => 3,
            FieldValue::Array(_) => 4,
            FieldValue::Object(_) => 5,
        }
    }

    /// Total order used for sorting. Undefined is the minimum; values of different
    /// kinds order by kind; arrays and objects tie with their own kind.
    pub fn sort_cmp(&self, other: &FieldValue<'_>) -> Ordering {
        match (self, other) {
            (FieldValue::Number(a), FieldValue::Number(b)) => a.total_cmp(b),
            (FieldValue::Array(_), FieldValue::Array(_)) | (FieldValue::Object(_), FieldValue::Object(_)) => {
                Ordering::Equal
            }
            _ => self
                .compare(other)
                .unwrap_or_else(|| self.kind_rank().cmp(&other.kind_rank())),
        }
    }

    /// Human-readable rendering for error messages and labels.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Undefined => "undefined".into(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            FieldValue::String(s) | FieldValue::Id(s) => (*s).to_string(),
            FieldValue::Array(items) => Value::Array(items.to_vec()).to_string(),
            FieldValue::Object(map) => Value::Object((*map).clone()).to_string(),
        }
    }
}

impl Fields for Map<String, Value> {
    fn field(&self, name: &str) -> FieldValue<'_> {
        self.get(name).map(FieldValue::from_json).unwrap_or(FieldValue::Undefined)
    }

    fn record_id(&self) -> Option<&str> {
        self.get("id").or_else(|| self.get("_id")).and_then(Value::as_str)
    }
}

impl Fields for Value {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match self {
            Value::Object(map) => map.field(name),
            _ => FieldValue::Undefined,
        }
    }

    fn record_id(&self) -> Option<&str> {
        match self {
            Value::Object(map) => map.record_id(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_reads_as_undefined() {
        assert!(FieldValue::from_json(&Value::Null).is_undefined());
        assert!(json!({"a": null}).field("a").is_undefined());
        assert!(json!({}).field("a").is_undefined());
    }

    #[test]
    fn integers_equal_floats() {
        let a = json!(100);
        let b = json!(100.0);
        assert!(FieldValue::from_json(&a).loose_eq(&FieldValue::from_json(&b)));
    }

    #[test]
    fn id_equals_matching_string() {
        assert!(FieldValue::Id("abc").loose_eq(&FieldValue::String("abc")));
        assert!(!FieldValue::Id("abc").loose_eq(&FieldValue::String("abd")));
    }

    #[test]
    fn mixed_kinds_are_incomparable() {
        assert_eq!(FieldValue::Number(1.0).compare(&FieldValue::String("1")), None);
        assert_eq!(FieldValue::Undefined.compare(&FieldValue::Number(0.0)), None);
    }

    #[test]
    fn undefined_sorts_first() {
        assert_eq!(FieldValue::Undefined.sort_cmp(&FieldValue::Number(-1e9)), Ordering::Less);
        assert_eq!(FieldValue::String("").sort_cmp(&FieldValue::Undefined), Ordering::Greater);
        assert_eq!(FieldValue::Undefined.sort_cmp(&FieldValue::Undefined), Ordering::Equal);
    }

    #[test]
    fn display_trims_integral_numbers() {
        assert_eq!(FieldValue::Number(150000.0).display(), "150000");
        assert_eq!(FieldValue::Number(1.5).display(), "1.5");
    }
}
