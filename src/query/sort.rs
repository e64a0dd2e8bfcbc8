//! Stable single-field sorting.

use crate::query::Fields;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(SortDirection::Asc),
            "desc" | "descending" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        SortSpec {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        SortSpec {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Parse the query-string form: `price` or `-price` (descending).
    pub fn from_param(param: &str) -> Option<Self> {
        let param = param.trim();
        match param.strip_prefix('-') {
            Some(field) if !field.is_empty() => Some(Self::desc(field)),
            Some(_) => None,
            None if !param.is_empty() => Some(Self::asc(param)),
            None => None,
        }
    }

    pub fn compare<R: Fields + ?Sized>(&self, a: &R, b: &R) -> Ordering {
        let ord = a.field(&self.field).sort_cmp(&b.field(&self.field));
        match self.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

/// Sort records by `sort`. Missing values come first ascending and last descending;
/// ties keep their input order. Without a spec the input order is returned as is.
pub fn apply_sort<R: Fields>(mut records: Vec<R>, sort: Option<&SortSpec>) -> Vec<R> {
    if let Some(spec) = sort {
        records.sort_by(|a, b| spec.compare(a, b));
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn names(records: &[Value]) -> Vec<&str> {
        records.iter().map(|r| r["name"].as_str().unwrap_or("")).collect()
    }

    #[test]
    fn missing_values_first_ascending_last_descending() {
        let input = vec![
            json!({"name": "a", "price": 20}),
            json!({"name": "b"}),
            json!({"name": "c", "price": 10}),
        ];
        let asc = apply_sort(input.clone(), Some(&SortSpec::asc("price")));
        assert_eq!(names(&asc), vec!["b", "c", "a"]);
        let desc = apply_sort(input, Some(&SortSpec::desc("price")));
        assert_eq!(names(&desc), vec!["a", "c", "b"]);
    }

    #[test]
    fn no_spec_keeps_order() {
        let input = vec![json!({"name": "z"}), json!({"name": "a"})];
        assert_eq!(names(&apply_sort(input, None)), vec!["z", "a"]);
    }

    #[test]
    fn param_form() {
        assert_eq!(SortSpec::from_param("-price"), Some(SortSpec::desc("price")));
        assert_eq!(SortSpec::from_param("name"), Some(SortSpec::asc("name")));
        assert_eq!(SortSpec::from_param("-"), None);
        assert_eq!(SortSpec::from_param(""), None);
    }
}
