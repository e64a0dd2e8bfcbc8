//! Label search for pickers and autocomplete.

use crate::query::{FieldValue, Fields};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SUGGEST_LIMIT: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: String,
    pub label: String,
}

/// First non-empty string among `label_fields`, in order, else the record id.
pub fn label_for<R, S>(record: &R, label_fields: &[S]) -> String
where
    R: Fields + ?Sized,
    S: AsRef<str>,
{
    label_fields
        .iter()
        .find_map(|name| match record.field(name.as_ref()) {
            FieldValue::String(s) if !s.is_empty() => Some(s.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| record.record_id().unwrap_or_default().to_string())
}

/// Up to `limit` `{id, label}` pairs for records where a label field contains `q`,
/// ignoring case.
pub fn suggest<R, S>(records: &[R], q: &str, label_fields: &[S], limit: usize) -> Vec<Suggestion>
where
    R: Fields,
    S: AsRef<str>,
{
    let needle = q.to_lowercase();
    records
        .iter()
        .filter(|r| {
            label_fields.iter().any(|name| match r.field(name.as_ref()) {
                FieldValue::String(s) => s.to_lowercase().contains(&needle),
                _ => false,
            })
        })
        .filter_map(|r| {
            r.record_id().map(|id| Suggestion {
                id: id.to_string(),
                label: label_for(r, label_fields),
            })
        })
        .take(limit)
        .collect()
}
