//! Case-insensitive substring search over a fixed list of fields.

use crate::query::Fields;

/// True when `q` is absent or empty, or when the lowercase query is a substring of
/// the lowercase text of at least one named field. Non-text values never match.
pub fn matches_query<R, S>(record: &R, q: Option<&str>, fields: &[S]) -> bool
where
    R: Fields + ?Sized,
    S: AsRef<str>,
{
    let needle = match q {
        Some(q) if !q.is_empty() => q.to_lowercase(),
        _ => return true,
    };
    fields.iter().any(|name| {
        record
            .field(name.as_ref())
            .as_text()
            .map(|text| text.to_lowercase().contains(&needle))
            .unwrap_or(false)
    })
}
