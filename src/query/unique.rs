//! Uniqueness checks by linear scan. Fine at catalog scale only.

use crate::error::AppError;
use crate::query::{FieldValue, Fields};

/// True when a record other than `exclude_id` holds `value` in `field`.
pub fn value_exists<R: Fields>(records: &[R], field: &str, value: &FieldValue<'_>, exclude_id: Option<&str>) -> bool {
    records.iter().any(|r| {
        let excluded = matches!((exclude_id, r.record_id()), (Some(ex), Some(id)) if ex == id);
        !excluded && r.field(field).loose_eq(value)
    })
}

/// Reject `candidate` if any unique field it carries is already held by another
/// record. Fields absent from the candidate are not checked.
pub fn ensure_unique<R, C, S>(records: &[R], unique_fields: &[S], candidate: &C, exclude_id: Option<&str>) -> Result<(), AppError>
where
    R: Fields,
    C: Fields + ?Sized,
    S: AsRef<str>,
{
    for field in unique_fields {
        let field = field.as_ref();
        let value = candidate.field(field);
        if value.is_undefined() {
            continue;
        }
        if value_exists(records, field, &value, exclude_id) {
            return Err(AppError::Duplicate {
                field: field.to_string(),
                value: value.display(),
            });
        }
    }
    Ok(())
}
