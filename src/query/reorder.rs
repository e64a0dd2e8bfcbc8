//! Dense manual ordering of sibling records through a numeric `sortOrder` field.
//!
//! After a move every sibling holds `(position + 1) * 10`, leaving gaps for manual
//! insertion. Only records whose value changes are reported.

use crate::error::AppError;
use crate::query::{FieldValue, Fields};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SORT_ORDER_STEP: i64 = 10;

/// Field/value pair restricting which records are siblings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReorderScope {
    pub field: String,
    #[serde(default)]
    pub value: Value,
}

impl ReorderScope {
    pub fn contains<R: Fields + ?Sized>(&self, record: &R) -> bool {
        record.field(&self.field).loose_eq(&FieldValue::from_json(&self.value))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReorderTarget {
    /// Clamped to `[0, len - 1]`.
    Index(i64),
    /// Current index of the given record, or the end when it is not a sibling.
    Before(String),
    /// Index after the given record.
    After(String),
    End,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderChange {
    pub id: String,
    pub sort_order: i64,
}

/// Compute the sortOrder values to persist after moving `moving_id` to `target`.
pub fn plan_reorder<R: Fields>(
    siblings: &[R],
    order_field: &str,
    moving_id: &str,
    target: &ReorderTarget,
) -> Result<Vec<OrderChange>, AppError> {
    let mut ordered: Vec<&R> = siblings.iter().collect();
    ordered.sort_by(|a, b| a.field(order_field).sort_cmp(&b.field(order_field)));

    let from = ordered
        .iter()
        .position(|r| r.record_id() == Some(moving_id))
        .ok_or_else(|| AppError::NotFoundInScope {
            id: moving_id.to_string(),
        })?;
    let len = ordered.len();
    let moving = ordered.remove(from);

    let index_of = |id: &str| ordered.iter().position(|r| r.record_id() == Some(id));
    let to = match target {
        ReorderTarget::Index(i) => (*i).clamp(0, len as i64 - 1) as usize,
        ReorderTarget::Before(id) => index_of(id).unwrap_or(ordered.len()),
        ReorderTarget::After(id) => index_of(id).map(|i| i + 1).unwrap_or(0).min(ordered.len()),
        ReorderTarget::End => ordered.len(),
    };
    ordered.insert(to, moving);

    let changes = ordered
        .iter()
        .enumerate()
        .filter_map(|(pos, r)| {
            let wanted = (pos as i64 + 1) * SORT_ORDER_STEP;
            let current = r.field(order_field).as_number();
            if current == Some(wanted as f64) {
                return None;
            }
            r.record_id().map(|id| OrderChange {
                id: id.to_string(),
                sort_order: wanted,
            })
        })
        .collect();
    Ok(changes)
}

/// sortOrder for a record appended after `siblings`. Saturates at `i64::MAX`.
pub fn next_sort_order<R: Fields>(siblings: &[R], order_field: &str) -> i64 {
    let max = siblings
        .iter()
        .filter_map(|r| r.field(order_field).as_number())
        .fold(0.0_f64, f64::max);
    (max as i64)
        .div_euclid(SORT_ORDER_STEP)
        .saturating_mul(SORT_ORDER_STEP)
        .saturating_add(SORT_ORDER_STEP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn siblings() -> Vec<Value> {
        vec![
            json!({"id": "A", "sortOrder": 10}),
            json!({"id": "B", "sortOrder": 20}),
            json!({"id": "C", "sortOrder": 30}),
        ]
    }

    #[test]
    fn unknown_id_is_not_in_scope() {
        let err = plan_reorder(&siblings(), "sortOrder", "Z", &ReorderTarget::End).unwrap_err();
        assert!(matches!(err, AppError::NotFoundInScope { .. }));
    }

    #[test]
    fn index_is_clamped() {
        let changes = plan_reorder(&siblings(), "sortOrder", "A", &ReorderTarget::Index(99)).unwrap();
        assert_eq!(
            changes,
            vec![
                OrderChange { id: "B".into(), sort_order: 10 },
                OrderChange { id: "C".into(), sort_order: 20 },
                OrderChange { id: "A".into(), sort_order: 30 },
            ]
        );
        let changes = plan_reorder(&siblings(), "sortOrder", "C", &ReorderTarget::Index(-5)).unwrap();
        assert_eq!(changes[0], OrderChange { id: "C".into(), sort_order: 10 });
    }

    #[test]
    fn before_missing_sibling_goes_to_end() {
        let changes = plan_reorder(&siblings(), "sortOrder", "A", &ReorderTarget::Before("nope".into())).unwrap();
        assert_eq!(changes.last(), Some(&OrderChange { id: "A".into(), sort_order: 30 }));
    }

    #[test]
    fn no_op_move_changes_nothing() {
        let changes = plan_reorder(&siblings(), "sortOrder", "B", &ReorderTarget::Index(1)).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn gaps_are_closed() {
        let sparse = vec![json!({"id": "A", "sortOrder": 5}), json!({"id": "B"})];
        let changes = plan_reorder(&sparse, "sortOrder", "A", &ReorderTarget::End).unwrap();
        assert_eq!(
            changes,
            vec![
                OrderChange { id: "B".into(), sort_order: 10 },
                OrderChange { id: "A".into(), sort_order: 20 },
            ]
        );
    }

    #[test]
    fn next_sort_order_rounds_up_to_step() {
        assert_eq!(next_sort_order(&siblings(), "sortOrder"), 40);
        assert_eq!(next_sort_order::<Value>(&[], "sortOrder"), 10);
        assert_eq!(next_sort_order(&[json!({"sortOrder": 35})], "sortOrder"), 40);
    }

    #[test]
    fn next_sort_order_saturates_on_huge_values() {
        assert_eq!(next_sort_order(&[json!({"sortOrder": 9.3e18})], "sortOrder"), i64::MAX);
        assert_eq!(next_sort_order(&[json!({"sortOrder": i64::MAX})], "sortOrder"), i64::MAX);
    }
}
