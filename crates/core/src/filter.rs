//! Payload filtering engine for selector-based operations.
//!
//! Evaluates [`FilterClause`] predicates against a point's payload document.
//! Supports `must` (AND) and `must_not` (AND-NOT) conditions with
//! operators: `eq`, `ne`, `gt`, `lt`, `gte`, `lte`, `in`.

use crate::filter_types::{FilterClause, FilterCondition, FilterOperator};
use crate::point::Payload;

/// Check if a point's payload matches the given filter clause.
/// `must` conditions are AND-ed; `must_not` conditions are AND-NOT-ed.
/// An empty clause matches every point.
pub fn matches_filter(payload: &Payload, filter: &FilterClause) -> bool {
    for cond in &filter.must {
        if !evaluate_condition(payload, cond) {
            return false;
        }
    }
    for cond in &filter.must_not {
        if evaluate_condition(payload, cond) {
            return false;
        }
    }
    true
}

fn evaluate_condition(payload: &Payload, cond: &FilterCondition) -> bool {
    let field_value = match payload.get(&cond.field) {
        Some(v) => v,
        None => return false,
    };

    match cond.op {
        FilterOperator::Eq => cond.value.as_ref().is_some_and(|v| json_eq(field_value, v)),
        FilterOperator::Ne => cond.value.as_ref().is_some_and(|v| !json_eq(field_value, v)),
        FilterOperator::Gt => cond
            .value
            .as_ref()
            .and_then(|v| json_cmp(field_value, v))
            .is_some_and(|o| o == std::cmp::Ordering::Greater),
        FilterOperator::Lt => cond
            .value
            .as_ref()
            .and_then(|v| json_cmp(field_value, v))
            .is_some_and(|o| o == std::cmp::Ordering::Less),
        FilterOperator::Gte => cond
            .value
            .as_ref()
            .and_then(|v| json_cmp(field_value, v))
            .is_some_and(|o| o != std::cmp::Ordering::Less),
        FilterOperator::Lte => cond
            .value
            .as_ref()
            .and_then(|v| json_cmp(field_value, v))
            .is_some_and(|o| o != std::cmp::Ordering::Greater),
        FilterOperator::In => cond
            .values
            .as_ref()
            .is_some_and(|vals| vals.iter().any(|v| json_eq(field_value, v))),
    }
}

/// Equality between a payload value and a filter value. Numbers compare
/// across integer/float representations; an array field matches if any
/// element matches (qdrant-style multi-value fields).
fn json_eq(field: &serde_json::Value, filter: &serde_json::Value) -> bool {
    match (field, filter) {
        (serde_json::Value::Array(items), _) => items.iter().any(|item| json_eq(item, filter)),
        (serde_json::Value::Number(a), serde_json::Value::Number(b)) => {
            match (a.as_i64(), b.as_i64()) {
                (Some(x), Some(y)) => x == y,
                _ => match (a.as_f64(), b.as_f64()) {
                    (Some(x), Some(y)) => (x - y).abs() < f64::EPSILON,
                    _ => false,
                },
            }
        }
        (a, b) => a == b,
    }
}

/// Numeric ordering between a payload value and a filter value.
fn json_cmp(field: &serde_json::Value, filter: &serde_json::Value) -> Option<std::cmp::Ordering> {
    let a = field.as_f64()?;
    let b = filter.as_f64()?;
    a.partial_cmp(&b)
}
