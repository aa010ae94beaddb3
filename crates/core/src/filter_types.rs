//! Payload filter types for selector-based mutation operations.
//!
//! Defines the filter clause structure used to address "all points matching
//! a predicate" in delete, delete-vectors, and payload operations. An empty
//! clause matches every point.

use serde::{Deserialize, Serialize};

/// Payload filter clause with `must` (AND) and `must_not` (AND-NOT) conditions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterClause {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<FilterCondition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must_not: Vec<FilterCondition>,
}

impl FilterClause {
    /// True if the clause has no conditions (matches all points).
    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.must_not.is_empty()
    }
}

/// A single filter condition on a top-level payload field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterCondition {
    pub field: String,
    pub op: FilterOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<serde_json::Value>>,
}

/// Comparison operator for filter conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
    In,
}
