//! Update operation types: the tagged batch operation enum and its inputs.
//!
//! A batch request is an ordered list of single-key tagged objects
//! (`{"upsert": {...}}`, `{"delete": {...}}`, ...). Each tag maps to one
//! variant of [`UpdateOperation`], dispatched through a single exhaustive
//! match in the executor. The same operation structs serve as request
//! bodies for the standalone per-operation endpoints.

use crate::filter_types::FilterClause;
use crate::point::{Payload, PointId, VectorInput};
use serde::{Deserialize, Serialize};

/// Addresses the points an operation applies to: an explicit id list or a
/// payload filter. Exactly one should be supplied; `filter: {}` matches all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PointsSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<PointId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterClause>,
}

impl PointsSelector {
    /// Selector for an explicit list of ids.
    pub fn from_ids(ids: Vec<PointId>) -> Self {
        Self {
            points: Some(ids),
            filter: None,
        }
    }

    /// True if neither an id list nor a filter was supplied.
    pub fn is_unspecified(&self) -> bool {
        self.points.is_none() && self.filter.is_none()
    }
}

/// One point input for upsert: id, vectors, and an optional payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointInput {
    pub id: PointId,
    /// Bare list (default vector) or name → list map. An empty map on a new
    /// point creates a vector-less point.
    #[serde(default)]
    pub vector: VectorInput,
    /// When present, replaces the point's payload; when absent, an existing
    /// point's payload is left untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
}

/// One point input for update-vectors: id plus the named vectors to replace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointVectors {
    pub id: PointId,
    pub vector: VectorInput,
}

/// Body of `upsert`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertOperation {
    pub points: Vec<PointInput>,
}

/// Body of `update_vectors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateVectorsOperation {
    pub points: Vec<PointVectors>,
}

/// Body of `delete_vectors`: selector plus the vector names to remove
/// (`""` denotes the default/unnamed vector).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteVectorsOperation {
    #[serde(flatten)]
    pub selector: PointsSelector,
    pub vector: Vec<String>,
}

/// Body of `delete`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteOperation {
    #[serde(flatten)]
    pub selector: PointsSelector,
}

/// Body of `set_payload` and `overwrite_payload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetPayloadOperation {
    pub payload: Payload,
    #[serde(flatten)]
    pub selector: PointsSelector,
}

/// Body of `delete_payload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletePayloadOperation {
    pub keys: Vec<String>,
    #[serde(flatten)]
    pub selector: PointsSelector,
}

/// Body of `clear_payload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearPayloadOperation {
    #[serde(flatten)]
    pub selector: PointsSelector,
}

/// A single mutation operation, tagged by its wire key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateOperation {
    /// Insert new points or replace the vectors/payload of existing ones.
    Upsert(UpsertOperation),
    /// Remove points; absent ids are no-ops.
    Delete(DeleteOperation),
    /// Replace named vectors on points that must already exist.
    UpdateVectors(UpdateVectorsOperation),
    /// Remove named vectors from points; absent names are no-ops.
    DeleteVectors(DeleteVectorsOperation),
    /// Shallow key-wise payload upsert on the addressed points.
    SetPayload(SetPayloadOperation),
    /// Replace the whole payload document on the addressed points.
    OverwritePayload(SetPayloadOperation),
    /// Remove the listed payload keys from the addressed points.
    DeletePayload(DeletePayloadOperation),
    /// Empty the payload document of the addressed points.
    ClearPayload(ClearPayloadOperation),
}

impl UpdateOperation {
    /// Wire tag of this operation, used for logging and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            UpdateOperation::Upsert(_) => "upsert",
            UpdateOperation::Delete(_) => "delete",
            UpdateOperation::UpdateVectors(_) => "update_vectors",
            UpdateOperation::DeleteVectors(_) => "delete_vectors",
            UpdateOperation::SetPayload(_) => "set_payload",
            UpdateOperation::OverwritePayload(_) => "overwrite_payload",
            UpdateOperation::DeletePayload(_) => "delete_payload",
            UpdateOperation::ClearPayload(_) => "clear_payload",
        }
    }
}

/// Completion state of an applied operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    /// Accepted and applied locally; durability not yet confirmed.
    Acknowledged,
    /// Applied and durably committed (`wait=true`).
    Completed,
}

/// Result of one applied operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateResult {
    /// Monotonically increasing per-collection operation sequence number.
    pub operation_id: u64,
    pub status: UpdateStatus,
}
