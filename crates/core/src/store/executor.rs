//! Batch operation executor.
//!
//! Mutation flows through two phases. Validation is structural and runs over
//! the whole batch before anything is touched, so a malformed entry rejects
//! the batch with zero side effects; field paths of entry `k` are prefixed
//! with `[k].`. Application then walks the batch strictly in order. A
//! runtime failure (a missing point in `update_vectors`, say) stops the walk
//! and leaves the prefix of already-applied operations in place. There is no
//! rollback.

use crate::config::{MAX_BATCH_OPERATIONS, MAX_PAYLOAD_BYTES, MAX_PAYLOAD_KEYS, MAX_POINTS_PER_OPERATION};
use crate::error::StoreError;
use crate::ops::{
    PointsSelector, UpdateOperation, UpdateResult, UpdateStatus,
};
use crate::point::Payload;
use crate::store::collection::Collection;

/// Structural validation of a single operation: selector presence, per-entry
/// vector requirements, and size limits. Needs no collection state; schema
/// and existence checks happen at apply time.
pub fn validate_operation(op: &UpdateOperation) -> Result<(), StoreError> {
    match op {
        UpdateOperation::Upsert(body) => {
            check_point_count(body.points.len())?;
            for (i, input) in body.points.iter().enumerate() {
                if let Some(payload) = &input.payload {
                    check_payload(&format!("points[{i}].payload"), payload)?;
                }
            }
            Ok(())
        }
        UpdateOperation::UpdateVectors(body) => {
            check_point_count(body.points.len())?;
            for (i, input) in body.points.iter().enumerate() {
                if input.vector.is_empty() {
                    return Err(StoreError::validation(
                        format!("points[{i}].vector"),
                        "must specify vectors to update for point",
                    ));
                }
            }
            Ok(())
        }
        UpdateOperation::DeleteVectors(body) => {
            check_selector(&body.selector)?;
            if body.vector.is_empty() {
                return Err(StoreError::validation(
                    "vector",
                    "must specify vector names to delete",
                ));
            }
            Ok(())
        }
        UpdateOperation::Delete(body) => check_selector(&body.selector),
        UpdateOperation::SetPayload(body) | UpdateOperation::OverwritePayload(body) => {
            check_selector(&body.selector)?;
            check_payload("payload", &body.payload)
        }
        UpdateOperation::DeletePayload(body) => {
            check_selector(&body.selector)?;
            if body.keys.is_empty() {
                return Err(StoreError::validation("keys", "must specify payload keys to delete"));
            }
            Ok(())
        }
        UpdateOperation::ClearPayload(body) => check_selector(&body.selector),
    }
}

/// Validate a whole batch before applying any of it. Field paths of entry
/// `k` come back prefixed with `[k].` so the caller can tell entries apart.
pub fn validate_batch(operations: &[UpdateOperation]) -> Result<(), StoreError> {
    if operations.len() > MAX_BATCH_OPERATIONS {
        return Err(StoreError::WrongInput(format!(
            "batch of {} operations exceeds the limit of {}",
            operations.len(),
            MAX_BATCH_OPERATIONS
        )));
    }
    for (k, op) in operations.iter().enumerate() {
        validate_operation(op).map_err(|e| e.with_field_prefix(&format!("[{k}].")))?;
    }
    Ok(())
}

/// Apply one validated operation to a collection. The returned status is
/// `Completed` when the caller already confirmed durability (`wait`),
/// `Acknowledged` otherwise.
pub fn apply_operation(
    collection: &Collection,
    op: &UpdateOperation,
    wait: bool,
) -> Result<UpdateResult, StoreError> {
    match op {
        UpdateOperation::Upsert(body) => {
            collection.upsert_points(&body.points)?;
        }
        UpdateOperation::Delete(body) => {
            collection.delete_points(&body.selector)?;
        }
        UpdateOperation::UpdateVectors(body) => {
            collection.update_vectors(&body.points)?;
        }
        UpdateOperation::DeleteVectors(body) => {
            collection.delete_vectors(&body.selector, &body.vector)?;
        }
        UpdateOperation::SetPayload(body) => {
            collection.set_payload(&body.selector, &body.payload)?;
        }
        UpdateOperation::OverwritePayload(body) => {
            collection.overwrite_payload(&body.selector, &body.payload)?;
        }
        UpdateOperation::DeletePayload(body) => {
            collection.delete_payload(&body.selector, &body.keys)?;
        }
        UpdateOperation::ClearPayload(body) => {
            collection.clear_payload(&body.selector)?;
        }
    }
    Ok(UpdateResult {
        operation_id: collection.assign_operation_id(),
        status: if wait {
            UpdateStatus::Completed
        } else {
            UpdateStatus::Acknowledged
        },
    })
}

/// Validate then apply a batch strictly in order.
///
/// Validation failures abort before any application. A runtime failure
/// mid-batch returns the error; operations before the failing one stay
/// applied.
pub fn apply_batch(
    collection: &Collection,
    operations: &[UpdateOperation],
    wait: bool,
) -> Result<Vec<UpdateResult>, StoreError> {
    validate_batch(operations)?;
    let mut results = Vec::with_capacity(operations.len());
    for op in operations {
        results.push(apply_operation(collection, op, wait)?);
    }
    Ok(results)
}

fn check_selector(selector: &PointsSelector) -> Result<(), StoreError> {
    if selector.is_unspecified() {
        return Err(StoreError::validation(
            "points",
            "either points list or filter is required",
        ));
    }
    if let Some(ids) = &selector.points {
        check_point_count(ids.len())?;
    }
    Ok(())
}

fn check_point_count(count: usize) -> Result<(), StoreError> {
    if count > MAX_POINTS_PER_OPERATION {
        return Err(StoreError::WrongInput(format!(
            "operation addresses {count} points, exceeding the limit of {MAX_POINTS_PER_OPERATION}"
        )));
    }
    Ok(())
}

fn check_payload(field: &str, payload: &Payload) -> Result<(), StoreError> {
    if payload.len() > MAX_PAYLOAD_KEYS {
        return Err(StoreError::validation(
            field,
            format!("payload has {} keys, exceeding the limit of {MAX_PAYLOAD_KEYS}", payload.len()),
        ));
    }
    let bytes = serde_json::to_vec(payload).map(|v| v.len()).unwrap_or(0);
    if bytes > MAX_PAYLOAD_BYTES {
        return Err(StoreError::validation(
            field,
            format!("payload is {bytes} bytes, exceeding the limit of {MAX_PAYLOAD_BYTES}"),
        ));
    }
    Ok(())
}
