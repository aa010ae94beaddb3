//! HTTP request handlers and shared application state.

use crate::api::errors::ApiError;
use crate::api::metrics;
use crate::api::models::*;
use crate::wal_async::WriteAheadLog;
use axum::extract::{Path, Query, State};
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;
use pointsdb_core::ops::{
    ClearPayloadOperation, DeleteOperation, DeletePayloadOperation, DeleteVectorsOperation,
    SetPayloadOperation, UpdateOperation, UpdateResult, UpdateVectorsOperation, UpsertOperation,
};
use pointsdb_core::point::{PointId, RetrievedPoint};
use pointsdb_core::schema::CollectionSchema;
use pointsdb_core::store::executor;
use pointsdb_core::store::persistence;
use pointsdb_core::store::wal::WalEntry;
use pointsdb_core::store::Database;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Shared application state passed to every handler via Axum's `State`
/// extractor.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub data_dir: String,
    pub wal: Arc<WriteAheadLog>,
    pub wal_path: PathBuf,
    pub prometheus_handle: PrometheusHandle,
    pub start_time: Instant,
    /// Per-collection write serialization, see [`dispatch_update`].
    pub write_locks: Arc<parking_lot::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl AppState {
    fn write_lock(&self, collection: &str) -> Arc<tokio::sync::Mutex<()>> {
        Arc::clone(
            self.write_locks
                .lock()
                .entry(collection.to_string())
                .or_default(),
        )
    }
}

/// Log the operation, apply it, and record metrics. The per-collection lock
/// is held across WAL queueing and the in-memory apply so the entry's file
/// position matches the apply order; crash replay then converges to the
/// state clients observed. Durability (with `wait`) is awaited after the
/// lock is released, keeping group commit effective across concurrent
/// writers. Either way the apply completes before the response, so a
/// subsequent read on this node observes the write.
async fn dispatch_update(
    state: &AppState,
    collection_name: &str,
    operation: UpdateOperation,
    wait: bool,
) -> Result<UpdateResult, ApiError> {
    let collection = state.db.collection(collection_name)?;
    executor::validate_operation(&operation)?;

    let entry = WalEntry::Update {
        collection: collection_name.to_string(),
        operation: operation.clone(),
    };

    let write_lock = state.write_lock(collection_name);
    let guard = write_lock.lock().await;
    let ticket = state.wal.begin_append(&entry).await.map_err(wal_error)?;
    let result = executor::apply_operation(&collection, &operation, wait)?;
    drop(guard);

    if wait {
        ticket.wait().await.map_err(wal_error)?;
    }
    metrics::record_write_operation(collection_name, operation.kind());
    Ok(result)
}

fn wal_error(e: std::io::Error) -> ApiError {
    tracing::error!("WAL append failed: {}", e);
    ApiError::Internal("Write failed".into())
}

async fn log_entry(state: &AppState, entry: &WalEntry, wait: bool) -> Result<(), ApiError> {
    let appended = if wait {
        state.wal.append(entry).await
    } else {
        state.wal.append_nowait(entry).await
    };
    appended.map_err(wal_error)
}

// ── Service endpoints ──────────────────────────────────────────────────

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        collections: state.db.collections.read().len(),
        points: state.db.total_points(),
    })
}

pub async fn metrics_endpoint(State(state): State<AppState>) -> String {
    state.prometheus_handle.render()
}

// ── Collection management ──────────────────────────────────────────────

pub async fn list_collections(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<CollectionInfo>>> {
    let started = Instant::now();
    let collections = state.db.collections.read();
    let mut infos: Vec<CollectionInfo> = collections
        .iter()
        .map(|(name, collection)| CollectionInfo {
            name: name.clone(),
            points_count: collection.point_count(),
        })
        .collect();
    infos.sort_by(|a, b| a.name.cmp(&b.name));
    drop(collections);
    ApiResponse::ok(infos, started)
}

pub async fn create_collection(
    State(state): State<AppState>,
    Json(req): Json<CreateCollectionRequest>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let started = Instant::now();
    persistence::check_collection_name(&req.name)?;

    let schema = CollectionSchema::from_config(&req.vectors);
    for vector_name in schema.names() {
        let dim = schema.dimension_of(vector_name).unwrap_or(0);
        if dim == 0 || dim > pointsdb_core::config::MAX_DIMENSION {
            return Err(pointsdb_core::error::StoreError::validation(
                "vectors",
                format!(
                    "vector dimension must be between 1 and {}",
                    pointsdb_core::config::MAX_DIMENSION
                ),
            )
            .into());
        }
    }
    state.db.create_collection(req.name.clone(), schema)?;

    let entry = WalEntry::CreateCollection {
        name: req.name.clone(),
        vectors: req.vectors,
    };
    // collection DDL is always durable before the response
    log_entry(&state, &entry, true).await?;

    tracing::info!(collection = %req.name, "Collection created");
    Ok(ApiResponse::ok(true, started))
}

pub async fn delete_collection(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let started = Instant::now();
    if !state.db.delete_collection(&name) {
        return Err(ApiError::NotFound(format!("Collection '{name}' not found")));
    }
    state.write_locks.lock().remove(&name);
    if let Err(e) = persistence::remove_snapshot(std::path::Path::new(&state.data_dir), &name) {
        tracing::warn!("Could not remove snapshot for '{}': {}", name, e);
    }
    let entry = WalEntry::DeleteCollection { name: name.clone() };
    log_entry(&state, &entry, true).await?;

    tracing::info!(collection = %name, "Collection deleted");
    Ok(ApiResponse::ok(true, started))
}

// ── Point mutation ─────────────────────────────────────────────────────

pub async fn upsert_points(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<WaitParam>,
    Json(body): Json<UpsertOperation>,
) -> Result<Json<ApiResponse<UpdateResult>>, ApiError> {
    let started = Instant::now();
    let result =
        dispatch_update(&state, &name, UpdateOperation::Upsert(body), params.wait).await?;
    Ok(ApiResponse::ok(result, started))
}

pub async fn update_vectors(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<WaitParam>,
    Json(body): Json<UpdateVectorsOperation>,
) -> Result<Json<ApiResponse<UpdateResult>>, ApiError> {
    let started = Instant::now();
    let result = dispatch_update(
        &state,
        &name,
        UpdateOperation::UpdateVectors(body),
        params.wait,
    )
    .await?;
    Ok(ApiResponse::ok(result, started))
}

pub async fn delete_vectors(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<WaitParam>,
    Json(body): Json<DeleteVectorsOperation>,
) -> Result<Json<ApiResponse<UpdateResult>>, ApiError> {
    let started = Instant::now();
    let result = dispatch_update(
        &state,
        &name,
        UpdateOperation::DeleteVectors(body),
        params.wait,
    )
    .await?;
    Ok(ApiResponse::ok(result, started))
}

pub async fn delete_points(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<WaitParam>,
    Json(body): Json<DeleteOperation>,
) -> Result<Json<ApiResponse<UpdateResult>>, ApiError> {
    let started = Instant::now();
    let result =
        dispatch_update(&state, &name, UpdateOperation::Delete(body), params.wait).await?;
    Ok(ApiResponse::ok(result, started))
}

// ── Payload mutation ───────────────────────────────────────────────────

pub async fn set_payload(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<WaitParam>,
    Json(body): Json<SetPayloadOperation>,
) -> Result<Json<ApiResponse<UpdateResult>>, ApiError> {
    let started = Instant::now();
    let result =
        dispatch_update(&state, &name, UpdateOperation::SetPayload(body), params.wait).await?;
    Ok(ApiResponse::ok(result, started))
}

pub async fn overwrite_payload(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<WaitParam>,
    Json(body): Json<SetPayloadOperation>,
) -> Result<Json<ApiResponse<UpdateResult>>, ApiError> {
    let started = Instant::now();
    let result = dispatch_update(
        &state,
        &name,
        UpdateOperation::OverwritePayload(body),
        params.wait,
    )
    .await?;
    Ok(ApiResponse::ok(result, started))
}

pub async fn delete_payload(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<WaitParam>,
    Json(body): Json<DeletePayloadOperation>,
) -> Result<Json<ApiResponse<UpdateResult>>, ApiError> {
    let started = Instant::now();
    let result = dispatch_update(
        &state,
        &name,
        UpdateOperation::DeletePayload(body),
        params.wait,
    )
    .await?;
    Ok(ApiResponse::ok(result, started))
}

pub async fn clear_payload(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<WaitParam>,
    Json(body): Json<ClearPayloadOperation>,
) -> Result<Json<ApiResponse<UpdateResult>>, ApiError> {
    let started = Instant::now();
    let result = dispatch_update(
        &state,
        &name,
        UpdateOperation::ClearPayload(body),
        params.wait,
    )
    .await?;
    Ok(ApiResponse::ok(result, started))
}

// ── Batch ──────────────────────────────────────────────────────────────

/// Heterogeneous batch: the whole list is validated up front (a bad entry
/// rejects everything with its index in the field path), then applied
/// strictly in order. A runtime failure stops the walk; earlier entries
/// stay applied.
pub async fn batch_update(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<WaitParam>,
    Json(operations): Json<Vec<UpdateOperation>>,
) -> Result<Json<ApiResponse<Vec<UpdateResult>>>, ApiError> {
    let started = Instant::now();
    let collection = state.db.collection(&name)?;
    executor::validate_batch(&operations)?;

    let write_lock = state.write_lock(&name);
    let guard = write_lock.lock().await;
    let mut results = Vec::with_capacity(operations.len());
    let mut tickets = Vec::with_capacity(operations.len());
    for operation in &operations {
        let entry = WalEntry::Update {
            collection: name.clone(),
            operation: operation.clone(),
        };
        tickets.push(state.wal.begin_append(&entry).await.map_err(wal_error)?);
        let result = executor::apply_operation(&collection, operation, params.wait)?;
        metrics::record_write_operation(&name, operation.kind());
        results.push(result);
    }
    drop(guard);

    if params.wait {
        for ticket in tickets {
            ticket.wait().await.map_err(wal_error)?;
        }
    }
    Ok(ApiResponse::ok(results, started))
}

// ── Point retrieval ────────────────────────────────────────────────────

pub async fn retrieve_points(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<PointsRetrieveRequest>,
) -> Result<Json<ApiResponse<Vec<RetrievedPoint>>>, ApiError> {
    let started = Instant::now();
    let collection = state.db.collection(&name)?;
    let points = collection.retrieve(&req.ids, &req.with_vector, req.with_payload);
    Ok(ApiResponse::ok(points, started))
}

pub async fn get_point(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<RetrievedPoint>>, ApiError> {
    let started = Instant::now();
    let point_id = parse_point_id(&id)?;
    let collection = state.db.collection(&name)?;
    let point = collection
        .get_point(point_id)
        .ok_or(pointsdb_core::error::StoreError::PointNotFound(point_id))?;
    Ok(ApiResponse::ok(point, started))
}

/// A path id is a u64 or a UUID, mirroring the body-side untagged enum.
fn parse_point_id(raw: &str) -> Result<PointId, ApiError> {
    if let Ok(n) = raw.parse::<u64>() {
        return Ok(PointId::Num(n));
    }
    if let Ok(u) = Uuid::parse_str(raw) {
        return Ok(PointId::Uuid(u));
    }
    Err(ApiError::BadRequest(format!(
        "Wrong input: unable to parse point id: {raw}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_point_id() {
        assert_eq!(parse_point_id("7").unwrap(), PointId::Num(7));
        let u = Uuid::new_v4();
        assert_eq!(parse_point_id(&u.to_string()).unwrap(), PointId::Uuid(u));
        assert!(parse_point_id("not-an-id").is_err());
    }
}
