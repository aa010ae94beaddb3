//! Collection and database data structures.
//!
//! A [`Collection`] is the authoritative map from point identifier to
//! [`PointRecord`] within one collection, guarded by a `parking_lot::RwLock`.
//! Each mutating method takes the write lock once, so every point's state
//! transition is serializable; batches against different collections apply
//! fully in parallel. [`Database`] manages named collections with
//! thread-safe concurrent access.

use crate::error::StoreError;
use crate::filter::matches_filter;
use crate::ops::{PointInput, PointVectors, PointsSelector};
use crate::point::{
    Payload, PointId, PointRecord, RetrievedPoint, VectorOutput, WithVector,
};
use crate::schema::CollectionSchema;
use crate::store::executor;
use crate::store::wal::WalEntry;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Internal data for a collection, protected by a `RwLock`.
#[derive(Debug)]
pub struct CollectionData {
    pub name: String,
    pub schema: CollectionSchema,
    pub points: HashMap<PointId, PointRecord>,
    /// Sequence number assigned to the next applied operation.
    pub next_operation_id: u64,
}

impl CollectionData {
    /// Creates empty collection data with the given name and schema.
    pub fn new(name: String, schema: CollectionSchema) -> Self {
        Self {
            name,
            schema,
            points: HashMap::new(),
            next_operation_id: 0,
        }
    }

    /// Resolve a points selector into concrete ids.
    ///
    /// An explicit id list is returned as-is (it may reference missing
    /// points; each operation decides whether that is an error or a no-op).
    /// A filter selects the ids of all currently matching points.
    fn resolve_selector(&self, selector: &PointsSelector) -> Result<Vec<PointId>, StoreError> {
        if let Some(ids) = &selector.points {
            return Ok(ids.clone());
        }
        if let Some(filter) = &selector.filter {
            return Ok(self
                .points
                .iter()
                .filter(|(_, record)| matches_filter(&record.payload, filter))
                .map(|(id, _)| *id)
                .collect());
        }
        Err(StoreError::validation(
            "points",
            "either points list or filter is required",
        ))
    }
}

/// A thread-safe collection of point records.
///
/// Cloning a `Collection` produces a new handle to the same shared data.
#[derive(Debug, Clone)]
pub struct Collection {
    pub data: Arc<RwLock<CollectionData>>,
}

impl Collection {
    /// Creates a new empty collection.
    pub fn new(name: String, schema: CollectionSchema) -> Self {
        Self {
            data: Arc::new(RwLock::new(CollectionData::new(name, schema))),
        }
    }

    /// Returns a clone of the collection's immutable vector schema.
    pub fn schema(&self) -> CollectionSchema {
        self.data.read().schema.clone()
    }

    /// Number of stored points.
    pub fn point_count(&self) -> usize {
        self.data.read().points.len()
    }

    /// Assign the next operation sequence number.
    pub(crate) fn assign_operation_id(&self) -> u64 {
        let mut data = self.data.write();
        let id = data.next_operation_id;
        data.next_operation_id += 1;
        id
    }

    /// Retrieve the listed points in input order. Missing ids are silently
    /// omitted, never an error.
    pub fn retrieve(
        &self,
        ids: &[PointId],
        with_vector: &WithVector,
        with_payload: bool,
    ) -> Vec<RetrievedPoint> {
        let data = self.data.read();
        ids.iter()
            .filter_map(|id| {
                data.points
                    .get(id)
                    .map(|record| render_point(&data.schema, record, with_vector, with_payload))
            })
            .collect()
    }

    /// Retrieve a single point with all vectors and payload.
    pub fn get_point(&self, id: PointId) -> Option<RetrievedPoint> {
        let data = self.data.read();
        data.points
            .get(&id)
            .map(|record| render_point(&data.schema, record, &WithVector::Bool(true), true))
    }

    /// Insert new points or replace parts of existing ones.
    ///
    /// For an existing point, only the named vectors present in the input
    /// are replaced; unmentioned names are left untouched. A supplied
    /// payload replaces the point's payload document (an empty document
    /// replaces with empty); an absent payload leaves it alone. An empty
    /// vector map on a new point creates a vector-less point.
    ///
    /// All inputs are schema-checked before any record is touched.
    pub fn upsert_points(&self, points: &[PointInput]) -> Result<usize, StoreError> {
        let mut data = self.data.write();
        for input in points {
            for (name, vector) in input.vector.iter_named() {
                data.schema.check_vector(name, vector)?;
            }
        }
        for input in points {
            let named = input.vector.clone().into_named();
            match data.points.get_mut(&input.id) {
                Some(record) => {
                    for (name, vector) in named {
                        record.vectors.insert(name, vector);
                    }
                    if let Some(payload) = &input.payload {
                        record.payload.overwrite(payload);
                    }
                }
                None => {
                    let mut record = PointRecord::new(input.id);
                    record.vectors = named;
                    if let Some(payload) = &input.payload {
                        record.payload = payload.clone();
                    }
                    data.points.insert(input.id, record);
                }
            }
        }
        Ok(points.len())
    }

    /// Replace named vectors on points that must already exist.
    ///
    /// Atomic per operation: every referenced id is checked for existence
    /// (and every input schema-checked) before any vector is written, so a
    /// missing id fails the whole operation with nothing applied. Each
    /// input must carry at least one named vector. Unmentioned names are
    /// left unchanged.
    pub fn update_vectors(&self, points: &[PointVectors]) -> Result<usize, StoreError> {
        let mut data = self.data.write();
        for (i, input) in points.iter().enumerate() {
            if input.vector.is_empty() {
                return Err(StoreError::validation(
                    format!("points[{i}].vector"),
                    "must specify vectors to update for point",
                ));
            }
            for (name, vector) in input.vector.iter_named() {
                data.schema.check_vector(name, vector)?;
            }
        }
        for input in points {
            if !data.points.contains_key(&input.id) {
                return Err(StoreError::PointNotFound(input.id));
            }
        }
        for input in points {
            let named = input.vector.clone().into_named();
            if let Some(record) = data.points.get_mut(&input.id) {
                for (name, vector) in named {
                    record.vectors.insert(name, vector);
                }
            }
        }
        Ok(points.len())
    }

    /// Remove the listed named vectors from the addressed points.
    ///
    /// Undeclared names abort the whole operation before any mutation;
    /// removing an already-absent name or addressing a missing id is a
    /// no-op, so the operation is idempotent. Returns the number of points
    /// that actually lost a vector.
    pub fn delete_vectors(
        &self,
        selector: &PointsSelector,
        names: &[String],
    ) -> Result<usize, StoreError> {
        let mut data = self.data.write();
        for name in names {
            data.schema.check_name(name)?;
        }
        let ids = data.resolve_selector(selector)?;
        let mut affected = 0;
        for id in ids {
            if let Some(record) = data.points.get_mut(&id) {
                let mut removed = false;
                for name in names {
                    removed |= record.vectors.remove(name).is_some();
                }
                if removed {
                    affected += 1;
                }
            }
        }
        Ok(affected)
    }

    /// Remove the addressed points. Absent ids are no-ops (idempotent).
    /// Returns the number of points actually removed.
    pub fn delete_points(&self, selector: &PointsSelector) -> Result<usize, StoreError> {
        let mut data = self.data.write();
        let ids = data.resolve_selector(selector)?;
        let mut removed = 0;
        for id in ids {
            if data.points.remove(&id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Shallow key-wise payload upsert on the addressed points.
    /// Missing ids are silently skipped.
    pub fn set_payload(
        &self,
        selector: &PointsSelector,
        payload: &Payload,
    ) -> Result<usize, StoreError> {
        self.mutate_payloads(selector, |p| p.merge(payload))
    }

    /// Replace the whole payload document on the addressed points.
    /// Missing ids are silently skipped.
    pub fn overwrite_payload(
        &self,
        selector: &PointsSelector,
        payload: &Payload,
    ) -> Result<usize, StoreError> {
        self.mutate_payloads(selector, |p| p.overwrite(payload))
    }

    /// Remove the listed payload keys from the addressed points.
    /// Missing ids and absent keys are silently skipped.
    pub fn delete_payload(
        &self,
        selector: &PointsSelector,
        keys: &[String],
    ) -> Result<usize, StoreError> {
        self.mutate_payloads(selector, |p| {
            p.delete_keys(keys);
        })
    }

    /// Empty the payload document of the addressed points.
    /// Missing ids are silently skipped.
    pub fn clear_payload(&self, selector: &PointsSelector) -> Result<usize, StoreError> {
        self.mutate_payloads(selector, Payload::clear)
    }

    fn mutate_payloads(
        &self,
        selector: &PointsSelector,
        mutate: impl Fn(&mut Payload),
    ) -> Result<usize, StoreError> {
        let mut data = self.data.write();
        let ids = data.resolve_selector(selector)?;
        let mut affected = 0;
        for id in ids {
            if let Some(record) = data.points.get_mut(&id) {
                mutate(&mut record.payload);
                affected += 1;
            }
        }
        Ok(affected)
    }
}

/// Shape a stored record for retrieval according to the caller's selectors.
fn render_point(
    schema: &CollectionSchema,
    record: &PointRecord,
    with_vector: &WithVector,
    with_payload: bool,
) -> RetrievedPoint {
    let vector = match with_vector {
        WithVector::Bool(false) => None,
        WithVector::Bool(true) => Some(render_all_vectors(schema, record)),
        WithVector::Names(names) => Some(VectorOutput::Named(
            record
                .vectors
                .iter()
                .filter(|(name, _)| names.contains(*name))
                .map(|(name, v)| (name.clone(), v.clone()))
                .collect(),
        )),
    };
    RetrievedPoint {
        id: record.id,
        vector,
        payload: with_payload.then(|| record.payload.clone()),
    }
}

/// Single-unnamed-vector collections render a bare list when the vector is
/// present (and an empty map once it has been deleted); multi-vector
/// collections always render the name → list map.
fn render_all_vectors(schema: &CollectionSchema, record: &PointRecord) -> VectorOutput {
    if schema.is_single_unnamed() {
        match record.vectors.get("") {
            Some(v) => VectorOutput::Single(v.clone()),
            None => VectorOutput::Named(HashMap::new()),
        }
    } else {
        VectorOutput::Named(record.vectors.clone())
    }
}

/// Database holds all collections.
#[derive(Debug, Clone, Default)]
pub struct Database {
    pub collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl Database {
    /// Creates a new empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new collection. Fails if the name is already taken.
    pub fn create_collection(
        &self,
        name: String,
        schema: CollectionSchema,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write();
        if collections.contains_key(&name) {
            return Err(StoreError::CollectionExists(name));
        }
        collections.insert(name.clone(), Collection::new(name, schema));
        Ok(())
    }

    /// Returns a cloned handle to the named collection, or `None` if not found.
    pub fn get_collection(&self, name: &str) -> Option<Collection> {
        self.collections.read().get(name).cloned()
    }

    /// Returns a handle to the named collection, or a not-found error.
    pub fn collection(&self, name: &str) -> Result<Collection, StoreError> {
        self.get_collection(name)
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))
    }

    /// Deletes a collection by name. Returns `true` if it existed.
    pub fn delete_collection(&self, name: &str) -> bool {
        self.collections.write().remove(name).is_some()
    }

    /// Returns the names of all collections.
    pub fn list_collections(&self) -> Vec<String> {
        self.collections.read().keys().cloned().collect()
    }

    /// Total number of points across all collections.
    pub fn total_points(&self) -> usize {
        self.collections
            .read()
            .values()
            .map(|c| c.point_count())
            .sum()
    }

    /// Rebuild state from replayed WAL entries. Entries that no longer
    /// apply (e.g. updates against a dropped collection) are skipped with a
    /// warning. Returns the number of entries applied.
    pub fn replay_wal(&self, entries: &[WalEntry]) -> usize {
        let mut applied = 0;
        for entry in entries {
            match entry {
                WalEntry::CreateCollection { name, vectors } => {
                    let schema = CollectionSchema::from_config(vectors);
                    match self.create_collection(name.clone(), schema) {
                        Ok(()) => applied += 1,
                        Err(e) => tracing::warn!("WAL replay: create '{}' skipped: {}", name, e),
                    }
                }
                WalEntry::DeleteCollection { name } => {
                    if self.delete_collection(name) {
                        applied += 1;
                    }
                }
                WalEntry::Update {
                    collection,
                    operation,
                } => match self.get_collection(collection) {
                    Some(col) => match executor::apply_operation(&col, operation, true) {
                        Ok(_) => applied += 1,
                        Err(e) => {
                            tracing::warn!(
                                "WAL replay: {} on '{}' skipped: {}",
                                operation.kind(),
                                collection,
                                e
                            );
                        }
                    },
                    None => {
                        tracing::warn!("WAL replay: unknown collection '{}'", collection);
                    }
                },
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter_types::FilterClause;
    use crate::point::VectorInput;
    use crate::schema::VectorsConfig;
    use serde_json::json;

    fn single_schema(dim: usize) -> CollectionSchema {
        CollectionSchema::from_config(&VectorsConfig::Single(crate::schema::VectorParams {
            size: dim,
        }))
    }

    fn multivec_schema() -> CollectionSchema {
        let config: VectorsConfig =
            serde_json::from_value(json!({"text": {"size": 8}, "image": {"size": 4}})).unwrap();
        CollectionSchema::from_config(&config)
    }

    fn payload_of(value: serde_json::Value) -> Payload {
        match value {
            serde_json::Value::Object(map) => Payload(map),
            _ => panic!("expected JSON object"),
        }
    }

    fn point(id: u64, vector: serde_json::Value) -> PointInput {
        PointInput {
            id: PointId::Num(id),
            vector: serde_json::from_value(vector).unwrap(),
            payload: Some(Payload::new()),
        }
    }

    fn ids(ids: &[u64]) -> PointsSelector {
        PointsSelector::from_ids(ids.iter().map(|&n| PointId::Num(n)).collect())
    }

    // ── Upsert and retrieve ────────────────────────────────────────────

    #[test]
    fn test_upsert_and_retrieve() {
        let col = Collection::new("c".into(), single_schema(4));
        col.upsert_points(&[point(7, json!([1.0, 2.0, 3.0, 4.0]))])
            .unwrap();
        assert_eq!(col.point_count(), 1);

        let got = col.retrieve(&[PointId::Num(7)], &WithVector::Bool(true), true);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].id, PointId::Num(7));
        assert_eq!(
            got[0].vector,
            Some(VectorOutput::Single(vec![1.0, 2.0, 3.0, 4.0]))
        );
    }

    #[test]
    fn test_retrieve_omits_missing_ids() {
        let col = Collection::new("c".into(), single_schema(4));
        col.upsert_points(&[point(1, json!([0.0, 0.0, 0.0, 0.0]))])
            .unwrap();
        let got = col.retrieve(
            &[PointId::Num(1), PointId::Num(99)],
            &WithVector::Bool(false),
            true,
        );
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].vector, None);
    }

    #[test]
    fn test_upsert_replaces_existing_vector() {
        let col = Collection::new("c".into(), single_schema(4));
        col.upsert_points(&[point(7, json!([1.0, 2.0, 3.0, 4.0]))])
            .unwrap();
        col.upsert_points(&[point(7, json!([2.0, 1.0, 3.0, 4.0]))])
            .unwrap();
        let got = col.get_point(PointId::Num(7)).unwrap();
        assert_eq!(got.vector, Some(VectorOutput::Single(vec![2.0, 1.0, 3.0, 4.0])));
    }

    #[test]
    fn test_upsert_partial_vectors_stay_absent() {
        let col = Collection::new("c".into(), multivec_schema());
        col.upsert_points(&[PointInput {
            id: PointId::Num(102),
            vector: serde_json::from_value(json!({"image": [0.19, 0.81, 0.75, 0.11]})).unwrap(),
            payload: None,
        }])
        .unwrap();

        let got = col.get_point(PointId::Num(102)).unwrap();
        match got.vector {
            Some(VectorOutput::Named(v)) => {
                assert!(v.contains_key("image"));
                assert!(!v.contains_key("text"), "absent name must not be zero-filled");
            }
            other => panic!("expected named vectors, got {other:?}"),
        }
    }

    #[test]
    fn test_upsert_empty_vector_map_creates_vectorless_point() {
        let col = Collection::new("c".into(), multivec_schema());
        col.upsert_points(&[PointInput {
            id: PointId::Num(103),
            vector: VectorInput::default(),
            payload: None,
        }])
        .unwrap();
        let got = col.get_point(PointId::Num(103)).unwrap();
        assert_eq!(got.vector, Some(VectorOutput::Named(HashMap::new())));
    }

    #[test]
    fn test_upsert_merges_vectors_keeps_unmentioned_names() {
        let col = Collection::new("c".into(), multivec_schema());
        col.upsert_points(&[PointInput {
            id: PointId::Num(1),
            vector: serde_json::from_value(json!({"text": vec![0.1f32; 8]})).unwrap(),
            payload: None,
        }])
        .unwrap();
        col.upsert_points(&[PointInput {
            id: PointId::Num(1),
            vector: serde_json::from_value(json!({"image": [0.2, 0.2, 0.2, 0.2]})).unwrap(),
            payload: None,
        }])
        .unwrap();
        let got = col.get_point(PointId::Num(1)).unwrap();
        match got.vector {
            Some(VectorOutput::Named(v)) => {
                assert!(v.contains_key("text"));
                assert!(v.contains_key("image"));
            }
            other => panic!("expected named vectors, got {other:?}"),
        }
    }

    #[test]
    fn test_upsert_rejects_undeclared_name_without_side_effects() {
        let col = Collection::new("c".into(), multivec_schema());
        let err = col
            .upsert_points(&[
                PointInput {
                    id: PointId::Num(1),
                    vector: serde_json::from_value(json!({"text": vec![0.1f32; 8]})).unwrap(),
                    payload: None,
                },
                PointInput {
                    id: PointId::Num(2),
                    vector: serde_json::from_value(json!({"bogus": [0.1]})).unwrap(),
                    payload: None,
                },
            ])
            .unwrap_err();
        assert_eq!(err, StoreError::vector_name("bogus"));
        assert_eq!(col.point_count(), 0, "validation must precede mutation");
    }

    #[test]
    fn test_upsert_rejects_dimension_mismatch() {
        let col = Collection::new("c".into(), single_schema(4));
        let err = col
            .upsert_points(&[point(1, json!([1.0, 2.0]))])
            .unwrap_err();
        assert_eq!(err, StoreError::vector_dimension(4, 2));
    }

    // ── Delete ─────────────────────────────────────────────────────────

    #[test]
    fn test_delete_is_idempotent() {
        let col = Collection::new("c".into(), single_schema(4));
        col.upsert_points(&[point(8, json!([1.0, 2.0, 3.0, 4.0]))])
            .unwrap();
        assert_eq!(col.delete_points(&ids(&[8])).unwrap(), 1);
        assert_eq!(col.delete_points(&ids(&[8])).unwrap(), 0);
        assert_eq!(col.point_count(), 0);
    }

    #[test]
    fn test_delete_then_reupsert_is_fresh() {
        let col = Collection::new("c".into(), single_schema(4));
        col.upsert_points(&[PointInput {
            id: PointId::Num(1),
            vector: serde_json::from_value(json!([1.0, 0.0, 0.0, 0.0])).unwrap(),
            payload: Some(payload_of(json!({"old": true}))),
        }])
        .unwrap();
        col.delete_points(&ids(&[1])).unwrap();
        col.upsert_points(&[point(1, json!([0.0, 1.0, 0.0, 0.0]))])
            .unwrap();
        let got = col.get_point(PointId::Num(1)).unwrap();
        assert_eq!(got.payload, Some(Payload::new()), "no residual payload");
    }

    #[test]
    fn test_delete_by_filter() {
        let col = Collection::new("c".into(), single_schema(4));
        for i in 1..=3 {
            col.upsert_points(&[PointInput {
                id: PointId::Num(i),
                vector: serde_json::from_value(json!([0.0, 0.0, 0.0, 0.0])).unwrap(),
                payload: Some(payload_of(json!({"keep": i == 3}))),
            }])
            .unwrap();
        }
        let selector = PointsSelector {
            points: None,
            filter: Some(serde_json::from_value(json!({
                "must": [{"field": "keep", "op": "eq", "value": false}]
            })).unwrap()),
        };
        assert_eq!(col.delete_points(&selector).unwrap(), 2);
        assert_eq!(col.point_count(), 1);
    }

    #[test]
    fn test_selector_requires_points_or_filter() {
        let col = Collection::new("c".into(), single_schema(4));
        let err = col.delete_points(&PointsSelector::default()).unwrap_err();
        assert!(matches!(err, StoreError::Validation { .. }));
    }

    // ── Update vectors ─────────────────────────────────────────────────

    #[test]
    fn test_update_vectors_replaces_mentioned_keeps_rest() {
        let col = Collection::new("c".into(), multivec_schema());
        col.upsert_points(&[PointInput {
            id: PointId::Num(1),
            vector: serde_json::from_value(
                json!({"text": vec![0.1f32; 8], "image": [0.5, 0.5, 0.5, 0.5]}),
            )
            .unwrap(),
            payload: Some(payload_of(json!({"city": "Berlin"}))),
        }])
        .unwrap();

        col.update_vectors(&[PointVectors {
            id: PointId::Num(1),
            vector: serde_json::from_value(json!({"image": [0.0, 0.01, 0.0, 0.01]})).unwrap(),
        }])
        .unwrap();

        let got = col.get_point(PointId::Num(1)).unwrap();
        match got.vector {
            Some(VectorOutput::Named(v)) => {
                assert_eq!(v.get("image"), Some(&vec![0.0, 0.01, 0.0, 0.01]));
                assert_eq!(v.get("text"), Some(&vec![0.1; 8]));
            }
            other => panic!("expected named vectors, got {other:?}"),
        }
        assert_eq!(got.payload.unwrap().get("city"), Some(&json!("Berlin")));
    }

    #[test]
    fn test_update_vectors_missing_point_applies_nothing() {
        let col = Collection::new("c".into(), multivec_schema());
        col.upsert_points(&[PointInput {
            id: PointId::Num(1),
            vector: serde_json::from_value(json!({"text": vec![0.1f32; 8]})).unwrap(),
            payload: None,
        }])
        .unwrap();

        let err = col
            .update_vectors(&[
                PointVectors {
                    id: PointId::Num(1),
                    vector: serde_json::from_value(json!({"text": vec![0.9f32; 8]})).unwrap(),
                },
                PointVectors {
                    id: PointId::Num(424242424242424242),
                    vector: serde_json::from_value(json!({"image": [0.1, 0.1, 0.1, 0.1]}))
                        .unwrap(),
                },
            ])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Not found: No point with id 424242424242424242 found"
        );

        // point 1 must be untouched
        let got = col.get_point(PointId::Num(1)).unwrap();
        match got.vector {
            Some(VectorOutput::Named(v)) => assert_eq!(v.get("text"), Some(&vec![0.1; 8])),
            other => panic!("expected named vectors, got {other:?}"),
        }
    }

    #[test]
    fn test_update_vectors_requires_at_least_one_vector() {
        let col = Collection::new("c".into(), multivec_schema());
        col.upsert_points(&[PointInput {
            id: PointId::Num(1),
            vector: VectorInput::default(),
            payload: None,
        }])
        .unwrap();
        let err = col
            .update_vectors(&[PointVectors {
                id: PointId::Num(1),
                vector: VectorInput::default(),
            }])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error in JSON body: [points[0].vector: must specify vectors to update for point]"
        );
    }

    // ── Delete vectors ─────────────────────────────────────────────────

    #[test]
    fn test_delete_vectors_idempotent() {
        let col = Collection::new("c".into(), multivec_schema());
        col.upsert_points(&[PointInput {
            id: PointId::Num(1),
            vector: serde_json::from_value(
                json!({"text": vec![0.1f32; 8], "image": [0.2, 0.2, 0.2, 0.2]}),
            )
            .unwrap(),
            payload: None,
        }])
        .unwrap();

        assert_eq!(
            col.delete_vectors(&ids(&[1]), &["image".into()]).unwrap(),
            1
        );
        // second run removes nothing but is not an error
        assert_eq!(
            col.delete_vectors(&ids(&[1]), &["image".into()]).unwrap(),
            0
        );
        let got = col.get_point(PointId::Num(1)).unwrap();
        match got.vector {
            Some(VectorOutput::Named(v)) => {
                assert!(!v.contains_key("image"));
                assert!(v.contains_key("text"));
            }
            other => panic!("expected named vectors, got {other:?}"),
        }
    }

    #[test]
    fn test_delete_vectors_unknown_name_aborts_before_mutation() {
        let col = Collection::new("c".into(), multivec_schema());
        col.upsert_points(&[PointInput {
            id: PointId::Num(1),
            vector: serde_json::from_value(json!({"text": vec![0.1f32; 8]})).unwrap(),
            payload: None,
        }])
        .unwrap();
        let err = col
            .delete_vectors(&ids(&[1]), &["text".into(), "a".into()])
            .unwrap_err();
        assert_eq!(err.to_string(), "Wrong input: Not existing vector name error: a");
        let got = col.get_point(PointId::Num(1)).unwrap();
        match got.vector {
            Some(VectorOutput::Named(v)) => assert!(v.contains_key("text"), "no partial apply"),
            other => panic!("expected named vectors, got {other:?}"),
        }
    }

    #[test]
    fn test_delete_vectors_match_all_filter() {
        let col = Collection::new("c".into(), multivec_schema());
        for i in 1..=2 {
            col.upsert_points(&[PointInput {
                id: PointId::Num(i),
                vector: serde_json::from_value(json!({"image": [0.1, 0.1, 0.1, 0.1]})).unwrap(),
                payload: None,
            }])
            .unwrap();
        }
        let selector = PointsSelector {
            points: None,
            filter: Some(FilterClause::default()),
        };
        assert_eq!(
            col.delete_vectors(&selector, &["image".into()]).unwrap(),
            2
        );
    }

    #[test]
    fn test_delete_vectors_missing_point_is_noop() {
        let col = Collection::new("c".into(), multivec_schema());
        assert_eq!(
            col.delete_vectors(&ids(&[42]), &["image".into()]).unwrap(),
            0
        );
    }

    // ── Payload operations ─────────────────────────────────────────────

    #[test]
    fn test_payload_overwrite_set_delete_sequence() {
        let col = Collection::new("c".into(), single_schema(4));
        col.upsert_points(&[point(1, json!([0.0, 0.0, 0.0, 0.0]))])
            .unwrap();

        col.overwrite_payload(&ids(&[1]), &payload_of(json!({"test_payload_1": "1"})))
            .unwrap();
        col.set_payload(
            &ids(&[1]),
            &payload_of(json!({"test_payload_2": "2", "test_payload_3": "3"})),
        )
        .unwrap();
        col.delete_payload(&ids(&[1]), &["test_payload_2".into()])
            .unwrap();

        let got = col.get_point(PointId::Num(1)).unwrap();
        assert_eq!(
            serde_json::to_value(got.payload.unwrap()).unwrap(),
            json!({"test_payload_1": "1", "test_payload_3": "3"})
        );
    }

    #[test]
    fn test_clear_payload() {
        let col = Collection::new("c".into(), single_schema(4));
        col.upsert_points(&[PointInput {
            id: PointId::Num(1),
            vector: serde_json::from_value(json!([0.0, 0.0, 0.0, 0.0])).unwrap(),
            payload: Some(payload_of(json!({"x": 1}))),
        }])
        .unwrap();
        col.clear_payload(&ids(&[1])).unwrap();
        assert_eq!(
            col.get_point(PointId::Num(1)).unwrap().payload,
            Some(Payload::new())
        );
    }

    #[test]
    fn test_payload_ops_skip_missing_points() {
        let col = Collection::new("c".into(), single_schema(4));
        assert_eq!(
            col.set_payload(&ids(&[404]), &payload_of(json!({"k": "v"})))
                .unwrap(),
            0
        );
        assert_eq!(col.clear_payload(&ids(&[404])).unwrap(), 0);
    }

    // ── Database CRUD ──────────────────────────────────────────────────

    #[test]
    fn test_database_create_and_get() {
        let db = Database::new();
        db.create_collection("c1".into(), single_schema(4)).unwrap();
        assert!(db.get_collection("c1").is_some());
        assert!(db.get_collection("nope").is_none());
        assert!(matches!(
            db.collection("nope").unwrap_err(),
            StoreError::CollectionNotFound(_)
        ));
    }

    #[test]
    fn test_database_duplicate_collection() {
        let db = Database::new();
        db.create_collection("dup".into(), single_schema(4)).unwrap();
        assert_eq!(
            db.create_collection("dup".into(), single_schema(4)),
            Err(StoreError::CollectionExists("dup".into()))
        );
    }

    #[test]
    fn test_database_delete_collection() {
        let db = Database::new();
        db.create_collection("del".into(), single_schema(4)).unwrap();
        assert!(db.delete_collection("del"));
        assert!(!db.delete_collection("del"));
    }

    #[test]
    fn test_replay_wal_rebuilds_state() {
        use crate::ops::{UpdateOperation, UpsertOperation};
        use crate::schema::{VectorParams, VectorsConfig};

        let db = Database::new();
        let entries = vec![
            WalEntry::CreateCollection {
                name: "c".into(),
                vectors: VectorsConfig::Single(VectorParams { size: 4 }),
            },
            WalEntry::Update {
                collection: "c".into(),
                operation: UpdateOperation::Upsert(UpsertOperation {
                    points: vec![point(7, json!([1.0, 2.0, 3.0, 4.0]))],
                }),
            },
        ];
        assert_eq!(db.replay_wal(&entries), 2);
        let col = db.get_collection("c").unwrap();
        assert_eq!(col.point_count(), 1);
    }
}
