//! Core point types for points.db.
//!
//! A [`PointRecord`] is the unit of storage: an identifier plus a set of
//! named vectors and a JSON payload document. A name absent from the vector
//! map means "this point has no vector under that name", which is distinct
//! from a zero vector. The empty string names the default/unnamed vector.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// A point identifier: an unsigned 64-bit integer or a UUID.
///
/// Untagged on the wire: JSON numbers deserialize as [`PointId::Num`],
/// UUID-formatted strings as [`PointId::Uuid`]. Immutable once assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    /// Unsigned integer identifier.
    Num(u64),
    /// UUID identifier.
    Uuid(Uuid),
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointId::Num(n) => write!(f, "{n}"),
            PointId::Uuid(u) => write!(f, "{u}"),
        }
    }
}

impl From<u64> for PointId {
    fn from(n: u64) -> Self {
        PointId::Num(n)
    }
}

impl From<Uuid> for PointId {
    fn from(u: Uuid) -> Self {
        PointId::Uuid(u)
    }
}

/// Mapping from vector name to vector data. The empty string key is the
/// default/unnamed vector.
pub type NamedVectors = HashMap<String, Vec<f32>>;

/// A point's vector field as it appears on the wire: either a bare float
/// list (shorthand for the default/unnamed vector) or a name → list map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VectorInput {
    /// Bare list, shorthand for the default/unnamed vector.
    Single(Vec<f32>),
    /// Explicit name → vector map. May be empty (a vector-less point).
    Named(NamedVectors),
}

impl VectorInput {
    /// Normalize into a named vector map. A bare list becomes the
    /// default/unnamed (`""`) entry.
    pub fn into_named(self) -> NamedVectors {
        match self {
            VectorInput::Single(v) => {
                let mut m = HashMap::with_capacity(1);
                m.insert(String::new(), v);
                m
            }
            VectorInput::Named(m) => m,
        }
    }

    /// Borrowing view as name/vector pairs, without allocating for the map case.
    pub fn iter_named(&self) -> Vec<(&str, &Vec<f32>)> {
        match self {
            VectorInput::Single(v) => vec![("", v)],
            VectorInput::Named(m) => m.iter().map(|(k, v)| (k.as_str(), v)).collect(),
        }
    }

    /// True if no vector is supplied at all (an empty named map).
    pub fn is_empty(&self) -> bool {
        match self {
            VectorInput::Single(_) => false,
            VectorInput::Named(m) => m.is_empty(),
        }
    }
}

impl Default for VectorInput {
    fn default() -> Self {
        VectorInput::Named(HashMap::new())
    }
}

/// A point's payload: a JSON object of arbitrary structured metadata.
///
/// Absent payload is equivalent to an empty document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(pub serde_json::Map<String, serde_json::Value>);

impl Payload {
    /// Creates an empty payload document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shallow key-wise upsert: keys in `other` are set, the rest are kept.
    pub fn merge(&mut self, other: &Payload) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }

    /// Replace the whole document with `other`.
    pub fn overwrite(&mut self, other: &Payload) {
        self.0 = other.0.clone();
    }

    /// Remove the listed keys. Absent keys are no-ops. Returns how many
    /// keys were actually removed.
    pub fn delete_keys(&mut self, keys: &[String]) -> usize {
        keys.iter().filter(|k| self.0.remove(*k).is_some()).count()
    }

    /// Empty the document.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Look up a top-level key.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// True if the document has no keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of top-level keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Payload {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Payload(map)
    }
}

/// A stored point: identifier, named vectors, and payload.
///
/// Existence is membership in the collection's point map: deleting and
/// re-upserting an id yields a fresh record with no residual state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    /// Unique identifier within the collection.
    pub id: PointId,
    /// Named vectors currently present on this point.
    #[serde(default)]
    pub vectors: NamedVectors,
    /// Structured metadata document.
    #[serde(default)]
    pub payload: Payload,
}

impl PointRecord {
    /// Creates a vector-less point with an empty payload.
    pub fn new(id: PointId) -> Self {
        Self {
            id,
            vectors: HashMap::new(),
            payload: Payload::new(),
        }
    }
}

/// Vector selector for retrieval: include none, all, or specific names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WithVector {
    /// `true` = all present vectors, `false` = none.
    Bool(bool),
    /// Only the listed names (absent names are simply omitted).
    Names(Vec<String>),
}

impl Default for WithVector {
    fn default() -> Self {
        WithVector::Bool(false)
    }
}

/// Rendered vector field of a retrieved point.
///
/// Single-unnamed-vector collections render a bare list when the vector is
/// present and an empty map when it has been deleted; multi-vector
/// collections always render the name → list map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum VectorOutput {
    /// Bare list for single-unnamed-vector collections.
    Single(Vec<f32>),
    /// Name → list map.
    Named(NamedVectors),
}

/// A point as returned by retrieval, shaped by the caller's
/// `with_vector`/`with_payload` selectors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedPoint {
    /// Point identifier.
    pub id: PointId,
    /// Vectors, or `None` (serialized `null`) when not requested.
    pub vector: Option<VectorOutput>,
    /// Payload, or `None` when not requested.
    pub payload: Option<Payload>,
}
