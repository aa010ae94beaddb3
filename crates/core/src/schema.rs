//! Collection schema: the declared vector names and their dimensions.
//!
//! The schema is fixed at collection creation and passed explicitly to the
//! store and executor, never as ambient global state. Only declared names are
//! legal in mutation operations; every present vector's length must equal
//! the dimension declared for its name.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration of a single declared vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorParams {
    /// Vector dimension.
    pub size: usize,
}

/// Vector configuration as supplied at collection creation: either a single
/// unnamed vector or a map of named vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VectorsConfig {
    /// One default/unnamed vector, e.g. `{"size": 4}`.
    Single(VectorParams),
    /// Named vectors, e.g. `{"text": {"size": 8}, "image": {"size": 4}}`.
    Named(HashMap<String, VectorParams>),
}

/// Immutable per-collection vector schema.
///
/// Internally the default/unnamed vector is keyed by the empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchema {
    vectors: HashMap<String, VectorParams>,
}

impl CollectionSchema {
    /// Build a schema from the creation-time configuration.
    pub fn from_config(config: &VectorsConfig) -> Self {
        let vectors = match config {
            VectorsConfig::Single(params) => {
                let mut m = HashMap::with_capacity(1);
                m.insert(String::new(), *params);
                m
            }
            VectorsConfig::Named(map) => map.clone(),
        };
        Self { vectors }
    }

    /// Dimension declared for `name`, or `None` if the name is not declared.
    pub fn dimension_of(&self, name: &str) -> Option<usize> {
        self.vectors.get(name).map(|p| p.size)
    }

    /// True if `name` is a declared vector name.
    pub fn contains(&self, name: &str) -> bool {
        self.vectors.contains_key(name)
    }

    /// All declared vector names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vectors.keys().map(String::as_str)
    }

    /// Number of declared vector names.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// True if no vectors are declared.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// True if the schema declares exactly the single default/unnamed vector.
    /// Such collections render retrieved vectors as a bare list.
    pub fn is_single_unnamed(&self) -> bool {
        self.vectors.len() == 1 && self.vectors.contains_key("")
    }

    /// Reject vector names not declared in this schema.
    pub fn check_name(&self, name: &str) -> Result<(), StoreError> {
        if self.contains(name) {
            Ok(())
        } else {
            Err(StoreError::vector_name(name))
        }
    }

    /// Reject undeclared names and dimension mismatches.
    pub fn check_vector(&self, name: &str, vector: &[f32]) -> Result<(), StoreError> {
        let expected = self
            .dimension_of(name)
            .ok_or_else(|| StoreError::vector_name(name))?;
        if vector.len() != expected {
            return Err(StoreError::vector_dimension(expected, vector.len()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_config_maps_to_unnamed() {
        let config: VectorsConfig = serde_json::from_value(json!({"size": 4})).unwrap();
        let schema = CollectionSchema::from_config(&config);
        assert!(schema.is_single_unnamed());
        assert_eq!(schema.dimension_of(""), Some(4));
        assert_eq!(schema.dimension_of("text"), None);
    }

    #[test]
    fn test_named_config() {
        let config: VectorsConfig =
            serde_json::from_value(json!({"text": {"size": 8}, "image": {"size": 4}}))
                .unwrap();
        let schema = CollectionSchema::from_config(&config);
        assert!(!schema.is_single_unnamed());
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.dimension_of("text"), Some(8));
        assert_eq!(schema.dimension_of("image"), Some(4));
        assert!(!schema.contains("a"));
    }

    #[test]
    fn test_untagged_config_disambiguation() {
        // A map of named params must not be mistaken for a single config
        let config: VectorsConfig =
            serde_json::from_value(json!({"text": {"size": 8}})).unwrap();
        assert!(matches!(config, VectorsConfig::Named(_)));
        let config: VectorsConfig = serde_json::from_value(json!({"size": 4})).unwrap();
        assert!(matches!(config, VectorsConfig::Single(_)));
    }

    #[test]
    fn test_schema_snapshot_roundtrip() {
        let config: VectorsConfig =
            serde_json::from_value(json!({"text": {"size": 8}})).unwrap();
        let schema = CollectionSchema::from_config(&config);
        let bytes = serde_json::to_vec(&schema).unwrap();
        let restored: CollectionSchema = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(schema, restored);
    }
}
