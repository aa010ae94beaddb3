//! # pointsdb-core
//!
//! Embeddable in-memory point record store. Each collection maps point
//! identifiers to records carrying zero or more named vectors and a JSON
//! payload document, mutated through ordered batches of heterogeneous
//! update operations with validate-before-apply semantics.
//!
//! This is the core library crate with zero async dependencies, suitable for
//! embedding directly. Durability (WAL, snapshots) lives in [`store`]; the
//! HTTP layer lives in a separate crate.

/// Global configuration constants: limits, defaults, and tuning parameters.
pub mod config;
/// Error taxonomy: not-found, wrong-input, and validation failures.
pub mod error;
/// Payload filter evaluation for selector-based operations.
pub mod filter;
/// Filter types shared by the store and the API layer.
pub mod filter_types;
/// Update operation types: the tagged batch operation enum and its inputs.
pub mod ops;
/// Core point types: identifiers, named vectors, payload documents, records.
pub mod point;
/// Collection schema: declared vector names and dimensions.
pub mod schema;
/// Storage layer: collections, database, batch executor, WAL, and persistence.
pub mod store;
