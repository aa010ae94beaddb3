//! pointsdb-server — HTTP server for points.db.
//!
//! Provides the REST API and the async group-commit WAL. The point store
//! and batch executor live in `pointsdb-core`.

/// REST API layer: Axum router, HTTP handlers, models, metrics.
pub mod api;
/// Async Write-Ahead Log with group commit (tokio-based).
pub mod wal_async;
