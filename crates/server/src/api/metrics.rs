//! Prometheus metrics recording and background collection.

use metrics::{counter, gauge, histogram};
use pointsdb_core::store::Database;
use std::path::Path;
use std::time::Duration;

/// Records HTTP request metrics.
pub fn record_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];
    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Records one applied mutation, labeled by collection and operation tag.
pub fn record_write_operation(collection: &str, operation: &str) {
    counter!(
        "pointsdb_operations_total",
        "collection" => collection.to_string(),
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Updates collection-level Prometheus gauges.
pub fn update_collection_metrics(db: &Database) {
    let collections = db.collections.read();
    gauge!("pointsdb_collections_total").set(collections.len() as f64);
    for (name, collection) in collections.iter() {
        let labels = [("collection", name.clone())];
        gauge!("pointsdb_points_total", &labels).set(collection.point_count() as f64);
    }
}

/// Updates the `pointsdb_wal_size_bytes` gauge.
pub fn update_wal_metrics(wal_path: &Path) {
    if let Ok(meta) = std::fs::metadata(wal_path) {
        gauge!("pointsdb_wal_size_bytes").set(meta.len() as f64);
    }
}
