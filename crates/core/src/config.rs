//! Global configuration constants for points.db.
//!
//! All tuning parameters, input validation limits, and server defaults are
//! defined here. These are compile-time constants; runtime configuration is
//! handled via CLI arguments and environment variables in `main.rs`.

/// Maximum allowed vector dimension per declared name.
pub const MAX_DIMENSION: usize = 4096;

/// Maximum length of a collection name in characters.
pub const MAX_COLLECTION_NAME_LEN: usize = 128;

/// Maximum number of operations per batch request.
pub const MAX_BATCH_OPERATIONS: usize = 1_000;

/// Maximum number of points addressed by a single operation.
pub const MAX_POINTS_PER_OPERATION: usize = 10_000;

/// Maximum number of top-level payload keys per point.
pub const MAX_PAYLOAD_KEYS: usize = 64;

/// Maximum serialized size of a point's payload in bytes (64 KB).
pub const MAX_PAYLOAD_BYTES: usize = 65_536;

/// Default HTTP server port.
pub const DEFAULT_PORT: u16 = 3030;

/// Default directory for WAL and snapshot files.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Default interval (in seconds) between automatic snapshots. 0 = disabled.
pub const DEFAULT_SNAPSHOT_INTERVAL_SECS: u64 = 300;

/// Default graceful shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Maximum HTTP request body size in bytes (10 MB).
pub const MAX_REQUEST_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Maximum entries per WAL group commit batch before forcing a flush.
pub const WAL_GROUP_COMMIT_MAX_BATCH: usize = 128;

/// Maximum wait time (microseconds) to accumulate WAL entries before flushing.
pub const WAL_GROUP_COMMIT_MAX_WAIT_US: u64 = 1000;
