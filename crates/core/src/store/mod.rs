//! Storage layer: collections, database, batch executor, WAL, and persistence.
//!
//! Point records live in-memory in `Collection` instances grouped by a
//! `Database`. All mutation goes through the executor in [`executor`];
//! durability is provided by a `SyncWriteAheadLog` (CRC32 + fsync) and
//! snapshots (atomic temp-file + rename).

/// Collection and database data structures.
pub mod collection;
/// Batch operation executor: validate-before-apply, ordered application.
pub mod executor;
/// Disk persistence: snapshot save/load with atomic writes.
pub mod persistence;
/// Write-Ahead Log with CRC32 checksums.
pub mod wal;

pub use collection::{Collection, Database};
pub use persistence::{load_all_collections, load_collection, save_collection};
pub use wal::{frame_entry, read_entries, ReplayStats, SyncWriteAheadLog, WalEntry};
