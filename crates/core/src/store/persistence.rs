//! Disk persistence for collections.
//!
//! Each collection snapshots to `<name>.pdb`: a JSON document followed by an
//! 8-byte footer (4-byte magic `PCR1`, 4-byte CRC32 of the document,
//! big-endian). Writes go to a temp file that is fsynced and renamed into
//! place, so a crash never leaves a half-written snapshot under the final
//! name. Loads verify magic and checksum before deserializing.

use crate::error::StoreError;
use crate::point::PointRecord;
use crate::schema::CollectionSchema;
use crate::store::collection::{Collection, CollectionData, Database};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const SNAPSHOT_MAGIC: &[u8; 4] = b"PCR1";
const SNAPSHOT_EXT: &str = "pdb";

/// On-disk shape of one collection. Points are stored as a list because
/// JSON object keys must be strings and point ids are not.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotData {
    name: String,
    schema: CollectionSchema,
    points: Vec<PointRecord>,
    next_operation_id: u64,
}

impl SnapshotData {
    fn from_collection(collection: &Collection) -> Self {
        let data = collection.data.read();
        Self {
            name: data.name.clone(),
            schema: data.schema.clone(),
            points: data.points.values().cloned().collect(),
            next_operation_id: data.next_operation_id,
        }
    }

    fn into_collection(self) -> Collection {
        let mut data = CollectionData::new(self.name, self.schema);
        data.next_operation_id = self.next_operation_id;
        data.points = self
            .points
            .into_iter()
            .map(|record| (record.id, record))
            .collect();
        Collection {
            data: std::sync::Arc::new(parking_lot::RwLock::new(data)),
        }
    }
}

/// Path of the snapshot file for a collection name.
pub fn snapshot_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.{SNAPSHOT_EXT}"))
}

/// Write a collection snapshot atomically. Returns the final path.
pub fn save_collection(dir: &Path, collection: &Collection) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let snapshot = SnapshotData::from_collection(collection);
    let payload = serde_json::to_vec(&snapshot)?;

    let final_path = snapshot_path(dir, &snapshot.name);
    let tmp_path = final_path.with_extension("pdb.tmp");
    {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(&payload)?;
        file.write_all(SNAPSHOT_MAGIC)?;
        file.write_all(&crc32fast::hash(&payload).to_be_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, &final_path)?;
    tracing::debug!(
        collection = %snapshot.name,
        points = snapshot.points.len(),
        "snapshot written"
    );
    Ok(final_path)
}

/// Load one collection from a snapshot file, verifying the footer.
pub fn load_collection(path: &Path) -> io::Result<Collection> {
    let bytes = fs::read(path)?;
    if bytes.len() < 8 {
        return Err(corrupt(path, "file shorter than footer"));
    }
    let (payload, footer) = bytes.split_at(bytes.len() - 8);
    if &footer[..4] != SNAPSHOT_MAGIC {
        return Err(corrupt(path, "bad magic"));
    }
    let stored_crc = u32::from_be_bytes([footer[4], footer[5], footer[6], footer[7]]);
    if crc32fast::hash(payload) != stored_crc {
        return Err(corrupt(path, "checksum mismatch"));
    }
    let snapshot: SnapshotData = serde_json::from_slice(payload)?;
    Ok(snapshot.into_collection())
}

/// Load every `.pdb` snapshot in `dir` into a fresh database. Unreadable
/// snapshots are logged and skipped so one bad file cannot block startup.
pub fn load_all_collections(dir: &Path) -> io::Result<Database> {
    let db = Database::new();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(db),
        Err(e) => return Err(e),
    };
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(SNAPSHOT_EXT) {
            continue;
        }
        match load_collection(&path) {
            Ok(collection) => {
                let name = collection.data.read().name.clone();
                db.collections.write().insert(name, collection);
            }
            Err(e) => {
                tracing::error!("skipping unreadable snapshot {}: {}", path.display(), e);
            }
        }
    }
    Ok(db)
}

/// Remove a collection's snapshot file if present.
pub fn remove_snapshot(dir: &Path, name: &str) -> io::Result<()> {
    match fs::remove_file(snapshot_path(dir, name)) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Validate a collection name before it becomes a file name.
pub fn check_collection_name(name: &str) -> Result<(), StoreError> {
    if name.is_empty() || name.len() > crate::config::MAX_COLLECTION_NAME_LEN {
        return Err(StoreError::validation(
            "name",
            format!(
                "collection name must be 1 to {} characters",
                crate::config::MAX_COLLECTION_NAME_LEN
            ),
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(StoreError::validation(
            "name",
            "collection name may contain only alphanumerics, '_' and '-'",
        ));
    }
    Ok(())
}

fn corrupt(path: &Path, reason: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("corrupt snapshot {}: {}", path.display(), reason),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::PointInput;
    use crate::point::{PointId, VectorOutput};
    use crate::schema::{VectorParams, VectorsConfig};
    use serde_json::json;

    fn temp_dir(name: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("pointsdb-snap-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample_collection(name: &str) -> Collection {
        let col = Collection::new(
            name.into(),
            CollectionSchema::from_config(&VectorsConfig::Single(VectorParams { size: 2 })),
        );
        col.upsert_points(&[PointInput {
            id: PointId::Num(7),
            vector: serde_json::from_value(json!([1.0, 2.0])).unwrap(),
            payload: Some(serde_json::from_value(json!({"city": "Berlin"})).unwrap()),
        }])
        .unwrap();
        col
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = temp_dir("roundtrip");
        let col = sample_collection("c");
        // burn a few sequence numbers so the counter survives the roundtrip
        col.assign_operation_id();
        col.assign_operation_id();
        let path = save_collection(&dir, &col).unwrap();

        let restored = load_collection(&path).unwrap();
        assert_eq!(restored.point_count(), 1);
        assert_eq!(restored.data.read().next_operation_id, 2);
        let got = restored.get_point(PointId::Num(7)).unwrap();
        assert_eq!(got.vector, Some(VectorOutput::Single(vec![1.0, 2.0])));
        assert_eq!(got.payload.unwrap().get("city"), Some(&json!("Berlin")));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_rejects_corrupt_payload() {
        let dir = temp_dir("corrupt");
        let path = save_collection(&dir, &sample_collection("c")).unwrap();
        let mut bytes = std::fs::read(&path).unwrap();
        bytes[5] ^= 0xFF;
        std::fs::write(&path, &bytes).unwrap();
        assert!(load_collection(&path).is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_rejects_bad_magic() {
        let dir = temp_dir("magic");
        let path = dir.join("x.pdb");
        std::fs::write(&path, b"{}XXXX\x00\x00\x00\x00").unwrap();
        assert!(load_collection(&path).is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_all_skips_bad_files() {
        let dir = temp_dir("load-all");
        save_collection(&dir, &sample_collection("good")).unwrap();
        std::fs::write(dir.join("bad.pdb"), b"garbage").unwrap();
        std::fs::write(dir.join("ignored.txt"), b"not a snapshot").unwrap();

        let db = load_all_collections(&dir).unwrap();
        assert_eq!(db.list_collections(), vec!["good".to_string()]);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_all_missing_dir_is_empty() {
        let dir = std::env::temp_dir().join("pointsdb-snap-definitely-missing");
        let db = load_all_collections(&dir).unwrap();
        assert!(db.list_collections().is_empty());
    }

    #[test]
    fn test_remove_snapshot_idempotent() {
        let dir = temp_dir("remove");
        save_collection(&dir, &sample_collection("c")).unwrap();
        remove_snapshot(&dir, "c").unwrap();
        remove_snapshot(&dir, "c").unwrap();
        assert!(!snapshot_path(&dir, "c").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_collection_name_rules() {
        assert!(check_collection_name("points_2024-a").is_ok());
        assert!(check_collection_name("").is_err());
        assert!(check_collection_name("../escape").is_err());
        assert!(check_collection_name(&"x".repeat(200)).is_err());
    }
}
