//! Write-Ahead Log with CRC32 checksums.
//!
//! Every mutation is framed as `[u32 len BE][u32 crc32 BE][json payload]`
//! and fsynced before the in-memory state changes. On startup the log is
//! replayed front to back; a frame whose checksum does not match is skipped,
//! and a partial frame at the tail (a crash mid-write) stops replay there.

use crate::ops::UpdateOperation;
use crate::schema::VectorsConfig;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// One durable log record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalEntry {
    /// A collection was created with the given vector configuration.
    CreateCollection {
        name: String,
        vectors: VectorsConfig,
    },
    /// A collection was dropped.
    DeleteCollection { name: String },
    /// A mutation applied to a collection.
    Update {
        collection: String,
        operation: UpdateOperation,
    },
}

/// Counters describing what a replay pass found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Frames decoded and returned.
    pub success: usize,
    /// Frames whose payload failed to deserialize.
    pub skipped: usize,
    /// Frames dropped for checksum mismatch.
    pub crc_errors: usize,
    /// 1 if replay stopped at a partial frame at the tail.
    pub truncated: usize,
}

/// Synchronous write-ahead log. Each append is flushed and fsynced before
/// returning, so a completed append survives process death.
#[derive(Debug)]
pub struct SyncWriteAheadLog {
    path: PathBuf,
    writer: BufWriter<File>,
    /// When frozen, appends are rejected. Used while a snapshot is cut.
    frozen: bool,
}

impl SyncWriteAheadLog {
    /// Open the log at `path`, creating it if absent, positioned for append.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            frozen: false,
        })
    }

    /// Path this log writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry and fsync it to disk.
    pub fn append(&mut self, entry: &WalEntry) -> io::Result<()> {
        if self.frozen {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "log is frozen",
            ));
        }
        let framed = frame_entry(entry)?;
        self.writer.write_all(&framed)?;
        self.writer.flush()?;
        self.writer.get_ref().sync_all()
    }

    /// Stop accepting appends. Pending buffered bytes are flushed first.
    pub fn freeze(&mut self) -> io::Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        self.frozen = true;
        Ok(())
    }

    /// Resume accepting appends after a freeze.
    pub fn unfreeze(&mut self) {
        self.frozen = false;
    }

    /// Drop all logged entries. Used after the state they describe has been
    /// captured in a snapshot. Only legal while frozen.
    pub fn truncate(&mut self) -> io::Result<()> {
        if !self.frozen {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "truncate requires a frozen log",
            ));
        }
        let file = self.writer.get_mut();
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.sync_all()
    }

    /// Current size of the log file in bytes.
    pub fn size_bytes(&self) -> io::Result<u64> {
        Ok(self.writer.get_ref().metadata()?.len())
    }

    /// Replay this log's file from the beginning.
    pub fn replay(&self) -> io::Result<(Vec<WalEntry>, ReplayStats)> {
        read_entries(&self.path)
    }
}

/// Serialize an entry into its on-disk frame: length, checksum, payload.
pub fn frame_entry(entry: &WalEntry) -> io::Result<Vec<u8>> {
    let payload = serde_json::to_vec(entry)?;
    let mut framed = Vec::with_capacity(8 + payload.len());
    framed.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    framed.extend_from_slice(&crc32fast::hash(&payload).to_be_bytes());
    framed.extend_from_slice(&payload);
    Ok(framed)
}

/// Read and verify every frame in the log at `path`. A missing file replays
/// as empty. Corrupt frames are counted, not fatal; a partial tail frame
/// stops the scan.
pub fn read_entries(path: &Path) -> io::Result<(Vec<WalEntry>, ReplayStats)> {
    let mut stats = ReplayStats::default();
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok((Vec::new(), stats)),
        Err(e) => return Err(e),
    };
    let mut reader = BufReader::new(file);
    let mut entries = Vec::new();
    let mut header = [0u8; 8];

    loop {
        match read_exact_or_eof(&mut reader, &mut header)? {
            ReadOutcome::Eof => break,
            ReadOutcome::Partial => {
                stats.truncated = 1;
                tracing::warn!("partial frame header at log tail, stopping replay");
                break;
            }
            ReadOutcome::Full => {}
        }
        let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let crc = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);

        let mut payload = vec![0u8; len];
        match read_exact_or_eof(&mut reader, &mut payload)? {
            ReadOutcome::Full => {}
            _ => {
                stats.truncated = 1;
                tracing::warn!("partial frame payload at log tail, stopping replay");
                break;
            }
        }

        if crc32fast::hash(&payload) != crc {
            stats.crc_errors += 1;
            tracing::warn!("checksum mismatch, frame dropped");
            continue;
        }
        match serde_json::from_slice::<WalEntry>(&payload) {
            Ok(entry) => {
                stats.success += 1;
                entries.push(entry);
            }
            Err(e) => {
                stats.skipped += 1;
                tracing::warn!("undecodable frame skipped: {}", e);
            }
        }
    }
    Ok((entries, stats))
}

enum ReadOutcome {
    Full,
    Partial,
    Eof,
}

fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<ReadOutcome> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            return Ok(if filled == 0 {
                ReadOutcome::Eof
            } else {
                ReadOutcome::Partial
            });
        }
        filled += n;
    }
    Ok(ReadOutcome::Full)
}
