//! Async Write-Ahead Log (WAL) with group commit for the HTTP server.
//!
//! Uses tokio channels + a background task to batch multiple concurrent
//! appends into a single write + fsync cycle. Two submit paths back the
//! `wait` query parameter: [`WriteAheadLog::append`] resolves only after
//! the entry's batch is durably on disk, while
//! [`WriteAheadLog::append_nowait`] resolves once the entry is accepted
//! into the commit queue.

use parking_lot::Mutex;
use pointsdb_core::config;
use pointsdb_core::store::wal::{frame_entry, read_entries, ReplayStats, WalEntry};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// A request from a caller to append an entry to the WAL.
struct GroupCommitRequest {
    framed_bytes: Vec<u8>,
    result_tx: oneshot::Sender<io::Result<()>>,
}

/// Async append-only write-ahead log with CRC32 integrity checks and group
/// commit.
pub struct WriteAheadLog {
    submit_tx: mpsc::Sender<GroupCommitRequest>,
    write_gate: Arc<parking_lot::RwLock<()>>,
    path: PathBuf,
    writer: Arc<Mutex<BufWriter<File>>>,
}

impl WriteAheadLog {
    /// Open or create the WAL file and spawn the background batch writer task.
    pub fn new(data_dir: &str) -> io::Result<Self> {
        fs::create_dir_all(data_dir)?;
        let path = PathBuf::from(data_dir).join("wal.bin");
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let writer = Arc::new(Mutex::new(BufWriter::new(file)));
        let write_gate = Arc::new(parking_lot::RwLock::new(()));

        let (submit_tx, submit_rx) = mpsc::channel::<GroupCommitRequest>(4096);

        let task_writer = Arc::clone(&writer);
        let task_gate = Arc::clone(&write_gate);
        tokio::spawn(async move {
            batch_writer_loop(submit_rx, task_writer, task_gate).await;
        });

        Ok(Self {
            submit_tx,
            write_gate,
            path,
            writer,
        })
    }

    /// Path of the underlying WAL file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a WAL entry using group commit, resolving only once the
    /// entry's batch has been written and fsynced.
    pub async fn append(&self, entry: &WalEntry) -> io::Result<()> {
        self.begin_append(entry).await?.wait().await
    }

    /// Append a WAL entry without waiting for durability. The entry is
    /// queued for the next group commit; the caller resolves as soon as
    /// the queue accepts it.
    pub async fn append_nowait(&self, entry: &WalEntry) -> io::Result<()> {
        // dropping the ticket makes the flush notification a no-op
        let _ = self.begin_append(entry).await?;
        Ok(())
    }

    /// Queue a WAL entry and return a [`FlushTicket`]. Once this resolves
    /// the entry's position in the file is fixed: the single writer task
    /// drains the queue in order, so entries land on disk in queue order.
    /// Callers that need durability await the ticket; callers that need
    /// append-order guarantees can do other work between queueing and
    /// waiting.
    pub async fn begin_append(&self, entry: &WalEntry) -> io::Result<FlushTicket> {
        let result_rx = self.submit(entry).await?;
        Ok(FlushTicket { result_rx })
    }

    async fn submit(&self, entry: &WalEntry) -> io::Result<oneshot::Receiver<io::Result<()>>> {
        let framed = frame_entry(entry)?;
        let (result_tx, result_rx) = oneshot::channel();
        self.submit_tx
            .send(GroupCommitRequest {
                framed_bytes: framed,
                result_tx,
            })
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "WAL batch writer stopped"))?;
        Ok(result_rx)
    }

    /// Read all entries from the WAL file, verifying integrity.
    pub fn replay(&self) -> io::Result<(Vec<WalEntry>, ReplayStats)> {
        read_entries(&self.path)
    }

    /// Freeze the WAL, blocking all appends while the guard is held.
    pub fn freeze(&self) -> parking_lot::RwLockWriteGuard<'_, ()> {
        self.write_gate.write()
    }

    /// Truncate the WAL file, fsync, and reopen in append mode. Call with
    /// the freeze guard held after the state it describes is snapshotted.
    pub fn truncate(&self) -> io::Result<()> {
        let mut writer = self.writer.lock();
        let truncated = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        truncated.sync_all()?;
        *writer = BufWriter::new(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?,
        );
        Ok(())
    }
}

/// Receipt for a queued WAL entry. Resolves once the entry's group-commit
/// batch has been written and fsynced.
pub struct FlushTicket {
    result_rx: oneshot::Receiver<io::Result<()>>,
}

impl FlushTicket {
    /// Wait for the entry's batch to reach disk.
    pub async fn wait(self) -> io::Result<()> {
        self.result_rx
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "WAL batch result lost"))?
    }
}

/// Background task that batches WAL entries and writes them together.
async fn batch_writer_loop(
    mut rx: mpsc::Receiver<GroupCommitRequest>,
    writer: Arc<Mutex<BufWriter<File>>>,
    write_gate: Arc<parking_lot::RwLock<()>>,
) {
    let max_batch = config::WAL_GROUP_COMMIT_MAX_BATCH;
    let max_wait = Duration::from_micros(config::WAL_GROUP_COMMIT_MAX_WAIT_US);
    let mut batch: Vec<GroupCommitRequest> = Vec::with_capacity(max_batch);

    loop {
        let first = match rx.recv().await {
            Some(req) => req,
            None => break,
        };
        batch.push(first);

        while batch.len() < max_batch {
            match rx.try_recv() {
                Ok(req) => batch.push(req),
                Err(_) => break,
            }
        }

        if batch.len() > 1 && batch.len() < max_batch {
            let deadline = tokio::time::Instant::now() + max_wait;
            while batch.len() < max_batch {
                match tokio::time::timeout_at(deadline, rx.recv()).await {
                    Ok(Some(req)) => batch.push(req),
                    _ => break,
                }
            }
        }

        flush_batch(&mut batch, &writer, &write_gate);
    }
}

/// Write all entries in the batch, fsync once, and notify all callers.
fn flush_batch(
    batch: &mut Vec<GroupCommitRequest>,
    writer: &Arc<Mutex<BufWriter<File>>>,
    write_gate: &Arc<parking_lot::RwLock<()>>,
) {
    let _gate = write_gate.read();
    let mut w = writer.lock();

    let mut write_err: Option<io::Error> = None;
    for req in batch.iter() {
        if write_err.is_none() {
            if let Err(e) = w.write_all(&req.framed_bytes) {
                write_err = Some(e);
            }
        }
    }

    if write_err.is_none() {
        if let Err(e) = w.flush() {
            write_err = Some(e);
        }
    }
    if write_err.is_none() {
        if let Err(e) = w.get_mut().sync_all() {
            write_err = Some(e);
        }
    }

    if let Some(ref e) = write_err {
        for req in batch.drain(..) {
            let _ = req
                .result_tx
                .send(Err(io::Error::new(e.kind(), e.to_string())));
        }
    } else {
        for req in batch.drain(..) {
            let _ = req.result_tx.send(Ok(()));
        }
    }
}
