//! Engine Module
//!
//! The embedded key-value engine the store persists into.
//!
//! ## Responsibilities
//! - Coordinate WAL and MemTable
//! - Handle concurrent read/write access
//! - Serve durable named sequences
//! - Keep data and sequence leases in separate keyspaces
//! - Manage crash recovery on startup

mod keyspace;
mod sequence;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{KvError, Result};
use crate::kvdb::KvDb;
use crate::memtable::MemTable;
use crate::wal::{Operation, WalRecovery, WalWriter};

pub use keyspace::Keyspace;
pub use sequence::EngineSequence;

/// The main storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (put/delete/compact): Serialized by the `wal` mutex
///   - Only ONE write operation at a time
///   - Order: lock → closed check → WAL append → memtable
///
/// - **Reads** (get): Concurrent at MemTable level
///   - No writer lock needed
///   - MemTable uses an internal RwLock
///
/// Sequences hold a reference to the same shared state, so they keep
/// working for as long as the engine is open, wherever they are stored.
pub struct Engine {
    shared: Arc<Shared>,
}

pub(crate) struct Shared {
    config: Config,

    /// Write-ahead log; `None` for in-memory engines and once closed.
    /// The mutex doubles as the single-writer lock.
    wal: Mutex<Option<WalWriter>>,

    memtable: MemTable,

    closed: AtomicBool,
}

impl Engine {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const WAL_FILENAME: &'static str = "wal.log";

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Open/create data directory
    /// 2. Recover from WAL if it exists (torn tail is truncated)
    /// 3. Replay recovered entries into the memtable
    /// 4. Ready to serve requests
    pub fn open(config: Config) -> Result<Self> {
        let memtable = MemTable::new();

        let wal = if config.in_memory {
            None
        } else {
            fs::create_dir_all(&config.data_dir)?;
            let wal_path = config.data_dir.join(Self::WAL_FILENAME);

            if wal_path.exists() {
                let (entries, result) = WalRecovery::recover(&wal_path)?;

                if result.entries_recovered > 0 || result.was_truncated {
                    tracing::info!(
                        recovered = result.entries_recovered,
                        corrupted = result.entries_corrupted,
                        last_lsn = result.last_lsn,
                        truncated = result.was_truncated,
                        "WAL recovery"
                    );
                }

                for entry in entries {
                    match entry.operation {
                        Operation::Put { key, value } => {
                            memtable.put(key, value);
                        }
                        Operation::Delete { key } => {
                            memtable.remove(&key);
                        }
                    }
                }
            }

            Some(WalWriter::open(&wal_path, config.wal_sync_strategy)?)
        };

        tracing::info!(
            data_dir = %config.data_dir.display(),
            in_memory = config.in_memory,
            keys = memtable.len(),
            "engine opened"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                wal: Mutex::new(wal),
                memtable,
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// Open an engine that never touches disk
    pub fn in_memory() -> Result<Self> {
        Self::open(Config::in_memory())
    }

    /// Get a value by key
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.shared.get(Keyspace::Data, key)
    }

    /// Put a key-value pair
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.shared.put(Keyspace::Data, key, value)
    }

    /// Delete a key; deleting a missing key is not an error
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.shared.delete(Keyspace::Data, key)
    }

    /// Get a value from a specific keyspace
    pub fn get_in(&self, space: Keyspace, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.shared.get(space, key)
    }

    /// Put a key-value pair into a specific keyspace
    pub fn put_in(&self, space: Keyspace, key: &[u8], value: &[u8]) -> Result<()> {
        self.shared.put(space, key, value)
    }

    /// Delete a key from a specific keyspace
    pub fn delete_in(&self, space: Keyspace, key: &[u8]) -> Result<()> {
        self.shared.delete(space, key)
    }

    /// Create or open the durable sequence stored under `key`
    ///
    /// The lease lives in [`Keyspace::Sequences`], so `key` may equal any
    /// data key without either overwriting the other.
    ///
    /// Every call returns an independent handle starting from the stored
    /// lease; callers must share one handle per key to avoid duplicates.
    pub fn get_seq(&self, key: &[u8], bandwidth: u64) -> Result<EngineSequence> {
        EngineSequence::open(Arc::clone(&self.shared), key, bandwidth)
    }

    /// Rewrite the WAL so it holds only the live keyspace
    pub fn compact(&self) -> Result<()> {
        let mut wal = self.shared.wal.lock();
        self.shared.ensure_open()?;

        if let Some(wal) = wal.as_mut() {
            let keys = self.shared.memtable.len();
            wal.compact(
                self.shared
                    .memtable
                    .iter()
                    .map(|(key, value)| Operation::Put { key, value }),
            )?;
            tracing::info!(keys, "WAL compacted");
        }

        Ok(())
    }

    /// Close the engine gracefully
    ///
    /// Syncs the WAL, drops the file handle and frees the memtable. Every
    /// later operation, including on outstanding sequences, fails with
    /// `KvError::Closed`. Closing an already closed engine is a no-op.
    pub fn close(&self) -> Result<()> {
        let mut wal = self.shared.wal.lock();
        if self.shared.closed.load(Ordering::SeqCst) {
            return Ok(());
        }

        if let Some(writer) = wal.as_mut() {
            writer.sync()?;
        }
        *wal = None;
        self.shared.closed.store(true, Ordering::SeqCst);
        self.shared.memtable.clear();

        tracing::info!(data_dir = %self.shared.config.data_dir.display(), "engine closed");
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.shared.config.data_dir
    }

    /// Path of the write-ahead log, if this engine keeps one
    pub fn wal_path(&self) -> Option<PathBuf> {
        (!self.shared.config.in_memory).then(|| self.data_dir().join(Self::WAL_FILENAME))
    }

    /// Number of live keys across all keyspaces
    pub fn entry_count(&self) -> usize {
        self.shared.memtable.len()
    }

    /// Whether `close` has completed
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.shared.config
    }
}

impl Shared {
    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(KvError::Closed);
        }
        Ok(())
    }

    pub(crate) fn get(&self, space: Keyspace, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.ensure_open()?;
        Ok(self.memtable.get(&space.scoped(key)))
    }

    /// WAL first, then memtable, under the writer lock
    pub(crate) fn put(&self, space: Keyspace, key: &[u8], value: &[u8]) -> Result<()> {
        let key = space.scoped(key);
        let mut wal = self.wal.lock();
        self.ensure_open()?;

        if let Some(wal) = wal.as_mut() {
            wal.append(Operation::Put {
                key: key.clone(),
                value: value.to_vec(),
            })?;
        }
        self.memtable.put(key, value.to_vec());

        Ok(())
    }

    pub(crate) fn delete(&self, space: Keyspace, key: &[u8]) -> Result<()> {
        let key = space.scoped(key);
        let mut wal = self.wal.lock();
        self.ensure_open()?;

        if let Some(wal) = wal.as_mut() {
            wal.append(Operation::Delete { key: key.clone() })?;
        }
        self.memtable.remove(&key);

        Ok(())
    }
}

impl KvDb for Engine {
    type Seq = EngineSequence;

    fn get_seq(&self, key: &[u8], bandwidth: u64) -> Result<EngineSequence> {
        Engine::get_seq(self, key, bandwidth)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        Engine::put(self, key, value)
    }

    fn close(&self) -> Result<()> {
        Engine::close(self)
    }
}
