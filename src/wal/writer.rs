//! WAL Writer
//!
//! Handles appending entries to the WAL file.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::{KvError, Result};
use super::{Operation, WalEntry, WalRecovery};

/// Append-only destination for WAL frames
///
/// `truncate` must cut the sink back to exactly `len` bytes; the writer uses
/// it to discard a frame whose append failed.
pub trait WalSink: Write {
    /// Current length in bytes
    fn byte_len(&self) -> io::Result<u64>;

    /// Discard everything past `len`
    fn truncate(&mut self, len: u64) -> io::Result<()>;

    /// Make written bytes durable
    fn sync(&mut self) -> io::Result<()>;
}

impl WalSink for File {
    fn byte_len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

/// Writes entries to the WAL file
///
/// Each frame is written straight to the sink. A failed append is rolled
/// back, so the log never holds a frame whose write was reported as failed
/// and an LSN is never used twice. If the rollback itself fails, the writer
/// is poisoned and refuses further appends.
pub struct WalWriter<S: WalSink = File> {
    /// Empty for writers built with [`WalWriter::with_sink`]
    path: PathBuf,
    sink: S,
    /// Length of the log after the last successful append
    len: u64,
    /// LSN the next appended entry will carry
    current_lsn: u64,
    sync_strategy: WalSyncStrategy,
    /// Entries appended since the last fsync
    unsynced: usize,
    poisoned: bool,
}

impl WalWriter<File> {
    /// Open or create a WAL file
    ///
    /// An existing file is scanned so LSNs continue after its last valid
    /// entry. Callers that need a clean tail should run
    /// [`WalRecovery::recover`] first.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let last_lsn = if path.exists() {
            WalRecovery::verify(path)?.last_lsn
        } else {
            0
        };

        let mut writer = Self::with_sink(Self::open_append(path)?, last_lsn + 1, sync_strategy)?;
        writer.path = path.to_path_buf();
        Ok(writer)
    }

    /// Replace the log with a fresh one holding only `operations`
    ///
    /// The new log is written beside the old one, renamed over it and the
    /// directory synced, so a crash mid-compaction leaves one complete log.
    /// LSNs restart at 1.
    pub fn compact<I>(&mut self, operations: I) -> Result<()>
    where
        I: IntoIterator<Item = Operation>,
    {
        if self.path.as_os_str().is_empty() {
            return Err(KvError::Config(
                "compaction needs a WAL opened from a path".to_string(),
            ));
        }
        self.ensure_usable()?;
        self.sync()?;

        let tmp_path = self.compact_path();
        let mut lsn = 1;
        {
            let mut tmp = BufWriter::new(File::create(&tmp_path)?);
            for operation in operations {
                tmp.write_all(&WalEntry::new(lsn, operation).serialize()?)?;
                lsn += 1;
            }
            tmp.flush()?;
            tmp.get_ref().sync_all()?;
        }

        fs::rename(&tmp_path, &self.path)?;
        sync_parent_dir(&self.path)?;

        self.sink = Self::open_append(&self.path)?;
        self.len = self.sink.byte_len()?;
        self.current_lsn = lsn;
        self.unsynced = 0;
        Ok(())
    }

    fn open_append(path: &Path) -> Result<File> {
        Ok(OpenOptions::new().create(true).append(true).open(path)?)
    }

    fn compact_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".compact");
        self.path.with_file_name(name)
    }
}

impl<S: WalSink> WalWriter<S> {
    /// Write to an arbitrary sink, starting at `next_lsn`
    pub fn with_sink(sink: S, next_lsn: u64, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let len = sink.byte_len()?;
        Ok(Self {
            path: PathBuf::new(),
            sink,
            len,
            current_lsn: next_lsn,
            sync_strategy,
            unsynced: 0,
            poisoned: false,
        })
    }

    /// Append an entry to the WAL, returning its LSN
    ///
    /// On error nothing of the frame remains in the log and the LSN is
    /// handed to the next append.
    pub fn append(&mut self, operation: Operation) -> Result<u64> {
        self.ensure_usable()?;

        let lsn = self.current_lsn;
        let frame = WalEntry::new(lsn, operation).serialize()?;

        if let Err(e) = self.write_frame(&frame) {
            self.rollback(lsn);
            return Err(e);
        }

        self.len += frame.len() as u64;
        self.current_lsn += 1;
        Ok(lsn)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.sink.flush()?;
        self.sink.sync()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Get the LSN the next entry will be assigned
    pub fn current_lsn(&self) -> u64 {
        self.current_lsn
    }

    /// Whether a failed rollback has disabled this writer
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// The underlying sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable access to the underlying sink
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.sink.write_all(frame)?;
        self.sink.flush()?;

        let due = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.unsynced + 1 >= count,
        };
        if due {
            self.sync()?;
        } else {
            self.unsynced += 1;
        }
        Ok(())
    }

    fn rollback(&mut self, lsn: u64) {
        if let Err(e) = self.sink.truncate(self.len) {
            self.poisoned = true;
            tracing::error!(lsn, error = %e, "failed to roll back WAL append; writer poisoned");
        }
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.poisoned {
            return Err(KvError::Storage(
                "WAL writer poisoned by a failed rollback".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        File::open(dir)?.sync_all()?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> Result<()> {
    Ok(())
}
