//! WAL Recovery
//!
//! Handles crash recovery by replaying the WAL.

use std::fs::OpenOptions;
use std::path::Path;

use crate::error::{KvError, Result};
use super::reader::{Frame, WalReader};
use super::WalEntry;

/// Handles WAL recovery after crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of entries successfully recovered
    pub entries_recovered: u64,

    /// Number of corrupted entries skipped
    pub entries_corrupted: u64,

    /// Last valid LSN
    pub last_lsn: u64,

    /// Whether the WAL was truncated (partial writes removed)
    pub was_truncated: bool,
}

impl WalRecovery {
    /// Recover entries from a WAL file
    ///
    /// Reads frames until the first torn or corrupted one, then truncates the
    /// file back to the end of the last good frame. Everything after a bad
    /// frame is discarded, since LSN order can no longer be trusted.
    pub fn recover(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let (entries, result, valid_len) = Self::scan(path)?;

        if result.was_truncated {
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(valid_len)?;
            file.sync_all()?;
            tracing::warn!(
                path = %path.display(),
                valid_len,
                corrupted = result.entries_corrupted,
                "truncated invalid WAL tail"
            );
        }

        Ok((entries, result))
    }

    /// Verify integrity of a WAL file without modifying it
    ///
    /// `was_truncated` reports whether `recover` would truncate.
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        let (_, result, _) = Self::scan(path)?;
        Ok(result)
    }

    fn scan(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult, u64)> {
        let mut reader = WalReader::open(path)?;
        let mut entries = Vec::new();
        let mut result = RecoveryResult::default();

        loop {
            match reader.read_frame() {
                Ok(Frame::Entry(entry)) => {
                    result.entries_recovered += 1;
                    result.last_lsn = entry.lsn;
                    entries.push(entry);
                }
                Ok(Frame::End) => break,
                Ok(Frame::Torn) => {
                    result.was_truncated = true;
                    break;
                }
                Err(KvError::WalCorruption(reason)) => {
                    tracing::debug!(%reason, offset = reader.position(), "corrupted WAL frame");
                    result.entries_corrupted += 1;
                    result.was_truncated = true;
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        Ok((entries, result, reader.position()))
    }
}
