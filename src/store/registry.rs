//! Sequence Registry
//!
//! One live sequence per table name, created on first use and kept until the
//! store closes.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{KvError, Result};
use crate::kvdb::{KvDb, Sequence};

/// Reservation band for row identifier sequences
///
/// Every allocation is persisted before it is handed out, so restarts never
/// leave gaps in a table's identifiers.
pub const ROW_ID_BANDWIDTH: u64 = 1;

/// Table name → sequence cache
///
/// ## Concurrency:
/// - `resolve` holds the map lock across check-then-insert, so two threads
///   can never open two sequences for the same table
/// - `next` advances outside the map lock; the sequence itself is
///   safe for concurrent use
pub struct SequenceRegistry<S> {
    sequences: Mutex<HashMap<String, Arc<S>>>,
}

impl<S: Sequence> SequenceRegistry<S> {
    pub fn new() -> Self {
        Self {
            sequences: Mutex::new(HashMap::new()),
        }
    }

    /// Get the table's sequence, opening it in `db` on first use
    ///
    /// Engine errors are returned unchanged and nothing is cached.
    pub fn resolve<D>(&self, db: &D, table_name: &str) -> Result<Arc<S>>
    where
        D: KvDb<Seq = S> + ?Sized,
    {
        let mut sequences = self.sequences.lock();
        if let Some(seq) = sequences.get(table_name) {
            return Ok(Arc::clone(seq));
        }

        let seq = Arc::new(db.get_seq(table_name.as_bytes(), ROW_ID_BANDWIDTH)?);
        sequences.insert(table_name.to_string(), Arc::clone(&seq));
        tracing::debug!(table = table_name, "registered row id sequence");

        Ok(seq)
    }

    /// Allocate the table's next row identifier
    pub fn next<D>(&self, db: &D, table_name: &str) -> Result<u32>
    where
        D: KvDb<Seq = S> + ?Sized,
    {
        let seq = self.resolve(db, table_name)?;
        let id = seq.next()?;

        u32::try_from(id).map_err(|_| KvError::SequenceExhausted {
            table: table_name.to_string(),
        })
    }

    /// Release every cached sequence
    ///
    /// All sequences are attempted; the first failure is returned.
    pub fn release_all(&self) -> Result<()> {
        let sequences = self.sequences.lock();
        let mut first_err = None;

        for (table, seq) in sequences.iter() {
            if let Err(e) = seq.release() {
                tracing::warn!(table = table.as_str(), error = %e, "failed to release sequence");
                first_err.get_or_insert(e);
            }
        }

        first_err.map_or(Ok(()), Err)
    }

    /// Number of tables with a live sequence
    pub fn len(&self) -> usize {
        self.sequences.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.lock().is_empty()
    }
}

impl<S: Sequence> Default for SequenceRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}
