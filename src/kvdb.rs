//! Storage collaborator traits
//!
//! The store only ever talks to its engine through these two traits, so any
//! byte key/value store with durable named counters can sit underneath it.

use std::sync::Arc;

use crate::error::Result;

/// A durable, monotonically advancing counter
///
/// Implementations must be safe to advance from many threads at once and
/// must never hand out the same value twice, including across restarts.
pub trait Sequence: Send + Sync {
    /// Atomically advance the counter and return the value handed out
    fn next(&self) -> Result<u64>;

    /// Give back any values reserved in memory but not yet handed out
    fn release(&self) -> Result<()>;
}

/// Byte key/value store with named durable sequences
pub trait KvDb: Send + Sync {
    type Seq: Sequence;

    /// Create or open the sequence persisted under `key`
    ///
    /// `bandwidth` is how many values the sequence may reserve per durable
    /// write; 1 persists on every allocation.
    fn get_seq(&self, key: &[u8], bandwidth: u64) -> Result<Self::Seq>;

    /// Durably write a single key/value pair
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Release engine resources; closing twice is not an error
    fn close(&self) -> Result<()>;
}

impl<D: KvDb + ?Sized> KvDb for Arc<D> {
    type Seq = D::Seq;

    fn get_seq(&self, key: &[u8], bandwidth: u64) -> Result<Self::Seq> {
        (**self).get_seq(key, bandwidth)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        (**self).put(key, value)
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }
}
