//! Leased sequences
//!
//! A sequence keeps its high-water mark (the "lease") under its key in the
//! engine's sequence keyspace. Values below the lease may be handed out from memory;
//! reaching the lease durably extends it by `bandwidth` first. After a crash
//! the sequence resumes from the stored lease, so at most `bandwidth - 1`
//! values are skipped and none is ever repeated.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{KvError, Result};
use crate::kvdb::Sequence;

use super::{Keyspace, Shared};

/// Durable counter backed by an [`Engine`](super::Engine)
pub struct EngineSequence {
    shared: Arc<Shared>,
    key: Vec<u8>,
    bandwidth: u64,
    lease: Mutex<Lease>,
}

#[derive(Debug)]
struct Lease {
    /// Next value to hand out
    next: u64,
    /// Persisted high-water mark; values in `next..leased` are reserved
    leased: u64,
}

impl EngineSequence {
    pub(super) fn open(shared: Arc<Shared>, key: &[u8], bandwidth: u64) -> Result<Self> {
        if bandwidth == 0 {
            return Err(KvError::Config(
                "sequence bandwidth must be at least 1".to_string(),
            ));
        }

        let next = match shared.get(Keyspace::Sequences, key)? {
            Some(bytes) => decode_lease(key, &bytes)?,
            None => 0,
        };

        tracing::debug!(
            key = %String::from_utf8_lossy(key),
            next,
            bandwidth,
            "opened sequence"
        );

        Ok(Self {
            shared,
            key: key.to_vec(),
            bandwidth,
            lease: Mutex::new(Lease { next, leased: next }),
        })
    }

    /// Key the lease is persisted under
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Reservation size per durable write
    pub fn bandwidth(&self) -> u64 {
        self.bandwidth
    }

    fn persist(&self, value: u64) -> Result<()> {
        self.shared.put(Keyspace::Sequences, &self.key, &value.to_be_bytes())
    }
}

impl Sequence for EngineSequence {
    fn next(&self) -> Result<u64> {
        let mut lease = self.lease.lock();

        if lease.next >= lease.leased {
            let leased = lease.next.checked_add(self.bandwidth).ok_or_else(|| {
                KvError::Storage(format!(
                    "sequence '{}' overflowed",
                    String::from_utf8_lossy(&self.key)
                ))
            })?;
            self.persist(leased)?;
            lease.leased = leased;
        }

        let value = lease.next;
        lease.next += 1;
        Ok(value)
    }

    fn release(&self) -> Result<()> {
        let mut lease = self.lease.lock();
        if lease.leased == lease.next {
            return Ok(());
        }

        self.persist(lease.next)?;
        lease.leased = lease.next;
        Ok(())
    }
}

fn decode_lease(key: &[u8], bytes: &[u8]) -> Result<u64> {
    let raw: [u8; 8] = bytes.try_into().map_err(|_| {
        KvError::Storage(format!(
            "sequence '{}' has a {}-byte lease, expected 8",
            String::from_utf8_lossy(key),
            bytes.len()
        ))
    })?;
    Ok(u64::from_be_bytes(raw))
}
