//! WAL Entry definitions
//!
//! Defines the structure of individual WAL log entries and their framing.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{KvError, Result};

/// Frame header size: LSN (8) + CRC (4) + Len (4)
pub const HEADER_SIZE: usize = 16;

/// A single entry in the WAL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// The operation to perform
    pub operation: Operation,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// Operations that can be logged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Put a key-value pair
    Put { key: Vec<u8>, value: Vec<u8> },

    /// Delete a key
    Delete { key: Vec<u8> },
}

impl WalEntry {
    /// Create an entry stamped with the current time
    pub fn new(lsn: u64, operation: Operation) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        Self {
            lsn,
            operation,
            timestamp,
        }
    }

    /// Encode as a complete frame: header followed by data
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let data = bincode::serialize(self)?;
        let len = u32::try_from(data.len()).map_err(|_| {
            KvError::Serialization(format!("WAL entry too large: {} bytes", data.len()))
        })?;
        let crc = Self::compute_crc(self.lsn, len, &data);

        let mut frame = Vec::with_capacity(HEADER_SIZE + data.len());
        frame.extend_from_slice(&self.lsn.to_le_bytes());
        frame.extend_from_slice(&crc.to_le_bytes());
        frame.extend_from_slice(&len.to_le_bytes());
        frame.extend_from_slice(&data);
        Ok(frame)
    }

    /// Decode a single frame, verifying its checksum
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let (lsn, crc, len) = Self::parse_header(bytes)?;

        let end = HEADER_SIZE + len as usize;
        if bytes.len() < end {
            return Err(KvError::WalCorruption(format!(
                "truncated entry: expected {} data bytes, found {}",
                len,
                bytes.len() - HEADER_SIZE
            )));
        }

        Self::decode_data(lsn, crc, len, &bytes[HEADER_SIZE..end])
    }

    /// Split a frame header into (lsn, crc, len)
    pub(crate) fn parse_header(bytes: &[u8]) -> Result<(u64, u32, u32)> {
        if bytes.len() < HEADER_SIZE {
            return Err(KvError::WalCorruption(format!(
                "header too small: {} bytes",
                bytes.len()
            )));
        }

        let mut lsn = [0u8; 8];
        let mut crc = [0u8; 4];
        let mut len = [0u8; 4];
        lsn.copy_from_slice(&bytes[0..8]);
        crc.copy_from_slice(&bytes[8..12]);
        len.copy_from_slice(&bytes[12..16]);

        Ok((
            u64::from_le_bytes(lsn),
            u32::from_le_bytes(crc),
            u32::from_le_bytes(len),
        ))
    }

    /// Verify and decode the data section of a frame
    pub(crate) fn decode_data(lsn: u64, crc: u32, len: u32, data: &[u8]) -> Result<Self> {
        let actual = Self::compute_crc(lsn, len, data);
        if actual != crc {
            return Err(KvError::WalCorruption(format!(
                "CRC mismatch at lsn {}: expected {:#010x}, got {:#010x}",
                lsn, crc, actual
            )));
        }

        let entry: WalEntry = bincode::deserialize(data)
            .map_err(|e| KvError::WalCorruption(format!("undecodable entry: {}", e)))?;

        if entry.lsn != lsn {
            return Err(KvError::WalCorruption(format!(
                "LSN mismatch: header {}, body {}",
                lsn, entry.lsn
            )));
        }

        Ok(entry)
    }

    /// Checksum over LSN, length and data
    pub fn compute_crc(lsn: u64, len: u32, data: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&lsn.to_le_bytes());
        hasher.update(&len.to_le_bytes());
        hasher.update(data);
        hasher.finalize()
    }

    /// Size of this entry once framed
    pub fn serialized_size(&self) -> Result<usize> {
        Ok(HEADER_SIZE + bincode::serialized_size(self)? as usize)
    }
}
