//! WAL Reader
//!
//! Handles reading entries from the WAL file.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::{KvError, Result};
use super::entry::{WalEntry, HEADER_SIZE};

/// Outcome of reading one frame
pub(super) enum Frame {
    /// A complete, checksummed entry
    Entry(WalEntry),
    /// Clean end of file on a frame boundary
    End,
    /// The file ends part-way through a frame
    Torn,
}

/// Reads entries from the WAL file
pub struct WalReader {
    reader: BufReader<File>,
    /// Byte offset of the next unread frame
    position: u64,
    /// File length at open; frames claiming to run past it are torn
    file_len: u64,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
            file_len,
        })
    }

    /// Read the next entry from the WAL
    ///
    /// Returns `Ok(None)` at a clean end of file. A torn or corrupted frame
    /// is reported as `WalCorruption`.
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        match self.read_frame()? {
            Frame::Entry(entry) => Ok(Some(entry)),
            Frame::End => Ok(None),
            Frame::Torn => Err(KvError::WalCorruption(format!(
                "partial entry at offset {}",
                self.position
            ))),
        }
    }

    /// Iterate over all valid entries
    ///
    /// The iterator yields the first error it meets and then stops.
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }

    /// Byte offset of the end of the last frame read successfully
    pub fn position(&self) -> u64 {
        self.position
    }

    pub(super) fn read_frame(&mut self) -> Result<Frame> {
        let mut header = [0u8; HEADER_SIZE];
        let n = read_full(&mut self.reader, &mut header)?;
        if n == 0 {
            return Ok(Frame::End);
        }
        if n < HEADER_SIZE {
            return Ok(Frame::Torn);
        }

        let (lsn, crc, len) = WalEntry::parse_header(&header)?;
        if self.position + (HEADER_SIZE as u64) + u64::from(len) > self.file_len {
            return Ok(Frame::Torn);
        }

        let mut data = vec![0u8; len as usize];
        if read_full(&mut self.reader, &mut data)? < data.len() {
            return Ok(Frame::Torn);
        }

        let entry = WalEntry::decode_data(lsn, crc, len, &data)?;
        self.position += (HEADER_SIZE + data.len()) as u64;
        Ok(Frame::Entry(entry))
    }
}

/// Fill `buf` as far as the file allows, returning the number of bytes read
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

/// Iterator over WAL entries
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
