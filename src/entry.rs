//! Entry conversion
//!
//! Turns a typed record into the ordered key/value pairs the store writes.
//! Each record type lists its own columns through [`Columns`]; nothing here
//! inspects types at runtime.
//!
//! ## Key Layout
//! ```text
//! {table}.{column}.{owner}.{row_id}
//! balloons.color.root.0
//! ```

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;
use crate::kvdb::KvDb;

/// Parent entity a record's keys are scoped to
///
/// Rendered verbatim into every key and never interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    /// Records with no parent
    Root,
    /// Records belonging to another entity
    Id(Uuid),
}

impl Owner {
    /// Owner with a fresh random identifier
    pub fn random() -> Self {
        Owner::Id(Uuid::new_v4())
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::Root => f.write_str("root"),
            Owner::Id(id) => write!(f, "{}", id.hyphenated()),
        }
    }
}

impl From<Uuid> for Owner {
    fn from(id: Uuid) -> Self {
        Owner::Id(id)
    }
}

/// One named, encoded field of a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub data: Vec<u8>,
}

impl Column {
    /// Encode a field with bincode
    pub fn encode<T: Serialize + ?Sized>(name: &'static str, value: &T) -> Result<Self> {
        Ok(Self {
            name,
            data: bincode::serialize(value)?,
        })
    }

    /// Column from bytes that are already encoded
    pub fn raw(name: &'static str, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name,
            data: data.into(),
        }
    }
}

/// Explicit mapping from a record to its stored columns
///
/// Column order is write order. Implementations must not depend on the
/// record's current row identifier.
pub trait Columns {
    fn columns(&self) -> Result<Vec<Column>>;
}

/// A single key/value pair derived from a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub table_name: String,
    pub column_name: String,
    pub owner: Owner,
    pub row_id: u32,
    pub data: Vec<u8>,
}

impl Entry {
    /// Storage key: `{table}.{column}.{owner}.{row_id}`
    pub fn key(&self) -> Vec<u8> {
        format!(
            "{}.{}.{}.{}",
            self.table_name, self.column_name, self.owner, self.row_id
        )
        .into_bytes()
    }

    /// Storage value
    pub fn value(&self) -> &[u8] {
        &self.data
    }
}

/// Derive the ordered entries for one record
pub fn convert_to_entries<V: Columns + ?Sized>(
    table_name: &str,
    owner: &Owner,
    row_id: u32,
    record: &V,
) -> Result<Vec<Entry>> {
    Ok(record
        .columns()?
        .into_iter()
        .map(|column| Entry {
            table_name: table_name.to_string(),
            column_name: column.name.to_string(),
            owner: *owner,
            row_id,
            data: column.data,
        })
        .collect())
}

/// Write one entry to the engine
pub fn store_entry<D: KvDb + ?Sized>(db: &D, entry: &Entry) -> Result<()> {
    db.put(&entry.key(), entry.value())
}
