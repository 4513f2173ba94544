//! Store Module
//!
//! Assigns per-table row identifiers and persists records.
//!
//! ## Save Pipeline
//! ```text
//! save(owner, record)
//!   │
//!   ├─ 1. registry.next(table)        durable, never rolled back
//!   ├─ 2. convert_to_entries(...)     pure
//!   ├─ 3. put each entry in order     stops at first failure
//!   └─ 4. record.set_id(row_id)       only after every put succeeded
//! ```
//!
//! A failed save leaves the record untouched and its allocated identifier
//! unused; retrying allocates a new, higher one. Entries written before a
//! failure are not rolled back.

mod registry;

use std::any::Any;

use crate::entry::{convert_to_entries, store_entry, Columns, Owner};
use crate::error::Result;
use crate::kvdb::KvDb;

pub use registry::{SequenceRegistry, ROW_ID_BANDWIDTH};

/// A record the store can assign identifiers to
pub trait Value {
    /// Table the record belongs to; stable per type
    fn table_name(&self) -> &str;

    /// Stamp the assigned row identifier onto the record
    fn set_id(&mut self, id: u32);

    /// Mutable access to the concrete record behind a trait object
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Anything that can be handed to [`Store::save`]
pub trait Record: Value + Columns {}

impl<T: Value + Columns + ?Sized> Record for T {}

/// Persists records, assigning each a per-table row identifier
pub struct Store<D: KvDb> {
    db: D,
    pks: SequenceRegistry<D::Seq>,
}

impl<D: KvDb> Store<D> {
    /// Wrap an already open engine handle
    pub fn new(db: D) -> Self {
        Self {
            db,
            pks: SequenceRegistry::new(),
        }
    }

    /// Allocate a row identifier for `value`, write its entries, then stamp
    /// the identifier onto it
    ///
    /// Errors from the engine are returned as-is. On error the record's
    /// identifier is left at its previous value.
    pub fn save<V: Record + ?Sized>(&self, owner: &Owner, value: &mut V) -> Result<()> {
        let table_name = value.table_name().to_string();
        let row_id = self.pks.next(&self.db, &table_name)?;

        save_value(&self.db, &table_name, owner, row_id, value)
    }

    /// Release all sequence reservations and close the engine
    ///
    /// The engine is closed even if releasing fails.
    pub fn close(&self) -> Result<()> {
        let released = self.pks.release_all();
        self.db.close()?;
        released
    }

    /// The underlying engine handle
    pub fn db(&self) -> &D {
        &self.db
    }

    /// Number of tables this store has allocated identifiers for
    pub fn table_count(&self) -> usize {
        self.pks.len()
    }
}

fn save_value<D, V>(
    db: &D,
    table_name: &str,
    owner: &Owner,
    row_id: u32,
    value: &mut V,
) -> Result<()>
where
    D: KvDb,
    V: Record + ?Sized,
{
    let entries = convert_to_entries(table_name, owner, row_id, value)?;
    for entry in &entries {
        store_entry(db, entry)?;
    }

    value.set_id(row_id);
    tracing::debug!(table = table_name, %owner, row_id, entries = entries.len(), "saved record");

    Ok(())
}
