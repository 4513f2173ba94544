//! # rowkv
//!
//! Typed record persistence on an embedded key-value store:
//! - Per-table row identifiers from durable sequences (0, 1, 2, …)
//! - Statically typed record → key/value entry mapping
//! - Write-Ahead Logging (WAL) with crash recovery for the bundled engine
//! - Thread-safe saves: identifiers never repeat within a table
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Store::save(owner, record)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Sequence   │          │    Entry    │
//!   │  Registry   │          │ Conversion  │
//!   └──────┬──────┘          └──────┬──────┘
//!          │   KvDb: get_seq / put  │
//!          └────────────┬───────────┘
//!                       ▼
//!   ┌─────────────────────────────────────────────────────┐
//!   │                      Engine                          │
//!   │      WAL (append)  ──►  MemTable (RwLock)            │
//!   └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use std::any::Any;
//! use rowkv::{Column, Columns, Engine, Owner, Store, Value};
//!
//! struct Balloon {
//!     id: u32,
//!     color: String,
//! }
//!
//! impl Value for Balloon {
//!     fn table_name(&self) -> &str { "balloons" }
//!     fn set_id(&mut self, id: u32) { self.id = id; }
//!     fn as_any_mut(&mut self) -> &mut dyn Any { self }
//! }
//!
//! impl Columns for Balloon {
//!     fn columns(&self) -> rowkv::Result<Vec<Column>> {
//!         Ok(vec![Column::encode("color", &self.color)?])
//!     }
//! }
//!
//! let store = Store::new(Engine::in_memory()?);
//! let mut red = Balloon { id: 0, color: "RED".into() };
//! let mut blue = Balloon { id: 0, color: "BLUE".into() };
//! store.save(&Owner::Root, &mut red)?;
//! store.save(&Owner::Root, &mut blue)?;
//! assert_eq!((red.id, blue.id), (0, 1));
//! store.close()?;
//! # Ok::<(), rowkv::KvError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod wal;
pub mod memtable;
pub mod engine;
pub mod kvdb;
pub mod entry;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::Config;
pub use engine::{Engine, EngineSequence, Keyspace};
pub use entry::{Column, Columns, Entry, Owner};
pub use kvdb::{KvDb, Sequence};
pub use store::{Record, Store, Value};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of rowkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
