//! MemTable Module
//!
//! In-memory ordered index over every live key.
//!
//! ## Responsibilities
//! - Fast reads and writes in memory
//! - Single-writer/multi-reader access pattern
//! - Track approximate size for diagnostics
//! - Ordered iteration for WAL compaction
//!
//! ## Data Structure Choice
//! A BTreeMap wrapped in an RwLock. The engine keeps the whole keyspace
//! here and rebuilds it from the WAL on open, so deletes simply remove keys.

mod table;

pub use table::MemTable;
