//! Shared record types and engine doubles for integration tests

#![allow(dead_code)]

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};

use rowkv::{Column, Columns, Engine, EngineSequence, KvDb, KvError, Result, Value};

// =============================================================================
// Record Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Balloon {
    pub id: u32,
    pub color: String,
    pub size: i32,
}

impl Balloon {
    pub fn new(color: &str, size: i32) -> Self {
        Self {
            id: 0,
            color: color.to_string(),
            size,
        }
    }
}

impl Value for Balloon {
    fn table_name(&self) -> &str {
        "balloons"
    }

    fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Columns for Balloon {
    fn columns(&self) -> Result<Vec<Column>> {
        Ok(vec![
            Column::encode("color", &self.color)?,
            Column::encode("size", &self.size)?,
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cake {
    pub id: u32,
    pub kind: String,
    pub calories: i32,
}

impl Cake {
    pub fn new(kind: &str, calories: i32) -> Self {
        Self {
            id: 0,
            kind: kind.to_string(),
            calories,
        }
    }
}

impl Value for Cake {
    fn table_name(&self) -> &str {
        "cakes"
    }

    fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Columns for Cake {
    fn columns(&self) -> Result<Vec<Column>> {
        Ok(vec![
            Column::encode("type", &self.kind)?,
            Column::encode("calories", &self.calories)?,
        ])
    }
}

/// Single-column record whose table name is chosen at runtime
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub id: u32,
    pub table: String,
    pub c: u64,
}

impl Row {
    pub fn new(table: &str, c: u64) -> Self {
        Self {
            id: 0,
            table: table.to_string(),
            c,
        }
    }
}

impl Value for Row {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Columns for Row {
    fn columns(&self) -> Result<Vec<Column>> {
        Ok(vec![Column::encode("c", &self.c)?])
    }
}

// =============================================================================
// Engine Doubles
// =============================================================================

/// Engine wrapper whose entry writes start failing after a budget is spent.
/// Sequences go straight to the real engine and keep working.
pub struct FlakyDb {
    pub engine: Engine,
    puts_left: AtomicUsize,
}

impl FlakyDb {
    pub fn new(puts_allowed: usize) -> Self {
        Self {
            engine: Engine::in_memory().unwrap(),
            puts_left: AtomicUsize::new(puts_allowed),
        }
    }

    pub fn allow_puts(&self, count: usize) {
        self.puts_left.store(count, Ordering::SeqCst);
    }
}

impl KvDb for FlakyDb {
    type Seq = EngineSequence;

    fn get_seq(&self, key: &[u8], bandwidth: u64) -> Result<EngineSequence> {
        self.engine.get_seq(key, bandwidth)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let spent = self
            .puts_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1));
        if spent.is_err() {
            return Err(KvError::Storage("injected write failure".to_string()));
        }
        self.engine.put(key, value)
    }

    fn close(&self) -> Result<()> {
        self.engine.close()
    }
}
