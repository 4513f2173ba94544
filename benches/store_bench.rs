//! Benchmarks for the save path

use std::any::Any;

use criterion::{criterion_group, criterion_main, Criterion};
use rowkv::config::{Config, WalSyncStrategy};
use rowkv::{Column, Columns, Engine, Owner, Result, Store, Value};
use tempfile::TempDir;

struct Reading {
    id: u32,
    sensor: String,
    celsius: f64,
}

impl Value for Reading {
    fn table_name(&self) -> &str {
        "readings"
    }

    fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Columns for Reading {
    fn columns(&self) -> Result<Vec<Column>> {
        Ok(vec![
            Column::encode("sensor", &self.sensor)?,
            Column::encode("celsius", &self.celsius)?,
        ])
    }
}

fn reading() -> Reading {
    Reading {
        id: 0,
        sensor: "sensor-1".to_string(),
        celsius: 21.5,
    }
}

fn store_benchmarks(c: &mut Criterion) {
    let store = Store::new(Engine::in_memory().unwrap());
    c.bench_function("save_in_memory", |b| {
        b.iter(|| store.save(&Owner::Root, &mut reading()).unwrap())
    });

    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .wal_sync_strategy(WalSyncStrategy::EveryNEntries { count: 1000 })
        .build();
    let store = Store::new(Engine::open(config).unwrap());
    c.bench_function("save_wal_batched_sync", |b| {
        b.iter(|| store.save(&Owner::Root, &mut reading()).unwrap())
    });
}

criterion_group!(benches, store_benchmarks);
criterion_main!(benches);
