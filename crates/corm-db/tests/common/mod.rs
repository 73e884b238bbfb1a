//! Helpers shared by the corm-db integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use corm_config::CormConfig;
use corm_db::Orm;
use corm_db::adapter::MemoryAdapter;
use corm_db::models;
use corm_db::registry::{Registry, RegistryBuilder};
use serde_json::{Map, Value};

/// Route `tracing` output to the test writer. Filter from `CORM_LOG`.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("CORM_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// A registry builder with the stock types booted.
pub fn stock_builder() -> RegistryBuilder {
    init_tracing();
    let mut builder = Registry::builder();
    models::boot_stock(&mut builder).unwrap();
    builder
}

/// Freeze `builder` into an engine over a fresh memory adapter.
pub fn orm_from(builder: RegistryBuilder) -> (Orm, Arc<MemoryAdapter>) {
    orm_from_with(builder, CormConfig::default())
}

pub fn orm_from_with(builder: RegistryBuilder, config: CormConfig) -> (Orm, Arc<MemoryAdapter>) {
    let adapter = Arc::new(MemoryAdapter::new());
    let orm = Orm::builder(builder.build(), Arc::clone(&adapter))
        .config(config)
        .build();
    (orm, adapter)
}

/// Stock types over a fresh memory adapter, with `config`.
pub fn orm_with(config: CormConfig) -> (Orm, Arc<MemoryAdapter>) {
    orm_from_with(stock_builder(), config)
}

pub fn attrs(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}
