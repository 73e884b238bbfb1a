//! # corm-schema
//!
//! JSON Schema registry for corm model types.
//!
//! Each model type may declare a schema for its canonical attribute payload,
//! either generated from a typed struct with `schemars` or supplied as raw
//! JSON. The engine validates the payload against it before every write and
//! surfaces failures as validation errors.

pub mod error;
pub mod registry;

pub use error::SchemaError;
pub use registry::SchemaRegistry;
