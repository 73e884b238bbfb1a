//! # corm-db
//!
//! The model engine of corm: an active-record layer over an external storage
//! adapter.
//!
//! - [`definition`]: the `ModelDefinition` trait a model type implements
//! - [`registry`]: boot orchestration and the frozen type registry
//! - [`events`]: the Lifecycle Dispatcher (`creating`/`created`, ...)
//! - [`scopes`]: global and local query scopes
//! - [`filter`] / [`query`]: criteria and the query builder
//! - [`model`]: the `Model` façade (attributes, meta, save, delete, terms)
//! - [`adapter`]: the `StorageAdapter` / `TermStore` seams and `MemoryAdapter`
//! - [`service`]: the `Orm` handle tying it together
//! - [`models`]: stock `Post`, `Page`, `User`, and `Admin` definitions
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//!
//! use corm_db::adapter::MemoryAdapter;
//! use corm_db::models::{self, Post};
//! use corm_db::registry::Registry;
//! use corm_db::service::Orm;
//!
//! let mut builder = Registry::builder();
//! models::boot_stock(&mut builder).unwrap();
//! let orm = Orm::new(builder.build(), Arc::new(MemoryAdapter::new()));
//!
//! let mut post = orm.make(&Post).unwrap();
//! post.set("title", "Example Title").unwrap();
//! post.meta().set("type", "video").unwrap();
//! post.save(None).unwrap();
//!
//! let videos = Post::of_type(&orm, "video").unwrap().get().unwrap();
//! assert_eq!(videos.len(), 1);
//! ```

pub mod adapter;
pub mod definition;
pub mod error;
pub mod events;
pub mod filter;
pub mod model;
pub mod models;
pub mod query;
pub mod registry;
pub mod scopes;
pub mod service;

#[cfg(test)]
mod test_support;

pub use error::{AdapterError, ModelError};
pub use model::Model;
pub use service::Orm;
