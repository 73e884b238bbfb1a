//! # corm-core
//!
//! Core types for corm, the active-record mapping layer.
//!
//! This crate holds the pieces of a model instance that do not talk to storage:
//! - Record identity and lifecycle enums
//! - The alias table and attribute schema of a model type
//! - The Attribute Store (canonical values + dirty tracking)
//! - The Meta Buffer (pending meta mutations flushed on save)
//! - Term and stock field structs with `JsonSchema` derives
//! - Cross-cutting error types

pub mod alias;
pub mod attributes;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod identity;
pub mod meta;
