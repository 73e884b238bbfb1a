//! # Attribute System
//!
//! The attribute half of a model instance:
//!
//! - **Schema**: which canonical fields a model type declares, their kinds,
//!   defaults, primary key, and alias table ([`AttributeSchema`]).
//! - **Store**: the current canonical values plus dirty tracking
//!   ([`AttributeStore`]).
//!
//! Every read and write resolves its name through the alias table first, so
//! `store.set("title", v)` and `store.get("post_title")` address the same slot.
//!
//! | Kind | Empty value |
//! |------|-------------|
//! | `String` | `""` |
//! | `Integer` | `0` |
//! | `Float` | `0.0` |
//! | `Bool` | `false` |
//! | `DateTime` | `null` |
//! | `Json` | `null` |

mod schema;
mod store;

pub use schema::{AttributeSchema, FieldDef, FieldKind};
pub use store::{AttributeSnapshot, AttributeStore};
