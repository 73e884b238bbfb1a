//! Typed record shapes for the stock model types.
//!
//! The engine stores attributes as canonical-name → JSON maps; these structs
//! describe the same data with `JsonSchema` derives so a model type can hand
//! its attribute schema to the schema registry for payload validation.

mod post;
mod term;
mod user;

pub use post::{PostFields, PostStatus};
pub use term::{Term, slugify};
pub use user::UserFields;
