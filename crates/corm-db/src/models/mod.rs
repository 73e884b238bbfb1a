//! Stock model definitions for the host platform's content and user records.
//!
//! | Type | Composes | Storage kind | Soft delete | Global scopes |
//! |------|----------|--------------|-------------|---------------|
//! | [`Post`] | | `post` | yes | `post_type` = `post` |
//! | [`Page`] | `Post` | `post` | yes | `post_type` = `page` (replaces Post's) |
//! | [`User`] | | `user` | no | |
//! | [`Admin`] | `User` | `user` | no | meta `role` = `administrator` |

mod post;
mod user;

pub use post::{Page, Post};
pub use user::{ADMINISTRATOR_ROLE, Admin, User};

use crate::error::ModelError;
use crate::registry::RegistryBuilder;

/// Boot every stock definition.
///
/// # Errors
///
/// Returns `ModelError::Schema` if a stock schema fails to register.
pub fn boot_stock(builder: &mut RegistryBuilder) -> Result<(), ModelError> {
    builder.boot(&Post)?.boot(&Page)?.boot(&User)?.boot(&Admin)?;
    Ok(())
}
