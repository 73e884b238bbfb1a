//! Cross-cutting error types for corm.
//!
//! Errors raised by the in-memory building blocks (attribute store, term
//! inference). Engine-level errors (`ModelError`) live in `corm-db`, which
//! flattens these into its own taxonomy.

use thiserror::Error;

/// Errors that can be raised by the corm-core building blocks.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A fixed-schema model type was given a field it does not declare.
    #[error("Unknown attribute '{field}' on {model}")]
    UnknownAttribute { model: String, field: String },

    /// Terms were assigned without a taxonomy and none could be inferred.
    #[error("Cannot infer taxonomy from terms spanning {taxonomies:?}")]
    AmbiguousTaxonomy { taxonomies: Vec<String> },

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
