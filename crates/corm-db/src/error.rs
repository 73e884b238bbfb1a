//! Error types for corm-db.

use corm_core::enums::LifecycleEvent;
use corm_core::errors::CoreError;
use corm_core::identity::RecordId;
use corm_schema::SchemaError;
use thiserror::Error;

/// Errors surfaced by model operations.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A strict model type was given a field it does not declare.
    #[error("Unknown attribute '{field}' on {model}")]
    UnknownAttribute { model: String, field: String },

    /// The attribute payload failed its registered schema.
    #[error("Validation failed for {model}: {}", errors.join("; "))]
    Validation { model: String, errors: Vec<String> },

    /// The storage adapter rejected a record write.
    #[error("Persistence failed for {model}: {reason}")]
    Persistence { model: String, reason: String },

    /// The storage adapter rejected a meta write during flush or write-through.
    #[error("Meta write '{key}' on {model} failed: {reason}")]
    MetaPersistence {
        model: String,
        key: String,
        reason: String,
    },

    /// A before-event callback rejected the operation.
    #[error("{event} on {model} was vetoed: {reason}")]
    OperationVetoed {
        model: String,
        event: LifecycleEvent,
        reason: String,
    },

    /// No local scope of that name is registered for the type or its ancestors.
    #[error("Scope '{scope}' not found on {model}")]
    ScopeNotFound { model: String, scope: String },

    /// `set_terms` could not decide which taxonomy the terms belong to.
    #[error("Cannot infer a single taxonomy from terms spanning {taxonomies:?}")]
    AmbiguousTaxonomy { taxonomies: Vec<String> },

    /// The record does not exist in storage (or was permanently deleted).
    #[error("{model} {id} not found")]
    NotFound { model: String, id: RecordId },

    /// The operation needs an identity but the instance was never saved.
    #[error("{model} has not been saved yet")]
    NotPersisted { model: String },

    /// The model type was never booted into the registry.
    #[error("Model type '{0}' has not been booted")]
    NotBooted(String),

    /// Schema registration or lookup failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<CoreError> for ModelError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownAttribute { model, field } => Self::UnknownAttribute { model, field },
            CoreError::AmbiguousTaxonomy { taxonomies } => Self::AmbiguousTaxonomy { taxonomies },
            CoreError::Other(e) => Self::Other(e),
        }
    }
}

impl ModelError {
    /// Map a failed record write.
    pub(crate) fn from_write(model: &str, err: AdapterError) -> Self {
        match err {
            AdapterError::NotFound(id) => Self::NotFound {
                model: model.to_string(),
                id,
            },
            other => Self::Persistence {
                model: model.to_string(),
                reason: other.to_string(),
            },
        }
    }

    /// Map a failed meta write.
    pub(crate) fn from_meta(model: &str, key: &str, err: AdapterError) -> Self {
        match err {
            AdapterError::NotFound(id) => Self::NotFound {
                model: model.to_string(),
                id,
            },
            other => Self::MetaPersistence {
                model: model.to_string(),
                key: key.to_string(),
                reason: other.to_string(),
            },
        }
    }
}

/// Errors reported by a storage adapter or term store.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("Record {0} not found")]
    NotFound(RecordId),

    /// The backend refused the write (constraint, permission, injected failure).
    #[error("Write rejected: {0}")]
    Rejected(String),

    /// The backend could not be reached or its state is unusable.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
