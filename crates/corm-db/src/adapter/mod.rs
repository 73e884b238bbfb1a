//! Storage collaborators.
//!
//! The model engine never talks to a database directly. Record writes, meta
//! writes, and queries go through a [`StorageAdapter`]; taxonomy associations go
//! through a [`TermStore`]. Both are synchronous and take `&self`, so
//! implementations own their interior mutability.

mod memory;

pub use memory::{AdapterCall, FailPoint, MemoryAdapter};

use corm_core::entities::Term;
use corm_core::identity::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AdapterError;
use crate::filter::Criteria;

/// A record as the adapter returns it. Attribute names are canonical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: RecordId,
    /// Storage kind the record was created under.
    pub kind: String,
    pub attributes: Map<String, Value>,
    pub trashed: bool,
}

/// Record and meta persistence.
pub trait StorageAdapter: Send + Sync {
    /// Insert a record of `kind` and return its new identity.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError` if the write is rejected.
    fn create(&self, kind: &str, attributes: &Map<String, Value>) -> Result<RecordId, AdapterError>;

    /// Merge `attributes` into an existing record.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::NotFound` if the record does not exist.
    fn update(&self, id: RecordId, attributes: &Map<String, Value>) -> Result<(), AdapterError>;

    /// Trash (`permanent == false`) or remove a record.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::NotFound` if the record does not exist.
    fn delete(&self, id: RecordId, permanent: bool) -> Result<(), AdapterError>;

    /// Un-trash a record.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::NotFound` if the record does not exist.
    fn restore(&self, id: RecordId) -> Result<(), AdapterError>;

    /// # Errors
    ///
    /// Returns `AdapterError::NotFound` if the record does not exist.
    fn fetch(&self, id: RecordId) -> Result<StoredRecord, AdapterError>;

    /// # Errors
    ///
    /// Returns `AdapterError::NotFound` if the record does not exist.
    fn get_meta(&self, id: RecordId, key: &str) -> Result<Option<Value>, AdapterError>;

    /// # Errors
    ///
    /// Returns `AdapterError` if the write is rejected.
    fn set_meta(&self, id: RecordId, key: &str, value: &Value) -> Result<(), AdapterError>;

    /// Deleting an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError` if the write is rejected.
    fn delete_meta(&self, id: RecordId, key: &str) -> Result<(), AdapterError>;

    /// Records of `kind` matching every filter in `criteria`.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError` if the backend cannot run the query.
    fn query(&self, kind: &str, criteria: &Criteria) -> Result<Vec<StoredRecord>, AdapterError>;
}

/// Taxonomy associations of records.
pub trait TermStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `AdapterError::NotFound` if the record does not exist.
    fn get_terms(&self, id: RecordId, taxonomy: &str) -> Result<Vec<Term>, AdapterError>;

    /// Replace the full association set of `id` in `taxonomy`.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError` if the write is rejected.
    fn set_terms(&self, id: RecordId, taxonomy: &str, terms: &[Term]) -> Result<(), AdapterError>;
}
