//! Model façade.
//!
//! A [`Model`] is one record instance: its type entry, identity, lifecycle
//! status, attribute store, meta buffer, and deferred term assignments.
//!
//! - `mod.rs`: construction, attribute access, serialization
//! - [`meta`]: the `meta()` accessor and buffered meta writes
//! - `persist`: `save`, `delete`, `restore`, `refresh`
//! - `terms`: taxonomy association reads and writes

pub mod meta;
mod persist;
mod terms;

use std::sync::Arc;

use corm_core::attributes::AttributeStore;
use corm_core::entities::Term;
use corm_core::enums::{LifecycleEvent, RecordStatus};
use corm_core::identity::RecordId;
use corm_core::meta::MetaBuffer;
use serde_json::{Map, Value};

use crate::adapter::StoredRecord;
use crate::error::ModelError;
use crate::registry::TypeEntry;
use crate::service::Orm;

pub use meta::MetaAccessor;

pub struct Model {
    orm: Orm,
    entry: Arc<TypeEntry>,
    id: Option<RecordId>,
    status: RecordStatus,
    attributes: AttributeStore,
    meta: MetaBuffer,
    /// Term assignments waiting for an identity, keyed by taxonomy.
    pending_terms: Vec<(String, Vec<Term>)>,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("type", &self.entry.name())
            .field("id", &self.id)
            .field("status", &self.status)
            .field("attributes", &self.attributes.to_map())
            .field("pending_meta", &self.meta.len())
            .finish_non_exhaustive()
    }
}

impl Model {
    pub(crate) fn new(orm: Orm, entry: Arc<TypeEntry>) -> Self {
        let attributes = AttributeStore::new(Arc::clone(entry.attributes()));
        Self {
            orm,
            entry,
            id: None,
            status: RecordStatus::New,
            attributes,
            meta: MetaBuffer::new(),
            pending_terms: Vec::new(),
        }
    }

    pub(crate) fn hydrate(orm: Orm, entry: Arc<TypeEntry>, record: StoredRecord) -> Self {
        let mut attributes = AttributeStore::hydrate(Arc::clone(entry.attributes()), record.attributes);
        attributes.set_identity(record.id.get());
        Self {
            orm,
            entry,
            id: Some(record.id),
            status: if record.trashed {
                RecordStatus::Trashed
            } else {
                RecordStatus::Persisted
            },
            attributes,
            meta: MetaBuffer::new(),
            pending_terms: Vec::new(),
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.entry.name()
    }

    #[must_use]
    pub fn entry(&self) -> &TypeEntry {
        &self.entry
    }

    #[must_use]
    pub const fn id(&self) -> Option<RecordId> {
        self.id
    }

    #[must_use]
    pub const fn status(&self) -> RecordStatus {
        self.status
    }

    /// Whether the record is in storage (trashed records included).
    #[must_use]
    pub const fn exists(&self) -> bool {
        self.status.exists()
    }

    #[must_use]
    pub fn is_trashed(&self) -> bool {
        self.status == RecordStatus::Trashed
    }

    /// Read an attribute by alias or canonical name.
    #[must_use]
    pub fn get(&self, name: &str) -> Value {
        self.attributes.get(name)
    }

    /// String view of an attribute; empty for non-strings.
    #[must_use]
    pub fn get_str(&self, name: &str) -> String {
        match self.attributes.get(name) {
            Value::String(s) => s,
            _ => String::new(),
        }
    }

    /// # Errors
    ///
    /// Returns `ModelError::UnknownAttribute` on a strict type.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ModelError> {
        self.attributes.set(name, value).map_err(ModelError::from)
    }

    /// Merge several attributes; all or none are applied.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::UnknownAttribute` on a strict type.
    pub fn fill(&mut self, attributes: Map<String, Value>) -> Result<(), ModelError> {
        self.attributes.fill(attributes).map_err(ModelError::from)
    }

    #[must_use]
    pub fn is_dirty(&self, name: Option<&str>) -> bool {
        self.attributes.is_dirty(name)
    }

    /// Canonical names changed since the last save.
    #[must_use]
    pub fn dirty_attributes(&self) -> Vec<String> {
        self.attributes.dirty_attributes().iter().cloned().collect()
    }

    #[must_use]
    pub fn original(&self, name: &str) -> Option<Value> {
        self.attributes.original(name).cloned()
    }

    #[must_use]
    pub const fn attributes(&self) -> &AttributeStore {
        &self.attributes
    }

    /// Attributes keyed by canonical name, identity included once saved.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(self.attributes.to_map())
    }

    fn fire(&mut self, event: LifecycleEvent) -> Result<(), ModelError> {
        let orm = self.orm.clone();
        let entry = Arc::clone(&self.entry);
        orm.registry().dispatcher().fire(entry.lineage(), event, self)
    }

    /// The identity, for operations on stored records.
    fn require_identity(&self) -> Result<RecordId, ModelError> {
        match (self.status, self.id) {
            (RecordStatus::Deleted, Some(id)) => Err(ModelError::NotFound {
                model: self.type_name().to_string(),
                id,
            }),
            (_, Some(id)) => Ok(id),
            (_, None) => Err(ModelError::NotPersisted {
                model: self.type_name().to_string(),
            }),
        }
    }
}
