//! Save, delete, restore, and refresh.
//!
//! `save` order: merge attributes, fire `creating`/`updating`, validate, adapter
//! create/update, fire `created`/`updated`, flush meta, flush pending terms.
//! Anything failing before the adapter accepted the write restores the
//! attribute store, the meta buffer, and pending term assignments to their
//! pre-save state.

use std::sync::Arc;

use corm_core::attributes::AttributeStore;
use corm_core::entities::Term;
use corm_core::enums::{LifecycleEvent, RecordStatus};
use corm_core::meta::MetaBuffer;
use corm_schema::SchemaError;
use serde_json::{Map, Value};

use super::Model;
use super::terms::label_terms;
use crate::error::ModelError;

/// Attribute key carrying term assignments in `save`/`create` payloads.
const TERMS_KEY: &str = "terms";

impl Model {
    /// Persist the instance, optionally merging `attributes` first.
    ///
    /// A `terms` entry holding an array of terms is not an attribute (unless
    /// the type declares a `terms` field). Its taxonomy is inferred as for
    /// [`Model::set_terms`], and it is written only after the record write
    /// succeeds.
    ///
    /// # Errors
    ///
    /// - `OperationVetoed` if a `creating`/`updating` callback rejects
    /// - `Validation` if the payload fails the type's schema
    /// - `Persistence` if the adapter rejects the write
    /// - `MetaPersistence` if a buffered meta write fails (the record itself is
    ///   saved; the unflushed remainder stays queued for the next save)
    ///
    /// The first three leave the instance as it was before the call: attributes,
    /// queued meta (including meta queued by callbacks), and pending terms.
    pub fn save(&mut self, attributes: Option<Map<String, Value>>) -> Result<(), ModelError> {
        if self.status == RecordStatus::Deleted {
            return Err(self.not_found());
        }

        let snapshot = self.attributes.snapshot();
        let meta = self.meta.clone();
        let pending_terms = self.pending_terms.clone();
        let after = match self.write_attributes(attributes) {
            Ok(after) => after,
            Err(err) => {
                self.attributes.rollback(snapshot);
                self.meta = meta;
                self.pending_terms = pending_terms;
                return Err(err);
            }
        };

        if let Some(event) = after {
            self.fire(event)?;
        }
        self.flush_meta()?;
        self.flush_terms()?;
        Ok(())
    }

    /// Steps of `save` up to and including the adapter write. Returns the
    /// after-event to fire, if a write happened.
    fn write_attributes(
        &mut self,
        attributes: Option<Map<String, Value>>,
    ) -> Result<Option<LifecycleEvent>, ModelError> {
        if let Some(mut attributes) = attributes {
            let terms = self.take_terms(&mut attributes)?;
            self.fill(attributes)?;
            if let Some(terms) = terms {
                let (taxonomy, terms) = label_terms(terms, None)?;
                self.queue_terms(taxonomy, terms);
            }
        }

        let Some(id) = self.id else {
            self.fire(LifecycleEvent::Creating)?;
            self.validate()?;
            let id = self
                .orm
                .adapter()
                .create(self.entry.record_kind(), &self.attributes.payload())
                .map_err(|e| ModelError::from_write(self.type_name(), e))?;
            self.id = Some(id);
            self.status = RecordStatus::Persisted;
            self.attributes.set_identity(id.get());
            self.attributes.sync_original();
            tracing::debug!(model = self.type_name(), %id, "record created");
            return Ok(Some(LifecycleEvent::Created));
        };

        if !self.attributes.is_dirty(None) {
            return Ok(None);
        }
        self.fire(LifecycleEvent::Updating)?;
        self.validate()?;
        let payload = self.attributes.dirty_payload();
        self.orm
            .adapter()
            .update(id, &payload)
            .map_err(|e| ModelError::from_write(self.type_name(), e))?;
        self.attributes.sync_original();
        tracing::debug!(model = self.type_name(), %id, fields = payload.len(), "record updated");
        Ok(Some(LifecycleEvent::Updated))
    }

    fn take_terms(&self, attributes: &mut Map<String, Value>) -> Result<Option<Vec<Term>>, ModelError> {
        if self.attributes.schema().get_field(TERMS_KEY).is_some() {
            return Ok(None);
        }
        let Some(raw) = attributes.remove(TERMS_KEY) else {
            return Ok(None);
        };
        serde_json::from_value(raw)
            .map(Some)
            .map_err(|e| ModelError::Validation {
                model: self.type_name().to_string(),
                errors: vec![format!("terms: {e}")],
            })
    }

    /// Check the full attribute payload against the type's registered schema.
    fn validate(&self) -> Result<(), ModelError> {
        if !self.orm.config().schema.validate_on_save {
            return Ok(());
        }
        let schemas = self.orm.registry().schemas();
        if !schemas.contains(self.type_name()) {
            return Ok(());
        }
        match schemas.validate(self.type_name(), &self.to_json()) {
            Ok(()) => Ok(()),
            Err(SchemaError::PayloadRejected { errors, .. }) => Err(ModelError::Validation {
                model: self.type_name().to_string(),
                errors,
            }),
            Err(other) => Err(other.into()),
        }
    }

    /// Trash (soft-deletable types, unless `force`) or permanently remove.
    ///
    /// Trashing an already trashed record does nothing.
    ///
    /// # Errors
    ///
    /// - `NotPersisted` on an unsaved instance
    /// - `NotFound` if the record is already deleted
    /// - `OperationVetoed` if a `trashing`/`deleting` callback rejects
    /// - `Persistence` if the adapter rejects the delete
    pub fn delete(&mut self, force: bool) -> Result<(), ModelError> {
        let id = self.require_identity()?;

        if self.entry.soft_deletes() && !force {
            if self.status == RecordStatus::Trashed {
                return Ok(());
            }
            self.fire(LifecycleEvent::Trashing)?;
            self.orm
                .adapter()
                .delete(id, false)
                .map_err(|e| ModelError::from_write(self.type_name(), e))?;
            self.status = RecordStatus::Trashed;
            tracing::debug!(model = self.type_name(), %id, "record trashed");
            return self.fire(LifecycleEvent::Trashed);
        }

        self.fire(LifecycleEvent::Deleting)?;
        self.orm
            .adapter()
            .delete(id, true)
            .map_err(|e| ModelError::from_write(self.type_name(), e))?;
        self.status = RecordStatus::Deleted;
        if !self.meta.is_empty() {
            tracing::debug!(model = self.type_name(), %id, dropped = self.meta.len(), "discarding queued meta");
            self.meta = MetaBuffer::new();
        }
        self.pending_terms.clear();
        tracing::debug!(model = self.type_name(), %id, "record deleted");
        self.fire(LifecycleEvent::Deleted)
    }

    /// Bring a trashed record back. Restoring a record that is not trashed
    /// does nothing.
    ///
    /// # Errors
    ///
    /// - `Validation` if the type does not soft delete
    /// - `NotPersisted` / `NotFound` as for [`Model::delete`]
    /// - `OperationVetoed` if a `restoring` callback rejects
    /// - `Persistence` if the adapter rejects the restore
    pub fn restore(&mut self) -> Result<(), ModelError> {
        if !self.entry.soft_deletes() {
            return Err(ModelError::Validation {
                model: self.type_name().to_string(),
                errors: vec!["type does not support trashing".to_string()],
            });
        }
        let id = self.require_identity()?;
        if self.status != RecordStatus::Trashed {
            return Ok(());
        }

        self.fire(LifecycleEvent::Restoring)?;
        self.orm
            .adapter()
            .restore(id)
            .map_err(|e| ModelError::from_write(self.type_name(), e))?;
        self.status = RecordStatus::Persisted;
        tracing::debug!(model = self.type_name(), %id, "record restored");
        self.fire(LifecycleEvent::Restored)
    }

    /// Reload attributes from storage, discarding unsaved attribute changes.
    /// Queued meta is kept.
    ///
    /// # Errors
    ///
    /// Returns `NotPersisted` on an unsaved instance, `NotFound` if the record
    /// is gone.
    pub fn refresh(&mut self) -> Result<(), ModelError> {
        let id = self.require_identity()?;
        let record = self
            .orm
            .adapter()
            .fetch(id)
            .map_err(|e| ModelError::from_write(self.type_name(), e))?;
        let mut attributes =
            AttributeStore::hydrate(Arc::clone(self.entry.attributes()), record.attributes);
        attributes.set_identity(id.get());
        self.attributes = attributes;
        self.status = if record.trashed {
            RecordStatus::Trashed
        } else {
            RecordStatus::Persisted
        };
        Ok(())
    }

    fn not_found(&self) -> ModelError {
        match self.id {
            Some(id) => ModelError::NotFound {
                model: self.type_name().to_string(),
                id,
            },
            None => ModelError::NotPersisted {
                model: self.type_name().to_string(),
            },
        }
    }
}
