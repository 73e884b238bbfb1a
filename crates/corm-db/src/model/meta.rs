//! Meta access on a model instance.
//!
//! | Instance state | `meta.write_through` | set / delete |
//! |----------------|----------------------|--------------|
//! | stored | `true` | written to the adapter immediately |
//! | stored | `false` | queued, flushed on `save()` |
//! | unsaved | any | queued (delete only cancels pending sets) |
//!
//! Reads see queued ops first and fall back to the adapter for stored records.

use corm_core::enums::RecordStatus;
use corm_core::identity::RecordId;
use corm_core::meta::{Buffered, MetaOp};
use serde_json::Value;

use super::Model;
use crate::error::ModelError;

/// Borrowed view of an instance's meta.
pub struct MetaAccessor<'a> {
    model: &'a mut Model,
}

impl MetaAccessor<'_> {
    /// Current value of `key`, or `null` when unset.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::NotFound` if the record was deleted or the adapter
    /// no longer has it.
    pub fn get(&self, key: &str) -> Result<Value, ModelError> {
        match self.model.meta.get(key) {
            Buffered::Set(value) => return Ok(value.clone()),
            Buffered::Deleted => return Ok(Value::Null),
            Buffered::Untouched => {}
        }
        if self.model.status == RecordStatus::New {
            return Ok(Value::Null);
        }
        let id = self.model.require_identity()?;
        self.model
            .orm
            .adapter()
            .get_meta(id, key)
            .map(Option::unwrap_or_default)
            .map_err(|e| ModelError::from_meta(self.model.type_name(), key, e))
    }

    /// # Errors
    ///
    /// Returns `ModelError::MetaPersistence` if a write-through set fails, or
    /// `ModelError::NotFound` on a deleted record.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), ModelError> {
        let value = value.into();
        match self.write_through_target()? {
            Some(id) => {
                self.model.meta.discard(key);
                self.model
                    .orm
                    .adapter()
                    .set_meta(id, key, &value)
                    .map_err(|e| ModelError::from_meta(self.model.type_name(), key, e))
            }
            None => {
                self.model.meta.set(key, value);
                Ok(())
            }
        }
    }

    /// # Errors
    ///
    /// Returns `ModelError::MetaPersistence` if a write-through delete fails,
    /// or `ModelError::NotFound` on a deleted record.
    pub fn delete(&mut self, key: &str) -> Result<(), ModelError> {
        if self.model.status == RecordStatus::New {
            self.model.meta.discard(key);
            return Ok(());
        }
        match self.write_through_target()? {
            Some(id) => {
                self.model.meta.discard(key);
                self.model
                    .orm
                    .adapter()
                    .delete_meta(id, key)
                    .map_err(|e| ModelError::from_meta(self.model.type_name(), key, e))
            }
            None => {
                self.model.meta.delete(key);
                Ok(())
            }
        }
    }

    /// Queued ops, oldest first.
    #[must_use]
    pub fn pending(&self) -> &[MetaOp] {
        self.model.meta.pending()
    }

    /// Identity to write to immediately, or `None` to queue.
    fn write_through_target(&self) -> Result<Option<RecordId>, ModelError> {
        if self.model.status == RecordStatus::New {
            return Ok(None);
        }
        let id = self.model.require_identity()?;
        Ok(self.model.orm.config().meta.write_through.then_some(id))
    }
}

impl Model {
    /// Meta accessor. Stored meta is read lazily.
    pub fn meta(&mut self) -> MetaAccessor<'_> {
        MetaAccessor { model: self }
    }

    /// Queue a meta set regardless of write-through, to be flushed by `save()`.
    pub fn queue_meta(&mut self, key: &str, value: impl Into<Value>) {
        self.meta.set(key, value);
    }

    /// Queue a meta delete regardless of write-through. On an unsaved instance
    /// this only cancels pending sets.
    pub fn queue_meta_delete(&mut self, key: &str) {
        if self.status == RecordStatus::New {
            self.meta.discard(key);
        } else {
            self.meta.delete(key);
        }
    }

    #[must_use]
    pub fn pending_meta(&self) -> &[MetaOp] {
        self.meta.pending()
    }

    /// Apply queued meta ops in order. On failure the failing op and the rest
    /// stay queued.
    pub(crate) fn flush_meta(&mut self) -> Result<usize, ModelError> {
        let Some(id) = self.id else {
            return Ok(0);
        };
        if self.meta.is_empty() {
            return Ok(0);
        }

        let adapter = self.orm.adapter();
        let result = self.meta.flush(|op| {
            match op {
                MetaOp::Set { key, value } => adapter.set_meta(id, key, value),
                MetaOp::Delete { key } => adapter.delete_meta(id, key),
            }
            .map_err(|e| (op.key().to_string(), e))
        });

        match result {
            Ok(applied) => {
                tracing::debug!(model = self.type_name(), %id, applied, "meta flushed");
                Ok(applied)
            }
            Err((key, err)) => {
                tracing::warn!(
                    model = self.type_name(),
                    %id,
                    key = %key,
                    remaining = self.meta.len(),
                    error = %err,
                    "meta flush failed"
                );
                Err(ModelError::from_meta(self.type_name(), &key, err))
            }
        }
    }
}
