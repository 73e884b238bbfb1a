//! Attribute Store: canonical values of one model instance plus dirty tracking.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::AttributeSchema;
use crate::errors::CoreError;

/// Saved copy of a store's mutable state, used to undo a failed save.
#[derive(Debug, Clone)]
pub struct AttributeSnapshot {
    values: BTreeMap<String, Value>,
    dirty: BTreeSet<String>,
}

#[derive(Debug, Clone)]
pub struct AttributeStore {
    schema: Arc<AttributeSchema>,
    values: BTreeMap<String, Value>,
    /// Values as last loaded from or written to storage.
    original: BTreeMap<String, Value>,
    dirty: BTreeSet<String>,
}

impl AttributeStore {
    /// A fresh store with the schema's defaults applied (and marked dirty).
    #[must_use]
    pub fn new(schema: Arc<AttributeSchema>) -> Self {
        let mut values = BTreeMap::new();
        let mut dirty = BTreeSet::new();
        for (name, value) in schema.defaults() {
            values.insert(name.to_string(), value.clone());
            dirty.insert(name.to_string());
        }
        Self {
            schema,
            values,
            original: BTreeMap::new(),
            dirty,
        }
    }

    /// A clean store holding values loaded from storage. Names are taken as canonical.
    #[must_use]
    pub fn hydrate(schema: Arc<AttributeSchema>, stored: Map<String, Value>) -> Self {
        let values: BTreeMap<String, Value> = stored.into_iter().collect();
        Self {
            schema,
            original: values.clone(),
            values,
            dirty: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn schema(&self) -> &AttributeSchema {
        &self.schema
    }

    /// Read by alias or canonical name.
    ///
    /// Absent fields yield the type-appropriate empty value.
    #[must_use]
    pub fn get(&self, name: &str) -> Value {
        let canonical = self.schema.canonical(name);
        self.values
            .get(canonical)
            .cloned()
            .unwrap_or_else(|| self.schema.empty_value(canonical))
    }

    /// Read without defaulting; `None` when the field was never set.
    #[must_use]
    pub fn get_raw(&self, name: &str) -> Option<&Value> {
        self.values.get(self.schema.canonical(name))
    }

    /// Write by alias or canonical name and mark the canonical field dirty.
    ///
    /// Writing the current value again still marks it dirty.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UnknownAttribute` if the schema is strict and does
    /// not declare the resolved field.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), CoreError> {
        let canonical = self.check(name)?;
        self.values.insert(canonical.clone(), value.into());
        self.dirty.insert(canonical);
        Ok(())
    }

    /// Merge several attributes. Either all are applied or none are.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UnknownAttribute` for the first rejected field.
    pub fn fill<I, K>(&mut self, attributes: I) -> Result<(), CoreError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut resolved = Vec::new();
        for (name, value) in attributes {
            resolved.push((self.check(name.as_ref())?, value));
        }
        for (canonical, value) in resolved {
            self.values.insert(canonical.clone(), value);
            self.dirty.insert(canonical);
        }
        Ok(())
    }

    fn check(&self, name: &str) -> Result<String, CoreError> {
        let canonical = self.schema.canonical(name);
        if !self.schema.accepts(canonical) {
            return Err(CoreError::UnknownAttribute {
                model: self.schema.model.clone(),
                field: canonical.to_string(),
            });
        }
        Ok(canonical.to_string())
    }

    /// Canonical names mutated since the last save.
    #[must_use]
    pub fn dirty_attributes(&self) -> &BTreeSet<String> {
        &self.dirty
    }

    /// Whether `name` (or, with `None`, any field) is dirty.
    #[must_use]
    pub fn is_dirty(&self, name: Option<&str>) -> bool {
        match name {
            Some(name) => self.dirty.contains(self.schema.canonical(name)),
            None => !self.dirty.is_empty(),
        }
    }

    /// Value as last synced with storage.
    #[must_use]
    pub fn original(&self, name: &str) -> Option<&Value> {
        self.original.get(self.schema.canonical(name))
    }

    /// Minimal update payload: dirty fields only, primary key excluded.
    #[must_use]
    pub fn dirty_payload(&self) -> Map<String, Value> {
        self.dirty
            .iter()
            .filter(|name| **name != self.schema.primary_key)
            .map(|name| {
                let value = self.values.get(name).cloned().unwrap_or(Value::Null);
                (name.clone(), value)
            })
            .collect()
    }

    /// Full create payload: every stored field, primary key excluded.
    #[must_use]
    pub fn payload(&self) -> Map<String, Value> {
        self.values
            .iter()
            .filter(|(name, _)| **name != self.schema.primary_key)
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Every stored field keyed by canonical name, primary key included.
    #[must_use]
    pub fn to_map(&self) -> Map<String, Value> {
        self.values
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Populate the primary key without marking it dirty.
    pub fn set_identity(&mut self, id: impl Into<Value>) {
        let id = id.into();
        let pk = self.schema.primary_key.clone();
        self.original.insert(pk.clone(), id.clone());
        self.values.insert(pk, id);
    }

    /// Mark the current values as saved.
    pub fn sync_original(&mut self) {
        self.original = self.values.clone();
        self.dirty.clear();
    }

    #[must_use]
    pub fn snapshot(&self) -> AttributeSnapshot {
        AttributeSnapshot {
            values: self.values.clone(),
            dirty: self.dirty.clone(),
        }
    }

    pub fn rollback(&mut self, snapshot: AttributeSnapshot) {
        self.values = snapshot.values;
        self.dirty = snapshot.dirty;
    }
}
