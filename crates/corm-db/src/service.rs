//! Engine entry point.
//!
//! `Orm` bundles the frozen [`Registry`], the storage adapter, the term store,
//! and the loaded [`CormConfig`]. It is cheap to clone and every model instance
//! holds one, so instances can persist themselves.

use std::sync::Arc;

use corm_config::CormConfig;
use corm_core::identity::RecordId;
use serde_json::{Map, Value};

use crate::adapter::{StorageAdapter, TermStore};
use crate::definition::ModelDefinition;
use crate::error::ModelError;
use crate::model::Model;
use crate::query::Query;
use crate::registry::Registry;

struct OrmInner {
    registry: Registry,
    adapter: Arc<dyn StorageAdapter>,
    terms: Arc<dyn TermStore>,
    config: CormConfig,
}

#[derive(Clone)]
pub struct Orm {
    inner: Arc<OrmInner>,
}

impl Orm {
    /// Engine using `adapter` for records, meta, and terms, with default config.
    #[must_use]
    pub fn new<A>(registry: Registry, adapter: Arc<A>) -> Self
    where
        A: StorageAdapter + TermStore + 'static,
    {
        Self::builder(registry, adapter).build()
    }

    #[must_use]
    pub fn builder<A>(registry: Registry, adapter: Arc<A>) -> OrmBuilder
    where
        A: StorageAdapter + TermStore + 'static,
    {
        OrmBuilder {
            registry,
            adapter: Arc::clone(&adapter) as Arc<dyn StorageAdapter>,
            terms: adapter,
            config: CormConfig::default(),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    #[must_use]
    pub fn adapter(&self) -> &dyn StorageAdapter {
        self.inner.adapter.as_ref()
    }

    #[must_use]
    pub fn terms(&self) -> &dyn TermStore {
        self.inner.terms.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> &CormConfig {
        &self.inner.config
    }

    /// A new, unsaved instance with the type's defaults applied.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::NotBooted` if the type was not booted.
    pub fn make(&self, definition: &dyn ModelDefinition) -> Result<Model, ModelError> {
        let entry = self.registry().entry(definition.name())?;
        Ok(Model::new(self.clone(), entry))
    }

    /// A new, unsaved instance filled with `attributes`.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::NotBooted` or `ModelError::UnknownAttribute`.
    pub fn make_with(
        &self,
        definition: &dyn ModelDefinition,
        attributes: Map<String, Value>,
    ) -> Result<Model, ModelError> {
        let mut model = self.make(definition)?;
        model.fill(attributes)?;
        Ok(model)
    }

    /// Make and save in one step. `attributes` may carry a `terms` entry, as
    /// for [`Model::save`].
    ///
    /// # Errors
    ///
    /// Any error from [`Model::save`].
    pub fn create(
        &self,
        definition: &dyn ModelDefinition,
        attributes: Map<String, Value>,
    ) -> Result<Model, ModelError> {
        let mut model = self.make(definition)?;
        model.save(Some(attributes))?;
        Ok(model)
    }

    /// # Errors
    ///
    /// Returns `ModelError::NotBooted` if the type was not booted.
    pub fn query(&self, definition: &dyn ModelDefinition) -> Result<Query, ModelError> {
        let entry = self.registry().entry(definition.name())?;
        Ok(Query::new(self.clone(), entry))
    }

    /// Load record `id` through the type's scoped query.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::NotFound` if no visible record has that id.
    pub fn find(&self, definition: &dyn ModelDefinition, id: RecordId) -> Result<Model, ModelError> {
        self.query(definition)?.find(id)
    }
}

pub struct OrmBuilder {
    registry: Registry,
    adapter: Arc<dyn StorageAdapter>,
    terms: Arc<dyn TermStore>,
    config: CormConfig,
}

impl OrmBuilder {
    #[must_use]
    pub fn config(mut self, config: CormConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a separate term store instead of the storage adapter.
    #[must_use]
    pub fn terms(mut self, terms: Arc<dyn TermStore>) -> Self {
        self.terms = terms;
        self
    }

    #[must_use]
    pub fn build(self) -> Orm {
        tracing::debug!(
            types = self.registry.type_names().len(),
            write_through = self.config.meta.write_through,
            validate_on_save = self.config.schema.validate_on_save,
            "orm ready"
        );
        Orm {
            inner: Arc::new(OrmInner {
                registry: self.registry,
                adapter: self.adapter,
                terms: self.terms,
                config: self.config,
            }),
        }
    }
}
