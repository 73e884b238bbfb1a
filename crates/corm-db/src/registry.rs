//! Boot orchestration and the frozen type registry.
//!
//! [`RegistryBuilder`] is the mutable boot phase: types are booted (parents
//! first, each exactly once), and hooks and scopes may be registered or removed.
//! [`RegistryBuilder::build`] freezes everything into a [`Registry`] shared by
//! every model instance through `Arc`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use corm_core::attributes::AttributeSchema;
use corm_core::enums::LifecycleEvent;
use corm_schema::SchemaRegistry;
use serde_json::Value;

use crate::definition::ModelDefinition;
use crate::error::ModelError;
use crate::events::{Dispatcher, HookResult, Hooks};
use crate::filter::Criteria;
use crate::model::Model;
use crate::query::Query;
use crate::scopes::{ScopeRegistry, Scopes};

/// Everything the engine knows about one booted type.
#[derive(Debug)]
pub struct TypeEntry {
    name: &'static str,
    record_kind: &'static str,
    /// Root ancestor first, this type last.
    lineage: Vec<&'static str>,
    attributes: Arc<AttributeSchema>,
    soft_deletes: bool,
}

impl TypeEntry {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn record_kind(&self) -> &'static str {
        self.record_kind
    }

    #[must_use]
    pub fn lineage(&self) -> &[&'static str] {
        &self.lineage
    }

    #[must_use]
    pub fn attributes(&self) -> &Arc<AttributeSchema> {
        &self.attributes
    }

    #[must_use]
    pub const fn soft_deletes(&self) -> bool {
        self.soft_deletes
    }

    /// Whether this type is `ancestor` or composes it.
    #[must_use]
    pub fn is_a(&self, ancestor: &str) -> bool {
        self.lineage.contains(&ancestor)
    }
}

#[derive(Default)]
pub struct RegistryBuilder {
    types: HashMap<&'static str, TypeEntry>,
    booting: HashSet<&'static str>,
    dispatcher: Dispatcher,
    scopes: ScopeRegistry,
    schemas: SchemaRegistry,
}

impl RegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Boot `definition` and, first, its ancestors. Booting an already booted
    /// type is a no-op, so callbacks and scopes are never registered twice.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Schema` if the type's schema fails to register, or
    /// `ModelError::Other` if the composition chain loops.
    pub fn boot(&mut self, definition: &'static dyn ModelDefinition) -> Result<&mut Self, ModelError> {
        let name = definition.name();
        if self.types.contains_key(name) {
            return Ok(self);
        }
        if !self.booting.insert(name) {
            return Err(anyhow::anyhow!("model type '{name}' composes itself").into());
        }

        let mut lineage = Vec::new();
        if let Some(parent) = definition.parent() {
            self.boot(parent)?;
            if let Some(entry) = self.types.get(parent.name()) {
                lineage.extend_from_slice(&entry.lineage);
            }
        }
        lineage.push(name);

        definition.register_schema(&mut self.schemas)?;
        definition.register_hooks(&mut Hooks::new(&mut self.dispatcher, name));
        definition.register_scopes(&mut Scopes::new(&mut self.scopes, name));

        let entry = TypeEntry {
            name,
            record_kind: definition.record_kind(),
            lineage,
            attributes: Arc::new(definition.attributes()),
            soft_deletes: definition.soft_deletes(),
        };
        tracing::debug!(
            model = name,
            kind = entry.record_kind,
            lineage = ?entry.lineage,
            "booted model type"
        );
        self.types.insert(name, entry);
        self.booting.remove(name);
        Ok(self)
    }

    #[must_use]
    pub fn is_booted(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Register a callback outside a type's own boot.
    pub fn register_hook<F>(&mut self, model: &'static str, event: LifecycleEvent, hook: F) -> &mut Self
    where
        F: Fn(&mut Model) -> HookResult + Send + Sync + 'static,
    {
        self.dispatcher.register(model, event, Arc::new(hook));
        self
    }

    pub fn add_global_scope<F>(&mut self, model: &'static str, name: &str, scope: F) -> &mut Self
    where
        F: Fn(&mut Criteria) + Send + Sync + 'static,
    {
        self.scopes.add_global_scope(model, name, Arc::new(scope));
        self
    }

    /// Remove a global scope for every future query of `model` and of types
    /// composed from it. Scopes inherited from an ancestor are suppressed
    /// below that ancestor only. Returns `false` if no scope by that name was
    /// in effect.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::NotBooted` if `model` was not booted yet.
    pub fn remove_global_scope(&mut self, model: &'static str, name: &str) -> Result<bool, ModelError> {
        let entry = self
            .types
            .get(model)
            .ok_or_else(|| ModelError::NotBooted(model.to_string()))?;
        let removed = self.scopes.remove_global_scope(&entry.lineage, name);
        if !removed {
            tracing::warn!(model, scope = name, "no global scope to remove");
        }
        Ok(removed)
    }

    pub fn add_local_scope<F>(&mut self, model: &'static str, name: &str, scope: F) -> &mut Self
    where
        F: Fn(Query, &[Value]) -> Result<Query, ModelError> + Send + Sync + 'static,
    {
        self.scopes.add_local_scope(model, name, Arc::new(scope));
        self
    }

    /// Direct access to schema registration (e.g. hand-written schemas).
    pub fn schemas_mut(&mut self) -> &mut SchemaRegistry {
        &mut self.schemas
    }

    #[must_use]
    pub fn build(self) -> Registry {
        Registry {
            types: self
                .types
                .into_iter()
                .map(|(name, entry)| (name, Arc::new(entry)))
                .collect(),
            dispatcher: self.dispatcher,
            scopes: self.scopes,
            schemas: self.schemas,
        }
    }
}

/// Booted types with their callbacks, scopes, and schemas. Read-only.
pub struct Registry {
    types: HashMap<&'static str, Arc<TypeEntry>>,
    dispatcher: Dispatcher,
    scopes: ScopeRegistry,
    schemas: SchemaRegistry,
}

impl Registry {
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// # Errors
    ///
    /// Returns `ModelError::NotBooted` if `name` was never booted.
    pub fn entry(&self, name: &str) -> Result<Arc<TypeEntry>, ModelError> {
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| ModelError::NotBooted(name.to_string()))
    }

    /// Booted type names, sorted.
    #[must_use]
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.types.keys().copied().collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    #[must_use]
    pub const fn scopes(&self) -> &ScopeRegistry {
        &self.scopes
    }

    #[must_use]
    pub const fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corm_core::attributes::{FieldDef, FieldKind};
    use pretty_assertions::assert_eq;

    struct Base;
    struct Child;
    struct Loop;

    impl ModelDefinition for Base {
        fn name(&self) -> &'static str {
            "base"
        }

        fn attributes(&self) -> AttributeSchema {
            AttributeSchema::new("base")
                .alias("title", "base_title")
                .field(FieldDef::new("base_title", FieldKind::String))
        }

        fn soft_deletes(&self) -> bool {
            true
        }

        fn register_hooks(&self, hooks: &mut Hooks<'_>) {
            hooks.creating(|_| Ok(()));
        }
    }

    impl ModelDefinition for Child {
        fn name(&self) -> &'static str {
            "child"
        }

        fn parent(&self) -> Option<&'static dyn ModelDefinition> {
            Some(&Base)
        }
    }

    impl ModelDefinition for Loop {
        fn name(&self) -> &'static str {
            "loop"
        }

        fn parent(&self) -> Option<&'static dyn ModelDefinition> {
            Some(&Loop)
        }
    }

    #[test]
    fn booting_child_boots_parent_first() {
        let mut builder = Registry::builder();
        builder.boot(&Child).unwrap();
        assert!(builder.is_booted("base"));

        let registry = builder.build();
        let child = registry.entry("child").unwrap();
        assert_eq!(child.lineage(), &["base", "child"]);
        assert_eq!(child.record_kind(), "base");
        assert!(child.soft_deletes());
        assert!(child.is_a("base"));
        assert_eq!(child.attributes().canonical("title"), "base_title");
        assert_eq!(child.attributes().model, "child");
        assert_eq!(registry.type_names(), vec!["base", "child"]);
    }

    #[test]
    fn booting_twice_registers_hooks_once() {
        let mut builder = Registry::builder();
        builder.boot(&Base).unwrap().boot(&Child).unwrap().boot(&Base).unwrap();
        let registry = builder.build();
        assert_eq!(registry.dispatcher().count("base", LifecycleEvent::Creating), 1);
    }

    #[test]
    fn self_composition_is_rejected() {
        let mut builder = Registry::builder();
        assert!(matches!(builder.boot(&Loop), Err(ModelError::Other(_))));
    }

    #[test]
    fn unknown_type_is_not_booted() {
        let registry = Registry::builder().build();
        assert!(matches!(registry.entry("post"), Err(ModelError::NotBooted(name)) if name == "post"));
    }
}
