//! Model type definitions.
//!
//! A model type is a unit struct implementing [`ModelDefinition`]. Composition
//! replaces subclassing: a type names its parent, inherits the parent's
//! attribute schema, storage kind, soft-delete capability, hooks, and scopes,
//! and can override any of them. Booting happens once per type, parent first,
//! through [`RegistryBuilder::boot`](crate::registry::RegistryBuilder::boot).

use corm_core::attributes::AttributeSchema;
use corm_schema::{SchemaError, SchemaRegistry};

use crate::events::Hooks;
use crate::scopes::Scopes;

pub trait ModelDefinition: Send + Sync + 'static {
    /// Unique type name, used as the registry key.
    fn name(&self) -> &'static str;

    /// The type this one composes, if any.
    fn parent(&self) -> Option<&'static dyn ModelDefinition> {
        None
    }

    /// Storage kind passed to the adapter. Composed types share their parent's.
    fn record_kind(&self) -> &'static str {
        self.parent().map_or_else(|| self.name(), |parent| parent.record_kind())
    }

    /// Aliases, declared fields, defaults, and primary key of the type.
    fn attributes(&self) -> AttributeSchema {
        match self.parent() {
            Some(parent) => parent
                .attributes()
                .extend(self.name(), AttributeSchema::new(self.name())),
            None => AttributeSchema::new(self.name()),
        }
    }

    /// Whether delete moves records to the trash unless forced.
    fn soft_deletes(&self) -> bool {
        self.parent().is_some_and(|parent| parent.soft_deletes())
    }

    /// Register the JSON Schema validated on save. Composed types reuse the
    /// parent's schema by default.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if the schema cannot be generated or compiled.
    fn register_schema(&self, schemas: &mut SchemaRegistry) -> Result<(), SchemaError> {
        match self.parent() {
            Some(parent) if schemas.contains(parent.name()) => schemas.alias(parent.name(), self.name()),
            _ => Ok(()),
        }
    }

    /// Register lifecycle callbacks for this type only. Parent callbacks are
    /// already registered and keep firing.
    fn register_hooks(&self, _hooks: &mut Hooks<'_>) {}

    /// Register global and local scopes for this type only.
    fn register_scopes(&self, _scopes: &mut Scopes<'_>) {}
}
