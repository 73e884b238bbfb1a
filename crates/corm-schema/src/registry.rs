//! Central schema registry for corm model types.
//!
//! The `SchemaRegistry` keeps one JSON Schema per model type name. Schemas are
//! compiled with `jsonschema` when registered, so a malformed schema fails at
//! boot rather than on the first save.

use std::collections::HashMap;

use schemars::{JsonSchema, schema_for};

use crate::error::SchemaError;

/// Store of attribute-payload schemas keyed by model type name.
#[derive(Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, serde_json::Value>,
    validators: HashMap<String, jsonschema::Validator>,
}

impl SchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the schema for `name`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Compile` if the schema does not compile.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        schema: serde_json::Value,
    ) -> Result<(), SchemaError> {
        let name = name.into();
        let validator = jsonschema::validator_for(&schema)
            .map_err(|e| SchemaError::Compile {
                model: name.clone(),
                reason: e.to_string(),
            })?;
        self.validators.insert(name.clone(), validator);
        self.schemas.insert(name, schema);
        Ok(())
    }

    /// Register the schemars-generated schema of `T` under `name`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Generation` if the generated schema cannot be
    /// converted to JSON, or `SchemaError::Compile` if it does not compile.
    pub fn register_type<T: JsonSchema>(&mut self, name: impl Into<String>) -> Result<(), SchemaError> {
        let name = name.into();
        let schema = serde_json::to_value(schema_for!(T)).map_err(|e| SchemaError::Generation {
            model: name.clone(),
            reason: e.to_string(),
        })?;
        self.register(name, schema)
    }

    /// Copy the schema registered under `from` to `to` (composed model types).
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::UnknownModel` if `from` is not registered.
    pub fn alias(&mut self, from: &str, to: impl Into<String>) -> Result<(), SchemaError> {
        let schema = self
            .get(from)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownModel(from.to_string()))?;
        self.register(to, schema)
    }

    /// Get a schema by name. Returns `None` if not found.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.schemas.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Validate a JSON value against a named schema.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::UnknownModel` if the schema name is unknown, or
    /// `SchemaError::PayloadRejected` if validation produces errors.
    pub fn validate(&self, name: &str, instance: &serde_json::Value) -> Result<(), SchemaError> {
        let validator = self
            .validators
            .get(name)
            .ok_or_else(|| SchemaError::UnknownModel(name.to_string()))?;

        let errors: Vec<String> = validator
            .iter_errors(instance)
            .map(|e| format!("{e}"))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::PayloadRejected {
                model: name.to_string(),
                errors,
            })
        }
    }

    /// List all registered schema names.
    #[must_use]
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered schemas.
    #[must_use]
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }
}
