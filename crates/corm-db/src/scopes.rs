//! Scope Registry.
//!
//! Global scopes are named criteria mutators applied to every query of a type
//! and its descendants. Local scopes are named query transformers invoked on
//! demand by name, e.g. `query.scope("ofType", &[json!("video")])`.
//!
//! Effective global scopes of a type are those of its lineage, root ancestor
//! first, each group in registration order. A descendant registering a name an
//! ancestor already uses replaces that scope's predicate in place; a descendant
//! removing an inherited name suppresses it for itself and its own descendants.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;

use crate::error::ModelError;
use crate::filter::Criteria;
use crate::query::Query;

/// Mutates the criteria of every query on the type.
pub type GlobalScope = Arc<dyn Fn(&mut Criteria) + Send + Sync>;

/// Transforms a query with caller-supplied arguments.
pub type LocalScope = Arc<dyn Fn(Query, &[Value]) -> Result<Query, ModelError> + Send + Sync>;

#[derive(Default, Clone)]
pub struct ScopeRegistry {
    globals: HashMap<&'static str, Vec<(String, GlobalScope)>>,
    locals: HashMap<&'static str, HashMap<String, LocalScope>>,
    suppressed: HashMap<&'static str, HashSet<String>>,
}

impl ScopeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a global scope on `model`. Re-registering a name replaces the
    /// predicate and keeps the original position.
    pub fn add_global_scope(&mut self, model: &'static str, name: impl Into<String>, scope: GlobalScope) {
        let name = name.into();
        let scopes = self.globals.entry(model).or_default();
        match scopes.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, predicate)) => *predicate = scope,
            None => scopes.push((name, scope)),
        }
    }

    /// Remove the global scope `name` from the last type in `lineage`.
    ///
    /// A scope registered on the type itself is dropped. One inherited from an
    /// ancestor is suppressed for the type and its descendants while the
    /// ancestor keeps it. Returns whether either took effect.
    pub fn remove_global_scope(&mut self, lineage: &[&'static str], name: &str) -> bool {
        let Some((&model, ancestors)) = lineage.split_last() else {
            return false;
        };
        let removed = self.globals.get_mut(model).is_some_and(|scopes| {
            let before = scopes.len();
            scopes.retain(|(existing, _)| existing != name);
            before != scopes.len()
        });
        let inherited = ancestors.iter().any(|ty| {
            self.globals
                .get(ty)
                .is_some_and(|scopes| scopes.iter().any(|(existing, _)| existing == name))
        });
        if inherited {
            self.suppressed.entry(model).or_default().insert(name.to_string());
        }
        removed || inherited
    }

    /// Register a local scope. The name is normalized, so `ofType`,
    /// `scopeOfType`, and `of_type` all address the same scope.
    pub fn add_local_scope(&mut self, model: &'static str, name: &str, scope: LocalScope) {
        self.locals
            .entry(model)
            .or_default()
            .insert(normalize_scope_name(name), scope);
    }

    /// Global scopes in effect for `lineage` (root first), in application order.
    #[must_use]
    pub fn global_scopes(&self, lineage: &[&'static str]) -> Vec<(&str, &GlobalScope)> {
        let mut effective: Vec<(&str, &GlobalScope)> = Vec::new();
        for ty in lineage {
            if let Some(names) = self.suppressed.get(ty) {
                effective.retain(|(name, _)| !names.contains(*name));
            }
            let Some(scopes) = self.globals.get(ty) else {
                continue;
            };
            for (name, scope) in scopes {
                match effective.iter_mut().find(|(existing, _)| *existing == name.as_str()) {
                    Some(slot) => slot.1 = scope,
                    None => effective.push((name.as_str(), scope)),
                }
            }
        }
        effective
    }

    /// Find the local scope `method` for the last type in `lineage`, falling
    /// back through its ancestors.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::ScopeNotFound` if no type in the lineage defines it.
    pub fn resolve_local_scope(
        &self,
        lineage: &[&'static str],
        method: &str,
    ) -> Result<LocalScope, ModelError> {
        let name = normalize_scope_name(method);
        lineage
            .iter()
            .rev()
            .find_map(|ty| self.locals.get(ty).and_then(|scopes| scopes.get(&name)))
            .cloned()
            .ok_or_else(|| ModelError::ScopeNotFound {
                model: lineage.last().copied().unwrap_or_default().to_string(),
                scope: method.to_string(),
            })
    }

    /// Local scope names available to `lineage`, sorted.
    #[must_use]
    pub fn local_scope_names(&self, lineage: &[&'static str]) -> Vec<&str> {
        let mut names: Vec<&str> = lineage
            .iter()
            .filter_map(|ty| self.locals.get(ty))
            .flat_map(|scopes| scopes.keys().map(String::as_str))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

/// Strip a `scope` prefix and convert camelCase to `snake_case`.
#[must_use]
pub fn normalize_scope_name(method: &str) -> String {
    let stripped = match method.strip_prefix("scope") {
        Some(rest) if rest.starts_with('_') => &rest[1..],
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_uppercase()) => rest,
        _ => method,
    };

    let mut normalized = String::with_capacity(stripped.len() + 4);
    for (i, c) in stripped.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 && !normalized.ends_with('_') {
                normalized.push('_');
            }
            normalized.push(c.to_ascii_lowercase());
        } else {
            normalized.push(c);
        }
    }
    normalized
}

/// Positional scope argument, or a validation error naming the scope.
///
/// # Errors
///
/// Returns `ModelError::Validation` when fewer than `index + 1` args were given.
pub fn scope_arg<'a>(
    model: &str,
    scope: &str,
    args: &'a [Value],
    index: usize,
) -> Result<&'a Value, ModelError> {
    args.get(index).ok_or_else(|| ModelError::Validation {
        model: model.to_string(),
        errors: vec![format!("scope '{scope}' expects argument {}", index + 1)],
    })
}

/// Boot-time handle for registering one type's scopes.
pub struct Scopes<'a> {
    registry: &'a mut ScopeRegistry,
    model: &'static str,
}

impl<'a> Scopes<'a> {
    pub(crate) fn new(registry: &'a mut ScopeRegistry, model: &'static str) -> Self {
        Self { registry, model }
    }

    #[must_use]
    pub const fn model(&self) -> &'static str {
        self.model
    }

    pub fn global<F>(&mut self, name: &str, scope: F) -> &mut Self
    where
        F: Fn(&mut Criteria) + Send + Sync + 'static,
    {
        self.registry.add_global_scope(self.model, name, Arc::new(scope));
        self
    }

    pub fn local<F>(&mut self, name: &str, scope: F) -> &mut Self
    where
        F: Fn(Query, &[Value]) -> Result<Query, ModelError> + Send + Sync + 'static,
    {
        self.registry.add_local_scope(self.model, name, Arc::new(scope));
        self
    }
}
