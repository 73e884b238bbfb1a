//! Query builder.
//!
//! A [`Query`] collects explicit conditions and local-scope contributions for
//! one model type. The final [`Criteria`] handed to the adapter is built by
//! [`Query::criteria`]: effective global scopes first (minus any excluded), then
//! every other condition in call order.

use std::collections::BTreeSet;
use std::sync::Arc;

use corm_core::identity::RecordId;
use serde_json::Value;

use crate::error::ModelError;
use crate::filter::{Criteria, Direction, Filter, FilterOp, OrderBy, TrashedFilter};
use crate::model::Model;
use crate::registry::TypeEntry;
use crate::service::Orm;

#[derive(Clone)]
pub struct Query {
    orm: Orm,
    entry: Arc<TypeEntry>,
    criteria: Criteria,
    excluded_scopes: BTreeSet<String>,
    skip_global_scopes: bool,
}

impl Query {
    pub(crate) fn new(orm: Orm, entry: Arc<TypeEntry>) -> Self {
        let config = &orm.config().query;
        let criteria = Criteria {
            trashed: if config.include_trashed && entry.soft_deletes() {
                TrashedFilter::Include
            } else {
                TrashedFilter::Exclude
            },
            limit: config.limit().map(|l| l as usize),
            ..Criteria::default()
        };
        Self {
            orm,
            entry,
            criteria,
            excluded_scopes: BTreeSet::new(),
            skip_global_scopes: false,
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.entry.name()
    }

    fn canonical(&self, name: &str) -> String {
        self.entry.attributes().canonical(name).to_string()
    }

    /// Condition on a primary field, addressed by alias or canonical name.
    #[must_use]
    pub fn where_field(mut self, field: &str, op: FilterOp, value: impl Into<Value>) -> Self {
        let field = self.canonical(field);
        self.criteria.where_field(field, op, value);
        self
    }

    #[must_use]
    pub fn where_eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.where_field(field, FilterOp::Eq, value)
    }

    #[must_use]
    pub fn where_meta(mut self, key: &str, op: FilterOp, value: impl Into<Value>) -> Self {
        self.criteria.where_meta(key, op, value);
        self
    }

    #[must_use]
    pub fn where_meta_eq(self, key: &str, value: impl Into<Value>) -> Self {
        self.where_meta(key, FilterOp::Eq, value)
    }

    /// Records associated with any of `slugs` in `taxonomy`.
    #[must_use]
    pub fn where_term<I, S>(mut self, taxonomy: &str, slugs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.criteria.where_term(taxonomy, slugs);
        self
    }

    #[must_use]
    pub fn where_ids(mut self, ids: impl IntoIterator<Item = RecordId>) -> Self {
        self.criteria.push(Filter::Ids {
            ids: ids.into_iter().collect(),
        });
        self
    }

    #[must_use]
    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        let field = self.canonical(field);
        self.criteria.order.push(OrderBy { field, direction });
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.criteria.limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn offset(mut self, offset: usize) -> Self {
        self.criteria.offset = offset;
        self
    }

    /// Include trashed records. No effect on types without soft delete.
    #[must_use]
    pub const fn with_trashed(mut self) -> Self {
        self.criteria.trashed = TrashedFilter::Include;
        self
    }

    #[must_use]
    pub const fn only_trashed(mut self) -> Self {
        self.criteria.trashed = TrashedFilter::Only;
        self
    }

    /// Skip the named global scope for this query only.
    #[must_use]
    pub fn without_global_scope(mut self, name: &str) -> Self {
        self.excluded_scopes.insert(name.to_string());
        self
    }

    #[must_use]
    pub const fn without_global_scopes(mut self) -> Self {
        self.skip_global_scopes = true;
        self
    }

    /// Apply a local scope by name (`ofType`, `scopeOfType`, and `of_type` are
    /// equivalent).
    ///
    /// # Errors
    ///
    /// Returns `ModelError::ScopeNotFound` if the type and its ancestors define
    /// no such scope, or whatever the scope itself returns.
    pub fn scope(self, name: &str, args: &[Value]) -> Result<Self, ModelError> {
        let scope = self
            .orm
            .registry()
            .scopes()
            .resolve_local_scope(self.entry.lineage(), name)?;
        tracing::trace!(model = self.entry.name(), scope = name, args = args.len(), "applying local scope");
        scope(self, args)
    }

    /// The criteria the adapter will receive.
    #[must_use]
    pub fn criteria(&self) -> Criteria {
        let mut criteria = Criteria {
            filters: Vec::new(),
            ..self.criteria.clone()
        };
        if !self.skip_global_scopes {
            for (name, scope) in self.orm.registry().scopes().global_scopes(self.entry.lineage()) {
                if self.excluded_scopes.contains(name) {
                    tracing::trace!(model = self.entry.name(), scope = name, "global scope skipped");
                    continue;
                }
                tracing::trace!(model = self.entry.name(), scope = name, "applying global scope");
                scope(&mut criteria);
            }
        }
        criteria.filters.extend(self.criteria.filters.iter().cloned());
        criteria
    }

    fn run(&self, criteria: &Criteria) -> Result<Vec<Model>, ModelError> {
        let records = self
            .orm
            .adapter()
            .query(self.entry.record_kind(), criteria)
            .map_err(|e| ModelError::from_write(self.entry.name(), e))?;
        tracing::debug!(
            model = self.entry.name(),
            filters = criteria.filters.len(),
            rows = records.len(),
            "query executed"
        );
        Ok(records
            .into_iter()
            .map(|record| Model::hydrate(self.orm.clone(), Arc::clone(&self.entry), record))
            .collect())
    }

    /// # Errors
    ///
    /// Returns `ModelError::Persistence` if the adapter fails the query.
    pub fn get(&self) -> Result<Vec<Model>, ModelError> {
        self.run(&self.criteria())
    }

    /// # Errors
    ///
    /// Returns `ModelError::Persistence` if the adapter fails the query.
    pub fn first(&self) -> Result<Option<Model>, ModelError> {
        let mut criteria = self.criteria();
        criteria.limit = Some(1);
        Ok(self.run(&criteria)?.into_iter().next())
    }

    /// The record `id`, if it satisfies every condition of this query.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::NotFound` if no such record matches.
    pub fn find(&self, id: RecordId) -> Result<Model, ModelError> {
        let mut criteria = self.criteria();
        criteria.push(Filter::Ids { ids: vec![id] });
        criteria.offset = 0;
        criteria.limit = Some(1);
        self.run(&criteria)?
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::NotFound {
                model: self.entry.name().to_string(),
                id,
            })
    }

    /// Number of matching records. Pagination is ignored, so the default
    /// limit does not cap the total.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Persistence` if the adapter fails the query.
    pub fn count(&self) -> Result<usize, ModelError> {
        let mut criteria = self.criteria();
        criteria.limit = None;
        criteria.offset = 0;
        Ok(self.run(&criteria)?.len())
    }

    /// Identities of the current page, in query order.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Persistence` if the adapter fails the query.
    pub fn ids(&self) -> Result<Vec<RecordId>, ModelError> {
        Ok(self.get()?.iter().filter_map(Model::id).collect())
    }
}
