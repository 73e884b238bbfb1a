//! Query criteria handed to the storage adapter.
//!
//! A [`Criteria`] is plain data: the conjunction of every filter contributed by
//! global scopes, local scopes, and explicit query calls, plus trash handling,
//! ordering, and paging. Field names in criteria are always canonical.

use std::cmp::Ordering;

use corm_core::identity::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison applied by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Ne,
    /// Stored value equals one of the values in the filter's array.
    In,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Substring match on strings, membership on arrays.
    Contains,
    /// The value is present and not null. The filter value is ignored.
    Exists,
}

impl FilterOp {
    /// Whether `actual` (absent when the field or meta key is missing) satisfies
    /// the operation against `expected`.
    #[must_use]
    pub fn matches(self, actual: Option<&Value>, expected: &Value) -> bool {
        let actual = match actual {
            Some(Value::Null) | None => {
                return match self {
                    Self::Exists => false,
                    Self::Ne => !expected.is_null(),
                    Self::Eq => expected.is_null(),
                    _ => false,
                };
            }
            Some(value) => value,
        };

        match self {
            Self::Eq => loosely_equal(actual, expected),
            Self::Ne => !loosely_equal(actual, expected),
            Self::In => expected
                .as_array()
                .is_some_and(|values| values.iter().any(|v| loosely_equal(actual, v))),
            Self::Gt => compare_values(actual, expected) == Some(Ordering::Greater),
            Self::Gte => matches!(
                compare_values(actual, expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Self::Lt => compare_values(actual, expected) == Some(Ordering::Less),
            Self::Lte => matches!(
                compare_values(actual, expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Self::Contains => match (actual, expected) {
                (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
                (Value::Array(items), needle) => items.iter().any(|v| loosely_equal(v, needle)),
                _ => false,
            },
            Self::Exists => true,
        }
    }
}

/// Numbers compare by value regardless of integer/float representation.
fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Ordering between two JSON scalars of the same kind. `None` for mixed kinds.
#[must_use]
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// One condition on a stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Filter {
    /// Condition on a primary field.
    Field {
        field: String,
        op: FilterOp,
        value: Value,
    },
    /// Condition on a meta entry.
    Meta {
        key: String,
        op: FilterOp,
        value: Value,
    },
    /// The record is associated with at least one of `slugs` in `taxonomy`.
    Term { taxonomy: String, slugs: Vec<String> },
    /// The record identity is one of `ids`.
    Ids { ids: Vec<RecordId> },
}

impl Filter {
    #[must_use]
    pub fn field(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self::Field {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn meta(key: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self::Meta {
            key: key.into(),
            op,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn term<I, S>(taxonomy: impl Into<String>, slugs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Term {
            taxonomy: taxonomy.into(),
            slugs: slugs.into_iter().map(Into::into).collect(),
        }
    }
}

/// How trashed records of a soft-deletable type are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrashedFilter {
    #[default]
    Exclude,
    Include,
    Only,
}

impl TrashedFilter {
    #[must_use]
    pub const fn admits(self, trashed: bool) -> bool {
        match self {
            Self::Exclude => !trashed,
            Self::Include => true,
            Self::Only => trashed,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Everything the adapter needs to run a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    /// Conjunction of conditions, in the order they were added.
    pub filters: Vec<Filter>,
    pub trashed: TrashedFilter,
    pub order: Vec<OrderBy>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl Criteria {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, filter: Filter) -> &mut Self {
        self.filters.push(filter);
        self
    }

    /// Add a condition on a canonical field name.
    pub fn where_field(
        &mut self,
        field: impl Into<String>,
        op: FilterOp,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.push(Filter::field(field, op, value))
    }

    pub fn where_meta(
        &mut self,
        key: impl Into<String>,
        op: FilterOp,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.push(Filter::meta(key, op, value))
    }

    pub fn where_term<I, S>(&mut self, taxonomy: impl Into<String>, slugs: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(Filter::term(taxonomy, slugs))
    }

    /// Apply the paging window to an already filtered and ordered result.
    #[must_use]
    pub fn paginate<T>(&self, rows: Vec<T>) -> Vec<T> {
        let rows = rows.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => rows.take(limit).collect(),
            None => rows.collect(),
        }
    }
}
