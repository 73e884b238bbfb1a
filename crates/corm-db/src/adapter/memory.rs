//! In-memory storage adapter and term store.
//!
//! Keeps records, meta, and term associations in a `Mutex`-guarded map and
//! journals every write, so tests can assert exactly what reached storage.
//! Failures can be injected per operation with [`MemoryAdapter::fail_on`].

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use corm_core::entities::Term;
use corm_core::identity::RecordId;
use serde_json::{Map, Value};

use super::{StorageAdapter, StoredRecord, TermStore};
use crate::error::AdapterError;
use crate::filter::{Criteria, Direction, Filter, compare_values};

/// One write (or query) observed by the adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterCall {
    Create {
        kind: String,
        attributes: Map<String, Value>,
    },
    Update {
        id: RecordId,
        attributes: Map<String, Value>,
    },
    Delete {
        id: RecordId,
        permanent: bool,
    },
    Restore {
        id: RecordId,
    },
    SetMeta {
        id: RecordId,
        key: String,
        value: Value,
    },
    DeleteMeta {
        id: RecordId,
        key: String,
    },
    SetTerms {
        id: RecordId,
        taxonomy: String,
        slugs: Vec<String>,
    },
    Query {
        kind: String,
        criteria: Criteria,
    },
}

impl AdapterCall {
    #[must_use]
    pub const fn is_meta_write(&self) -> bool {
        matches!(self, Self::SetMeta { .. } | Self::DeleteMeta { .. })
    }
}

/// An operation that should fail until [`MemoryAdapter::clear_failures`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailPoint {
    Create,
    Update,
    Delete,
    Restore,
    /// Every meta set and delete.
    Meta,
    /// Meta set or delete of one key.
    MetaKey(String),
    SetTerms,
}

#[derive(Debug, Clone)]
struct MemRecord {
    kind: String,
    attributes: Map<String, Value>,
    trashed: bool,
    meta: BTreeMap<String, Value>,
    terms: BTreeMap<String, Vec<Term>>,
}

impl MemRecord {
    fn to_stored(&self, id: RecordId) -> StoredRecord {
        StoredRecord {
            id,
            kind: self.kind.clone(),
            attributes: self.attributes.clone(),
            trashed: self.trashed,
        }
    }

    fn matches(&self, id: RecordId, filter: &Filter) -> bool {
        match filter {
            Filter::Field { field, op, value } => op.matches(self.attributes.get(field), value),
            Filter::Meta { key, op, value } => op.matches(self.meta.get(key), value),
            Filter::Term { taxonomy, slugs } => self
                .terms
                .get(taxonomy)
                .is_some_and(|terms| terms.iter().any(|t| slugs.contains(&t.slug))),
            Filter::Ids { ids } => ids.contains(&id),
        }
    }
}

#[derive(Default)]
struct MemState {
    next_id: u64,
    records: BTreeMap<RecordId, MemRecord>,
    journal: Vec<AdapterCall>,
    failures: Vec<FailPoint>,
}

impl MemState {
    fn check(&self, point: &FailPoint) -> Result<(), AdapterError> {
        if self.failures.contains(point) {
            return Err(AdapterError::Rejected(format!("injected failure: {point:?}")));
        }
        Ok(())
    }

    fn check_meta(&self, key: &str) -> Result<(), AdapterError> {
        self.check(&FailPoint::Meta)?;
        self.check(&FailPoint::MetaKey(key.to_string()))
    }

    fn record_mut(&mut self, id: RecordId) -> Result<&mut MemRecord, AdapterError> {
        self.records.get_mut(&id).ok_or(AdapterError::NotFound(id))
    }

    fn record(&self, id: RecordId) -> Result<&MemRecord, AdapterError> {
        self.records.get(&id).ok_or(AdapterError::NotFound(id))
    }
}

/// Storage adapter and term store backed by process memory.
#[derive(Default)]
pub struct MemoryAdapter {
    state: Mutex<MemState>,
}

impl MemoryAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MemState>, AdapterError> {
        self.state
            .lock()
            .map_err(|_| AdapterError::Unavailable("memory adapter lock poisoned".into()))
    }

    /// Make `point` fail until cleared.
    pub fn fail_on(&self, point: FailPoint) {
        if let Ok(mut state) = self.state() {
            state.failures.push(point);
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut state) = self.state() {
            state.failures.clear();
        }
    }

    /// Every call observed so far, oldest first.
    #[must_use]
    pub fn journal(&self) -> Vec<AdapterCall> {
        self.state().map(|s| s.journal.clone()).unwrap_or_default()
    }

    /// Journaled meta writes only.
    #[must_use]
    pub fn meta_writes(&self) -> Vec<AdapterCall> {
        self.journal()
            .into_iter()
            .filter(AdapterCall::is_meta_write)
            .collect()
    }

    /// Criteria of every query run so far.
    #[must_use]
    pub fn queries(&self) -> Vec<Criteria> {
        self.journal()
            .into_iter()
            .filter_map(|call| match call {
                AdapterCall::Query { criteria, .. } => Some(criteria),
                _ => None,
            })
            .collect()
    }

    pub fn clear_journal(&self) {
        if let Ok(mut state) = self.state() {
            state.journal.clear();
        }
    }

    /// Stored meta of a record, bypassing the journal.
    #[must_use]
    pub fn stored_meta(&self, id: RecordId) -> BTreeMap<String, Value> {
        self.state()
            .ok()
            .and_then(|s| s.records.get(&id).map(|r| r.meta.clone()))
            .unwrap_or_default()
    }

    /// Number of records held, trashed ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state().map(|s| s.records.len()).unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StorageAdapter for MemoryAdapter {
    fn create(&self, kind: &str, attributes: &Map<String, Value>) -> Result<RecordId, AdapterError> {
        let mut state = self.state()?;
        state.check(&FailPoint::Create)?;
        state.next_id += 1;
        let id = RecordId(state.next_id);
        state.records.insert(
            id,
            MemRecord {
                kind: kind.to_string(),
                attributes: attributes.clone(),
                trashed: false,
                meta: BTreeMap::new(),
                terms: BTreeMap::new(),
            },
        );
        state.journal.push(AdapterCall::Create {
            kind: kind.to_string(),
            attributes: attributes.clone(),
        });
        Ok(id)
    }

    fn update(&self, id: RecordId, attributes: &Map<String, Value>) -> Result<(), AdapterError> {
        let mut state = self.state()?;
        state.check(&FailPoint::Update)?;
        let record = state.record_mut(id)?;
        for (name, value) in attributes {
            record.attributes.insert(name.clone(), value.clone());
        }
        state.journal.push(AdapterCall::Update {
            id,
            attributes: attributes.clone(),
        });
        Ok(())
    }

    fn delete(&self, id: RecordId, permanent: bool) -> Result<(), AdapterError> {
        let mut state = self.state()?;
        state.check(&FailPoint::Delete)?;
        if permanent {
            state.records.remove(&id).ok_or(AdapterError::NotFound(id))?;
        } else {
            state.record_mut(id)?.trashed = true;
        }
        state.journal.push(AdapterCall::Delete { id, permanent });
        Ok(())
    }

    fn restore(&self, id: RecordId) -> Result<(), AdapterError> {
        let mut state = self.state()?;
        state.check(&FailPoint::Restore)?;
        state.record_mut(id)?.trashed = false;
        state.journal.push(AdapterCall::Restore { id });
        Ok(())
    }

    fn fetch(&self, id: RecordId) -> Result<StoredRecord, AdapterError> {
        let state = self.state()?;
        Ok(state.record(id)?.to_stored(id))
    }

    fn get_meta(&self, id: RecordId, key: &str) -> Result<Option<Value>, AdapterError> {
        let state = self.state()?;
        Ok(state.record(id)?.meta.get(key).cloned())
    }

    fn set_meta(&self, id: RecordId, key: &str, value: &Value) -> Result<(), AdapterError> {
        let mut state = self.state()?;
        state.check_meta(key)?;
        state
            .record_mut(id)?
            .meta
            .insert(key.to_string(), value.clone());
        state.journal.push(AdapterCall::SetMeta {
            id,
            key: key.to_string(),
            value: value.clone(),
        });
        Ok(())
    }

    fn delete_meta(&self, id: RecordId, key: &str) -> Result<(), AdapterError> {
        let mut state = self.state()?;
        state.check_meta(key)?;
        state.record_mut(id)?.meta.remove(key);
        state.journal.push(AdapterCall::DeleteMeta {
            id,
            key: key.to_string(),
        });
        Ok(())
    }

    fn query(&self, kind: &str, criteria: &Criteria) -> Result<Vec<StoredRecord>, AdapterError> {
        let mut state = self.state()?;
        state.journal.push(AdapterCall::Query {
            kind: kind.to_string(),
            criteria: criteria.clone(),
        });

        let mut rows: Vec<StoredRecord> = state
            .records
            .iter()
            .filter(|(_, r)| r.kind == kind && criteria.trashed.admits(r.trashed))
            .filter(|(id, r)| criteria.filters.iter().all(|f| r.matches(**id, f)))
            .map(|(id, r)| r.to_stored(*id))
            .collect();

        for order in criteria.order.iter().rev() {
            rows.sort_by(|a, b| {
                let left = a.attributes.get(&order.field).unwrap_or(&Value::Null);
                let right = b.attributes.get(&order.field).unwrap_or(&Value::Null);
                let ordering = compare_values(left, right).unwrap_or(std::cmp::Ordering::Equal);
                match order.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }

        Ok(criteria.paginate(rows))
    }
}

impl TermStore for MemoryAdapter {
    fn get_terms(&self, id: RecordId, taxonomy: &str) -> Result<Vec<Term>, AdapterError> {
        let state = self.state()?;
        Ok(state
            .record(id)?
            .terms
            .get(taxonomy)
            .cloned()
            .unwrap_or_default())
    }

    fn set_terms(&self, id: RecordId, taxonomy: &str, terms: &[Term]) -> Result<(), AdapterError> {
        let mut state = self.state()?;
        state.check(&FailPoint::SetTerms)?;
        state
            .record_mut(id)?
            .terms
            .insert(taxonomy.to_string(), terms.to_vec());
        state.journal.push(AdapterCall::SetTerms {
            id,
            taxonomy: taxonomy.to_string(),
            slugs: terms.iter().map(|t| t.slug.clone()).collect(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterOp, OrderBy, TrashedFilter};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn attrs(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn create_assigns_sequential_ids() {
        let adapter = MemoryAdapter::new();
        let a = adapter.create("post", &attrs(json!({"post_title": "A"}))).unwrap();
        let b = adapter.create("post", &attrs(json!({"post_title": "B"}))).unwrap();
        assert_eq!((a, b), (RecordId(1), RecordId(2)));
        assert_eq!(adapter.len(), 2);
    }

    #[test]
    fn update_merges_attributes() {
        let adapter = MemoryAdapter::new();
        let id = adapter
            .create("post", &attrs(json!({"post_title": "A", "post_status": "draft"})))
            .unwrap();
        adapter.update(id, &attrs(json!({"post_status": "publish"}))).unwrap();
        let stored = adapter.fetch(id).unwrap();
        assert_eq!(
            Value::Object(stored.attributes),
            json!({"post_title": "A", "post_status": "publish"})
        );
    }

    #[test]
    fn missing_record_is_not_found() {
        let adapter = MemoryAdapter::new();
        assert!(matches!(adapter.fetch(RecordId(4)), Err(AdapterError::NotFound(RecordId(4)))));
        assert!(matches!(
            adapter.set_meta(RecordId(4), "k", &json!(1)),
            Err(AdapterError::NotFound(_))
        ));
    }

    #[test]
    fn injected_failure_blocks_only_that_key() {
        let adapter = MemoryAdapter::new();
        let id = adapter.create("post", &Map::new()).unwrap();
        adapter.fail_on(FailPoint::MetaKey("bad".into()));

        adapter.set_meta(id, "good", &json!(1)).unwrap();
        assert!(matches!(
            adapter.set_meta(id, "bad", &json!(2)),
            Err(AdapterError::Rejected(_))
        ));

        adapter.clear_failures();
        adapter.set_meta(id, "bad", &json!(2)).unwrap();
        assert_eq!(adapter.meta_writes().len(), 2);
    }

    #[test]
    fn query_filters_orders_and_pages() {
        let adapter = MemoryAdapter::new();
        for (title, kind) in [("c", "post"), ("a", "post"), ("b", "post"), ("z", "user")] {
            adapter.create(kind, &attrs(json!({"title": title}))).unwrap();
        }
        let trashed = adapter.create("post", &attrs(json!({"title": "t"}))).unwrap();
        adapter.delete(trashed, false).unwrap();

        let criteria = Criteria {
            order: vec![OrderBy {
                field: "title".into(),
                direction: Direction::Asc,
            }],
            limit: Some(2),
            ..Criteria::default()
        };
        let titles: Vec<Value> = adapter
            .query("post", &criteria)
            .unwrap()
            .into_iter()
            .map(|r| r.attributes["title"].clone())
            .collect();
        assert_eq!(titles, vec![json!("a"), json!("b")]);

        let only_trashed = Criteria {
            trashed: TrashedFilter::Only,
            ..Criteria::default()
        };
        let rows = adapter.query("post", &only_trashed).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, trashed);
    }

    #[test]
    fn query_by_meta_and_terms() {
        let adapter = MemoryAdapter::new();
        let video = adapter.create("post", &Map::new()).unwrap();
        let audio = adapter.create("post", &Map::new()).unwrap();
        adapter.set_meta(video, "type", &json!("video")).unwrap();
        adapter.set_meta(audio, "type", &json!("audio")).unwrap();
        adapter
            .set_terms(audio, "category", &[Term::new("category", "News")])
            .unwrap();

        let mut criteria = Criteria::new();
        criteria.where_meta("type", FilterOp::Eq, "video");
        let ids: Vec<RecordId> = adapter
            .query("post", &criteria)
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![video]);

        let mut criteria = Criteria::new();
        criteria.where_term("category", ["news"]);
        let ids: Vec<RecordId> = adapter
            .query("post", &criteria)
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![audio]);
    }

    #[test]
    fn permanent_delete_removes_record() {
        let adapter = MemoryAdapter::new();
        let id = adapter.create("post", &Map::new()).unwrap();
        adapter.delete(id, true).unwrap();
        assert!(adapter.is_empty());
        assert!(matches!(adapter.restore(id), Err(AdapterError::NotFound(_))));
    }
}
