//! Lifecycle event ordering, vetoes, and delete/trash/restore transitions.

use std::sync::{Arc, Mutex};

use corm_core::entities::Term;
use corm_core::enums::{LifecycleEvent, RecordStatus};
use corm_db::ModelError;
use corm_db::adapter::{AdapterCall, FailPoint};
use corm_db::events::Rejection;
use corm_db::models::{Admin, Page, Post, User};
use corm_db::registry::RegistryBuilder;
use pretty_assertions::assert_eq;
use serde_json::json;

mod common;

use common::{attrs, orm_from, stock_builder};

type Log = Arc<Mutex<Vec<String>>>;

/// Record every event fired on `model` into the returned log.
fn record_events(builder: &mut RegistryBuilder, model: &'static str) -> Log {
    let log: Log = Arc::default();
    for event in LifecycleEvent::ALL {
        let log = Arc::clone(&log);
        builder.register_hook(model, event, move |instance| {
            log.lock()
                .unwrap()
                .push(format!("{}:{event}", instance.type_name()));
            Ok(())
        });
    }
    log
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[test]
fn create_then_update_fire_in_pairs() {
    let mut builder = stock_builder();
    let log = record_events(&mut builder, "post");
    let (orm, _) = orm_from(builder);

    let mut post = orm.make(&Post).unwrap();
    post.set("title", "First").unwrap();
    post.save(None).unwrap();
    post.set("title", "Second").unwrap();
    post.save(None).unwrap();

    assert_eq!(
        entries(&log),
        vec!["post:creating", "post:created", "post:updating", "post:updated"]
    );
}

#[test]
fn clean_save_skips_update_events() {
    let mut builder = stock_builder();
    let log = record_events(&mut builder, "post");
    let (orm, adapter) = orm_from(builder);

    let mut post = orm.make(&Post).unwrap();
    post.set("title", "Once").unwrap();
    post.save(None).unwrap();
    adapter.clear_journal();
    post.save(None).unwrap();

    assert_eq!(entries(&log), vec!["post:creating", "post:created"]);
    assert!(adapter.journal().is_empty());
}

#[test]
fn ancestor_hooks_fire_for_composed_types_first() {
    let mut builder = stock_builder();
    let post_log = record_events(&mut builder, "post");
    let order: Log = Arc::clone(&post_log);
    builder.register_hook("page", LifecycleEvent::Creating, move |page| {
        order.lock().unwrap().push(format!("{}:page-hook", page.type_name()));
        Ok(())
    });
    let (orm, _) = orm_from(builder);

    let mut page = orm.make(&Page).unwrap();
    page.set("title", "About").unwrap();
    page.save(None).unwrap();

    assert_eq!(
        entries(&post_log),
        vec!["page:creating", "page:page-hook", "page:created"]
    );
    assert_eq!(page.get("type"), json!("page"));
}

#[test]
fn creating_veto_aborts_and_keeps_attributes() {
    let mut builder = stock_builder();
    builder.register_hook("post", LifecycleEvent::Creating, |post| {
        if post.get_str("title").contains("spam") {
            return Err(Rejection::new("looks like spam"));
        }
        Ok(())
    });
    let (orm, adapter) = orm_from(builder);

    let mut post = orm.make(&Post).unwrap();
    post.set("title", "buy spam now").unwrap();
    let before = post.to_json();
    let dirty = post.dirty_attributes();

    let err = post.save(None).unwrap_err();
    match err {
        ModelError::OperationVetoed { model, event, reason } => {
            assert_eq!(model, "post");
            assert_eq!(event, LifecycleEvent::Creating);
            assert_eq!(reason, "looks like spam");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(adapter.journal().is_empty());
    assert_eq!(post.id(), None);
    assert_eq!(post.to_json(), before);
    assert_eq!(post.dirty_attributes(), dirty);
}

#[test]
fn veto_rolls_back_attributes_merged_by_save() {
    let mut builder = stock_builder();
    builder.register_hook("post", LifecycleEvent::Updating, |_| Err("frozen".into()));
    let (orm, adapter) = orm_from(builder);

    let mut post = orm.make(&Post).unwrap();
    post.set("title", "Stable").unwrap();
    post.save(None).unwrap();
    adapter.clear_journal();

    let attrs = json!({"title": "Changed"}).as_object().cloned().unwrap();
    assert!(matches!(
        post.save(Some(attrs)),
        Err(ModelError::OperationVetoed { .. })
    ));
    assert_eq!(post.get("title"), json!("Stable"));
    assert!(!post.is_dirty(None));
    assert!(adapter.journal().is_empty());
}

#[test]
fn after_event_failure_is_not_fatal() {
    let mut builder = stock_builder();
    builder.register_hook("post", LifecycleEvent::Created, |_| Err("mailer down".into()));
    let (orm, adapter) = orm_from(builder);

    let mut post = orm.make(&Post).unwrap();
    post.set("title", "Still saved").unwrap();
    post.save(None).unwrap();

    assert_eq!(post.status(), RecordStatus::Persisted);
    assert_eq!(adapter.len(), 1);
}

#[test]
fn soft_delete_trashes_and_restore_brings_back() {
    let mut builder = stock_builder();
    let log = record_events(&mut builder, "post");
    let (orm, adapter) = orm_from(builder);

    let mut post = orm.make(&Post).unwrap();
    post.set("title", "Trash me").unwrap();
    post.save(None).unwrap();
    let id = post.id().unwrap();

    post.delete(false).unwrap();
    assert!(post.is_trashed());
    assert!(post.exists());
    assert!(Post::query(&orm).unwrap().get().unwrap().is_empty());
    assert_eq!(Post::query(&orm).unwrap().with_trashed().ids().unwrap(), vec![id]);
    assert_eq!(Post::query(&orm).unwrap().only_trashed().count().unwrap(), 1);

    post.restore().unwrap();
    assert_eq!(post.status(), RecordStatus::Persisted);
    assert_eq!(Post::query(&orm).unwrap().ids().unwrap(), vec![id]);

    assert_eq!(
        entries(&log)[2..].to_vec(),
        vec!["post:trashing", "post:trashed", "post:restoring", "post:restored"]
    );
    assert!(adapter.journal().contains(&AdapterCall::Delete { id, permanent: false }));
}

#[test]
fn forced_delete_removes_and_later_reads_fail() {
    let builder = stock_builder();
    let (orm, adapter) = orm_from(builder);

    let mut post = orm.make(&Post).unwrap();
    post.set("title", "Gone").unwrap();
    post.save(None).unwrap();
    let id = post.id().unwrap();

    post.delete(true).unwrap();
    assert_eq!(post.status(), RecordStatus::Deleted);
    assert!(adapter.is_empty());

    assert!(matches!(post.get_terms("category"), Err(ModelError::NotFound { .. })));
    assert!(matches!(post.meta().get("views"), Err(ModelError::NotFound { .. })));
    assert!(matches!(post.save(None), Err(ModelError::NotFound { .. })));
    assert!(matches!(
        orm.find(&Post, id),
        Err(ModelError::NotFound { id: missing, .. }) if missing == id
    ));
}

#[test]
fn types_without_soft_delete_delete_permanently() {
    let mut builder = stock_builder();
    let log = record_events(&mut builder, "user");
    let (orm, adapter) = orm_from(builder);

    let mut user = orm.make(&User).unwrap();
    user.set("login", "ada").unwrap();
    user.save(None).unwrap();
    user.delete(false).unwrap();

    assert_eq!(user.status(), RecordStatus::Deleted);
    assert!(adapter.is_empty());
    assert_eq!(entries(&log)[2..].to_vec(), vec!["user:deleting", "user:deleted"]);
    assert!(matches!(user.restore(), Err(ModelError::Validation { .. })));
}

#[test]
fn deleting_veto_keeps_record() {
    let mut builder = stock_builder();
    builder.register_hook("post", LifecycleEvent::Trashing, |_| Err("locked".into()));
    let (orm, adapter) = orm_from(builder);

    let mut post = orm.make(&Post).unwrap();
    post.set("title", "Locked").unwrap();
    post.save(None).unwrap();

    assert!(matches!(post.delete(false), Err(ModelError::OperationVetoed { .. })));
    assert_eq!(post.status(), RecordStatus::Persisted);
    assert_eq!(Post::query(&orm).unwrap().count().unwrap(), 1);

    // A forced delete goes through deleting, which is not vetoed.
    post.delete(true).unwrap();
    assert!(adapter.is_empty());
}

#[test]
fn persistence_failure_keeps_pre_save_state() {
    let (orm, adapter) = orm_from(stock_builder());
    adapter.fail_on(FailPoint::Create);

    let mut post = orm.make(&Post).unwrap();
    post.set("title", "Unlucky").unwrap();
    let before = post.to_json();

    let err = post.save(None).unwrap_err();
    assert!(matches!(err, ModelError::Persistence { .. }), "{err}");
    assert_eq!(post.id(), None);
    assert_eq!(post.status(), RecordStatus::New);
    // The creating hook's slug and date are rolled back too.
    assert_eq!(post.to_json(), before);

    adapter.clear_failures();
    post.save(None).unwrap();
    assert_eq!(post.get("slug"), json!("unlucky"));
}

#[test]
fn vetoed_update_leaves_payload_terms_unwritten() {
    let mut builder = stock_builder();
    builder.register_hook("post", LifecycleEvent::Updating, |_| Err("frozen".into()));
    let (orm, adapter) = orm_from(builder);

    let mut post = orm.make(&Post).unwrap();
    post.set("title", "Stable").unwrap();
    post.save(None).unwrap();
    adapter.clear_journal();

    let news = serde_json::to_value(Term::new("category", "News")).unwrap();
    let err = post
        .save(Some(attrs(json!({"title": "Changed", "terms": [news]}))))
        .unwrap_err();
    assert!(matches!(err, ModelError::OperationVetoed { .. }));
    assert!(adapter.journal().is_empty());
    assert!(post.get_terms("category").unwrap().is_empty());
    assert_eq!(post.get("title"), json!("Stable"));
}

#[test]
fn creating_veto_discards_meta_queued_by_earlier_hooks() {
    let mut builder = stock_builder();
    builder.register_hook("admin", LifecycleEvent::Creating, |_| Err("closed".into()));
    let (orm, adapter) = orm_from(builder);

    let mut admin = orm.make(&Admin).unwrap();
    admin.set("login", "root").unwrap();
    assert!(admin.pending_meta().is_empty());

    let err = admin.save(None).unwrap_err();
    assert!(matches!(err, ModelError::OperationVetoed { ref reason, .. } if reason == "closed"));
    assert!(admin.pending_meta().is_empty());
    assert!(adapter.journal().is_empty());
}
