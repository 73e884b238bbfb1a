//! Global and local scopes as seen through the query builder.

use corm_config::CormConfig;
use corm_db::filter::{Direction, Filter, FilterOp, TrashedFilter};
use corm_db::models::{Admin, Page, Post, User};
use corm_db::{ModelError, Orm};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};

mod common;

use common::{orm_from, orm_from_with, stock_builder};

fn post_with_type(orm: &Orm, title: &str, kind: &str) {
    let mut post = orm.make(&Post).unwrap();
    post.set("title", title).unwrap();
    post.meta().set("type", kind).unwrap();
    post.save(None).unwrap();
}

fn titles(models: &[corm_db::Model]) -> Vec<Value> {
    models.iter().map(|m| m.get("title")).collect()
}

#[rstest]
#[case("ofType")]
#[case("of_type")]
#[case("scopeOfType")]
#[case("scope_of_type")]
fn of_type_adds_meta_filter_after_global_scopes(#[case] method: &str) {
    let (orm, _) = orm_from(stock_builder());
    let criteria = Post::query(&orm)
        .unwrap()
        .scope(method, &[json!("video")])
        .unwrap()
        .criteria();
    assert_eq!(
        criteria.filters,
        vec![
            Filter::field("post_type", FilterOp::Eq, "post"),
            Filter::meta("type", FilterOp::Eq, "video"),
        ]
    );
}

#[test]
fn of_type_query_reaches_adapter_and_filters() {
    let (orm, adapter) = orm_from(stock_builder());
    post_with_type(&orm, "Clip", "video");
    post_with_type(&orm, "Podcast", "audio");
    adapter.clear_journal();

    let videos = Post::of_type(&orm, "video").unwrap().get().unwrap();
    assert_eq!(titles(&videos), vec![json!("Clip")]);

    let sent = adapter.queries();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].filters.contains(&Filter::meta("type", FilterOp::Eq, "video")));
    assert!(sent[0].filters.contains(&Filter::field("post_type", FilterOp::Eq, "post")));
}

#[test]
fn composed_type_replaces_parent_scope() {
    let (orm, _) = orm_from(stock_builder());
    let mut page = orm.make(&Page).unwrap();
    page.set("title", "About").unwrap();
    page.save(None).unwrap();
    post_with_type(&orm, "News", "standard");

    assert_eq!(
        Page::query(&orm).unwrap().criteria().filters,
        vec![Filter::field("post_type", FilterOp::Eq, "page")]
    );
    assert_eq!(titles(&Page::query(&orm).unwrap().get().unwrap()), vec![json!("About")]);
    assert_eq!(titles(&Post::query(&orm).unwrap().get().unwrap()), vec![json!("News")]);

    // Parent local scopes stay available.
    let published = Page::query(&orm).unwrap().scope("published", &[]).unwrap();
    assert!(published.get().unwrap().is_empty());
}

#[test]
fn global_scopes_can_be_skipped_per_query() {
    let (orm, _) = orm_from(stock_builder());
    let mut page = orm.make(&Page).unwrap();
    page.set("title", "About").unwrap();
    page.save(None).unwrap();
    post_with_type(&orm, "News", "standard");

    let everything = Post::query(&orm)
        .unwrap()
        .without_global_scope("post_type")
        .order_by("title", Direction::Asc)
        .get()
        .unwrap();
    assert_eq!(titles(&everything), vec![json!("About"), json!("News")]);

    let unscoped = Post::query(&orm).unwrap().without_global_scopes().criteria();
    assert!(unscoped.filters.is_empty());
}

#[test]
fn global_scope_removed_at_boot_applies_to_every_query() {
    let mut builder = stock_builder();
    assert!(builder.remove_global_scope("post", "post_type").unwrap());
    let (orm, _) = orm_from(builder);
    assert!(Post::query(&orm).unwrap().criteria().filters.is_empty());
}

#[test]
fn removing_a_scope_on_a_composed_type_leaves_the_parent_alone() {
    let mut builder = stock_builder();
    builder.add_global_scope("post", "visible", |criteria| {
        criteria.where_field("post_status", FilterOp::Ne, "private");
    });
    assert!(builder.remove_global_scope("page", "post_type").unwrap());
    assert!(builder.remove_global_scope("page", "visible").unwrap());
    assert!(!builder.remove_global_scope("page", "bogus").unwrap());
    assert!(matches!(
        builder.remove_global_scope("product", "post_type"),
        Err(ModelError::NotBooted(name)) if name == "product"
    ));
    let (orm, _) = orm_from(builder);

    assert!(Page::query(&orm).unwrap().criteria().filters.is_empty());
    assert_eq!(
        Post::query(&orm).unwrap().criteria().filters,
        vec![
            Filter::field("post_type", FilterOp::Eq, "post"),
            Filter::field("post_status", FilterOp::Ne, "private"),
        ]
    );
}

#[test]
fn global_scopes_apply_in_registration_order() {
    let mut builder = stock_builder();
    builder.add_global_scope("post", "visible", |criteria| {
        criteria.where_field("post_status", FilterOp::Ne, "private");
    });
    builder.add_global_scope("page", "top_level", |criteria| {
        criteria.where_field("post_parent", FilterOp::Eq, 0);
    });
    let (orm, _) = orm_from(builder);

    assert_eq!(
        Page::query(&orm).unwrap().criteria().filters,
        vec![
            Filter::field("post_type", FilterOp::Eq, "page"),
            Filter::field("post_status", FilterOp::Ne, "private"),
            Filter::field("post_parent", FilterOp::Eq, 0),
        ]
    );
}

#[test]
fn unknown_local_scope_fails() {
    let (orm, _) = orm_from(stock_builder());
    let err = Post::query(&orm).unwrap().scope("bogus", &[]).err().unwrap();
    assert!(matches!(err, ModelError::ScopeNotFound { ref scope, .. } if scope == "bogus"));

    // User scopes are not visible to posts.
    assert!(Post::query(&orm).unwrap().scope("search", &[json!("a")]).is_err());
}

#[test]
fn scope_without_required_argument_fails() {
    let (orm, _) = orm_from(stock_builder());
    let err = Post::query(&orm).unwrap().scope("ofType", &[]).err().unwrap();
    assert!(matches!(err, ModelError::Validation { .. }));
}

#[test]
fn custom_local_scope_registered_at_boot() {
    let mut builder = stock_builder();
    builder.add_local_scope("post", "byAuthor", |query, args| {
        let author = args.first().cloned().unwrap_or(Value::Null);
        Ok(query.where_eq("author", author))
    });
    let (orm, _) = orm_from(builder);

    let criteria = Post::query(&orm)
        .unwrap()
        .scope("scopeByAuthor", &[json!(7)])
        .unwrap()
        .criteria();
    assert_eq!(criteria.filters[1], Filter::field("post_author", FilterOp::Eq, 7));
}

#[test]
fn admin_scope_filters_on_role_meta() {
    let (orm, _) = orm_from(stock_builder());
    let mut admin = orm.make(&Admin).unwrap();
    admin.set("login", "root").unwrap();
    admin.save(None).unwrap();
    let mut user = orm.make(&User).unwrap();
    user.set("login", "guest").unwrap();
    user.save(None).unwrap();

    let admins = Admin::query(&orm).unwrap().get().unwrap();
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0].get("login"), json!("root"));
    assert_eq!(admins[0].type_name(), "admin");
    assert_eq!(User::query(&orm).unwrap().count().unwrap(), 2);

    let found = User::query(&orm)
        .unwrap()
        .scope("search", &[json!("gue")])
        .unwrap()
        .ids()
        .unwrap();
    assert_eq!(found, vec![user.id().unwrap()]);
}

#[test]
fn config_defaults_shape_new_queries() {
    let mut config = CormConfig::default();
    config.query.default_limit = 2;
    config.query.include_trashed = true;
    let (orm, _) = orm_from_with(stock_builder(), config);

    for title in ["a", "b", "c"] {
        post_with_type(&orm, title, "standard");
    }
    let mut trashed = Post::query(&orm).unwrap().first().unwrap().unwrap();
    trashed.delete(false).unwrap();

    let criteria = Post::query(&orm).unwrap().criteria();
    assert_eq!(criteria.trashed, TrashedFilter::Include);
    assert_eq!(criteria.limit, Some(2));
    assert_eq!(Post::query(&orm).unwrap().get().unwrap().len(), 2);
    assert_eq!(Post::query(&orm).unwrap().ids().unwrap().len(), 2);
    // Counting spans every page.
    assert_eq!(Post::query(&orm).unwrap().count().unwrap(), 3);
    assert_eq!(Post::query(&orm).unwrap().offset(2).count().unwrap(), 3);

    // Users cannot be trashed, so the flag does not apply.
    assert_eq!(
        User::query(&orm).unwrap().criteria().trashed,
        TrashedFilter::Exclude
    );
}

#[test]
fn query_find_respects_scopes() {
    let (orm, _) = orm_from(stock_builder());
    let mut page = orm.make(&Page).unwrap();
    page.set("title", "About").unwrap();
    page.save(None).unwrap();
    let id = page.id().unwrap();

    assert!(orm.find(&Page, id).is_ok());
    assert!(matches!(orm.find(&Post, id), Err(ModelError::NotFound { .. })));
}
