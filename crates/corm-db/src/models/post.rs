use chrono::Utc;
use corm_core::attributes::{AttributeSchema, FieldDef, FieldKind};
use corm_core::entities::{PostFields, PostStatus, slugify};
use corm_schema::{SchemaError, SchemaRegistry};
use serde_json::Value;

use crate::definition::ModelDefinition;
use crate::error::ModelError;
use crate::events::Hooks;
use crate::filter::FilterOp;
use crate::model::Model;
use crate::query::Query;
use crate::scopes::{Scopes, scope_arg};
use crate::service::Orm;

/// A blog post. Soft-deletable; queries see `post_type = "post"` only.
pub struct Post;

impl Post {
    /// # Errors
    ///
    /// Returns `ModelError::NotBooted` if `Post` was not booted.
    pub fn query(orm: &Orm) -> Result<Query, ModelError> {
        orm.query(&Self)
    }

    /// Posts whose `type` meta equals `kind` (e.g. `"video"`).
    ///
    /// # Errors
    ///
    /// Returns `ModelError::NotBooted` if `Post` was not booted.
    pub fn of_type(orm: &Orm, kind: &str) -> Result<Query, ModelError> {
        Self::query(orm)?.scope("of_type", &[Value::from(kind)])
    }

    /// # Errors
    ///
    /// Returns `ModelError::NotBooted` if `Post` was not booted.
    pub fn published(orm: &Orm) -> Result<Query, ModelError> {
        Self::query(orm)?.scope("published", &[])
    }
}

impl ModelDefinition for Post {
    fn name(&self) -> &'static str {
        "post"
    }

    fn attributes(&self) -> AttributeSchema {
        AttributeSchema::new("post")
            .primary_key("ID")
            .alias("id", "ID")
            .alias("title", "post_title")
            .alias("content", "post_content")
            .alias("excerpt", "post_excerpt")
            .alias("status", "post_status")
            .alias("slug", "post_name")
            .alias("type", "post_type")
            .alias("author", "post_author")
            .alias("date", "post_date")
            .field(FieldDef::new("post_title", FieldKind::String))
            .field(FieldDef::new("post_content", FieldKind::String))
            .field(FieldDef::new("post_excerpt", FieldKind::String))
            .field(
                FieldDef::new("post_status", FieldKind::String)
                    .default_value(PostStatus::Draft.as_str()),
            )
            .field(FieldDef::new("post_name", FieldKind::String))
            .field(FieldDef::new("post_type", FieldKind::String).default_value("post"))
            .field(FieldDef::new("post_author", FieldKind::Integer))
            .field(FieldDef::new("post_date", FieldKind::DateTime))
    }

    fn soft_deletes(&self) -> bool {
        true
    }

    fn register_schema(&self, schemas: &mut SchemaRegistry) -> Result<(), SchemaError> {
        schemas.register_type::<PostFields>(self.name())
    }

    fn register_hooks(&self, hooks: &mut Hooks<'_>) {
        hooks.creating(|post| {
            fill_slug(post)?;
            if post.get("post_date").is_null() {
                post.set("post_date", Utc::now().to_rfc3339())?;
            }
            Ok(())
        });
        hooks.updating(|post| {
            if post.is_dirty(Some("post_title")) && post.get_str("post_name").is_empty() {
                fill_slug(post)?;
            }
            Ok(())
        });
    }

    fn register_scopes(&self, scopes: &mut Scopes<'_>) {
        scopes
            .global("post_type", |criteria| {
                criteria.where_field("post_type", FilterOp::Eq, "post");
            })
            .local("of_type", |query, args| {
                let kind = scope_arg(query.type_name(), "of_type", args, 0)?.clone();
                Ok(query.where_meta_eq("type", kind))
            })
            .local("published", |query, _| {
                Ok(query.where_eq("post_status", PostStatus::Publish.as_str()))
            })
            .local("status", |query, args| {
                let status = scope_arg(query.type_name(), "status", args, 0)?.clone();
                Ok(query.where_eq("post_status", status))
            });
    }
}

/// Derive `post_name` from the title when it is empty.
fn fill_slug(post: &mut Model) -> Result<(), ModelError> {
    if post.get_str("post_name").is_empty() {
        let slug = slugify(&post.get_str("post_title"));
        if !slug.is_empty() {
            post.set("post_name", slug)?;
        }
    }
    Ok(())
}

/// A static page: a post stored with `post_type = "page"`.
pub struct Page;

impl Page {
    /// # Errors
    ///
    /// Returns `ModelError::NotBooted` if `Page` was not booted.
    pub fn query(orm: &Orm) -> Result<Query, ModelError> {
        orm.query(&Self)
    }
}

impl ModelDefinition for Page {
    fn name(&self) -> &'static str {
        "page"
    }

    fn parent(&self) -> Option<&'static dyn ModelDefinition> {
        Some(&Post)
    }

    fn attributes(&self) -> AttributeSchema {
        Post.attributes().extend(
            "page",
            AttributeSchema::new("page")
                .field(FieldDef::new("post_type", FieldKind::String).default_value("page")),
        )
    }

    fn register_scopes(&self, scopes: &mut Scopes<'_>) {
        scopes.global("post_type", |criteria| {
            criteria.where_field("post_type", FilterOp::Eq, "page");
        });
    }
}
