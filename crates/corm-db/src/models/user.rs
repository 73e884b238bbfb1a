use chrono::Utc;
use corm_core::attributes::{AttributeSchema, FieldDef, FieldKind};
use corm_core::entities::UserFields;
use corm_schema::{SchemaError, SchemaRegistry};

use crate::definition::ModelDefinition;
use crate::error::ModelError;
use crate::events::Hooks;
use crate::filter::FilterOp;
use crate::query::Query;
use crate::scopes::{Scopes, scope_arg};
use crate::service::Orm;

/// Role meta value that marks a user as an administrator.
pub const ADMINISTRATOR_ROLE: &str = "administrator";

/// A site user. Strict: only declared fields are accepted.
pub struct User;

impl User {
    /// # Errors
    ///
    /// Returns `ModelError::NotBooted` if `User` was not booted.
    pub fn query(orm: &Orm) -> Result<Query, ModelError> {
        orm.query(&Self)
    }
}

impl ModelDefinition for User {
    fn name(&self) -> &'static str {
        "user"
    }

    fn attributes(&self) -> AttributeSchema {
        AttributeSchema::new("user")
            .primary_key("ID")
            .alias("id", "ID")
            .alias("login", "user_login")
            .alias("email", "user_email")
            .alias("name", "display_name")
            .alias("registered", "user_registered")
            .field(FieldDef::new("user_login", FieldKind::String))
            .field(FieldDef::new("user_email", FieldKind::String))
            .field(FieldDef::new("display_name", FieldKind::String))
            .field(FieldDef::new("user_registered", FieldKind::DateTime))
            .field(FieldDef::new("user_status", FieldKind::Integer).default_value(0))
            .strict()
    }

    fn register_schema(&self, schemas: &mut SchemaRegistry) -> Result<(), SchemaError> {
        schemas.register_type::<UserFields>(self.name())
    }

    fn register_hooks(&self, hooks: &mut Hooks<'_>) {
        hooks.creating(|user| {
            if user.get_str("display_name").is_empty() {
                let login = user.get("user_login");
                user.set("display_name", login)?;
            }
            if user.get("user_registered").is_null() {
                user.set("user_registered", Utc::now().to_rfc3339())?;
            }
            Ok(())
        });
    }

    fn register_scopes(&self, scopes: &mut Scopes<'_>) {
        scopes.local("search", |query, args| {
            let needle = scope_arg(query.type_name(), "search", args, 0)?.clone();
            Ok(query.where_field("user_login", FilterOp::Contains, needle))
        });
    }
}

/// A user holding the administrator role.
pub struct Admin;

impl Admin {
    /// # Errors
    ///
    /// Returns `ModelError::NotBooted` if `Admin` was not booted.
    pub fn query(orm: &Orm) -> Result<Query, ModelError> {
        orm.query(&Self)
    }
}

impl ModelDefinition for Admin {
    fn name(&self) -> &'static str {
        "admin"
    }

    fn parent(&self) -> Option<&'static dyn ModelDefinition> {
        Some(&User)
    }

    fn register_hooks(&self, hooks: &mut Hooks<'_>) {
        hooks.creating(|admin| {
            admin.meta().set("role", ADMINISTRATOR_ROLE)?;
            Ok(())
        });
    }

    fn register_scopes(&self, scopes: &mut Scopes<'_>) {
        scopes.global("administrators", |criteria| {
            criteria.where_meta("role", FilterOp::Eq, ADMINISTRATOR_ROLE);
        });
    }
}
