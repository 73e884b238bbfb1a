//! Attribute schema of a model type.
//!
//! Declares the canonical fields, the alias table, the primary key, and
//! whether the field list is fixed (`strict`). Adding a field to a model type
//! means adding a [`FieldDef`] here.

use serde_json::Value;

use crate::alias::AliasTable;

/// The kind of value a canonical field holds.
///
/// Determines the type-appropriate empty value returned for absent fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Bool,
    /// RFC 3339 string when set.
    DateTime,
    /// Arbitrary JSON.
    Json,
}

impl FieldKind {
    #[must_use]
    pub fn empty_value(self) -> Value {
        match self {
            Self::String => Value::String(String::new()),
            Self::Integer => Value::from(0),
            Self::Float => Value::from(0.0),
            Self::Bool => Value::Bool(false),
            Self::DateTime | Self::Json => Value::Null,
        }
    }
}

/// Definition of a single canonical field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Canonical storage name (e.g., `post_title`).
    pub name: String,
    pub kind: FieldKind,
    /// Value assigned to new instances before any caller input.
    pub default: Option<Value>,
}

impl FieldDef {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }

    /// Set the default applied to new instances.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// Schema for the attributes of one model type.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSchema {
    /// Model type name, used in error messages.
    pub model: String,
    pub aliases: AliasTable,
    pub fields: Vec<FieldDef>,
    /// Canonical name of the identity field (populated from the record id).
    pub primary_key: String,
    /// Reject fields not listed in `fields`.
    pub strict: bool,
}

impl AttributeSchema {
    /// An open schema with no declared fields and primary key `id`.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            aliases: AliasTable::new(),
            fields: Vec::new(),
            primary_key: "id".to_string(),
            strict: false,
        }
    }

    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.aliases.insert(alias, canonical);
        self
    }

    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    #[must_use]
    pub fn primary_key(mut self, canonical: impl Into<String>) -> Self {
        self.primary_key = canonical.into();
        self
    }

    #[must_use]
    pub const fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Derive a schema for a composed type: same fields and aliases, new name,
    /// with `overrides` applied on top.
    #[must_use]
    pub fn extend(&self, model: impl Into<String>, overrides: Self) -> Self {
        let mut merged = self.clone();
        merged.model = model.into();
        merged.aliases.extend(&overrides.aliases);
        for field in overrides.fields {
            merged = merged.field(field);
        }
        merged.strict = self.strict || overrides.strict;
        merged
    }

    /// Resolve a name through the alias table.
    #[must_use]
    pub fn canonical<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.resolve(name)
    }

    #[must_use]
    pub fn get_field(&self, canonical: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == canonical)
    }

    /// Whether `canonical` may be stored on this type.
    #[must_use]
    pub fn accepts(&self, canonical: &str) -> bool {
        !self.strict || canonical == self.primary_key || self.get_field(canonical).is_some()
    }

    /// Type-appropriate empty value for `canonical` (`null` for undeclared fields).
    #[must_use]
    pub fn empty_value(&self, canonical: &str) -> Value {
        self.get_field(canonical)
            .map_or(Value::Null, |f| f.kind.empty_value())
    }

    /// Defaults for a fresh instance, keyed by canonical name.
    pub fn defaults(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .filter_map(|f| f.default.as_ref().map(|v| (f.name.as_str(), v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_schema() -> AttributeSchema {
        AttributeSchema::new("user")
            .alias("id", "ID")
            .alias("login", "user_login")
            .field(FieldDef::new("user_login", FieldKind::String))
            .field(FieldDef::new("user_status", FieldKind::Integer).default_value(0))
            .primary_key("ID")
            .strict()
    }

    #[test]
    fn strict_schema_accepts_declared_fields_and_primary_key() {
        let schema = user_schema();
        assert!(schema.accepts("user_login"));
        assert!(schema.accepts("ID"));
        assert!(!schema.accepts("nickname"));
    }

    #[test]
    fn open_schema_accepts_anything() {
        let schema = AttributeSchema::new("note");
        assert!(schema.accepts("whatever"));
    }

    #[test]
    fn empty_values_follow_field_kind() {
        let schema = user_schema();
        assert_eq!(schema.empty_value("user_login"), Value::String(String::new()));
        assert_eq!(schema.empty_value("user_status"), Value::from(0));
        assert_eq!(schema.empty_value("undeclared"), Value::Null);
    }

    #[test]
    fn redeclaring_a_field_replaces_it() {
        let schema = user_schema().field(FieldDef::new("user_status", FieldKind::String));
        assert_eq!(schema.fields.len(), 2);
        assert_eq!(schema.get_field("user_status").unwrap().kind, FieldKind::String);
    }

    #[test]
    fn extend_keeps_parent_fields_and_applies_overrides() {
        let child = user_schema().extend(
            "admin",
            AttributeSchema::new("admin")
                .alias("email", "user_email")
                .field(FieldDef::new("user_email", FieldKind::String)),
        );
        assert_eq!(child.model, "admin");
        assert_eq!(child.primary_key, "ID");
        assert!(child.strict);
        assert_eq!(child.canonical("login"), "user_login");
        assert_eq!(child.canonical("email"), "user_email");
        assert_eq!(child.fields.len(), 3);
    }
}
