//! Alias table: user-facing attribute names → canonical storage field names.
//!
//! Resolution is total: a known alias maps to its canonical field, anything
//! else resolves to itself. An alias and its canonical name are therefore
//! interchangeable read/write targets.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    aliases: BTreeMap<String, String>,
}

impl AliasTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration of `alias → canonical`.
    #[must_use]
    pub fn with(mut self, alias: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.insert(alias, canonical);
        self
    }

    /// Register `alias → canonical`, replacing any previous mapping for `alias`.
    pub fn insert(&mut self, alias: impl Into<String>, canonical: impl Into<String>) {
        self.aliases.insert(alias.into(), canonical.into());
    }

    /// Resolve a name to its canonical field. Unknown names fall through unchanged.
    #[must_use]
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map_or(name, String::as_str)
    }

    /// Whether `name` is a registered alias (not a canonical name).
    #[must_use]
    pub fn is_alias(&self, name: &str) -> bool {
        self.aliases.contains_key(name)
    }

    /// All aliases that resolve to `canonical`, sorted.
    #[must_use]
    pub fn aliases_for(&self, canonical: &str) -> Vec<&str> {
        self.aliases
            .iter()
            .filter(|(_, target)| target.as_str() == canonical)
            .map(|(alias, _)| alias.as_str())
            .collect()
    }

    /// Merge another table on top of this one (entries in `other` win).
    pub fn extend(&mut self, other: &Self) {
        for (alias, canonical) in &other.aliases {
            self.aliases.insert(alias.clone(), canonical.clone());
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn posts() -> AliasTable {
        AliasTable::new()
            .with("content", "post_content")
            .with("title", "post_title")
            .with("id", "ID")
    }

    #[rstest]
    #[case("content", "post_content")]
    #[case("title", "post_title")]
    #[case("id", "ID")]
    #[case("post_content", "post_content")]
    #[case("menu_order", "menu_order")]
    fn resolves_aliases_and_falls_through(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(posts().resolve(name), expected);
    }

    #[test]
    fn aliases_for_canonical_are_sorted() {
        let table = posts().with("body", "post_content");
        assert_eq!(table.aliases_for("post_content"), vec!["body", "content"]);
        assert!(table.aliases_for("post_status").is_empty());
    }

    #[test]
    fn extend_overrides_existing_entries() {
        let mut table = posts();
        table.extend(&AliasTable::new().with("title", "post_name"));
        assert_eq!(table.resolve("title"), "post_name");
        assert_eq!(table.len(), 3);
    }
}
