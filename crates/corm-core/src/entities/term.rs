use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// A taxonomy term (category, tag, or any custom taxonomy).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub struct Term {
    /// Identity in the term store, if the term already exists there.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term_id: Option<u64>,
    pub name: String,
    pub slug: String,
    pub taxonomy: String,
}

impl Term {
    /// A not-yet-stored term; the slug is derived from the name.
    #[must_use]
    pub fn new(taxonomy: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            term_id: None,
            slug: slugify(&name),
            name,
            taxonomy: taxonomy.into(),
        }
    }

    #[must_use]
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    /// The single taxonomy shared by `terms`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::AmbiguousTaxonomy` if the terms span more than one
    /// taxonomy, or if there are no terms to infer from.
    pub fn infer_taxonomy(terms: &[Self]) -> Result<&str, CoreError> {
        let mut taxonomies: Vec<&str> = terms.iter().map(|t| t.taxonomy.as_str()).collect();
        taxonomies.sort_unstable();
        taxonomies.dedup();
        if taxonomies.len() == 1 {
            return Ok(taxonomies[0]);
        }
        Err(CoreError::AmbiguousTaxonomy {
            taxonomies: taxonomies.into_iter().map(String::from).collect(),
        })
    }
}

/// Lowercase, ASCII-alphanumeric words joined by `-`.
#[must_use]
pub fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("News", "news")]
    #[case("Release Notes 2024", "release-notes-2024")]
    #[case("  C++ & Rust ", "c-rust")]
    fn slug_is_derived_from_name(#[case] name: &str, #[case] slug: &str) {
        assert_eq!(Term::new("category", name).slug, slug);
    }

    #[test]
    fn infers_single_taxonomy() {
        let terms = vec![Term::new("category", "News"), Term::new("category", "Tech")];
        assert_eq!(Term::infer_taxonomy(&terms).unwrap(), "category");
    }

    #[test]
    fn mixed_taxonomies_are_ambiguous() {
        let terms = vec![Term::new("category", "News"), Term::new("post_tag", "rust")];
        let err = Term::infer_taxonomy(&terms).unwrap_err();
        match err {
            CoreError::AmbiguousTaxonomy { taxonomies } => {
                assert_eq!(taxonomies, vec!["category", "post_tag"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn no_terms_is_ambiguous() {
        assert!(matches!(
            Term::infer_taxonomy(&[]),
            Err(CoreError::AmbiguousTaxonomy { .. })
        ));
    }
}
