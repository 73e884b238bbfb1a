//! Taxonomy associations.

use corm_core::entities::Term;
use corm_core::enums::RecordStatus;

use super::Model;
use crate::error::ModelError;

impl Model {
    /// Terms associated with the record in `taxonomy`.
    ///
    /// Unsaved instances (and saved ones with a pending assignment) answer from
    /// the pending assignment.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::NotFound` if the record was deleted.
    pub fn get_terms(&self, taxonomy: &str) -> Result<Vec<Term>, ModelError> {
        if let Some((_, terms)) = self.pending_terms.iter().find(|(t, _)| t == taxonomy) {
            return Ok(terms.clone());
        }
        if self.status == RecordStatus::New {
            return Ok(Vec::new());
        }
        let id = self.require_identity()?;
        self.orm
            .terms()
            .get_terms(id, taxonomy)
            .map_err(|e| ModelError::from_write(self.type_name(), e))
    }

    /// Replace the full association set for a taxonomy.
    ///
    /// Without `taxonomy` it is inferred from the terms; with it, every term is
    /// filed under that taxonomy. Stored records are written immediately;
    /// unsaved ones defer the write until after the first save.
    ///
    /// # Errors
    ///
    /// - `AmbiguousTaxonomy` if no taxonomy is given and the terms span zero or
    ///   several taxonomies
    /// - `NotFound` if the record was deleted
    /// - `Persistence` if the term store rejects the write
    pub fn set_terms(&mut self, terms: Vec<Term>, taxonomy: Option<&str>) -> Result<(), ModelError> {
        let (taxonomy, terms) = label_terms(terms, taxonomy)?;
        if self.status == RecordStatus::New {
            self.queue_terms(taxonomy, terms);
            return Ok(());
        }

        let id = self.require_identity()?;
        self.pending_terms.retain(|(t, _)| *t != taxonomy);
        self.orm
            .terms()
            .set_terms(id, &taxonomy, &terms)
            .map_err(|e| ModelError::from_write(self.type_name(), e))
    }

    pub(super) fn queue_terms(&mut self, taxonomy: String, terms: Vec<Term>) {
        match self.pending_terms.iter_mut().find(|(t, _)| *t == taxonomy) {
            Some((_, pending)) => *pending = terms,
            None => self.pending_terms.push((taxonomy, terms)),
        }
    }

    /// Write deferred term assignments in the order they were made. On failure
    /// the failing assignment and the rest stay pending.
    pub(crate) fn flush_terms(&mut self) -> Result<(), ModelError> {
        let Some(id) = self.id else {
            return Ok(());
        };
        let mut written = 0;
        let mut failure = None;
        for (taxonomy, terms) in &self.pending_terms {
            if let Err(err) = self.orm.terms().set_terms(id, taxonomy, terms) {
                tracing::warn!(model = self.type_name(), %id, taxonomy, error = %err, "term flush failed");
                failure = Some(ModelError::from_write(self.type_name(), err));
                break;
            }
            written += 1;
        }
        self.pending_terms.drain(..written);
        failure.map_or(Ok(()), Err)
    }
}

/// Resolve the taxonomy of an assignment and file every term under it.
pub(super) fn label_terms(
    terms: Vec<Term>,
    taxonomy: Option<&str>,
) -> Result<(String, Vec<Term>), ModelError> {
    let taxonomy = match taxonomy {
        Some(taxonomy) => taxonomy.to_string(),
        None => Term::infer_taxonomy(&terms)?.to_string(),
    };
    let terms = terms
        .into_iter()
        .map(|term| Term {
            taxonomy: taxonomy.clone(),
            ..term
        })
        .collect();
    Ok((taxonomy, terms))
}

#[cfg(test)]
mod tests {
    use crate::adapter::AdapterCall;
    use crate::error::ModelError;
    use crate::test_support::{memory_orm, note_model::Note};
    use corm_core::entities::Term;
    use pretty_assertions::assert_eq;

    #[test]
    fn terms_on_unsaved_instance_are_deferred() {
        let (orm, adapter) = memory_orm();
        let mut note = orm.make(&Note).unwrap();
        note.set("title", "Hi").unwrap();
        note.set_terms(vec![Term::new("category", "News")], None).unwrap();
        assert_eq!(note.get_terms("category").unwrap()[0].slug, "news");
        assert!(adapter.journal().is_empty());

        note.save(None).unwrap();
        let journal = adapter.journal();
        assert!(matches!(journal[0], AdapterCall::Create { .. }));
        assert!(matches!(
            &journal[1],
            AdapterCall::SetTerms { taxonomy, slugs, .. } if taxonomy == "category" && slugs == &["news"]
        ));
        assert_eq!(note.get_terms("category").unwrap().len(), 1);
    }

    #[test]
    fn explicit_taxonomy_relabels_terms() {
        let (orm, _) = memory_orm();
        let mut note = orm.make(&Note).unwrap();
        note.set("title", "Hi").unwrap();
        note.save(None).unwrap();
        note.set_terms(vec![Term::new("tag", "Rust")], Some("post_tag")).unwrap();
        let stored = note.get_terms("post_tag").unwrap();
        assert_eq!(stored[0].taxonomy, "post_tag");
        assert!(note.get_terms("tag").unwrap().is_empty());
    }

    #[test]
    fn empty_terms_without_taxonomy_are_ambiguous() {
        let (orm, _) = memory_orm();
        let mut note = orm.make(&Note).unwrap();
        assert!(matches!(
            note.set_terms(Vec::new(), None),
            Err(ModelError::AmbiguousTaxonomy { .. })
        ));
    }
}
