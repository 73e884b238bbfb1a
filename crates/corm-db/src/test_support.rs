//! Shared test utilities for corm-db unit tests.

use std::sync::Arc;

use crate::adapter::MemoryAdapter;
use crate::registry::Registry;
use crate::service::Orm;

/// Route `tracing` output to the test writer. Filter from `CORM_LOG`.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("CORM_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// An engine with [`note_model::Note`] booted over a fresh memory adapter.
pub fn memory_orm() -> (Orm, Arc<MemoryAdapter>) {
    init_tracing();
    let mut builder = Registry::builder();
    builder.boot(&note_model::Note).unwrap();
    let adapter = Arc::new(MemoryAdapter::new());
    (Orm::new(builder.build(), Arc::clone(&adapter)), adapter)
}

/// A small strict model with no hooks or schema.
pub mod note_model {
    use corm_core::attributes::{AttributeSchema, FieldDef, FieldKind};

    use crate::definition::ModelDefinition;

    pub struct Note;

    impl ModelDefinition for Note {
        fn name(&self) -> &'static str {
            "note"
        }

        fn attributes(&self) -> AttributeSchema {
            AttributeSchema::new("note")
                .alias("title", "note_title")
                .alias("status", "note_status")
                .alias("body", "note_body")
                .field(FieldDef::new("note_title", FieldKind::String))
                .field(FieldDef::new("note_status", FieldKind::String).default_value("draft"))
                .field(FieldDef::new("note_body", FieldKind::String))
                .strict()
        }
    }
}
