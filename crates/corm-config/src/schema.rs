//! Attribute payload validation policy.

use serde::{Deserialize, Serialize};

const fn default_validate_on_save() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchemaConfig {
    /// Validate the attribute payload inside `save()` for types with a schema.
    #[serde(default = "default_validate_on_save")]
    pub validate_on_save: bool,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            validate_on_save: default_validate_on_save(),
        }
    }
}
