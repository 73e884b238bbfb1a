//! Meta write policy.

use serde::{Deserialize, Serialize};

const fn default_write_through() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetaConfig {
    /// Write meta on persisted models straight to storage.
    ///
    /// When false, meta writes are buffered and flushed by the next `save()`.
    #[serde(default = "default_write_through")]
    pub write_through: bool,
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            write_through: default_write_through(),
        }
    }
}
