//! Query defaults.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QueryConfig {
    /// Row limit for queries that do not set one. `0` means unlimited.
    #[serde(default)]
    pub default_limit: u32,

    /// Include trashed records in queries on soft-deletable types by default.
    #[serde(default)]
    pub include_trashed: bool,
}

impl QueryConfig {
    /// The default limit as an `Option` (`None` when unlimited).
    #[must_use]
    pub const fn limit(&self) -> Option<u32> {
        if self.default_limit == 0 {
            None
        } else {
            Some(self.default_limit)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_limit_means_unlimited() {
        let config = QueryConfig::default();
        assert_eq!(config.limit(), None);
        let config = QueryConfig {
            default_limit: 50,
            ..QueryConfig::default()
        };
        assert_eq!(config.limit(), Some(50));
    }
}
