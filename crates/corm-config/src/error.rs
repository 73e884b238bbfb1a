//! Errors from assembling a `CormConfig`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source is malformed, or a value does not fit its setting
    /// (e.g. a string for `query.default_limit`).
    #[error("invalid corm configuration: {0}")]
    Invalid(#[from] figment::Error),

    /// The config file named by the override variable is missing.
    #[error("{var} points at {}, which does not exist", path.display())]
    MissingFile { var: &'static str, path: PathBuf },
}
