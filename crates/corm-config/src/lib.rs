//! # corm-config
//!
//! Engine settings for corm: how meta writes reach storage, whether `save()`
//! checks payloads against model type schemas, and the defaults every new
//! query starts from.
//!
//! Sources, lowest priority first:
//! 1. `CormConfig::default()`
//! 2. `~/.config/corm/config.toml`
//! 3. `.corm/config.toml` in the working directory, or the file named by
//!    `CORM_CONFIG` when that variable is set
//! 4. `CORM_*` environment variables, `__` between section and key
//!    (`CORM_QUERY__DEFAULT_LIMIT` sets `query.default_limit`)
//!
//! ```no_run
//! use corm_config::CormConfig;
//!
//! let config = CormConfig::load_with_dotenv().expect("config");
//! if !config.meta.write_through {
//!     println!("meta writes are batched until save()");
//! }
//! ```

mod error;
mod meta;
mod query;
mod schema;

pub use error::ConfigError;
pub use meta::MetaConfig;
pub use query::QueryConfig;
pub use schema::SchemaConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Names a config file used instead of `.corm/config.toml`.
pub const CONFIG_PATH_VAR: &str = "CORM_CONFIG";

const ENV_PREFIX: &str = "CORM_";
const PROJECT_CONFIG: &str = ".corm/config.toml";

/// Settings read by the `Orm` handle and every model and query it creates.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CormConfig {
    #[serde(default)]
    pub meta: MetaConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

impl CormConfig {
    /// Load from the TOML files and `CORM_*` variables. `.env` is not read;
    /// see [`Self::load_with_dotenv`].
    ///
    /// # Errors
    ///
    /// - `ConfigError::MissingFile` if `CORM_CONFIG` names a file that does not
    ///   exist
    /// - `ConfigError::Invalid` if a source is malformed or a value has the
    ///   wrong type
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self::figment()?.extract()?)
    }

    /// [`Self::load`] after exporting the variables of a `.env` file, if any.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// The provider chain behind [`Self::load`], for layering extra providers.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingFile` if `CORM_CONFIG` names a file that
    /// does not exist.
    pub fn figment() -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(user_path) = Self::user_config_path() {
            if user_path.exists() {
                figment = figment.merge(Toml::file(user_path));
            }
        }

        match std::env::var_os(CONFIG_PATH_VAR) {
            Some(path) => {
                let path = PathBuf::from(path);
                if !path.exists() {
                    return Err(ConfigError::MissingFile {
                        var: CONFIG_PATH_VAR,
                        path,
                    });
                }
                figment = figment.merge(Toml::file(path));
            }
            None => {
                let project_path = PathBuf::from(PROJECT_CONFIG);
                if project_path.exists() {
                    figment = figment.merge(Toml::file(project_path));
                }
            }
        }

        // CORM_CONFIG and CORM_LOG are not settings.
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["config", "log"]).split("__")))
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("corm").join("config.toml"))
    }
}
