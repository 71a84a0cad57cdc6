//! # linkage-config
//!
//! Layered configuration loading for the linkage workspace using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`LINKAGE_*` prefix, `__` as separator)
//! 2. Project-level `.linkage/config.toml`
//! 3. User-level `~/.config/linkage/config.toml`
//! 4. Built-in defaults
//!
//! Figment maps `LINKAGE_STORE__DB_PATH` -> `store.db_path`,
//! `LINKAGE_LINKS__MAX_BATCH_SIZE` -> `links.max_batch_size`, and so on.
//!
//! ```no_run
//! use linkage_config::LinkageConfig;
//!
//! let config = LinkageConfig::load_with_dotenv().expect("config");
//! if config.suggestions.is_configured() {
//!     println!("suggestions from {}", config.suggestions.base_url);
//! }
//! ```

mod auth;
mod error;
mod general;
mod links;
mod store;
mod suggestions;

pub use auth::AuthConfig;
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use links::LinkRulesConfig;
pub use store::StoreConfig;
pub use suggestions::SuggestionsConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project-relative location of the local config file.
pub const PROJECT_CONFIG: &str = ".linkage/config.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LinkageConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub links: LinkRulesConfig,
    #[serde(default)]
    pub suggestions: SuggestionsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl LinkageConfig {
    /// Load configuration from TOML files and environment variables,
    /// resolving the project file against the current directory.
    ///
    /// Does NOT read `.env`; use [`Self::load_with_dotenv`] for that.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` when a source fails to parse or
    /// `ConfigError::InvalidValue` when the link rules are unusable.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("."))
    }

    /// Like [`Self::load`], with the project file resolved under `project_root`.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_from(project_root: &Path) -> Result<Self, ConfigError> {
        let config: Self = Self::figment_for(project_root).extract()?;
        config.links.validate()?;
        Ok(config)
    }

    /// Load `.env` first, then the usual layers.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// The provider chain rooted at the current directory.
    pub fn figment() -> Figment {
        Self::figment_for(Path::new("."))
    }

    /// Build the provider chain with the project file under `project_root`.
    pub fn figment_for(project_root: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        let local_path = project_root.join(PROJECT_CONFIG);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("LINKAGE_").split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("linkage").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_remote_sections() {
        let config = LinkageConfig::default();
        assert!(!config.suggestions.is_configured());
        assert!(!config.auth.is_configured());
        assert_eq!(config.links.max_batch_size, 50);
    }

    #[test]
    fn figment_builds_without_files() {
        figment::Jail::expect_with(|_jail| {
            let config: LinkageConfig = LinkageConfig::figment().extract()?;
            assert_eq!(config.general.default_limit, 20);
            assert_eq!(config.store.db_path, ".linkage/links.db");
            Ok(())
        });
    }
}
