use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use linkage_config::LinkageConfig;
use linkage_db::service::LinkService;
use linkage_engine::LinkRules;
use linkage_flow::suggestions::SuggestionClient;
use linkage_flow::{Linker, Session};

/// Load `<project>/.env` when present, then the layered config.
pub fn load_config(project_root: &Path) -> anyhow::Result<LinkageConfig> {
    let env_path = project_root.join(".env");
    if env_path.exists() {
        dotenvy::from_path(&env_path)
            .with_context(|| format!("failed to load dotenv file at {}", env_path.display()))?;
    }
    LinkageConfig::load_from(project_root).map_err(anyhow::Error::from)
}

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub linker: Linker<LinkService>,
    pub config: LinkageConfig,
    pub project_root: PathBuf,
}

impl AppContext {
    pub async fn init(project_root: PathBuf, config: LinkageConfig) -> anyhow::Result<Self> {
        let session = Session::from_config(&config.auth)
            .context("set auth.user_id and auth.token (or LINKAGE_AUTH__USER_ID / LINKAGE_AUTH__TOKEN)")?;

        let service = LinkService::from_config(&config, &project_root, session.identity().clone())
            .await
            .context("failed to open link store")?;

        tracing::debug!(
            root = %project_root.display(),
            db = %config.store.db_path,
            "link store ready"
        );

        let linker = Linker::new(service, session, LinkRules::from(&config.links));
        Ok(Self {
            linker,
            config,
            project_root,
        })
    }

    /// The link store, for reads that bypass the linking flow.
    pub fn service(&self) -> &LinkService {
        self.linker.store()
    }

    pub fn suggestion_client(&self) -> anyhow::Result<Arc<SuggestionClient>> {
        let client = SuggestionClient::new(&self.config.suggestions)
            .context("suggestions need suggestions.base_url")?;
        Ok(Arc::new(client))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn config() -> LinkageConfig {
        let mut config = LinkageConfig::default();
        config.auth.user_id = "u-analyst".into();
        config.auth.token = "tok".into();
        config.store.trail_enabled = false;
        config
    }

    #[tokio::test]
    async fn init_opens_store_under_project_root() {
        let temp = TempDir::new().expect("tempdir should create");
        let ctx = AppContext::init(temp.path().to_path_buf(), config())
            .await
            .expect("context should init");

        assert_eq!(ctx.service().actor(), "u-analyst");
        assert!(temp.path().join(".linkage/links.db").exists());
    }

    #[tokio::test]
    async fn init_requires_auth() {
        let temp = TempDir::new().expect("tempdir should create");
        let result = AppContext::init(temp.path().to_path_buf(), LinkageConfig::default()).await;
        let err = result.err().expect("missing auth should fail");
        assert!(format!("{err:#}").contains("auth.user_id"));
    }

    #[tokio::test]
    async fn suggestion_client_requires_base_url() {
        let temp = TempDir::new().expect("tempdir should create");
        let ctx = AppContext::init(temp.path().to_path_buf(), config())
            .await
            .expect("context should init");
        assert!(ctx.suggestion_client().is_err());
    }
}
