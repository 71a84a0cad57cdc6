use std::path::PathBuf;

use anyhow::Context;
use linkage_config::{LinkageConfig, PROJECT_CONFIG};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::InitArgs;
use crate::context::PROJECT_DIR;
use crate::output::output;

#[derive(Debug, Serialize)]
struct InitResponse {
    project_root: String,
    config_path: String,
    config_written: bool,
}

/// Handle `lkg init`.
pub fn handle(args: &InitArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let root = match &args.path {
        Some(path) => PathBuf::from(path),
        None => std::env::current_dir().context("failed to read current directory")?,
    };
    let response = init_project(&root, args.force)?;
    output(&response, flags.format)
}

fn init_project(root: &std::path::Path, force: bool) -> anyhow::Result<InitResponse> {
    let dir = root.join(PROJECT_DIR);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let config_path = root.join(PROJECT_CONFIG);
    let config_written = force || !config_path.exists();
    if config_written {
        let body = toml::to_string_pretty(&LinkageConfig::default())
            .context("failed to serialize default config")?;
        std::fs::write(&config_path, body)
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        tracing::info!(path = %config_path.display(), "wrote default config");
    }

    Ok(InitResponse {
        project_root: root.display().to_string(),
        config_path: config_path.display().to_string(),
        config_written,
    })
}
