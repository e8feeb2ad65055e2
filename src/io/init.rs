//! Initialization helpers for `.siteforge/` scaffolding.
//!
//! Everything the engine owns (progress file, config, event log) lives under
//! `.siteforge/` and is kept out of the generated project's history via a
//! directory-local `.gitignore`, so no-op detection reflects generated
//! content only.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::config::{ForgeConfig, write_config};

const FORGE_GITIGNORE: &str = "*\n";

/// All canonical paths within `.siteforge/` for a project root.
#[derive(Debug, Clone)]
pub struct ForgePaths {
    pub root: PathBuf,
    pub forge_dir: PathBuf,
    pub gitignore_path: PathBuf,
    pub config_path: PathBuf,
    pub progress_path: PathBuf,
    pub event_log_path: PathBuf,
}

impl ForgePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let forge_dir = root.join(".siteforge");
        Self {
            root,
            gitignore_path: forge_dir.join(".gitignore"),
            config_path: forge_dir.join("config.toml"),
            progress_path: forge_dir.join("progress"),
            event_log_path: forge_dir.join("builder.log"),
            forge_dir,
        }
    }
}

/// Create `.siteforge/` scaffolding if missing: gitignore and default config.
///
/// Existing files are left untouched, so re-running `init` on a repo that is
/// mid-build changes nothing.
pub fn init_forge(root: &Path) -> Result<ForgePaths> {
    let paths = ForgePaths::new(root);
    fs::create_dir_all(&paths.forge_dir)
        .with_context(|| format!("create directory {}", paths.forge_dir.display()))?;

    if !paths.gitignore_path.exists() {
        fs::write(&paths.gitignore_path, FORGE_GITIGNORE)
            .with_context(|| format!("write {}", paths.gitignore_path.display()))?;
    }
    if !paths.config_path.exists() {
        write_config(&paths.config_path, &ForgeConfig::default())?;
    }
    Ok(paths)
}
