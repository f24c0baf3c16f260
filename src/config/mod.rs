pub mod settings;

pub use settings::{GitConfig, RepoConfig, Settings};

use crate::errors::{Result, StkError};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-repository stk directory
pub const STK_DIR: &str = ".stk";

/// Get the stk directory for a specific repository
pub fn get_repo_config_dir(repo_path: &Path) -> PathBuf {
    repo_path.join(STK_DIR)
}

/// Path of the repository settings file
pub fn config_file(repo_path: &Path) -> PathBuf {
    get_repo_config_dir(repo_path).join("config.json")
}

/// Path of the tracked-branch rows
pub fn branches_file(repo_path: &Path) -> PathBuf {
    get_repo_config_dir(repo_path).join("branches.json")
}

/// Ensure the configuration directory exists
pub fn ensure_config_dir(config_dir: &Path) -> Result<()> {
    if !config_dir.exists() {
        fs::create_dir_all(config_dir).map_err(|e| {
            StkError::config(format!("Failed to create config directory: {e}"))
        })?;
    }
    Ok(())
}

/// Check if a repository is initialized for stk
pub fn is_repo_initialized(repo_path: &Path) -> bool {
    config_file(repo_path).exists()
}

/// Load the settings of an initialized repository
pub fn load_settings(repo_path: &Path) -> Result<Settings> {
    Settings::load_from_file(&config_file(repo_path))
}

/// Initialize a repository for stk
pub fn initialize_repo(repo_path: &Path, settings: &Settings) -> Result<()> {
    settings.validate()?;

    let config_dir = get_repo_config_dir(repo_path);
    ensure_config_dir(&config_dir)?;
    settings.save_to_file(&config_file(repo_path))?;

    tracing::info!("Initialized stk repository at {}", repo_path.display());
    Ok(())
}
