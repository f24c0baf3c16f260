use crate::errors::{Result, StkError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub repo: RepoConfig,
    #[serde(default)]
    pub git: GitConfig,
}

/// Branches that anchor every stack in the repository
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepoConfig {
    /// Root of the tracked tree
    pub trunk: String,
    /// Optional floor between trunk and the user's stacks
    #[serde(default)]
    pub trailing_trunk: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitConfig {
    /// Remote used for pull and push
    pub remote: String,
    /// Push with --force-with-lease instead of --force
    pub force_with_lease: bool,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            trunk: "main".to_string(),
            trailing_trunk: None,
        }
    }
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            force_with_lease: true,
        }
    }
}

impl RepoConfig {
    pub fn new(trunk: impl Into<String>, trailing_trunk: Option<String>) -> Self {
        Self {
            trunk: trunk.into(),
            trailing_trunk,
        }
    }

    /// Trunk and trailing trunk are never rebased and never drift.
    pub fn is_floor(&self, branch: &str) -> bool {
        self.trunk == branch || self.trailing_trunk.as_deref() == Some(branch)
    }

    /// Default parent for a newly tracked branch.
    pub fn default_parent(&self) -> &str {
        self.trailing_trunk.as_deref().unwrap_or(&self.trunk)
    }
}

impl Settings {
    /// Create default settings for a repository
    pub fn default_for_repo(trunk: &str, trailing_trunk: Option<String>) -> Self {
        Self {
            repo: RepoConfig::new(trunk, trailing_trunk),
            git: GitConfig::default(),
        }
    }

    /// Load settings from a file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(StkError::not_initialized(
                "Repository is not initialized for stk. Run 'stk init' first.",
            ));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| StkError::config(format!("Failed to read config file: {e}")))?;

        let settings: Settings = serde_json::from_str(&content)
            .map_err(|e| StkError::config(format!("Failed to parse config file: {e}")))?;

        Ok(settings)
    }

    /// Save settings to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        crate::utils::atomic_file::write_json(path, self)
    }

    /// Update a configuration value by key
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match split_key(key)? {
            ("repo", "trunk") => self.repo.trunk = value.to_string(),
            ("repo", "trailing_trunk") => {
                self.repo.trailing_trunk = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            ("git", "remote") => self.git.remote = value.to_string(),
            ("git", "force_with_lease") => {
                self.git.force_with_lease = value
                    .parse()
                    .map_err(|_| StkError::config(format!("Invalid boolean value: {value}")))?;
            }
            _ => return Err(StkError::config(format!("Unknown config key: {key}"))),
        }

        Ok(())
    }

    /// Get a configuration value by key
    pub fn get_value(&self, key: &str) -> Result<String> {
        let value = match split_key(key)? {
            ("repo", "trunk") => self.repo.trunk.clone(),
            ("repo", "trailing_trunk") => self.repo.trailing_trunk.clone().unwrap_or_default(),
            ("git", "remote") => self.git.remote.clone(),
            ("git", "force_with_lease") => self.git.force_with_lease.to_string(),
            _ => return Err(StkError::config(format!("Unknown config key: {key}"))),
        };

        Ok(value)
    }

    /// All keys understood by `get_value`/`set_value`
    pub fn keys() -> &'static [&'static str] {
        &[
            "repo.trunk",
            "repo.trailing_trunk",
            "git.remote",
            "git.force_with_lease",
        ]
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.repo.trunk.trim().is_empty() {
            return Err(StkError::config("Trunk branch name cannot be empty"));
        }

        if let Some(trailing) = &self.repo.trailing_trunk {
            if trailing == &self.repo.trunk {
                return Err(StkError::config(
                    "Trailing trunk must differ from the trunk branch",
                ));
            }
        }

        if self.git.remote.trim().is_empty() {
            return Err(StkError::config("Remote name cannot be empty"));
        }

        Ok(())
    }
}

fn split_key(key: &str) -> Result<(&str, &str)> {
    key.split_once('.')
        .ok_or_else(|| StkError::config(format!("Invalid config key format: {key}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_floor_branches() {
        let config = RepoConfig::new("main", Some("develop".to_string()));
        assert!(config.is_floor("main"));
        assert!(config.is_floor("develop"));
        assert!(!config.is_floor("feature"));
        assert_eq!(config.default_parent(), "develop");

        let config = RepoConfig::new("main", None);
        assert_eq!(config.default_parent(), "main");
    }

    #[test]
    fn test_set_and_get_values() {
        let mut settings = Settings::default_for_repo("main", None);
        settings.set_value("repo.trailing_trunk", "develop").unwrap();
        settings.set_value("git.force_with_lease", "false").unwrap();

        assert_eq!(settings.get_value("repo.trailing_trunk").unwrap(), "develop");
        assert_eq!(settings.get_value("git.force_with_lease").unwrap(), "false");

        settings.set_value("repo.trailing_trunk", "").unwrap();
        assert_eq!(settings.repo.trailing_trunk, None);
    }

    #[test]
    fn test_invalid_keys_and_values() {
        let mut settings = Settings::default();
        assert!(settings.set_value("trunk", "main").is_err());
        assert!(settings.set_value("repo.unknown", "x").is_err());
        assert!(settings.set_value("git.force_with_lease", "maybe").is_err());
        assert!(settings.get_value("nope.nope").is_err());
    }

    #[test]
    fn test_validate() {
        let settings = Settings::default_for_repo("main", Some("main".to_string()));
        assert!(settings.validate().is_err());

        let settings = Settings::default_for_repo("", None);
        assert!(settings.validate().is_err());

        let settings = Settings::default_for_repo("main", Some("develop".to_string()));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");

        assert!(Settings::load_from_file(&path).is_err());

        let settings = Settings::default_for_repo("trunk", Some("next".to_string()));
        settings.save_to_file(&path).unwrap();
        assert_eq!(Settings::load_from_file(&path).unwrap(), settings);
    }
}
