use crate::cli::output::Output;
use crate::cli::ConfigAction;
use crate::config::{config_file, is_repo_initialized, Settings};
use crate::errors::{Result, StkError};
use crate::git::find_repository_root;
use std::env;
use std::path::Path;

/// Handle configuration commands
pub async fn run(action: ConfigAction) -> Result<()> {
    let current_dir = env::current_dir()
        .map_err(|e| StkError::config(format!("Could not get current directory: {e}")))?;
    let repo_root = find_repository_root(&current_dir)?;

    if !is_repo_initialized(&repo_root) {
        return Err(StkError::not_initialized(
            "Repository is not initialized for stk. Run 'stk init' first.",
        ));
    }
    let config_file = config_file(&repo_root);

    match action {
        ConfigAction::Set { key, value } => {
            set_config_value(&config_file, &key, &value)?;
            Output::success(format!("Configuration updated: {key} = {value}"));
            if key == "repo.trunk" || key == "repo.trailing_trunk" {
                Output::tip("Tracked branches are not re-parented; use 'stk move' if needed");
            }
            Ok(())
        }
        ConfigAction::Get { key } => {
            let value = Settings::load_from_file(&config_file)?.get_value(&key)?;
            println!("{key} = {}", display_value(&value));
            Ok(())
        }
        ConfigAction::List => {
            let settings = Settings::load_from_file(&config_file)?;
            Output::section("stk configuration");
            for (key, value) in list_values(&settings)? {
                Output::sub_item(format!("{key} = {}", display_value(&value)));
            }
            Ok(())
        }
    }
}

/// Set, validate and atomically save one key
pub fn set_config_value(config_file: &Path, key: &str, value: &str) -> Result<()> {
    let mut settings = Settings::load_from_file(config_file)?;
    settings.set_value(key, value)?;
    settings.validate()?;
    settings.save_to_file(config_file)
}

fn list_values(settings: &Settings) -> Result<Vec<(&'static str, String)>> {
    Settings::keys()
        .iter()
        .map(|key| Ok((*key, settings.get_value(key)?)))
        .collect()
}

fn display_value(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}
