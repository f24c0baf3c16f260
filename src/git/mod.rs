pub mod repository;
pub mod vcs;

pub use repository::GitRepository;
pub use vcs::{CreateBranchResult, Vcs};

use crate::errors::{Result, StkError};
use std::path::{Path, PathBuf};

/// Find the root of the Git repository
pub fn find_repository_root(start_path: &Path) -> Result<PathBuf> {
    let repo = git2::Repository::discover(start_path)
        .map_err(|e| StkError::config(format!("Not in a git repository: {e}")))?;

    let workdir = repo
        .workdir()
        .ok_or_else(|| StkError::config("Repository has no working directory (bare repo?)"))?;

    Ok(workdir.to_path_buf())
}
