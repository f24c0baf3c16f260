pub mod branch;
pub mod config;
pub mod init;
pub mod push;
pub mod restack;
pub mod status;
pub mod sync;
pub mod track;

use crate::config::{is_repo_initialized, load_settings, RepoConfig, Settings};
use crate::errors::{Result, StkError};
use crate::git::{find_repository_root, GitRepository, Vcs};
use crate::stack::{BranchTree, JsonBranchStore, JsonLockStore, Locker, StackManager};
use std::env;
use std::path::Path;

/// Everything a command needs for an initialized repository
pub struct RepoContext {
    pub repo: GitRepository,
    pub settings: Settings,
    pub manager: StackManager<JsonBranchStore>,
    pub locker: Locker<JsonLockStore>,
}

impl RepoContext {
    /// Open the repository containing the current directory
    pub fn open() -> Result<Self> {
        let current_dir = env::current_dir()
            .map_err(|e| StkError::config(format!("Could not get current directory: {e}")))?;
        Self::open_at(&current_dir)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let repo_root = find_repository_root(path)?;
        if !is_repo_initialized(&repo_root) {
            return Err(StkError::not_initialized(
                "Repository is not initialized for stk. Run 'stk init' first.",
            ));
        }

        let settings = load_settings(&repo_root)?;
        let repo = GitRepository::open(&repo_root)?.with_git_config(&settings.git);
        let locker = Locker::new(JsonLockStore::for_git_dir(repo.git_dir()));
        let manager = StackManager::new(JsonBranchStore::for_repo(&repo_root));

        Ok(Self {
            repo,
            settings,
            manager,
            locker,
        })
    }

    pub fn config(&self) -> &RepoConfig {
        &self.settings.repo
    }

    /// Tracked tree, or guidance when nothing is tracked yet
    pub fn require_tree(&self) -> Result<BranchTree> {
        self.manager.tree()?.ok_or_else(|| {
            StkError::not_initialized("No branches are tracked. Run 'stk init' first.")
        })
    }

    /// Rebases refuse to start over uncommitted changes
    pub fn require_clean_worktree(&self) -> Result<()> {
        if self.repo.is_dirty()? {
            return Err(StkError::validation(
                "Working tree has uncommitted changes; commit or stash them first",
            ));
        }
        Ok(())
    }

    /// The named branch, or the checked-out one
    pub fn branch_or_current(&self, branch: Option<String>) -> Result<String> {
        match branch {
            Some(branch) => Ok(branch),
            None => self.repo.current_branch_name(),
        }
    }
}
