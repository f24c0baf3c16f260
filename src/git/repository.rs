use super::vcs::{CreateBranchResult, Vcs};
use crate::config::GitConfig;
use crate::errors::{Result, StkError};
use git2::{BranchType, Oid, Repository};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, info, warn};

/// Wrapper around git2::Repository with the operations stk needs.
///
/// Reads and ref updates go through libgit2. Rebases and network operations
/// shell out to the `git` CLI so that conflict state, hooks and credential
/// helpers behave exactly as they do for the user.
pub struct GitRepository {
    repo: Repository,
    path: PathBuf,
    remote: String,
    force_with_lease: bool,
}

impl GitRepository {
    /// Open a Git repository at the given path
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path)
            .map_err(|e| StkError::config(format!("Not a git repository: {e}")))?;

        let workdir = repo
            .workdir()
            .ok_or_else(|| StkError::config("Repository has no working directory"))?
            .to_path_buf();

        let defaults = GitConfig::default();
        Ok(Self {
            repo,
            path: workdir,
            remote: defaults.remote,
            force_with_lease: defaults.force_with_lease,
        })
    }

    /// Apply remote/push preferences from the repository settings
    pub fn with_git_config(mut self, config: &GitConfig) -> Self {
        self.remote = config.remote.clone();
        self.force_with_lease = config.force_with_lease;
        self
    }

    /// Get repository path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Per-worktree git directory
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    /// Get the current branch name
    pub fn get_current_branch(&self) -> Result<String> {
        let head = self
            .repo
            .head()
            .map_err(|e| StkError::branch(format!("Could not get HEAD: {e}")))?;

        if let Some(name) = head.shorthand().filter(|_| head.is_branch()) {
            Ok(name.to_string())
        } else {
            // Detached HEAD - return commit hash
            let commit = head
                .peel_to_commit()
                .map_err(|e| StkError::branch(format!("Could not get HEAD commit: {e}")))?;
            Ok(format!("HEAD@{}", commit.id()))
        }
    }

    /// Check if the working directory has uncommitted changes to tracked files
    pub fn is_dirty(&self) -> Result<bool> {
        let mut options = git2::StatusOptions::new();
        options.include_untracked(false).include_ignored(false);
        let statuses = self.repo.statuses(Some(&mut options))?;

        Ok(statuses.iter().any(|status| {
            status.status().intersects(
                git2::Status::INDEX_MODIFIED
                    | git2::Status::INDEX_NEW
                    | git2::Status::INDEX_DELETED
                    | git2::Status::WT_MODIFIED
                    | git2::Status::WT_DELETED
                    | git2::Status::CONFLICTED,
            )
        }))
    }

    /// List all local branches
    pub fn list_branches(&self) -> Result<Vec<String>> {
        let branches = self.repo.branches(Some(BranchType::Local))?;

        let mut branch_names = Vec::new();
        for branch in branches {
            let (branch, _) = branch?;
            if let Some(name) = branch.name()? {
                branch_names.push(name.to_string());
            }
        }

        Ok(branch_names)
    }

    /// Create a new branch at `target` (a branch, tag or commit) or at HEAD
    pub fn create_branch(&self, name: &str, target: Option<&str>) -> Result<()> {
        let target_commit = if let Some(target) = target {
            let target_obj = self.repo.revparse_single(target).map_err(|e| {
                StkError::branch(format!("Could not find target '{target}': {e}"))
            })?;
            target_obj.peel_to_commit().map_err(|e| {
                StkError::branch(format!("Target '{target}' is not a commit: {e}"))
            })?
        } else {
            let head = self
                .repo
                .head()
                .map_err(|e| StkError::branch(format!("Could not get HEAD: {e}")))?;
            head.peel_to_commit()
                .map_err(|e| StkError::branch(format!("Could not get HEAD commit: {e}")))?
        };

        self.repo
            .branch(name, &target_commit, false)
            .map_err(|e| StkError::branch(format!("Could not create branch '{name}': {e}")))?;

        info!("Created branch '{}'", name);
        Ok(())
    }

    /// Switch to a branch
    pub fn checkout_branch(&self, name: &str) -> Result<()> {
        let branch = self
            .repo
            .find_branch(name, BranchType::Local)
            .map_err(|e| StkError::branch(format!("Could not find branch '{name}': {e}")))?;

        let tree = branch.get().peel_to_tree().map_err(|e| {
            StkError::branch(format!("Could not get tree for branch '{name}': {e}"))
        })?;

        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.safe();
        self.repo
            .checkout_tree(tree.as_object(), Some(&mut checkout))
            .map_err(|e| StkError::branch(format!("Could not checkout branch '{name}': {e}")))?;

        self.repo
            .set_head(&format!("refs/heads/{name}"))
            .map_err(|e| StkError::branch(format!("Could not update HEAD to '{name}': {e}")))?;

        info!("Switched to branch '{}'", name);
        Ok(())
    }

    /// Get the commit hash at the head of a branch
    pub fn get_branch_head(&self, branch_name: &str) -> Result<String> {
        Ok(self.branch_oid(branch_name)?.to_string())
    }

    fn branch_oid(&self, branch_name: &str) -> Result<Oid> {
        let branch = self
            .repo
            .find_branch(branch_name, BranchType::Local)
            .map_err(|e| {
                StkError::branch(format!("Could not find branch '{branch_name}': {e}"))
            })?;

        let commit = branch.get().peel_to_commit().map_err(|e| {
            StkError::branch(format!(
                "Could not get commit for branch '{branch_name}': {e}"
            ))
        })?;

        Ok(commit.id())
    }

    /// Check for merge conflicts in the index
    pub fn has_conflicts(&self) -> Result<bool> {
        let mut index = self.repo.index()?;
        // The git CLI may have rewritten the index since libgit2 cached it
        index.read(true)?;
        Ok(index.has_conflicts())
    }

    /// Whether a `git rebase` is stopped in this worktree
    pub fn is_rebase_in_progress(&self) -> bool {
        let git_dir = self.git_dir();
        git_dir.join("rebase-merge").exists() || git_dir.join("rebase-apply").exists()
    }

    /// Whether commit `sha` is in `branch`'s history. Unknown or unparsable
    /// SHAs (for example garbage-collected ones) are simply not contained.
    fn branch_contains(&self, branch: &str, sha: &str) -> Result<bool> {
        let Ok(oid) = Oid::from_str(sha) else {
            return Ok(false);
        };
        if self.repo.find_commit(oid).is_err() {
            return Ok(false);
        }
        let tip = self.branch_oid(branch)?;
        Ok(tip == oid || self.repo.graph_descendant_of(tip, oid)?)
    }

    /// Old base for a rebase of `branch` when no recorded base is usable:
    /// the fork point from `parent`'s reflog, else the merge base with the
    /// target commit.
    fn fallback_upstream(&self, branch: &str, parent: &str, parent_sha: &str) -> Result<String> {
        if let Some(sha) = self.fork_point(parent, branch)? {
            return Ok(sha);
        }
        let onto = Oid::from_str(parent_sha)?;
        let base = self
            .repo
            .merge_base(self.branch_oid(branch)?, onto)
            .map_err(|e| {
                StkError::rebase(format!("'{branch}' shares no history with '{parent}': {e}"))
            })?;
        Ok(base.to_string())
    }

    /// The commit where `branch` forked from `parent`, using the parent's
    /// reflog so a parent rewritten by an earlier restack still resolves to
    /// its pre-rewrite tip.
    fn fork_point(&self, parent: &str, branch: &str) -> Result<Option<String>> {
        let output = self.run_git(&["merge-base", "--fork-point", parent, branch])?;
        if !output.status.success() {
            return Ok(None);
        }
        let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!sha.is_empty()).then_some(sha))
    }

    fn run_git(&self, args: &[&str]) -> Result<Output> {
        debug!("Running git {}", args.join(" "));
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.path)
            .env("GIT_EDITOR", "true")
            .output()?;
        Ok(output)
    }

    fn run_git_checked(&self, args: &[&str]) -> Result<Output> {
        let output = self.run_git(args)?;
        if !output.status.success() {
            return Err(StkError::branch(format!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(output)
    }
}

impl Vcs for GitRepository {
    fn current_branch_name(&self) -> Result<String> {
        self.get_current_branch()
    }

    fn branches(&self) -> Result<Vec<String>> {
        self.list_branches()
    }

    fn checkout(&self, name: &str) -> Result<()> {
        self.checkout_branch(name)
    }

    fn branch_exists(&self, name: &str) -> bool {
        self.repo.find_branch(name, BranchType::Local).is_ok()
    }

    fn get_sha(&self, name: &str) -> Result<String> {
        self.get_branch_head(name)
    }

    fn is_ancestor(&self, branch: &str, possible_ancestor: &str) -> Result<bool> {
        let branch_oid = self.branch_oid(branch)?;
        let ancestor_oid = self.branch_oid(possible_ancestor)?;

        if branch_oid == ancestor_oid {
            return Ok(true);
        }
        Ok(self.repo.graph_descendant_of(branch_oid, ancestor_oid)?)
    }

    fn restack(
        &self,
        branch: &str,
        parent: &str,
        parent_sha: &str,
        old_base: Option<&str>,
    ) -> Result<bool> {
        let upstream = match old_base {
            Some(sha) if self.branch_contains(branch, sha)? => sha.to_string(),
            Some(sha) => {
                debug!("Recorded base {} is not in '{}', using fork point", sha, branch);
                self.fallback_upstream(branch, parent, parent_sha)?
            }
            None => self.fallback_upstream(branch, parent, parent_sha)?,
        };
        debug!(
            "Rebasing '{}' onto {} ({}), upstream {}",
            branch, parent, parent_sha, upstream
        );

        let output = self.run_git(&["rebase", "--onto", parent_sha, upstream.as_str(), branch])?;
        if output.status.success() {
            info!("Restacked '{}' onto '{}'", branch, parent);
            return Ok(true);
        }

        if self.is_rebase_in_progress() {
            warn!("Rebase of '{}' onto '{}' stopped on conflicts", branch, parent);
            return Ok(false);
        }

        Err(StkError::rebase(format!(
            "Could not rebase '{branch}' onto '{parent}': {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }

    fn continue_rebase(&self, branch: &str) -> Result<bool> {
        if !self.is_rebase_in_progress() {
            debug!("No rebase in progress for '{}', nothing to continue", branch);
            return Ok(true);
        }

        if self.has_conflicts()? {
            return Ok(false);
        }

        let output = self.run_git(&["rebase", "--continue"])?;
        if output.status.success() {
            info!("Finished rebase of '{}'", branch);
            return Ok(true);
        }

        if self.is_rebase_in_progress() {
            // Stopped again on a later commit of the same branch
            return Ok(false);
        }

        Err(StkError::rebase(format!(
            "Could not continue rebase of '{branch}': {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }

    fn abort_rebase(&self) -> Result<()> {
        if !self.is_rebase_in_progress() {
            debug!("No rebase in progress, nothing to abort");
            return Ok(());
        }

        self.run_git_checked(&["rebase", "--abort"])?;
        info!("Aborted in-progress rebase");
        Ok(())
    }

    fn create_branch_from_current(&self, name: &str) -> Result<CreateBranchResult> {
        if self.branch_exists(name) {
            return Ok(CreateBranchResult::AlreadyExists);
        }
        self.create_branch(name, None)?;
        Ok(CreateBranchResult::Success)
    }

    fn rename_branch(&self, name: &str, new_name: &str) -> Result<()> {
        let mut branch = self
            .repo
            .find_branch(name, BranchType::Local)
            .map_err(|e| StkError::branch(format!("Could not find branch '{name}': {e}")))?;

        branch.rename(new_name, false).map_err(|e| {
            StkError::branch(format!("Could not rename '{name}' to '{new_name}': {e}"))
        })?;

        info!("Renamed branch '{}' to '{}'", name, new_name);
        Ok(())
    }

    fn delete_branch(&self, name: &str) -> Result<()> {
        let mut branch = self
            .repo
            .find_branch(name, BranchType::Local)
            .map_err(|e| StkError::branch(format!("Could not find branch '{name}': {e}")))?;

        branch
            .delete()
            .map_err(|e| StkError::branch(format!("Could not delete branch '{name}': {e}")))?;

        info!("Deleted branch '{}'", name);
        Ok(())
    }

    fn push_branches(&self, names: &[String]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }

        let force = if self.force_with_lease {
            "--force-with-lease"
        } else {
            "--force"
        };
        let mut args = vec!["push", force, self.remote.as_str()];
        args.extend(names.iter().map(String::as_str));

        self.run_git_checked(&args)?;
        info!("Pushed {} branch(es) to {}", names.len(), self.remote);
        Ok(())
    }

    fn pull(&self, branch: &str) -> Result<()> {
        self.run_git_checked(&["fetch", self.remote.as_str(), branch])?;

        let remote_ref = format!("refs/remotes/{}/{}", self.remote, branch);
        let remote_oid = self.repo.refname_to_id(&remote_ref).map_err(|e| {
            StkError::branch(format!("Remote branch {remote_ref} not found: {e}"))
        })?;
        let local_oid = self.branch_oid(branch)?;

        if local_oid == remote_oid {
            debug!("'{}' already up to date", branch);
            return Ok(());
        }

        if !self.repo.graph_descendant_of(remote_oid, local_oid)? {
            return Err(StkError::branch(format!(
                "'{branch}' has diverged from {}/{branch}; cannot fast-forward",
                self.remote
            )));
        }

        if self.get_current_branch()? == branch {
            self.run_git_checked(&["merge", "--ff-only", remote_ref.as_str()])?;
        } else {
            let mut reference = self.repo.find_reference(&format!("refs/heads/{branch}"))?;
            reference.set_target(remote_oid, "stk: fast-forward from remote")?;
        }

        info!("Fast-forwarded '{}' to {}", branch, remote_oid);
        Ok(())
    }
}
