use crate::errors::Result;

/// Outcome of creating a branch at the current HEAD
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateBranchResult {
    Success,
    AlreadyExists,
}

/// Version-control primitives the stack core depends on.
///
/// `GitRepository` is the production implementation; tests substitute a
/// scripted double. Rebase-related methods report conflicts as `Ok(false)`
/// and reserve `Err` for failures the user cannot resolve by editing files.
pub trait Vcs {
    fn current_branch_name(&self) -> Result<String>;

    fn branches(&self) -> Result<Vec<String>>;

    fn checkout(&self, name: &str) -> Result<()>;

    fn branch_exists(&self, name: &str) -> bool;

    /// Commit SHA at the tip of a local branch
    fn get_sha(&self, name: &str) -> Result<String>;

    /// True when `possible_ancestor`'s tip is reachable from `branch`'s tip
    /// (a branch counts as its own ancestor).
    fn is_ancestor(&self, branch: &str, possible_ancestor: &str) -> Result<bool>;

    /// Rebase `branch` onto the commit `parent_sha` of `parent`.
    ///
    /// `old_base` is the parent commit the branch was last reconciled
    /// against; only commits after it are replayed. When it is absent or no
    /// longer in the branch's history, the implementation works out the fork
    /// point itself.
    ///
    /// Returns `false` when the rebase stopped on conflicts and is waiting
    /// for the user.
    fn restack(
        &self,
        branch: &str,
        parent: &str,
        parent_sha: &str,
        old_base: Option<&str>,
    ) -> Result<bool>;

    /// Finish a rebase of `branch` the user has resolved. `false` means
    /// conflicts remain.
    fn continue_rebase(&self, branch: &str) -> Result<bool>;

    fn abort_rebase(&self) -> Result<()>;

    fn create_branch_from_current(&self, name: &str) -> Result<CreateBranchResult>;

    fn rename_branch(&self, name: &str, new_name: &str) -> Result<()>;

    fn delete_branch(&self, name: &str) -> Result<()>;

    fn push_branches(&self, names: &[String]) -> Result<()>;

    /// Fast-forward a local branch from its remote counterpart
    fn pull(&self, branch: &str) -> Result<()>;
}
