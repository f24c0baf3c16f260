//! Restack orchestration.
//!
//! A restack walks an ordered work list, rebasing each branch onto the
//! current tip of its parent. The remaining list lives in the operation lock
//! and shrinks by one after every branch, so an interrupted run resumes at
//! the branch that stopped it and never repeats finished work.

use super::lock::{LockScope, Locker, Operation, OperationOutcome};
use super::manager::StackManager;
use super::store::{BranchStore, LockStore};
use super::tree::BranchTree;
use crate::cli::output::Output;
use crate::config::RepoConfig;
use crate::errors::{Result, StkError};
use crate::git::Vcs;
use tracing::{debug, info};

/// Work list for restacking `name`.
///
/// With `only`, just the branch itself. Otherwise the branch followed by all
/// of its descendants, parents first. Floor branches are never included, so
/// for the trunk this is every other branch in the tree.
pub fn restack_order(
    tree: &BranchTree,
    name: &str,
    config: &RepoConfig,
    only: bool,
) -> Result<Vec<String>> {
    let node = tree.get(name).ok_or_else(|| StkError::not_tracked(name))?;
    let restackable = |name: &str| !config.is_floor(name);

    if only {
        return Ok(if node.is_root() || !restackable(node.name()) {
            Vec::new()
        } else {
            vec![node.name().to_string()]
        });
    }

    Ok(node
        .all()
        .filter(|node| !node.is_root() && restackable(node.name()))
        .map(|node| node.name().to_string())
        .collect())
}

/// Executes the restack steps recorded in a lock scope
pub struct Restacker<'a, S: BranchStore, V: Vcs + ?Sized> {
    manager: &'a mut StackManager<S>,
    vcs: &'a V,
    config: &'a RepoConfig,
}

impl<'a, S: BranchStore, V: Vcs + ?Sized> Restacker<'a, S, V> {
    pub fn new(manager: &'a mut StackManager<S>, vcs: &'a V, config: &'a RepoConfig) -> Self {
        Self {
            manager,
            vcs,
            config,
        }
    }

    /// Work through the scope's remaining branches.
    ///
    /// When `continuing`, the first branch is the one whose rebase stopped
    /// on conflicts; it is finished with `continue_rebase` instead of being
    /// rebased again. Returns `Suspended` as soon as a branch conflicts,
    /// with the lock still naming that branch first.
    pub fn perform<L: LockStore>(
        &mut self,
        scope: &mut LockScope<'_, L>,
        continuing: bool,
    ) -> Result<OperationOutcome> {
        let Operation::Restack {
            starting_branch,
            branches,
        } = scope.operation().clone();

        for (i, branch) in branches.iter().enumerate() {
            let (parent, recorded) = self.parent_of(branch)?;
            let base = recorded.as_deref();

            let landed = if continuing && i == 0 {
                info!("Finishing in-progress rebase of '{}'", branch);
                self.vcs.continue_rebase(branch)? && self.finish_if_stale(branch, &parent, base)?
            } else {
                self.restack_one(branch, &parent, base)?
            };

            if !landed {
                Output::conflict_guidance(branch);
                return Ok(OperationOutcome::Suspended);
            }

            let parent_tip = self.vcs.get_sha(&parent)?;
            self.manager.update_parent_sha(branch, &parent_tip)?;
            scope.update_operation(Operation::restack(
                starting_branch.clone(),
                branches[i + 1..].to_vec(),
            ))?;
            Output::success(format!("Restacked {branch} onto {parent}"));
        }

        self.vcs.checkout(&starting_branch)?;
        debug!("Returned to '{}'", starting_branch);
        Ok(OperationOutcome::Completed)
    }

    /// `recorded` is the parent SHA the branch was last reconciled at; the
    /// rebase replays only the commits after it, even when `parent` is not
    /// the branch the commits were built on (after a move or a prune).
    fn restack_one(&self, branch: &str, parent: &str, recorded: Option<&str>) -> Result<bool> {
        let parent_sha = self.vcs.get_sha(parent)?;
        Output::progress(format!("Restacking {branch} onto {parent}"));
        self.vcs.restack(branch, parent, &parent_sha, recorded)
    }

    /// After a resumed rebase, restack again if the branch still does not
    /// sit on its parent (the process stopped before the rebase started).
    fn finish_if_stale(&self, branch: &str, parent: &str, recorded: Option<&str>) -> Result<bool> {
        if self.vcs.is_ancestor(branch, parent)? {
            return Ok(true);
        }
        debug!("'{}' is not on '{}' after continue, restacking", branch, parent);
        self.restack_one(branch, parent, recorded)
    }

    /// Parent and recorded parent SHA, read fresh from the tree; the root
    /// and floor branches are rejected because they are never rebased.
    fn parent_of(&self, branch: &str) -> Result<(String, Option<String>)> {
        let tree = self
            .manager
            .tree()?
            .ok_or_else(|| StkError::not_tracked(branch))?;
        let node = tree.get(branch).ok_or_else(|| StkError::not_tracked(branch))?;

        match node.parent() {
            Some(parent) if !self.config.is_floor(branch) => Ok((
                parent.name().to_string(),
                node.parent_sha().map(str::to_string),
            )),
            _ => Err(StkError::validation(format!(
                "'{branch}' is a trunk branch and is never restacked"
            ))),
        }
    }
}

/// Restack `branches` in order under a new lock.
///
/// The current branch is recorded as the one to return to. The list is
/// checked before the lock is taken, so a bad list leaves nothing behind.
pub fn run_restack<S, L, V>(
    manager: &mut StackManager<S>,
    locker: &mut Locker<L>,
    vcs: &V,
    config: &RepoConfig,
    branches: Vec<String>,
) -> Result<OperationOutcome>
where
    S: BranchStore,
    L: LockStore,
    V: Vcs + ?Sized,
{
    locker.ensure_unlocked()?;
    validate_work_list(manager, config, &branches)?;

    let starting_branch = vcs.current_branch_name()?;
    let operation = Operation::restack(starting_branch, branches);
    let mut restacker = Restacker::new(manager, vcs, config);

    locker.begin_operation(operation, |scope| restacker.perform(scope, false))
}

/// Resume the restack recorded in the lock
pub fn continue_restack<S, L, V>(
    manager: &mut StackManager<S>,
    locker: &mut Locker<L>,
    vcs: &V,
    config: &RepoConfig,
) -> Result<OperationOutcome>
where
    S: BranchStore,
    L: LockStore,
    V: Vcs + ?Sized,
{
    let mut restacker = Restacker::new(manager, vcs, config);
    locker.continue_operation(|operation, scope| match operation {
        Operation::Restack { .. } => restacker.perform(scope, true),
    })
}

/// Abort the in-flight rebase, return to the starting branch and unlock.
///
/// Branches already restacked keep their new position.
pub fn abort_restack<L, V>(locker: &mut Locker<L>, vcs: &V) -> Result<Operation>
where
    L: LockStore,
    V: Vcs + ?Sized,
{
    locker.cancel_operation(|operation| {
        vcs.abort_rebase()?;
        vcs.checkout(operation.starting_branch())
    })
}

fn validate_work_list<S: BranchStore>(
    manager: &StackManager<S>,
    config: &RepoConfig,
    branches: &[String],
) -> Result<()> {
    if branches.is_empty() {
        return Ok(());
    }
    let tree = manager
        .tree()?
        .ok_or_else(|| StkError::not_tracked(&branches[0]))?;

    let mut seen = Vec::with_capacity(branches.len());
    for branch in branches {
        let node = tree.get(branch).ok_or_else(|| StkError::not_tracked(branch))?;
        if node.is_root() || config.is_floor(branch) {
            return Err(StkError::validation(format!(
                "'{branch}' is a trunk branch and is never restacked"
            )));
        }
        let queued_later = node.ancestors().find(|ancestor| {
            branches.iter().any(|b| b == ancestor.name()) && !seen.contains(&ancestor.name())
        });
        if let Some(ancestor) = queued_later {
            return Err(StkError::validation(format!(
                "'{}' must be restacked before its descendant '{branch}'",
                ancestor.name()
            )));
        }
        seen.push(node.name());
    }
    Ok(())
}
