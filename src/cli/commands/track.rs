use super::RepoContext;
use crate::cli::output::Output;
use crate::errors::{Result, StkError};
use crate::git::Vcs;

/// Start tracking an existing git branch
pub async fn track(branch: Option<String>, parent: Option<String>) -> Result<()> {
    let mut ctx = RepoContext::open()?;
    let branch = ctx.branch_or_current(branch)?;
    let parent = track_branch(&mut ctx, &branch, parent)?;

    Output::success(format!("Tracking '{branch}' on '{parent}'"));
    Ok(())
}

/// Stop tracking a branch; the git branch itself is kept
pub async fn untrack(branch: Option<String>) -> Result<()> {
    let mut ctx = RepoContext::open()?;
    let branch = ctx.branch_or_current(branch)?;
    untrack_branch(&mut ctx, &branch)?;

    Output::success(format!("No longer tracking '{branch}'"));
    Ok(())
}

/// Track `branch` on `parent` (or the configured default parent) at the
/// parent's current tip. Returns the parent used.
pub fn track_branch(ctx: &mut RepoContext, branch: &str, parent: Option<String>) -> Result<String> {
    ctx.locker.ensure_unlocked()?;
    ctx.require_tree()?;

    if !ctx.repo.branch_exists(branch) {
        return Err(StkError::branch(format!("Branch '{branch}' does not exist")));
    }
    if ctx.config().is_floor(branch) && !ctx.manager.is_tracked(branch)? {
        return Err(StkError::validation(format!(
            "'{branch}' is a trunk branch; run 'stk init --force' to track it"
        )));
    }

    let parent = parent.unwrap_or_else(|| ctx.config().default_parent().to_string());
    if !ctx.manager.is_tracked(&parent)? {
        return Err(StkError::not_tracked(&parent));
    }
    let parent_sha = ctx.repo.get_sha(&parent)?;
    ctx.manager
        .track_branch(branch, Some(&parent), Some(&parent_sha))?;

    Ok(parent)
}

pub fn untrack_branch(ctx: &mut RepoContext, branch: &str) -> Result<()> {
    ctx.locker.ensure_unlocked()?;
    if ctx.config().is_floor(branch) {
        return Err(StkError::validation(format!(
            "'{branch}' is a trunk branch and stays tracked"
        )));
    }
    ctx.manager.untrack_branch(branch)
}
