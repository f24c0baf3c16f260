use super::restack::report_outcome;
use super::RepoContext;
use crate::cli::output::Output;
use crate::errors::{Result, StkError};
use crate::git::{CreateBranchResult, Vcs};
use crate::stack::{restack_order, run_restack, OperationOutcome};

/// Create a branch on top of the current one and track it
pub async fn create(name: String) -> Result<()> {
    let mut ctx = RepoContext::open()?;
    let parent = create_branch(&mut ctx, &name)?;

    Output::success(format!("Created '{name}' on '{parent}'"));
    Ok(())
}

/// Rename a branch in git and in the stack
pub async fn rename(branch: Option<String>, new_name: String) -> Result<()> {
    let mut ctx = RepoContext::open()?;
    let branch = ctx.branch_or_current(branch)?;
    rename_branch(&mut ctx, &branch, &new_name)?;

    Output::success(format!("Renamed '{branch}' to '{new_name}'"));
    Ok(())
}

/// Re-parent a branch and restack it together with its descendants
pub async fn move_onto(branch: Option<String>, onto: String) -> Result<()> {
    let mut ctx = RepoContext::open()?;
    let branch = ctx.branch_or_current(branch)?;
    let outcome = move_branch(&mut ctx, &branch, &onto)?;

    report_outcome(outcome, &format!("Moved '{branch}' onto '{onto}'"));
    Ok(())
}

/// Returns the parent the new branch was stacked on
pub fn create_branch(ctx: &mut RepoContext, name: &str) -> Result<String> {
    ctx.locker.ensure_unlocked()?;

    let parent = ctx.repo.current_branch_name()?;
    if !ctx.manager.is_tracked(&parent)? {
        return Err(StkError::not_tracked(&parent));
    }
    if ctx.manager.is_tracked(name)? {
        return Err(StkError::validation(format!(
            "Branch '{name}' is already tracked"
        )));
    }

    match ctx.repo.create_branch_from_current(name)? {
        CreateBranchResult::Success => {}
        CreateBranchResult::AlreadyExists => {
            return Err(StkError::branch(format!(
                "Branch '{name}' already exists; use 'stk track {name}' instead"
            )))
        }
    }

    let parent_sha = ctx.repo.get_sha(&parent)?;
    ctx.manager
        .track_branch(name, Some(&parent), Some(&parent_sha))?;
    ctx.repo.checkout(name)?;

    Ok(parent)
}

pub fn rename_branch(ctx: &mut RepoContext, branch: &str, new_name: &str) -> Result<()> {
    ctx.locker.ensure_unlocked()?;

    if ctx.config().is_floor(branch) {
        return Err(StkError::validation(format!(
            "'{branch}' is a trunk branch; change it with 'stk config set' instead"
        )));
    }
    if !ctx.manager.is_tracked(branch)? {
        return Err(StkError::not_tracked(branch));
    }
    if ctx.manager.is_tracked(new_name)? || ctx.repo.branch_exists(new_name) {
        return Err(StkError::validation(format!(
            "Branch '{new_name}' already exists"
        )));
    }

    // Rows first: a failed row write leaves git untouched, and a failed git
    // rename is undone in the rows
    ctx.manager.rename_branch(branch, new_name)?;
    if let Err(e) = ctx.repo.rename_branch(branch, new_name) {
        ctx.manager.rename_branch(new_name, branch)?;
        return Err(e);
    }
    Ok(())
}

pub fn move_branch(ctx: &mut RepoContext, branch: &str, onto: &str) -> Result<OperationOutcome> {
    ctx.locker.ensure_unlocked()?;
    ctx.require_clean_worktree()?;

    if ctx.config().is_floor(branch) {
        return Err(StkError::validation(format!(
            "'{branch}' is a trunk branch and cannot be moved"
        )));
    }
    ctx.manager.update_parent(branch, onto)?;

    let tree = ctx.require_tree()?;
    let branches = restack_order(&tree, branch, &ctx.settings.repo, false)?;
    run_restack(
        &mut ctx.manager,
        &mut ctx.locker,
        &ctx.repo,
        &ctx.settings.repo,
        branches,
    )
}
