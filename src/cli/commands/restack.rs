use super::RepoContext;
use crate::cli::output::Output;
use crate::errors::{Result, StkError};
use crate::stack::{
    abort_restack, continue_restack, restack_order, run_restack, Operation, OperationOutcome,
};

/// Restack a branch (and by default its descendants) onto current parents
pub async fn restack(branch: Option<String>, only: bool) -> Result<()> {
    let mut ctx = RepoContext::open()?;
    let branch = ctx.branch_or_current(branch)?;
    let outcome = restack_branch(&mut ctx, &branch, only)?;

    report_outcome(outcome, "Stack restacked");
    Ok(())
}

/// Resume after the user resolved conflicts
pub async fn continue_operation() -> Result<()> {
    let mut ctx = RepoContext::open()?;
    let outcome = continue_restack(
        &mut ctx.manager,
        &mut ctx.locker,
        &ctx.repo,
        &ctx.settings.repo,
    )?;

    report_outcome(outcome, "Stack restacked");
    Ok(())
}

/// Cancel the operation in progress
pub async fn abort() -> Result<()> {
    let mut ctx = RepoContext::open()?;
    let Operation::Restack {
        starting_branch,
        branches,
    } = abort_restack(&mut ctx.locker, &ctx.repo)?;

    Output::success("Restack aborted");
    Output::sub_item(format!("Returned to '{starting_branch}'"));
    if !branches.is_empty() {
        Output::sub_item(format!("Not restacked: {}", branches.join(", ")));
    }
    Output::tip("Branches restacked before the conflict keep their new base");
    Ok(())
}

pub fn restack_branch(
    ctx: &mut RepoContext,
    branch: &str,
    only: bool,
) -> Result<OperationOutcome> {
    ctx.locker.ensure_unlocked()?;
    ctx.require_clean_worktree()?;

    let tree = ctx.require_tree()?;
    if !tree.contains(branch) {
        return Err(StkError::not_tracked(branch));
    }
    let branches = restack_order(&tree, branch, &ctx.settings.repo, only)?;
    tracing::debug!("Restack order: {:?}", branches);

    run_restack(
        &mut ctx.manager,
        &mut ctx.locker,
        &ctx.repo,
        &ctx.settings.repo,
        branches,
    )
}

/// Conflict guidance is printed by the restack itself; only report success
pub(crate) fn report_outcome(outcome: OperationOutcome, done: &str) {
    match outcome {
        OperationOutcome::Completed => Output::success(done),
        OperationOutcome::Suspended => {
            Output::info("Operation paused; 'stk status' shows what remains")
        }
    }
}
