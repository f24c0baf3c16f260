use super::RepoContext;
use crate::cli::output::Output;
use crate::errors::{Result, StkError};
use crate::git::Vcs;
use crate::utils::spinner::Spinner;

/// Push a branch together with the stacked branches below it
pub async fn run(branch: Option<String>) -> Result<()> {
    let ctx = RepoContext::open()?;
    let branch = ctx.branch_or_current(branch)?;
    let names = push_list(&ctx, &branch)?;

    if names.is_empty() {
        Output::info(format!("'{branch}' is a trunk branch; nothing to push"));
        return Ok(());
    }

    let remote = ctx.settings.git.remote.clone();
    Spinner::run(format!("Pushing to {remote}..."), || {
        ctx.repo.push_branches(&names)
    })?;

    Output::success(format!("Pushed {} branch(es) to {remote}", names.len()));
    for name in &names {
        Output::sub_item(name);
    }
    Ok(())
}

/// `branch` and its non-floor ancestors, bottom of the stack first
pub fn push_list(ctx: &RepoContext, branch: &str) -> Result<Vec<String>> {
    let tree = ctx.require_tree()?;
    let node = tree.get(branch).ok_or_else(|| StkError::not_tracked(branch))?;

    let mut names: Vec<String> = std::iter::once(node)
        .chain(node.ancestors())
        .filter(|node| !node.is_root() && !ctx.config().is_floor(node.name()))
        .map(|node| node.name().to_string())
        .collect();
    names.reverse();
    Ok(names)
}
