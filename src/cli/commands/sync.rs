use super::RepoContext;
use crate::cli::output::Output;
use crate::errors::Result;
use crate::git::Vcs;
use crate::stack::drifted_branches;
use crate::utils::spinner::Spinner;

/// What a sync changed
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub pruned: Vec<String>,
    pub drifted: Vec<String>,
}

/// Pull the trunk, then forget tracked branches deleted from git
pub async fn run() -> Result<()> {
    let mut ctx = RepoContext::open()?;
    ctx.locker.ensure_unlocked()?;

    let trunk = ctx.config().trunk.clone();
    let remote = ctx.settings.git.remote.clone();
    let pulled = Spinner::run(format!("Pulling {trunk} from {remote}..."), || {
        ctx.repo.pull(&trunk)
    });
    match pulled {
        Ok(()) => Output::success(format!("Updated '{trunk}' from {remote}")),
        Err(e) => Output::warning(format!("Could not pull '{trunk}': {e}")),
    }

    let report = reconcile(&mut ctx)?;
    if report.pruned.is_empty() {
        Output::info("All tracked branches still exist");
    } else {
        Output::success(format!(
            "Stopped tracking {} deleted branch(es)",
            report.pruned.len()
        ));
        for name in &report.pruned {
            Output::sub_item(name);
        }
    }
    if !report.drifted.is_empty() {
        Output::tip(format!(
            "Needs restack: {}. Run 'stk restack {}'",
            report.drifted.join(", "),
            trunk
        ));
    }
    Ok(())
}

/// Prune rows for branches git no longer has and report resulting drift
pub fn reconcile(ctx: &mut RepoContext) -> Result<SyncReport> {
    let existing = ctx.repo.branches()?;
    let pruned = ctx.manager.prune_missing(&existing)?;

    let drifted = match ctx.manager.tree()? {
        Some(tree) => drifted_branches(&tree, &ctx.repo, ctx.config())?,
        None => Vec::new(),
    };
    Ok(SyncReport { pruned, drifted })
}
