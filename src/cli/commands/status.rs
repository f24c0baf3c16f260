use super::RepoContext;
use crate::cli::output::Output;
use crate::errors::Result;
use crate::git::Vcs;
use crate::stack::{needs_restack, LockState, Operation};
use crate::utils::short_sha;

/// One row of the status listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub name: String,
    pub depth: usize,
    pub is_current: bool,
    pub is_floor: bool,
    pub needs_restack: bool,
    pub pr_number: Option<u64>,
}

impl StatusLine {
    fn markers(&self) -> Vec<String> {
        let mut markers = Vec::new();
        if self.is_floor {
            markers.push("(trunk)".to_string());
        }
        if let Some(pr) = self.pr_number {
            markers.push(format!("PR #{pr}"));
        }
        if self.needs_restack {
            markers.push("(needs restack)".to_string());
        }
        markers
    }
}

/// Show tracked branches, drift and any operation in progress
pub async fn run() -> Result<()> {
    let ctx = RepoContext::open()?;

    if let LockState::Locked(Operation::Restack {
        starting_branch,
        branches,
    }) = ctx.locker.state()?
    {
        Output::warning("A restack is in progress");
        Output::sub_item(format!("Started from: {starting_branch}"));
        Output::sub_item(format!("Remaining: {}", branches.join(", ")));
        Output::tip("Resolve conflicts, then run 'stk continue' or 'stk abort'");
    }

    let lines = collect(&ctx)?;
    if lines.is_empty() {
        Output::info("No branches are tracked. Run 'stk init' first.");
        return Ok(());
    }

    Output::section("Stack");
    for line in &lines {
        Output::tree_line(line.depth, &line.name, line.is_current, &line.markers());
    }

    let drifted = lines.iter().filter(|line| line.needs_restack).count();
    if drifted > 0 {
        Output::spacing();
        Output::tip(format!("{drifted} branch(es) need a restack: run 'stk restack'"));
    }
    Ok(())
}

/// Status rows in tree order, parents before children
pub fn collect(ctx: &RepoContext) -> Result<Vec<StatusLine>> {
    let Some(tree) = ctx.manager.tree()? else {
        return Ok(Vec::new());
    };
    let current = ctx.repo.current_branch_name().ok();

    let mut lines = Vec::with_capacity(tree.len());
    for node in tree.base().all() {
        let needs_restack = needs_restack(node, &ctx.repo, ctx.config())?;
        tracing::debug!(
            "{}: parent sha {}",
            node.name(),
            node.parent_sha().map(short_sha).unwrap_or("-")
        );

        lines.push(StatusLine {
            name: node.name().to_string(),
            depth: node.depth(),
            is_current: current.as_deref() == Some(node.name()),
            is_floor: ctx.config().is_floor(node.name()),
            needs_restack,
            pr_number: node.pr_number(),
        });
    }
    Ok(lines)
}
