use super::tree::{BranchNode, BranchTree};
use crate::config::RepoConfig;
use crate::errors::Result;
use crate::git::Vcs;
use tracing::{debug, warn};

/// Whether `node` has drifted from its parent and should be restacked.
///
/// Floor branches and the root never drift. Otherwise a branch drifts when
/// its recorded parent SHA differs from the parent's tip, or when the parent
/// is no longer an ancestor of it. The SHA check runs first so the ancestry
/// query is only paid for branches that look reconciled. A branch with no
/// recorded SHA counts as drifted, and so does one whose parent is gone
/// from git. A branch that is itself gone from git is not reported; `sync`
/// prunes it.
pub fn needs_restack<V: Vcs + ?Sized>(
    node: BranchNode<'_>,
    vcs: &V,
    config: &RepoConfig,
) -> Result<bool> {
    if node.is_root() || config.is_floor(node.name()) {
        return Ok(false);
    }
    let Some(parent) = node.parent() else {
        return Ok(false);
    };
    if !vcs.branch_exists(node.name()) {
        warn!("'{}' is tracked but missing from git; run 'stk sync'", node.name());
        return Ok(false);
    }
    if !vcs.branch_exists(parent.name()) {
        warn!(
            "Parent '{}' of '{}' is missing from git; run 'stk sync'",
            parent.name(),
            node.name()
        );
        return Ok(true);
    }
    let Some(recorded) = node.parent_sha() else {
        debug!("'{}' has no recorded parent SHA", node.name());
        return Ok(true);
    };

    let current = vcs.get_sha(parent.name())?;
    if recorded != current {
        debug!(
            "'{}' recorded {} for '{}', tip is now {}",
            node.name(),
            recorded,
            parent.name(),
            current
        );
        return Ok(true);
    }

    Ok(!vcs.is_ancestor(node.name(), parent.name())?)
}

/// Every drifted branch in the tree, parents before children
pub fn drifted_branches<V: Vcs + ?Sized>(
    tree: &BranchTree,
    vcs: &V,
    config: &RepoConfig,
) -> Result<Vec<String>> {
    let mut drifted = Vec::new();
    for node in tree.base().all() {
        if needs_restack(node, vcs, config)? {
            drifted.push(node.name().to_string());
        }
    }
    Ok(drifted)
}
