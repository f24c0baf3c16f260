use super::branch::TrackedBranch;
use super::store::BranchStore;
use super::tree::BranchTree;
use crate::errors::{Result, StkError};
use std::collections::HashSet;
use tracing::{debug, info};

/// Tracking mutations and queries over the persisted branch rows.
///
/// Every query rebuilds the tree from the store. Every mutation computes the
/// complete new row set, checks that it still forms a valid tree, and
/// replaces the stored rows in a single write.
pub struct StackManager<S: BranchStore> {
    store: S,
}

impl<S: BranchStore> StackManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current tree, or `None` when nothing is tracked
    pub fn tree(&self) -> Result<Option<BranchTree>> {
        BranchTree::from_rows(self.store.load()?)
    }

    /// The trunk row
    pub fn get_base(&self) -> Result<Option<TrackedBranch>> {
        Ok(self.tree()?.map(|tree| tree.base().branch().clone()))
    }

    pub fn get_branch(&self, name: &str) -> Result<Option<TrackedBranch>> {
        Ok(self
            .tree()?
            .and_then(|tree| tree.get(name).map(|node| node.branch().clone())))
    }

    pub fn is_tracked(&self, name: &str) -> Result<bool> {
        Ok(self.tree()?.is_some_and(|tree| tree.contains(name)))
    }

    pub fn tracked_branch_names(&self) -> Result<Vec<String>> {
        Ok(self
            .tree()?
            .map(|tree| tree.rows().iter().map(|row| row.name.clone()).collect())
            .unwrap_or_default())
    }

    /// Start tracking `name`.
    ///
    /// Without a parent the branch becomes the trunk, which is only allowed
    /// while nothing is tracked. With a parent, the parent's current SHA must
    /// be supplied as the reconciliation point.
    pub fn track_branch(
        &mut self,
        name: &str,
        parent: Option<&str>,
        parent_sha: Option<&str>,
    ) -> Result<()> {
        if name.trim().is_empty() {
            return Err(StkError::validation("Branch name cannot be empty"));
        }

        let tree = self.tree()?;
        if tree.as_ref().is_some_and(|tree| tree.contains(name)) {
            return Err(StkError::validation(format!(
                "Branch '{name}' is already tracked"
            )));
        }

        let row = match (parent, parent_sha) {
            (None, Some(_)) => {
                return Err(StkError::validation(
                    "A parent SHA was given without a parent branch",
                ))
            }
            (None, None) => {
                if let Some(tree) = &tree {
                    return Err(StkError::validation(format!(
                        "Cannot track '{name}' as a trunk: '{}' is already the trunk",
                        tree.base().name()
                    )));
                }
                TrackedBranch::trunk(name)
            }
            (Some(parent), None) => {
                return Err(StkError::validation(format!(
                    "Tracking '{name}' on '{parent}' requires the parent's current SHA"
                )))
            }
            (Some(parent), Some(sha)) => {
                if !tree.as_ref().is_some_and(|tree| tree.contains(parent)) {
                    return Err(StkError::not_tracked(parent));
                }
                TrackedBranch::child_of(name, parent, sha)
            }
        };

        let mut rows = tree.map(|tree| tree.rows().to_vec()).unwrap_or_default();
        rows.push(row);
        self.commit(rows)?;

        info!(
            "Tracking '{}'{}",
            name,
            parent.map(|p| format!(" on '{p}'")).unwrap_or_default()
        );
        Ok(())
    }

    pub fn untrack_branch(&mut self, name: &str) -> Result<()> {
        self.untrack_branches(&[name])
    }

    /// Remove several rows in one write.
    ///
    /// Nothing is written when any removed branch keeps a child that is not
    /// removed along with it.
    pub fn untrack_branches<N: AsRef<str>>(&mut self, names: &[N]) -> Result<()> {
        let Some(first) = names.first() else {
            return Ok(());
        };
        let Some(tree) = self.tree()? else {
            return Err(StkError::not_tracked(first.as_ref()));
        };

        let removing: HashSet<&str> = names.iter().map(|name| name.as_ref()).collect();
        for name in names {
            let name: &str = name.as_ref();
            let node = tree.get(name).ok_or_else(|| StkError::not_tracked(name))?;
            let children: Vec<String> = node
                .children()
                .filter(|child| !removing.contains(child.name()))
                .map(|child| child.name().to_string())
                .collect();
            if !children.is_empty() {
                return Err(StkError::HasChildren {
                    branch: name.to_string(),
                    children,
                });
            }
        }

        let rows = tree
            .rows()
            .iter()
            .filter(|row| !removing.contains(row.name.as_str()))
            .cloned()
            .collect();
        self.commit(rows)?;

        let removed: Vec<&str> = names.iter().map(|name| name.as_ref()).collect();
        info!("Untracked {}", removed.join(", "));
        Ok(())
    }

    /// Rename a tracked branch and repoint its children in the same write
    pub fn rename_branch(&mut self, name: &str, new_name: &str) -> Result<()> {
        if new_name.trim().is_empty() {
            return Err(StkError::validation("Branch name cannot be empty"));
        }

        let tree = self.require_tree(name)?;
        if tree.get(name).is_none() {
            return Err(StkError::not_tracked(name));
        }
        if tree.contains(new_name) {
            return Err(StkError::validation(format!(
                "Cannot rename '{name}' to '{new_name}': '{new_name}' is already tracked"
            )));
        }

        let rows = tree
            .rows()
            .iter()
            .cloned()
            .map(|mut row| {
                if row.name == name {
                    row.name = new_name.to_string();
                }
                if row.parent.as_deref() == Some(name) {
                    row.parent = Some(new_name.to_string());
                }
                row
            })
            .collect();
        self.commit(rows)?;

        info!("Renamed tracked branch '{}' to '{}'", name, new_name);
        Ok(())
    }

    /// Point `name` at a different parent. The recorded parent SHA is kept,
    /// so the branch shows as needing a restack until one runs.
    pub fn update_parent(&mut self, name: &str, new_parent: &str) -> Result<()> {
        let tree = self.require_tree(name)?;
        let node = tree.get(name).ok_or_else(|| StkError::not_tracked(name))?;

        if node.is_root() {
            return Err(StkError::validation(format!(
                "'{name}' is the trunk and cannot be given a parent"
            )));
        }
        if !tree.contains(new_parent) {
            return Err(StkError::not_tracked(new_parent));
        }
        if name == new_parent {
            return Err(StkError::validation(format!(
                "'{name}' cannot be its own parent"
            )));
        }
        if node.all().any(|descendant| descendant.name() == new_parent) {
            return Err(StkError::validation(format!(
                "Cannot move '{name}' onto its descendant '{new_parent}'"
            )));
        }

        self.modify(&tree, name, |row| row.parent = Some(new_parent.to_string()))?;
        info!("Moved '{}' onto '{}'", name, new_parent);
        Ok(())
    }

    /// Record that `name` is reconciled with its parent at `sha`
    pub fn update_parent_sha(&mut self, name: &str, sha: &str) -> Result<()> {
        let tree = self.require_tree(name)?;
        let node = tree.get(name).ok_or_else(|| StkError::not_tracked(name))?;
        if node.is_root() {
            return Err(StkError::validation(format!(
                "'{name}' is the trunk and has no parent SHA"
            )));
        }

        self.modify(&tree, name, |row| row.parent_sha = Some(sha.to_string()))?;
        debug!("Recorded parent SHA {} for '{}'", sha, name);
        Ok(())
    }

    pub fn set_pr_number(&mut self, name: &str, pr_number: Option<u64>) -> Result<()> {
        let tree = self.require_tree(name)?;
        self.modify(&tree, name, |row| row.pr_number = pr_number)
    }

    /// Untrack every non-trunk branch missing from `existing`.
    ///
    /// Children of a pruned branch move to their nearest surviving ancestor
    /// with their parent SHA left as it was. Returns the pruned names in
    /// tree order.
    pub fn prune_missing(&mut self, existing: &[String]) -> Result<Vec<String>> {
        let Some(tree) = self.tree()? else {
            return Ok(Vec::new());
        };

        let existing: HashSet<&str> = existing.iter().map(String::as_str).collect();
        let pruned: Vec<String> = tree
            .base()
            .all()
            .filter(|node| !node.is_root() && !existing.contains(node.name()))
            .map(|node| node.name().to_string())
            .collect();
        if pruned.is_empty() {
            return Ok(pruned);
        }

        let gone: HashSet<&str> = pruned.iter().map(String::as_str).collect();
        let mut rows = Vec::with_capacity(tree.len() - pruned.len());
        for row in tree.rows() {
            if gone.contains(row.name.as_str()) {
                continue;
            }
            let mut row = row.clone();
            if row.parent.as_deref().is_some_and(|parent| gone.contains(parent)) {
                // The trunk is never pruned, so a survivor always exists
                let survivor = tree
                    .get(&row.name)
                    .and_then(|node| node.ancestors().find(|a| !gone.contains(a.name())))
                    .ok_or_else(|| StkError::corruption("Tracked tree has no trunk"))?;
                debug!("Re-parenting '{}' onto '{}'", row.name, survivor.name());
                row.parent = Some(survivor.name().to_string());
            }
            rows.push(row);
        }
        self.commit(rows)?;

        info!("Pruned {} branch(es) missing from git: {}", pruned.len(), pruned.join(", "));
        Ok(pruned)
    }

    fn require_tree(&self, name: &str) -> Result<BranchTree> {
        self.tree()?.ok_or_else(|| StkError::not_tracked(name))
    }

    fn modify<F>(&mut self, tree: &BranchTree, name: &str, update: F) -> Result<()>
    where
        F: FnOnce(&mut TrackedBranch),
    {
        let mut rows = tree.rows().to_vec();
        let row = rows
            .iter_mut()
            .find(|row| row.name == name)
            .ok_or_else(|| StkError::not_tracked(name))?;
        update(row);
        self.commit(rows)
    }

    /// Validate the new row set and replace the stored one
    fn commit(&mut self, rows: Vec<TrackedBranch>) -> Result<()> {
        match BranchTree::from_rows(rows)? {
            Some(tree) => self.store.save(tree.rows()),
            None => self.store.save(&[]),
        }
    }
}
