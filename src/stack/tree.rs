//! Read-only tree view over the tracked branch rows.
//!
//! The tree is an arena rebuilt from the flat row set on every query: nodes
//! live in a `Vec`, parent and child links are indices into it, and names
//! resolve through a lookup map. Nothing holds references into persisted
//! state, so a tree is just a snapshot and can be dropped freely.

use super::branch::TrackedBranch;
use crate::errors::{Result, StkError};
use std::collections::HashMap;
use std::fmt;

pub struct BranchTree {
    rows: Vec<TrackedBranch>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    index: HashMap<String, usize>,
    root: usize,
}

impl BranchTree {
    /// Build the tree from persisted rows.
    ///
    /// Returns `Ok(None)` when nothing is tracked. Fails when the rows do not
    /// form a single tree: duplicate names, zero or several roots, a parent
    /// name with no row, or branches that cannot reach the root.
    pub fn from_rows(rows: Vec<TrackedBranch>) -> Result<Option<Self>> {
        if rows.is_empty() {
            return Ok(None);
        }

        let mut index = HashMap::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            if index.insert(row.name.clone(), i).is_some() {
                return Err(StkError::corruption(format!(
                    "Branch '{}' is tracked more than once",
                    row.name
                )));
            }
        }

        let roots: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.is_root())
            .map(|(i, _)| i)
            .collect();
        let root = match roots.as_slice() {
            [root] => *root,
            [] => {
                return Err(StkError::corruption(
                    "No trunk branch: every tracked branch has a parent",
                ))
            }
            many => {
                let names: Vec<&str> = many.iter().map(|&i| rows[i].name.as_str()).collect();
                return Err(StkError::corruption(format!(
                    "Multiple trunk branches tracked: {}",
                    names.join(", ")
                )));
            }
        };

        let mut parents = vec![None; rows.len()];
        let mut children = vec![Vec::new(); rows.len()];
        for (i, row) in rows.iter().enumerate() {
            let Some(parent) = &row.parent else {
                continue;
            };
            let parent_index = *index.get(parent).ok_or_else(|| {
                StkError::corruption(format!(
                    "Branch '{}' references untracked parent '{}'",
                    row.name, parent
                ))
            })?;
            parents[i] = Some(parent_index);
            children[parent_index].push(i);
        }

        // Each node has one parent, so the nodes reachable from the root form
        // a tree. Anything left over sits on a parent cycle.
        let mut reachable = vec![false; rows.len()];
        let mut pending = vec![root];
        while let Some(i) = pending.pop() {
            reachable[i] = true;
            pending.extend(children[i].iter().copied());
        }
        if reachable.iter().any(|seen| !seen) {
            let detached: Vec<&str> = rows
                .iter()
                .zip(&reachable)
                .filter(|(_, seen)| !**seen)
                .map(|(row, _)| row.name.as_str())
                .collect();
            return Err(StkError::corruption(format!(
                "Branches form a parent cycle and cannot reach the trunk: {}",
                detached.join(", ")
            )));
        }

        Ok(Some(Self {
            rows,
            parents,
            children,
            index,
            root,
        }))
    }

    /// The trunk node
    pub fn base(&self) -> BranchNode<'_> {
        self.node(self.root)
    }

    /// Look up a tracked branch by name
    pub fn get(&self, name: &str) -> Option<BranchNode<'_>> {
        self.index.get(name).map(|&i| self.node(i))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in persisted order
    pub fn rows(&self) -> &[TrackedBranch] {
        &self.rows
    }

    fn node(&self, index: usize) -> BranchNode<'_> {
        BranchNode { tree: self, index }
    }
}

/// A branch inside a [`BranchTree`]
#[derive(Clone, Copy)]
pub struct BranchNode<'a> {
    tree: &'a BranchTree,
    index: usize,
}

impl<'a> BranchNode<'a> {
    pub fn branch(&self) -> &'a TrackedBranch {
        &self.tree.rows[self.index]
    }

    pub fn name(&self) -> &'a str {
        &self.branch().name
    }

    pub fn parent_sha(&self) -> Option<&'a str> {
        self.branch().parent_sha.as_deref()
    }

    pub fn pr_number(&self) -> Option<u64> {
        self.branch().pr_number
    }

    pub fn is_root(&self) -> bool {
        self.index == self.tree.root
    }

    pub fn parent(&self) -> Option<BranchNode<'a>> {
        self.tree.parents[self.index].map(|i| self.tree.node(i))
    }

    /// Children in persisted order
    pub fn children(&self) -> impl ExactSizeIterator<Item = BranchNode<'a>> + 'a {
        let tree = self.tree;
        tree.children[self.index]
            .iter()
            .map(move |&index| BranchNode { tree, index })
    }

    pub fn has_children(&self) -> bool {
        !self.tree.children[self.index].is_empty()
    }

    pub fn child_names(&self) -> Vec<String> {
        self.children().map(|child| child.name().to_string()).collect()
    }

    /// Parent, grandparent, ... up to and including the trunk.
    ///
    /// Lazy; call again to restart from this node.
    pub fn ancestors(&self) -> Ancestors<'a> {
        Ancestors {
            tree: self.tree,
            next: self.tree.parents[self.index],
        }
    }

    /// This node followed by every descendant, depth-first pre-order
    pub fn all(&self) -> Descendants<'a> {
        Descendants {
            tree: self.tree,
            pending: vec![self.index],
        }
    }

    /// Number of ancestors (0 for the trunk)
    pub fn depth(&self) -> usize {
        self.ancestors().count()
    }
}

impl PartialEq for BranchNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.index == other.index
    }
}

impl Eq for BranchNode<'_> {}

impl fmt::Debug for BranchNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BranchNode")
            .field("name", &self.name())
            .field("parent", &self.branch().parent)
            .finish()
    }
}

/// Root-ward walk returned by [`BranchNode::ancestors`]
pub struct Ancestors<'a> {
    tree: &'a BranchTree,
    next: Option<usize>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = BranchNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.parents[current];
        Some(self.tree.node(current))
    }
}

/// Pre-order walk returned by [`BranchNode::all`]
pub struct Descendants<'a> {
    tree: &'a BranchTree,
    pending: Vec<usize>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = BranchNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.pending.pop()?;
        // Reverse so the first child is visited first
        self.pending
            .extend(self.tree.children[current].iter().rev().copied());
        Some(self.tree.node(current))
    }
}
