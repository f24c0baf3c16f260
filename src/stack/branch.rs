use serde::{Deserialize, Serialize};

/// One persisted row of the stack: a branch stk is tracking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedBranch {
    /// Branch name, unique across rows
    pub name: String,
    /// Name of the parent branch (None only for the trunk)
    pub parent: Option<String>,
    /// Tip of `parent` when this branch was last tracked or restacked
    pub parent_sha: Option<String>,
    /// Pull request number once one has been opened
    #[serde(default)]
    pub pr_number: Option<u64>,
}

impl TrackedBranch {
    /// Row for the root of the tree
    pub fn trunk(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            parent_sha: None,
            pr_number: None,
        }
    }

    /// Row for a branch stacked on `parent` at `parent_sha`
    pub fn child_of(
        name: impl Into<String>,
        parent: impl Into<String>,
        parent_sha: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            parent: Some(parent.into()),
            parent_sha: Some(parent_sha.into()),
            pr_number: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
