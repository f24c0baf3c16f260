//! In-memory `Vcs` double for unit tests.
//!
//! Each branch is a list of commit ids, oldest first. A restack replays the
//! commits after the recorded old base (or, without a usable base, the ids
//! prefixed with `<branch>:`) on top of the parent's history under fresh
//! ids, the way a real rebase rewrites SHAs.

use crate::errors::{Result, StkError};
use crate::git::{CreateBranchResult, Vcs};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};

#[derive(Default)]
struct FakeState {
    histories: BTreeMap<String, Vec<String>>,
    current: String,
    conflicts: HashSet<String>,
    pending: Option<(String, String, Option<String>)>,
    calls: Vec<String>,
    bases: Vec<(String, Option<String>)>,
    ancestry_queries: usize,
    counter: usize,
}

impl FakeState {
    fn next_id(&mut self, branch: &str) -> String {
        self.counter += 1;
        format!("{branch}:{}", self.counter)
    }

    fn history(&self, branch: &str) -> Result<&Vec<String>> {
        self.histories
            .get(branch)
            .ok_or_else(|| StkError::branch(format!("Branch '{branch}' not found")))
    }

    fn replay(&mut self, branch: &str, parent: &str, old_base: Option<&str>) -> Result<()> {
        let prefix = format!("{branch}:");
        let history = self.history(branch)?;
        let own = match old_base.and_then(|base| history.iter().position(|id| id == base)) {
            Some(pos) => history.len() - pos - 1,
            None => history.iter().filter(|id| id.starts_with(&prefix)).count(),
        };
        let mut history = self.history(parent)?.clone();
        for _ in 0..own {
            let id = self.next_id(branch);
            history.push(id);
        }
        self.histories.insert(branch.to_string(), history);
        Ok(())
    }
}

pub struct FakeVcs {
    state: RefCell<FakeState>,
}

impl FakeVcs {
    pub fn new(trunk: &str) -> Self {
        let vcs = Self {
            state: RefCell::new(FakeState::default()),
        };
        {
            let mut state = vcs.state.borrow_mut();
            let id = state.next_id(trunk);
            state.histories.insert(trunk.to_string(), vec![id]);
            state.current = trunk.to_string();
        }
        vcs
    }

    /// Create `name` from `from` with one commit of its own
    pub fn branch(&self, name: &str, from: &str) {
        let mut state = self.state.borrow_mut();
        let mut history = state.histories[from].clone();
        let id = state.next_id(name);
        history.push(id);
        state.histories.insert(name.to_string(), history);
    }

    /// Add a commit to `name` and return the new tip
    pub fn commit(&self, name: &str) -> String {
        let mut state = self.state.borrow_mut();
        let id = state.next_id(name);
        if let Some(history) = state.histories.get_mut(name) {
            history.push(id.clone());
        }
        id
    }

    pub fn reset_history(&self, name: &str, ids: &[&str]) {
        self.state.borrow_mut().histories.insert(
            name.to_string(),
            ids.iter().map(|id| id.to_string()).collect(),
        );
    }

    pub fn sha(&self, name: &str) -> String {
        self.state.borrow().histories[name]
            .last()
            .cloned()
            .unwrap_or_default()
    }

    pub fn contains_commit(&self, name: &str, id: &str) -> bool {
        self.state.borrow().histories[name].iter().any(|c| c == id)
    }

    /// Make the next restack of `name` stop on conflicts
    pub fn conflict_on(&self, name: &str) {
        self.state.borrow_mut().conflicts.insert(name.to_string());
    }

    pub fn resolve(&self, name: &str) {
        self.state.borrow_mut().conflicts.remove(name);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Old base passed to each restack, in call order
    pub fn restack_bases(&self) -> Vec<(String, Option<String>)> {
        self.state.borrow().bases.clone()
    }

    pub fn ancestry_queries(&self) -> usize {
        self.state.borrow().ancestry_queries
    }

    pub fn rebase_pending(&self) -> bool {
        self.state.borrow().pending.is_some()
    }
}

impl Vcs for FakeVcs {
    fn current_branch_name(&self) -> Result<String> {
        Ok(self.state.borrow().current.clone())
    }

    fn branches(&self) -> Result<Vec<String>> {
        Ok(self.state.borrow().histories.keys().cloned().collect())
    }

    fn branch_exists(&self, name: &str) -> bool {
        self.state.borrow().histories.contains_key(name)
    }

    fn checkout(&self, name: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.history(name)?;
        state.calls.push(format!("checkout {name}"));
        state.current = name.to_string();
        Ok(())
    }

    fn get_sha(&self, name: &str) -> Result<String> {
        let state = self.state.borrow();
        Ok(state.history(name)?.last().cloned().unwrap_or_default())
    }

    fn is_ancestor(&self, branch: &str, possible_ancestor: &str) -> Result<bool> {
        let mut state = self.state.borrow_mut();
        state.ancestry_queries += 1;
        let tip = state.history(possible_ancestor)?.last().cloned();
        let history = state.history(branch)?;
        Ok(tip.is_some_and(|tip| history.contains(&tip)))
    }

    fn restack(
        &self,
        branch: &str,
        parent: &str,
        parent_sha: &str,
        old_base: Option<&str>,
    ) -> Result<bool> {
        let mut state = self.state.borrow_mut();
        state.calls.push(format!("restack {branch} onto {parent}"));
        state
            .bases
            .push((branch.to_string(), old_base.map(str::to_string)));
        if state.history(parent)?.last().map(String::as_str) != Some(parent_sha) {
            return Err(StkError::rebase(format!("stale target for {branch}")));
        }
        let old_base = old_base.map(str::to_string);
        if state.conflicts.contains(branch) {
            state.pending = Some((branch.to_string(), parent.to_string(), old_base));
            return Ok(false);
        }
        state.replay(branch, parent, old_base.as_deref())?;
        Ok(true)
    }

    fn continue_rebase(&self, branch: &str) -> Result<bool> {
        let mut state = self.state.borrow_mut();
        state.calls.push(format!("continue {branch}"));
        if state.conflicts.contains(branch) {
            return Ok(false);
        }
        if let Some((pending, parent, old_base)) = state.pending.take() {
            state.replay(&pending, &parent, old_base.as_deref())?;
        }
        Ok(true)
    }

    fn abort_rebase(&self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push("abort".to_string());
        state.pending = None;
        Ok(())
    }

    fn create_branch_from_current(&self, name: &str) -> Result<CreateBranchResult> {
        let mut state = self.state.borrow_mut();
        if state.histories.contains_key(name) {
            return Ok(CreateBranchResult::AlreadyExists);
        }
        let current = state.current.clone();
        let history = state.history(&current)?.clone();
        state.histories.insert(name.to_string(), history);
        Ok(CreateBranchResult::Success)
    }

    fn rename_branch(&self, name: &str, new_name: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let history = state
            .histories
            .remove(name)
            .ok_or_else(|| StkError::branch(format!("Branch '{name}' not found")))?;
        state.histories.insert(new_name.to_string(), history);
        if state.current == name {
            state.current = new_name.to_string();
        }
        Ok(())
    }

    fn delete_branch(&self, name: &str) -> Result<()> {
        self.state.borrow_mut().histories.remove(name);
        Ok(())
    }

    fn push_branches(&self, names: &[String]) -> Result<()> {
        self.state
            .borrow_mut()
            .calls
            .push(format!("push {}", names.join(",")));
        Ok(())
    }

    fn pull(&self, branch: &str) -> Result<()> {
        self.state.borrow_mut().calls.push(format!("pull {branch}"));
        Ok(())
    }
}
