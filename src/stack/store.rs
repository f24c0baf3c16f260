use super::branch::TrackedBranch;
use super::lock::LockRecord;
use crate::errors::{Result, StkError};
use crate::utils::atomic_file;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the lock row inside the git directory
pub const LOCK_FILE: &str = "STK_OPERATION";

/// Durable storage for the tracked branch rows.
///
/// `save` replaces the whole row set at once; readers never observe a
/// partially applied mutation.
pub trait BranchStore {
    fn load(&self) -> Result<Vec<TrackedBranch>>;

    fn save(&mut self, rows: &[TrackedBranch]) -> Result<()>;
}

/// Durable storage for the single optional lock row
pub trait LockStore {
    fn read(&self) -> Result<Option<LockRecord>>;

    fn write(&mut self, record: &LockRecord) -> Result<()>;

    fn delete(&mut self) -> Result<()>;

    fn exists(&self) -> Result<bool> {
        Ok(self.read()?.is_some())
    }
}

/// Branch rows as a JSON array on disk
#[derive(Debug, Clone)]
pub struct JsonBranchStore {
    path: PathBuf,
}

impl JsonBranchStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<repo>/.stk/branches.json`
    pub fn for_repo(repo_path: &Path) -> Self {
        Self::new(crate::config::branches_file(repo_path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BranchStore for JsonBranchStore {
    fn load(&self) -> Result<Vec<TrackedBranch>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| StkError::config(format!("Failed to read branch metadata: {e}")))?;
        let rows: Vec<TrackedBranch> = serde_json::from_str(&content).map_err(|e| {
            StkError::corruption(format!(
                "Failed to parse {}: {e}",
                self.path.display()
            ))
        })?;

        debug!("Loaded {} tracked branches from {:?}", rows.len(), self.path);
        Ok(rows)
    }

    fn save(&mut self, rows: &[TrackedBranch]) -> Result<()> {
        atomic_file::write_json(&self.path, &rows)?;
        debug!("Saved {} tracked branches to {:?}", rows.len(), self.path);
        Ok(())
    }
}

/// Lock row as a JSON file, normally `<git-dir>/STK_OPERATION`
#[derive(Debug, Clone)]
pub struct JsonLockStore {
    path: PathBuf,
}

impl JsonLockStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store inside the per-worktree git directory
    pub fn for_git_dir(git_dir: &Path) -> Self {
        Self::new(git_dir.join(LOCK_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LockStore for JsonLockStore {
    fn read(&self) -> Result<Option<LockRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path)
            .map_err(|e| StkError::config(format!("Failed to read operation state: {e}")))?;
        let record = serde_json::from_str(&json).map_err(|e| {
            StkError::corruption(format!("Failed to parse operation state: {e}"))
        })?;

        Ok(Some(record))
    }

    fn write(&mut self, record: &LockRecord) -> Result<()> {
        atomic_file::write_json(&self.path, record)?;
        debug!("Saved operation state to {:?}", self.path);
        Ok(())
    }

    fn delete(&mut self) -> Result<()> {
        atomic_file::remove_if_exists(&self.path)?;
        debug!("Deleted operation state file");
        Ok(())
    }

    fn exists(&self) -> Result<bool> {
        Ok(self.path.exists())
    }
}

/// Branch rows held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryBranchStore {
    rows: Vec<TrackedBranch>,
}

impl MemoryBranchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<TrackedBranch>) -> Self {
        Self { rows }
    }
}

impl BranchStore for MemoryBranchStore {
    fn load(&self) -> Result<Vec<TrackedBranch>> {
        Ok(self.rows.clone())
    }

    fn save(&mut self, rows: &[TrackedBranch]) -> Result<()> {
        self.rows = rows.to_vec();
        Ok(())
    }
}

/// Lock row held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryLockStore {
    record: Option<LockRecord>,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LockStore for MemoryLockStore {
    fn read(&self) -> Result<Option<LockRecord>> {
        Ok(self.record.clone())
    }

    fn write(&mut self, record: &LockRecord) -> Result<()> {
        self.record = Some(record.clone());
        Ok(())
    }

    fn delete(&mut self) -> Result<()> {
        self.record = None;
        Ok(())
    }
}
