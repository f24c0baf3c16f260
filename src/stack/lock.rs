//! Resumable operation lock.
//!
//! A long-running stack mutation is recorded as a single row before any work
//! starts and rewritten after every unit of work. If the process stops for
//! any reason (conflict, crash, Ctrl-C) the row survives and the next
//! invocation can continue from the last checkpoint or cancel.

use super::store::LockStore;
use crate::errors::{Result, StkError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Persisted description of an in-progress mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Rebase `branches` in order; the queue shrinks from the front
    Restack {
        starting_branch: String,
        branches: Vec<String>,
    },
}

impl Operation {
    pub fn restack(starting_branch: impl Into<String>, branches: Vec<String>) -> Self {
        Operation::Restack {
            starting_branch: starting_branch.into(),
            branches,
        }
    }

    /// Branch checked out when the operation began
    pub fn starting_branch(&self) -> &str {
        match self {
            Operation::Restack {
                starting_branch, ..
            } => starting_branch,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Restack { branches, .. } if branches.is_empty() => {
                write!(f, "restack, nothing remaining")
            }
            Operation::Restack { branches, .. } => {
                write!(f, "restack of {}", branches.join(", "))
            }
        }
    }
}

/// The lock row as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockRecord {
    pub operation: Operation,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LockRecord {
    pub fn new(operation: Operation) -> Self {
        let now = Utc::now();
        Self {
            operation,
            started_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockState {
    Unlocked,
    Locked(Operation),
}

/// How an operation body ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationOutcome {
    /// All work done; the lock row is removed
    Completed,
    /// Stopped for the user; the lock row keeps the last checkpoint
    Suspended,
}

/// Checkpoint handle given to an operation body.
///
/// Only `Locker` creates one, so checkpoints cannot be written while
/// unlocked.
pub struct LockScope<'a, L: LockStore> {
    store: &'a mut L,
    record: LockRecord,
}

impl<L: LockStore> LockScope<'_, L> {
    pub fn operation(&self) -> &Operation {
        &self.record.operation
    }

    /// Persist `operation` as the new checkpoint
    pub fn update_operation(&mut self, operation: Operation) -> Result<()> {
        self.record.operation = operation;
        self.record.updated_at = Utc::now();
        self.store.write(&self.record)?;
        debug!("Checkpointed {}", self.record.operation);
        Ok(())
    }
}

/// State machine over the lock row: `Unlocked` or `Locked(op)`
pub struct Locker<L: LockStore> {
    store: L,
}

impl<L: LockStore> Locker<L> {
    pub fn new(store: L) -> Self {
        Self { store }
    }

    pub fn state(&self) -> Result<LockState> {
        Ok(match self.store.read()? {
            Some(record) => LockState::Locked(record.operation),
            None => LockState::Unlocked,
        })
    }

    /// Full persisted row, including timestamps
    pub fn record(&self) -> Result<Option<LockRecord>> {
        self.store.read()
    }

    pub fn has_lock(&self) -> Result<bool> {
        self.store.exists()
    }

    /// Fail when an operation is waiting to be continued or aborted
    pub fn ensure_unlocked(&self) -> Result<()> {
        match self.state()? {
            LockState::Unlocked => Ok(()),
            LockState::Locked(operation) => {
                Err(StkError::OperationInProgress(operation.to_string()))
            }
        }
    }

    /// Record `operation` and run `body` under the lock.
    ///
    /// Fails without touching the row when already locked. The row is
    /// removed only when `body` returns `Completed`; a suspension or an
    /// error leaves it for `continue_operation` / `cancel_operation`.
    pub fn begin_operation<F>(&mut self, operation: Operation, body: F) -> Result<OperationOutcome>
    where
        F: FnOnce(&mut LockScope<'_, L>) -> Result<OperationOutcome>,
    {
        if let Some(existing) = self.store.read()? {
            return Err(StkError::OperationInProgress(existing.operation.to_string()));
        }

        let record = LockRecord::new(operation);
        self.store.write(&record)?;
        info!("Started {}", record.operation);

        let mut scope = LockScope {
            store: &mut self.store,
            record,
        };
        let outcome = body(&mut scope)?;
        self.finish(outcome)
    }

    /// Resume the persisted operation
    pub fn continue_operation<F>(&mut self, body: F) -> Result<OperationOutcome>
    where
        F: FnOnce(Operation, &mut LockScope<'_, L>) -> Result<OperationOutcome>,
    {
        let record = self
            .store
            .read()?
            .ok_or(StkError::NoOperationInProgress)?;
        let operation = record.operation.clone();
        info!("Continuing {}", operation);

        let mut scope = LockScope {
            store: &mut self.store,
            record,
        };
        let outcome = body(operation, &mut scope)?;
        self.finish(outcome)
    }

    /// Hand the persisted operation to `body` for cleanup, then unlock.
    ///
    /// If `body` fails the row stays so the cancel can be retried.
    pub fn cancel_operation<F>(&mut self, body: F) -> Result<Operation>
    where
        F: FnOnce(&Operation) -> Result<()>,
    {
        let record = self
            .store
            .read()?
            .ok_or(StkError::NoOperationInProgress)?;

        body(&record.operation)?;
        self.store.delete()?;
        info!("Cancelled {}", record.operation);

        Ok(record.operation)
    }

    fn finish(&mut self, outcome: OperationOutcome) -> Result<OperationOutcome> {
        match outcome {
            OperationOutcome::Completed => {
                self.store.delete()?;
                debug!("Operation completed, lock released");
            }
            OperationOutcome::Suspended => debug!("Operation suspended, lock kept"),
        }
        Ok(outcome)
    }
}
