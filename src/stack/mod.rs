//! Stack management module
//!
//! - Tracked branch rows and the tree built from them
//! - Drift detection against the version-control state
//! - The resumable operation lock
//! - Restack orchestration over the lock

pub mod branch;
pub mod drift;
pub mod lock;
pub mod manager;
pub mod restack;
pub mod store;
pub mod tree;

#[cfg(test)]
pub(crate) mod test_support;

pub use branch::TrackedBranch;
pub use drift::{drifted_branches, needs_restack};
pub use lock::{LockRecord, LockScope, LockState, Locker, Operation, OperationOutcome};
pub use manager::StackManager;
pub use restack::{abort_restack, continue_restack, restack_order, run_restack, Restacker};
pub use store::{
    BranchStore, JsonBranchStore, JsonLockStore, LockStore, MemoryBranchStore, MemoryLockStore,
    LOCK_FILE,
};
pub use tree::{BranchNode, BranchTree};
