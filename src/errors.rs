/// Stk Error Types
#[derive(Debug, thiserror::Error)]
pub enum StkError {
    /// Git-related errors
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Branch management errors
    #[error("Branch error: {0}")]
    Branch(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Persisted stack state that cannot form a valid tree
    #[error("Stack corruption: {0}")]
    Corruption(String),

    /// Rebase operation errors
    #[error("Rebase error: {0}")]
    Rebase(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// A branch or record that was expected to exist does not
    #[error("Not found: {0}")]
    NotFound(String),

    /// A stack operation is already recorded in the lock
    #[error(
        "An operation is already in progress ({0}). Run 'stk continue' to resume it or 'stk abort' to cancel it."
    )]
    OperationInProgress(String),

    /// Continue/abort was requested but nothing is recorded in the lock
    #[error("No operation in progress")]
    NoOperationInProgress,

    /// Untracking would orphan tracked children
    #[error("Branch '{branch}' still has tracked children: {}", children.join(", "))]
    HasChildren {
        branch: String,
        children: Vec<String>,
    },
}

impl StkError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        StkError::Config(msg.into())
    }

    pub fn branch<S: Into<String>>(msg: S) -> Self {
        StkError::Branch(msg.into())
    }

    pub fn validation<S: Into<String>>(msg: S) -> Self {
        StkError::Validation(msg.into())
    }

    pub fn corruption<S: Into<String>>(msg: S) -> Self {
        StkError::Corruption(msg.into())
    }

    pub fn rebase<S: Into<String>>(msg: S) -> Self {
        StkError::Rebase(msg.into())
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        StkError::NotFound(msg.into())
    }

    pub fn not_initialized<S: Into<String>>(msg: S) -> Self {
        StkError::config(msg.into())
    }

    pub fn not_tracked(branch: &str) -> Self {
        StkError::NotFound(format!(
            "Branch '{branch}' is not tracked. Track it first with 'stk track {branch}'"
        ))
    }
}

pub type Result<T> = std::result::Result<T, StkError>;
