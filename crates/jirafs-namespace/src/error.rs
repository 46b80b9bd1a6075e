use jirafs_tracker::{TrackerError, WorkflowError};
use thiserror::Error;

/// Result type for namespace operations.
pub type FsResult<T> = Result<T, FsError>;

/// Errors surfaced to the filesystem host.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("'{0}' not found")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error(transparent)]
    Remote(#[from] TrackerError),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("{0} already committed")]
    AlreadyCommitted(String),
    #[error(transparent)]
    NoPathFound(#[from] WorkflowError),
    /// A multi-step operation stopped at `step` (1-based); earlier steps stay
    /// applied.
    #[error("step {step} ({action}) failed: {source}")]
    StepFailed {
        step: usize,
        action: String,
        #[source]
        source: TrackerError,
    },
    #[error("'{0}' is not a directory")]
    NotADirectory(String),
    #[error("'{0}' is a directory")]
    IsADirectory(String),
}
