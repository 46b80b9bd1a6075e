use thiserror::Error;

/// Result type for tracker operations.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Errors returned by tracker client implementations.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("tracker {0}: not found")]
    NotFound(String),
    #[error("tracker {operation}: unauthorized (status {status})")]
    Unauthorized { operation: String, status: u16 },
    #[error("tracker {operation} failed with status {status}: {body}")]
    Status {
        operation: String,
        status: u16,
        body: String,
    },
    #[error("tracker {operation} request failed")]
    Transport {
        operation: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to decode tracker {operation}")]
    Decode {
        operation: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

impl TrackerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
