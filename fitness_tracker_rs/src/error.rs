use thiserror::Error;

/// Tracker error types
///
/// Poor-accuracy fixes and degenerate arithmetic are not errors; they simply
/// leave the session unchanged for that cycle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackerError {
    #[error("Location permission not granted")]
    PermissionDenied,

    #[error("Session already tracking")]
    AlreadyTracking,

    #[error("Session not tracking")]
    NotTracking,

    #[error("Invalid session state: {0}")]
    InvalidState(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for tracker operations
pub type TrackerResult<T> = Result<T, TrackerError>;

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::Serialization(err.to_string())
    }
}
