use fitness_tracker_rs::TrackerError;
use jni::JNIEnv;
use thiserror::Error;

/// JNI bridge error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JniBridgeError {
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error("JNI error: {0}")]
    JniError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<jni::errors::Error> for JniBridgeError {
    fn from(err: jni::errors::Error) -> Self {
        JniBridgeError::JniError(err.to_string())
    }
}

/// Result type for JNI operations
pub type JResult<T> = Result<T, JniBridgeError>;

/// Java exception class thrown for `error`
pub fn exception_class(error: &JniBridgeError) -> &'static str {
    match error {
        JniBridgeError::Tracker(TrackerError::PermissionDenied) => "java/lang/SecurityException",
        JniBridgeError::Tracker(
            TrackerError::AlreadyTracking
            | TrackerError::NotTracking
            | TrackerError::InvalidState(_),
        ) => "java/lang/IllegalStateException",
        JniBridgeError::Tracker(TrackerError::InvalidParameters(_)) => {
            "java/lang/IllegalArgumentException"
        }
        JniBridgeError::Tracker(TrackerError::Serialization(_) | TrackerError::Internal(_))
        | JniBridgeError::JniError(_)
        | JniBridgeError::Internal(_) => "java/lang/RuntimeException",
    }
}

/// Throw Java exception from Rust error
pub fn throw_java_exception(env: &mut JNIEnv, error: &JniBridgeError) -> JResult<()> {
    log::warn!("Throwing {}: {}", exception_class(error), error);
    env.throw_new(exception_class(error), error.to_string())
        .map_err(|_| JniBridgeError::JniError("Failed to throw exception".to_string()))?;

    Ok(())
}
