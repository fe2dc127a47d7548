//! Capture error types and handling
//!
//! Errors raised by the capture engine seam and the capture session. They fold
//! into the crate-wide [`ScreeningError`] taxonomy at the API boundary.

use thiserror::Error;
use vscreen_core::ScreeningError;

/// Main error type for capture operations
#[derive(Error, Debug)]
pub enum MediaError {
    /// Permission denied error
    #[error("Permission denied: {operation}")]
    PermissionDenied {
        /// Operation that was denied
        operation: String,
    },

    /// Device not found error
    #[error("Device not found: {kind}")]
    DeviceNotFound {
        /// Device kind that is missing
        kind: String,
    },

    /// Device already held by another session
    #[error("Device busy: {device_id}")]
    DeviceBusy {
        /// Device identifier
        device_id: String,
    },

    /// Session has no stream or recorder yet
    #[error("Capture session not initialized")]
    NotInitialized,

    /// Invalid state for operation
    #[error("Invalid state: expected {expected}, got {actual}")]
    InvalidState {
        /// Expected phase
        expected: String,
        /// Actual phase
        actual: String,
    },

    /// Recorder failed to start or stop
    #[error("Recorder error: {reason}")]
    Recorder {
        /// Failure reason
        reason: String,
    },

    /// Unsupported format error
    #[error("Unsupported format: {format}")]
    UnsupportedFormat {
        /// Format description
        format: String,
    },

    /// Invalid configuration provided
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Error message
        message: String,
    },

    /// Timers need a tokio runtime
    #[error("No async runtime available: {reason}")]
    RuntimeUnavailable {
        /// Underlying error
        reason: String,
    },
}

/// Result type alias for capture operations
pub type MediaResult<T> = Result<T, MediaError>;

impl MediaError {
    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            MediaError::DeviceBusy { .. } => true,
            MediaError::Recorder { .. } => true,
            MediaError::PermissionDenied { .. } => false,
            MediaError::DeviceNotFound { .. } => false,
            MediaError::UnsupportedFormat { .. } => false,
            MediaError::InvalidConfiguration { .. } => false,
            _ => false,
        }
    }

    /// True for failures that mean the camera or microphone cannot be used
    pub fn is_device_error(&self) -> bool {
        matches!(
            self,
            MediaError::PermissionDenied { .. }
                | MediaError::DeviceNotFound { .. }
                | MediaError::DeviceBusy { .. }
        )
    }
}

impl From<MediaError> for ScreeningError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::PermissionDenied { .. }
            | MediaError::DeviceNotFound { .. }
            | MediaError::DeviceBusy { .. } => ScreeningError::DeviceUnavailable {
                reason: err.to_string(),
            },
            MediaError::NotInitialized => ScreeningError::InvalidState {
                expected: "initialized capture session".to_string(),
                actual: "uninitialized".to_string(),
            },
            MediaError::InvalidState { expected, actual } => {
                ScreeningError::InvalidState { expected, actual }
            }
            MediaError::InvalidConfiguration { message } => {
                ScreeningError::InvalidConfiguration { message }
            }
            other => ScreeningError::Capture {
                reason: other.to_string(),
            },
        }
    }
}
