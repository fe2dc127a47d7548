//! Error types for vscreen
//!
//! Every fallible operation in the recording-and-upload pipeline and the
//! invite/video lifecycle reports one of these variants. Collaborator failures
//! are surfaced once; nothing in this crate retries on its own.

use thiserror::Error;

/// Main error type for screening operations
#[derive(Error, Debug)]
pub enum ScreeningError {
    /// Camera or microphone could not be acquired
    #[error("Capture device unavailable: {reason}")]
    DeviceUnavailable {
        /// Why the device could not be acquired
        reason: String,
    },

    /// The recording produced no bytes
    #[error("Recording is empty, re-record before uploading")]
    EmptyArtifact,

    /// The invite token is unknown, expired or already consumed
    #[error("Invalid or expired invite link")]
    InvalidToken,

    /// Invite e-mail failed validation
    #[error("Invalid e-mail address: {email:?}")]
    InvalidEmail {
        /// Rejected input
        email: String,
    },

    /// Tag value outside the review vocabulary
    #[error("Invalid tag: {value:?} (expected one of pending, advance, review, pass)")]
    InvalidTag {
        /// Rejected input
        value: String,
    },

    /// Operation called from the wrong state
    #[error("Invalid state: expected {expected}, got {actual}")]
    InvalidState {
        /// Expected state
        expected: String,
        /// Actual state
        actual: String,
    },

    /// Configuration value missing, malformed or out of range
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// What is wrong with it
        message: String,
    },

    /// Recorder or capture pipeline failure other than device acquisition
    #[error("Capture failed: {reason}")]
    Capture {
        /// Failure reason
        reason: String,
    },

    /// Any other network or non-success collaborator outcome
    #[error("Transport error{}: {message}", status.map(|s| format!(" (status {})", s)).unwrap_or_default())]
    Transport {
        /// HTTP status, when the collaborator answered at all
        status: Option<u16>,
        /// Status text or underlying error
        message: String,
    },
}

/// Result type alias for screening operations
pub type ScreeningResult<T> = Result<T, ScreeningError>;

impl ScreeningError {
    /// Build a transport error from an HTTP status line
    pub fn from_status(status: u16, reason: &str) -> Self {
        ScreeningError::Transport {
            status: Some(status),
            message: format!("{} {}", status, reason).trim_end().to_string(),
        }
    }

    /// HTTP status attached to a transport failure
    pub fn status(&self) -> Option<u16> {
        match self {
            ScreeningError::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Get error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ScreeningError::DeviceUnavailable { .. } => "DEVICE_UNAVAILABLE",
            ScreeningError::EmptyArtifact => "EMPTY_ARTIFACT",
            ScreeningError::InvalidToken => "INVALID_TOKEN",
            ScreeningError::InvalidEmail { .. } => "INVALID_EMAIL",
            ScreeningError::InvalidTag { .. } => "INVALID_TAG",
            ScreeningError::InvalidState { .. } => "INVALID_STATE",
            ScreeningError::InvalidConfiguration { .. } => "INVALID_CONFIGURATION",
            ScreeningError::Capture { .. } => "CAPTURE_FAILED",
            ScreeningError::Transport { .. } => "TRANSPORT_ERROR",
        }
    }

    /// Whether the user can reasonably try the same action again
    ///
    /// Invalid tokens are terminal for the candidate flow; validation failures
    /// need different input rather than a retry.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ScreeningError::DeviceUnavailable { .. } => true,
            ScreeningError::EmptyArtifact => true,
            ScreeningError::Transport { .. } => true,
            ScreeningError::Capture { .. } => true,
            ScreeningError::InvalidToken => false,
            ScreeningError::InvalidEmail { .. } => false,
            ScreeningError::InvalidTag { .. } => false,
            ScreeningError::InvalidState { .. } => false,
            ScreeningError::InvalidConfiguration { .. } => false,
        }
    }

    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            ScreeningError::DeviceUnavailable { .. } => ErrorCategory::Device,
            ScreeningError::Capture { .. } => ErrorCategory::Device,
            ScreeningError::EmptyArtifact => ErrorCategory::Validation,
            ScreeningError::InvalidEmail { .. } => ErrorCategory::Validation,
            ScreeningError::InvalidTag { .. } => ErrorCategory::Validation,
            ScreeningError::InvalidToken => ErrorCategory::Access,
            ScreeningError::InvalidState { .. } => ErrorCategory::State,
            ScreeningError::InvalidConfiguration { .. } => ErrorCategory::Configuration,
            ScreeningError::Transport { .. } => ErrorCategory::Network,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Camera, microphone and recorder errors
    Device,
    /// Input rejected before any I/O
    Validation,
    /// Capability token rejected
    Access,
    /// State machine misuse
    State,
    /// Settings rejected at startup
    Configuration,
    /// Collaborator and network errors
    Network,
}

impl From<reqwest::Error> for ScreeningError {
    fn from(err: reqwest::Error) -> Self {
        ScreeningError::Transport {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScreeningError::from_status(503, "Service Unavailable");
        assert_eq!(
            err.to_string(),
            "Transport error (status 503): 503 Service Unavailable"
        );

        let err = ScreeningError::Transport {
            status: None,
            message: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "Transport error: connection refused");
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(ScreeningError::InvalidToken.category(), ErrorCategory::Access);
        assert!(!ScreeningError::InvalidToken.is_recoverable());

        assert_eq!(ScreeningError::EmptyArtifact.error_code(), "EMPTY_ARTIFACT");
        assert!(ScreeningError::EmptyArtifact.is_recoverable());

        let err = ScreeningError::from_status(500, "Internal Server Error");
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.status(), Some(500));
    }
}
