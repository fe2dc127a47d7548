//! Service error types and handling
//!
//! Each variant corresponds to an HTTP status of the screening API so the
//! in-process service fails exactly the way the remote one would.

use thiserror::Error;
use vscreen_core::ScreeningError;

/// Errors raised by the reference service
#[derive(Error, Debug)]
pub enum ServiceError {
    /// No invite carries the token
    #[error("Invite not found")]
    InviteNotFound,

    /// The invite's token lifetime has passed
    #[error("Invite expired")]
    InviteExpired,

    /// Upload content type is not on the allow list
    #[error("Unsupported media type: {content_type}")]
    UnsupportedMedia {
        /// Rejected content type
        content_type: String,
    },

    /// Upload exceeds the size limit
    #[error("File too large: {size} bytes exceeds {limit}")]
    TooLarge {
        /// Upload size
        size: u64,
        /// Configured limit
        limit: u64,
    },

    /// Unknown video
    #[error("Video not found: {video_id}")]
    VideoNotFound {
        /// Requested video
        video_id: String,
    },

    /// Invite has no videos
    #[error("No videos for invite {invite_id}")]
    NoVideos {
        /// Requested invite
        invite_id: String,
    },

    /// Request body failed validation
    #[error("Unprocessable request: {message}")]
    Unprocessable {
        /// What was wrong
        message: String,
    },

    /// Object storage failure
    #[error("Storage error: {message}")]
    Storage {
        /// Error message
        message: String,
    },

    /// Invalid configuration provided
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Error message
        message: String,
    },
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// HTTP status the remote API answers with
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::InviteNotFound
            | ServiceError::VideoNotFound { .. }
            | ServiceError::NoVideos { .. } => 404,
            ServiceError::InviteExpired => 410,
            ServiceError::UnsupportedMedia { .. } => 415,
            ServiceError::TooLarge { .. } => 413,
            ServiceError::Unprocessable { .. } => 422,
            ServiceError::Storage { .. } | ServiceError::InvalidConfiguration { .. } => 500,
        }
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::Storage {
            message: err.to_string(),
        }
    }
}

impl From<ServiceError> for ScreeningError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InviteNotFound | ServiceError::InviteExpired => {
                ScreeningError::InvalidToken
            }
            ServiceError::InvalidConfiguration { message } => {
                ScreeningError::InvalidConfiguration { message }
            }
            other => ScreeningError::Transport {
                status: Some(other.http_status()),
                message: other.to_string(),
            },
        }
    }
}
