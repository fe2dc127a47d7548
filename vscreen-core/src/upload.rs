//! Upload submission
//!
//! Packages a finished artifact with the candidate's token into one request.
//! Empty recordings are rejected locally so no request ever carries them.

use crate::api::ScreeningApi;
use crate::artifact::Artifact;
use crate::error::{ScreeningError, ScreeningResult};
use crate::model::{InviteStatus, Token, VideoId};
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of an accepted upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Video created by the collaborator
    pub video_id: VideoId,
    /// Name the artifact was declared under
    pub file_name: String,
    /// Invite state after the upload, as reported by the collaborator
    pub invite_status: InviteStatus,
}

/// Submits recordings against invite tokens
pub struct UploadSubmitter {
    api: Arc<dyn ScreeningApi>,
}

impl UploadSubmitter {
    /// Create a submitter over a collaborator
    pub fn new(api: Arc<dyn ScreeningApi>) -> Self {
        Self { api }
    }

    /// Upload an artifact for a token
    pub async fn submit(&self, artifact: &Artifact, token: &Token) -> ScreeningResult<UploadReceipt> {
        if artifact.is_empty() {
            warn!("Refusing to upload an empty recording");
            return Err(ScreeningError::EmptyArtifact);
        }
        if token.is_blank() {
            return Err(ScreeningError::InvalidToken);
        }

        let video_id = self.api.upload(token, artifact).await?;
        info!("Upload accepted as video {}", video_id);

        Ok(UploadReceipt {
            video_id,
            file_name: artifact.file_name(),
            invite_status: InviteStatus::Uploaded,
        })
    }
}
