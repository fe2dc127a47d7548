//! In-process screening service

use crate::clock::{Clock, SystemClock};
use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::storage::{MemoryStorage, ObjectStorage, StoredObject};
use crate::store::{InviteRecord, InviteStore, VideoStore};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Duration;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use vscreen_core::{
    validate_email, Artifact, Invite, InviteId, InviteStatus, ResolvedToken, ScreeningApi,
    ScreeningResult, Tag, Token, Video, VideoId,
};

const TOKEN_LENGTH: usize = 32;

fn generate_token() -> Token {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect();
    Token::new(token)
}

fn storage_file_name(file_name: &str) -> String {
    file_name.replace(['/', '\\'], "_")
}

/// Screening service backed by in-memory records and pluggable object storage
pub struct InMemoryScreeningService {
    config: ServiceConfig,
    invites: InviteStore,
    videos: VideoStore,
    storage: Arc<dyn ObjectStorage>,
    clock: Arc<dyn Clock>,
}

impl InMemoryScreeningService {
    /// Service with memory storage and the system clock
    pub fn new(config: ServiceConfig) -> ServiceResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            invites: InviteStore::new(),
            videos: VideoStore::new(),
            storage: Arc::new(MemoryStorage::new()),
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the object storage
    pub fn with_storage(mut self, storage: Arc<dyn ObjectStorage>) -> Self {
        self.storage = storage;
        self
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Active configuration
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Mint an invite valid for the configured token lifetime
    pub fn issue_invite(&self, email: &str) -> ServiceResult<InviteRecord> {
        let email = validate_email(email).map_err(|e| ServiceError::Unprocessable {
            message: e.to_string(),
        })?;
        let now = self.clock.now();
        let record = InviteRecord {
            invite: Invite {
                invite_id: InviteId::new(Uuid::new_v4().to_string()),
                email,
                token: generate_token(),
                status: InviteStatus::Open,
            },
            created_at: now,
            expires_at: now + Duration::minutes(self.config.token_ttl_minutes),
        };
        info!(
            "Issued invite {} (token {}…) expiring {}",
            record.invite.invite_id,
            record.invite.token.short(),
            record.expires_at
        );
        self.invites.insert(record.clone());
        Ok(record)
    }

    /// Stored record of an invite
    pub fn invite_record(&self, invite_id: &InviteId) -> Option<InviteRecord> {
        self.invites.get(invite_id)
    }

    /// Validate and store an upload against a token
    ///
    /// Checks run in order: token known, token unexpired, content type
    /// allowed, size within limit. Nothing is stored unless all pass.
    pub async fn accept_upload(
        &self,
        token: &str,
        file_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> ServiceResult<Video> {
        let record = self
            .invites
            .get_by_token(token)
            .ok_or(ServiceError::InviteNotFound)?;
        if record.is_expired_at(self.clock.now()) {
            warn!("Rejected upload for expired invite {}", record.invite.invite_id);
            return Err(ServiceError::InviteExpired);
        }
        if !self.config.accepts(content_type) {
            return Err(ServiceError::UnsupportedMedia {
                content_type: content_type.to_string(),
            });
        }
        let size = data.len() as u64;
        let limit = self.config.max_upload_bytes();
        if size > limit {
            return Err(ServiceError::TooLarge { size, limit });
        }

        let invite_id = record.invite.invite_id;
        let storage_key = format!(
            "{}/{}-{}",
            invite_id,
            Uuid::new_v4().simple(),
            storage_file_name(file_name)
        );
        self.storage
            .put_object(&storage_key, data, content_type)
            .await?;

        let video = Video {
            id: VideoId::new(Uuid::new_v4().to_string()),
            invite_id: invite_id.clone(),
            storage_key,
            original_name: file_name.to_string(),
            tag: Tag::Pending,
        };
        self.videos.insert(video.clone());
        self.invites.mark_uploaded(&invite_id);
        info!(
            "Stored video {} ({} bytes) for invite {}",
            video.id, size, invite_id
        );
        Ok(video)
    }

    /// Recorded bytes of a video
    pub async fn video_content(&self, video_id: &VideoId) -> ServiceResult<StoredObject> {
        let video = self.find_video(video_id)?;
        self.storage.get_object(&video.storage_key).await
    }

    /// Replace a video's tag
    pub fn tag_video(&self, video_id: &VideoId, tag: Tag) -> ServiceResult<Video> {
        let video = self
            .videos
            .set_tag(video_id, tag)
            .ok_or_else(|| ServiceError::VideoNotFound {
                video_id: video_id.to_string(),
            })?;
        debug!("Video {} tagged {}", video_id, tag);
        Ok(video)
    }

    fn find_video(&self, video_id: &VideoId) -> ServiceResult<Video> {
        self.videos
            .get(video_id)
            .ok_or_else(|| ServiceError::VideoNotFound {
                video_id: video_id.to_string(),
            })
    }
}

#[async_trait]
impl ScreeningApi for InMemoryScreeningService {
    async fn create_invite(&self, email: &str) -> ScreeningResult<Invite> {
        Ok(self.issue_invite(email)?.invite)
    }

    async fn list_invites(&self) -> ScreeningResult<Vec<Invite>> {
        Ok(self
            .invites
            .list()
            .into_iter()
            .map(|record| record.invite)
            .collect())
    }

    async fn resolve_token(&self, token: &Token) -> ScreeningResult<ResolvedToken> {
        let record = self
            .invites
            .get_by_token(token.as_str())
            .ok_or(ServiceError::InviteNotFound)?;
        Ok(ResolvedToken {
            invite_id: Some(record.invite.invite_id),
        })
    }

    async fn latest_video(&self, invite_id: &InviteId) -> ScreeningResult<Video> {
        let video = self
            .videos
            .latest_for(invite_id)
            .ok_or_else(|| ServiceError::NoVideos {
                invite_id: invite_id.to_string(),
            })?;
        Ok(video)
    }

    async fn list_videos(&self, invite_id: &InviteId) -> ScreeningResult<Vec<Video>> {
        Ok(self.videos.list_by_invite(invite_id))
    }

    async fn upload(&self, token: &Token, artifact: &Artifact) -> ScreeningResult<VideoId> {
        let video = self
            .accept_upload(
                token.as_str(),
                &artifact.file_name(),
                artifact.content_type(),
                artifact.data().clone(),
            )
            .await?;
        Ok(video.id)
    }

    async fn get_video(&self, video_id: &VideoId) -> ScreeningResult<Video> {
        Ok(self.find_video(video_id)?)
    }

    async fn set_tag(&self, video_id: &VideoId, tag: Tag) -> ScreeningResult<Video> {
        Ok(self.tag_video(video_id, tag)?)
    }

    fn stream_url(&self, video_id: &VideoId) -> String {
        format!(
            "{}/videos/{}/stream",
            self.config.api_base.trim_end_matches('/'),
            video_id
        )
    }
}
