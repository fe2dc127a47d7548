//! Screening service collaborator interface
//!
//! The storage/service layer is consumed only through this trait. The HTTP
//! client in [`crate::http`] talks to a remote deployment; the reference
//! service crate implements it in-process.

use crate::artifact::Artifact;
use crate::error::ScreeningResult;
use crate::model::{Invite, InviteId, ResolvedToken, Tag, Token, Video, VideoId};
use async_trait::async_trait;

/// Operations offered by the screening service
#[async_trait]
pub trait ScreeningApi: Send + Sync {
    /// `POST /invites`: mint a new invite
    async fn create_invite(&self, email: &str) -> ScreeningResult<Invite>;

    /// `GET /invites`: every invite, already normalized
    async fn list_invites(&self) -> ScreeningResult<Vec<Invite>>;

    /// `GET /invites/{token}`: fails with `InvalidToken` unless the token is live
    async fn resolve_token(&self, token: &Token) -> ScreeningResult<ResolvedToken>;

    /// `GET /invites/{inviteId}/videos/latest`
    async fn latest_video(&self, invite_id: &InviteId) -> ScreeningResult<Video>;

    /// `GET /videos?inviteId=...`, in the collaborator's order
    async fn list_videos(&self, invite_id: &InviteId) -> ScreeningResult<Vec<Video>>;

    /// `POST /upload/{token}` with the artifact as multipart field `file`
    async fn upload(&self, token: &Token, artifact: &Artifact) -> ScreeningResult<VideoId>;

    /// `GET /videos/{id}`
    async fn get_video(&self, video_id: &VideoId) -> ScreeningResult<Video>;

    /// `POST /videos/{id}/tag`
    async fn set_tag(&self, video_id: &VideoId, tag: Tag) -> ScreeningResult<Video>;

    /// Playback source for `GET /videos/{id}/stream`; never fetched by the client
    fn stream_url(&self, video_id: &VideoId) -> String;
}
