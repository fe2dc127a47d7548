//! Administrator dashboard
//!
//! Keeps the invite table the admin page renders: every invite with its share
//! link and latest video. Latest videos are fetched for all invites at once
//! and matched back by invite id.
//!
//! Creating an invite and tagging a video reload the table afterwards. A
//! failed reload never hides the outcome of the write: the new invite or the
//! tagged video is still returned and [`AdminDashboard::is_stale`] says the
//! table needs another refresh.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vscreen_core::{
    ClientConfig, Invite, InviteId, InviteManager, ScreeningApi, ScreeningResult, Video, VideoId,
    VideoReviewManager,
};

/// One row of the invite table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteRow {
    /// The invite
    pub invite: Invite,
    /// Link to send to the candidate
    pub share_link: String,
    /// Most recent upload, if any
    pub latest_video: Option<Video>,
}

/// A freshly minted invite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedInvite {
    /// The invite
    pub invite: Invite,
    /// Link to send to the candidate
    pub share_link: String,
}

/// Invite table with per-invite latest videos
pub struct AdminDashboard {
    invites: InviteManager,
    videos: VideoReviewManager,
    latest: RwLock<HashMap<InviteId, Option<Video>>>,
}

impl AdminDashboard {
    /// Dashboard over a collaborator
    pub fn new(api: Arc<dyn ScreeningApi>, client: ClientConfig) -> Self {
        Self {
            invites: InviteManager::new(api.clone(), client),
            videos: VideoReviewManager::new(api),
            latest: RwLock::new(HashMap::new()),
        }
    }

    /// Mint an invite and reload the table
    pub async fn create_invite(&self, email: &str) -> ScreeningResult<CreatedInvite> {
        let invite = self.invites.create_invite(email).await?;
        let share_link = self.invites.share_link(&invite.token);
        info!("Share link for {}: {}", invite.email, share_link);
        self.reload("invite creation").await;
        Ok(CreatedInvite { invite, share_link })
    }

    /// Reload invites and the latest video of each
    pub async fn refresh(&self) -> ScreeningResult<Vec<InviteRow>> {
        let invites = self.invites.list_invites().await?;
        let ids: Vec<InviteId> = invites.iter().map(|i| i.invite_id.clone()).collect();
        let latest = self.videos.latest_videos_for(&ids).await;
        debug!(
            "Dashboard refreshed: {} invites, {} with videos",
            invites.len(),
            latest.values().filter(|v| v.is_some()).count()
        );
        *self.latest.write() = latest;
        Ok(self.rows())
    }

    /// Table as of the last refresh
    pub fn rows(&self) -> Vec<InviteRow> {
        let latest = self.latest.read();
        self.invites
            .cached()
            .into_iter()
            .map(|invite| InviteRow {
                share_link: self.invites.share_link(&invite.token),
                latest_video: latest.get(&invite.invite_id).cloned().flatten(),
                invite,
            })
            .collect()
    }

    /// Latest video of one invite as of the last refresh
    pub fn latest_video(&self, invite_id: &InviteId) -> Option<Video> {
        self.latest.read().get(invite_id).cloned().flatten()
    }

    /// Whether the table predates the last invite creation
    pub fn is_stale(&self) -> bool {
        self.invites.is_stale()
    }

    /// Tag a video and reload the table
    pub async fn tag_video(&self, video_id: &VideoId, tag: &str) -> ScreeningResult<Video> {
        let video = self.videos.set_tag_str(video_id, tag).await?;
        {
            let mut latest = self.latest.write();
            if let Some(Some(shown)) = latest.get_mut(&video.invite_id) {
                if shown.id == video.id {
                    *shown = video.clone();
                }
            }
        }
        self.reload("tagging").await;
        Ok(video)
    }

    async fn reload(&self, after: &str) {
        if let Err(e) = self.refresh().await {
            warn!("Reloading invites after {} failed, table is stale: {}", after, e);
        }
    }

    /// Playback source for a video
    pub fn stream_url(&self, video_id: &VideoId) -> String {
        self.videos.stream_url(video_id)
    }
}
