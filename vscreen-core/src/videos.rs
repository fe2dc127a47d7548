//! Video review and tagging

use crate::api::ScreeningApi;
use crate::error::ScreeningResult;
use crate::model::{InviteId, Tag, Video, VideoId};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Fetches latest videos and drives tag transitions
pub struct VideoReviewManager {
    api: Arc<dyn ScreeningApi>,
}

impl VideoReviewManager {
    /// Create a manager over a collaborator
    pub fn new(api: Arc<dyn ScreeningApi>) -> Self {
        Self { api }
    }

    /// Most recent video for an invite, or `None` for "no video yet"
    ///
    /// Falls back from the direct query to the per-invite listing on any
    /// failure and takes its last element as ordered by the collaborator.
    pub async fn latest_video_for(&self, invite_id: &InviteId) -> Option<Video> {
        match self.api.latest_video(invite_id).await {
            Ok(video) => return Some(video),
            Err(e) => debug!(
                "Latest-video query for invite {} failed ({}), falling back to listing",
                invite_id, e
            ),
        }

        match self.api.list_videos(invite_id).await {
            Ok(mut videos) => videos.pop(),
            Err(e) => {
                warn!("Could not list videos for invite {}: {}", invite_id, e);
                None
            }
        }
    }

    /// Latest video of several invites, fetched concurrently
    ///
    /// Results are keyed by invite so completion order cannot mix them up.
    pub async fn latest_videos_for(&self, invite_ids: &[InviteId]) -> HashMap<InviteId, Option<Video>> {
        let fetches = invite_ids.iter().map(|invite_id| async move {
            let video = self.latest_video_for(invite_id).await;
            (invite_id.clone(), video)
        });
        join_all(fetches).await.into_iter().collect()
    }

    /// Fetch one video
    pub async fn video(&self, video_id: &VideoId) -> ScreeningResult<Video> {
        self.api.get_video(video_id).await
    }

    /// Apply a tag, returning the updated video
    pub async fn set_tag(&self, video_id: &VideoId, tag: Tag) -> ScreeningResult<Video> {
        let video = self.api.set_tag(video_id, tag).await?;
        debug!("Video {} tagged {}", video_id, video.tag);
        Ok(video)
    }

    /// Parse and apply a tag; unknown values fail before any request
    pub async fn set_tag_str(&self, video_id: &VideoId, tag: &str) -> ScreeningResult<Video> {
        let tag = tag.parse::<Tag>()?;
        self.set_tag(video_id, tag).await
    }

    /// Playback source for a video
    pub fn stream_url(&self, video_id: &VideoId) -> String {
        self.api.stream_url(video_id)
    }
}
