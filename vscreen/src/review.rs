//! Single-video review page

use std::sync::Arc;
use tracing::warn;
use vscreen_core::{ScreeningApi, ScreeningResult, Tag, Video, VideoId, VideoReviewManager};

/// One video with its displayed tag and playback source
pub struct ReviewPage {
    videos: VideoReviewManager,
    video_id: VideoId,
    video: Option<Video>,
}

impl ReviewPage {
    /// Page for `video_id`; call [`load`](Self::load) to fetch it
    pub fn new(api: Arc<dyn ScreeningApi>, video_id: VideoId) -> Self {
        Self {
            videos: VideoReviewManager::new(api),
            video_id,
            video: None,
        }
    }

    /// Fetch the video
    pub async fn load(&mut self) -> ScreeningResult<&Video> {
        let video = self.videos.video(&self.video_id).await?;
        Ok(&*self.video.insert(video))
    }

    /// Video being reviewed
    pub fn video_id(&self) -> &VideoId {
        &self.video_id
    }

    /// Loaded video, if any
    pub fn video(&self) -> Option<&Video> {
        self.video.as_ref()
    }

    /// Tag shown in the selector; pending until loaded
    pub fn displayed_tag(&self) -> Tag {
        self.video.as_ref().map(|v| v.tag).unwrap_or_default()
    }

    /// Source for the player
    pub fn stream_url(&self) -> String {
        self.videos.stream_url(&self.video_id)
    }

    /// Change the tag from a selector value
    ///
    /// On any failure the displayed tag stays what it was.
    pub async fn set_tag(&mut self, tag: &str) -> ScreeningResult<Tag> {
        match self.videos.set_tag_str(&self.video_id, tag).await {
            Ok(video) => {
                let tag = video.tag;
                self.video = Some(video);
                Ok(tag)
            }
            Err(e) => {
                warn!(
                    "Tagging video {} failed, keeping {}: {}",
                    self.video_id,
                    self.displayed_tag(),
                    e
                );
                Err(e)
            }
        }
    }
}
