//! Invite and video records

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Serialize;
use vscreen_core::{Invite, InviteId, InviteStatus, Tag, Video, VideoId};

/// Stored invite with its token lifetime
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteRecord {
    /// Client-visible invite
    #[serde(flatten)]
    pub invite: Invite,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Token stops being accepted for uploads after this instant
    pub expires_at: DateTime<Utc>,
}

impl InviteRecord {
    /// Whether the token lifetime has passed at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Invites indexed by id and by token
#[derive(Debug, Default)]
pub struct InviteStore {
    by_id: DashMap<InviteId, InviteRecord>,
    by_token: DashMap<String, InviteId>,
    order: RwLock<Vec<InviteId>>,
}

impl InviteStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record
    pub fn insert(&self, record: InviteRecord) {
        let id = record.invite.invite_id.clone();
        self.by_token
            .insert(record.invite.token.as_str().to_string(), id.clone());
        if self.by_id.insert(id.clone(), record).is_none() {
            self.order.write().push(id);
        }
    }

    /// Record holding `token`
    pub fn get_by_token(&self, token: &str) -> Option<InviteRecord> {
        let id = self.by_token.get(token)?.value().clone();
        self.get(&id)
    }

    /// Record by id
    pub fn get(&self, invite_id: &InviteId) -> Option<InviteRecord> {
        self.by_id.get(invite_id).map(|entry| entry.value().clone())
    }

    /// Every record in creation order
    pub fn list(&self) -> Vec<InviteRecord> {
        self.order
            .read()
            .iter()
            .filter_map(|id| self.get(id))
            .collect()
    }

    /// Flip an invite to uploaded; returns false for unknown ids
    pub fn mark_uploaded(&self, invite_id: &InviteId) -> bool {
        match self.by_id.get_mut(invite_id) {
            Some(mut entry) => {
                entry.invite.status = InviteStatus::Uploaded;
                true
            }
            None => false,
        }
    }

    /// Number of invites
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether no invite exists
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Videos indexed by id and by invite
#[derive(Debug, Default)]
pub struct VideoStore {
    by_id: DashMap<VideoId, Video>,
    by_invite: DashMap<InviteId, Vec<VideoId>>,
}

impl VideoStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a video
    pub fn insert(&self, video: Video) {
        self.by_invite
            .entry(video.invite_id.clone())
            .or_default()
            .push(video.id.clone());
        self.by_id.insert(video.id.clone(), video);
    }

    /// Video by id
    pub fn get(&self, video_id: &VideoId) -> Option<Video> {
        self.by_id.get(video_id).map(|entry| entry.value().clone())
    }

    /// Videos of an invite, oldest first
    pub fn list_by_invite(&self, invite_id: &InviteId) -> Vec<Video> {
        let ids = match self.by_invite.get(invite_id) {
            Some(ids) => ids.value().clone(),
            None => return Vec::new(),
        };
        ids.iter().filter_map(|id| self.get(id)).collect()
    }

    /// Most recently uploaded video of an invite
    pub fn latest_for(&self, invite_id: &InviteId) -> Option<Video> {
        let id = self.by_invite.get(invite_id)?.value().last()?.clone();
        self.get(&id)
    }

    /// Replace a video's tag
    pub fn set_tag(&self, video_id: &VideoId, tag: Tag) -> Option<Video> {
        let mut entry = self.by_id.get_mut(video_id)?;
        entry.tag = tag;
        Some(entry.value().clone())
    }

    /// Number of videos
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether no video exists
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
