//! End-to-end screening scenarios
//!
//! The admin dashboard, candidate flow and review page run against the
//! in-process service with a mock capture engine on tokio's paused clock.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use vscreen::*;

fn vscreen() -> VScreen {
    VScreen::in_process(GlobalConfig::default()).unwrap()
}

async fn opened_flow(
    vscreen: &VScreen,
    token: Token,
) -> (RecordingFlow, Arc<MockCaptureEngine>, RecorderFeed) {
    let engine = Arc::new(MockCaptureEngine::new());
    let mut flow = vscreen.recording_flow(token, engine.clone()).unwrap();
    assert_ok!(flow.open().await);
    let feed = engine.last_recorder().expect("recorder created");
    (flow, engine, feed)
}

/// Delegates to the in-process service; uploads or listings fail on demand
struct FlakyService {
    inner: Arc<InMemoryScreeningService>,
    failing: AtomicBool,
    listing_fails: AtomicBool,
}

impl FlakyService {
    fn failing_uploads(inner: Arc<InMemoryScreeningService>) -> Self {
        Self {
            inner,
            failing: AtomicBool::new(true),
            listing_fails: AtomicBool::new(false),
        }
    }

    fn failing_listings(inner: Arc<InMemoryScreeningService>) -> Self {
        Self {
            inner,
            failing: AtomicBool::new(false),
            listing_fails: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl ScreeningApi for FlakyService {
    async fn create_invite(&self, email: &str) -> ScreeningResult<Invite> {
        self.inner.create_invite(email).await
    }

    async fn list_invites(&self) -> ScreeningResult<Vec<Invite>> {
        if self.listing_fails.load(Ordering::Acquire) {
            return Err(ScreeningError::from_status(503, "Service Unavailable"));
        }
        self.inner.list_invites().await
    }

    async fn resolve_token(&self, token: &Token) -> ScreeningResult<ResolvedToken> {
        self.inner.resolve_token(token).await
    }

    async fn latest_video(&self, invite_id: &InviteId) -> ScreeningResult<Video> {
        self.inner.latest_video(invite_id).await
    }

    async fn list_videos(&self, invite_id: &InviteId) -> ScreeningResult<Vec<Video>> {
        self.inner.list_videos(invite_id).await
    }

    async fn upload(&self, token: &Token, artifact: &Artifact) -> ScreeningResult<VideoId> {
        if self.failing.load(Ordering::Acquire) {
            return Err(ScreeningError::from_status(502, "Bad Gateway"));
        }
        self.inner.upload(token, artifact).await
    }

    async fn get_video(&self, video_id: &VideoId) -> ScreeningResult<Video> {
        self.inner.get_video(video_id).await
    }

    async fn set_tag(&self, video_id: &VideoId, tag: Tag) -> ScreeningResult<Video> {
        self.inner.set_tag(video_id, tag).await
    }

    fn stream_url(&self, video_id: &VideoId) -> String {
        self.inner.stream_url(video_id)
    }
}

// ============================================================================
// FULL LIFECYCLE
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_invite_record_upload_and_tag() {
    let vscreen = vscreen();
    let admin = vscreen.admin();

    let created = admin.create_invite("a@x.com").await.unwrap();
    assert_eq!(created.invite.status, InviteStatus::Open);
    assert_eq!(
        created.share_link,
        format!("http://localhost:5173/r/{}", created.invite.token.as_str())
    );
    assert!(!admin.is_stale());

    let (mut flow, engine, feed) = opened_flow(&vscreen, created.invite.token.clone()).await;
    assert_eq!(flow.state(), FlowState::Ready);
    assert_eq!(flow.invite_id(), Some(&created.invite.invite_id));
    assert!(engine.device_in_use());

    assert_ok!(flow.start_recording());
    feed.push(Bytes::from_static(b"take-"));
    tokio::time::sleep(Duration::from_millis(10_500)).await;
    feed.push(Bytes::from_static(b"one"));
    let artifact = flow.stop_recording().await.unwrap();
    assert_eq!(artifact.data().as_ref(), b"take-one");
    assert_eq!(flow.session().elapsed_seconds(), 10);

    let receipt = flow.submit().await.unwrap();
    assert_eq!(
        flow.state(),
        FlowState::Done {
            video_id: receipt.video_id.clone()
        }
    );
    assert_eq!(receipt.file_name, "recording.mp4");
    assert!(!engine.device_in_use());

    let rows = admin.refresh().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].invite.status, InviteStatus::Uploaded);
    let latest = rows[0].latest_video.clone().expect("latest video");
    assert_eq!(latest.id, receipt.video_id);
    assert_eq!(latest.tag, Tag::Pending);

    let tagged = admin.tag_video(&latest.id, "advance").await.unwrap();
    assert_eq!(tagged.tag, Tag::Advance);
    assert_eq!(
        admin.latest_video(&created.invite.invite_id).map(|v| v.tag),
        Some(Tag::Advance)
    );

    let mut page = vscreen.review(latest.id.clone());
    assert_eq!(page.load().await.unwrap().tag, Tag::Advance);
    assert_eq!(
        page.stream_url(),
        format!("http://localhost:8000/api/v1/videos/{}/stream", latest.id)
    );
}

#[tokio::test(start_paused = true)]
async fn test_time_limit_completes_take_without_stop() {
    let mut config = GlobalConfig::default();
    config.set_max_video_seconds(5);
    let vscreen = VScreen::in_process(config).unwrap();
    let invite = vscreen.api().create_invite("a@x.com").await.unwrap();
    let (mut flow, _engine, feed) = opened_flow(&vscreen, invite.token).await;

    flow.start_recording().unwrap();
    feed.push(Bytes::from_static(b"limit"));
    let artifact = flow.wait_for_take().await.unwrap();
    assert_eq!(artifact.data().as_ref(), b"limit");
    assert_eq!(flow.session().elapsed_seconds(), 5);
    assert_eq!(flow.session().phase(), CapturePhase::Preview);

    assert_ok!(flow.submit().await);
}

// ============================================================================
// CANDIDATE FLOW
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_leaving_the_page_releases_devices() {
    let vscreen = vscreen();
    let invite = vscreen.api().create_invite("a@x.com").await.unwrap();
    let (mut flow, engine, feed) = opened_flow(&vscreen, invite.token).await;

    flow.start_recording().unwrap();
    feed.push(Bytes::from_static(b"abandoned"));
    flow.close();

    assert!(!engine.device_in_use());
    assert!(!flow.session().has_pending_timers());
    assert!(!feed.is_recording());
    assert_eq!(flow.session().chunk_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_the_flow_releases_devices() {
    let vscreen = vscreen();
    let invite = vscreen.api().create_invite("a@x.com").await.unwrap();
    let (flow, engine, _feed) = opened_flow(&vscreen, invite.token).await;

    assert!(engine.device_in_use());
    drop(flow);
    assert!(!engine.device_in_use());
}

#[tokio::test(start_paused = true)]
async fn test_unknown_token_is_terminal() {
    let vscreen = vscreen();
    let engine = Arc::new(MockCaptureEngine::new());
    let mut flow = vscreen.recording_flow("no-such-token", engine.clone()).unwrap();

    let err = flow.open().await.unwrap_err();
    assert!(matches!(err, ScreeningError::InvalidToken));
    assert_eq!(flow.state(), FlowState::Error(FlowError::InvalidLink));
    assert!(flow.state().is_terminal());
    assert_eq!(engine.acquire_count(), 0);

    assert_err!(flow.start_recording());
    assert_err!(flow.initialize_devices().await);
    assert_err!(flow.open().await);
}

#[tokio::test(start_paused = true)]
async fn test_empty_take_is_not_uploaded() {
    let vscreen = vscreen();
    let invite = vscreen.api().create_invite("a@x.com").await.unwrap();
    let (mut flow, _engine, _feed) = opened_flow(&vscreen, invite.token).await;

    flow.start_recording().unwrap();
    let artifact = flow.stop_recording().await.unwrap();
    assert!(artifact.is_empty());

    let err = flow.submit().await.unwrap_err();
    assert!(matches!(err, ScreeningError::EmptyArtifact));
    assert_eq!(flow.state(), FlowState::Ready);
    assert!(vscreen
        .api()
        .list_videos(&invite.invite_id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_submit_before_recording_is_rejected() {
    let vscreen = vscreen();
    let invite = vscreen.api().create_invite("a@x.com").await.unwrap();
    let (mut flow, _engine, _feed) = opened_flow(&vscreen, invite.token).await;

    let err = flow.submit().await.unwrap_err();
    assert!(matches!(err, ScreeningError::InvalidState { .. }));
    assert_eq!(flow.state(), FlowState::Ready);
}

#[tokio::test(start_paused = true)]
async fn test_failed_upload_can_be_retried() {
    let service = Arc::new(InMemoryScreeningService::new(ServiceConfig::default()).unwrap());
    let api = Arc::new(FlakyService::failing_uploads(service.clone()));
    let vscreen = VScreen::with_api(GlobalConfig::default(), api.clone());
    let invite = service.create_invite("a@x.com").await.unwrap();
    let (mut flow, engine, feed) = opened_flow(&vscreen, invite.token).await;

    flow.start_recording().unwrap();
    feed.push(Bytes::from_static(b"keep"));
    flow.stop_recording().await.unwrap();

    let err = flow.submit().await.unwrap_err();
    assert_eq!(err.status(), Some(502));
    assert!(matches!(
        flow.state(),
        FlowState::Error(FlowError::UploadFailed { .. })
    ));
    assert!(!flow.state().is_terminal());
    assert!(engine.device_in_use());

    api.failing.store(false, Ordering::Release);
    let receipt = flow.submit().await.unwrap();
    let stored = service.video_content(&receipt.video_id).await.unwrap();
    assert_eq!(stored.data.as_ref(), b"keep");
}

#[tokio::test(start_paused = true)]
async fn test_new_take_clears_failed_upload() {
    let service = Arc::new(InMemoryScreeningService::new(ServiceConfig::default()).unwrap());
    let api = Arc::new(FlakyService::failing_uploads(service.clone()));
    let vscreen = VScreen::with_api(GlobalConfig::default(), api);
    let invite = service.create_invite("a@x.com").await.unwrap();
    let (mut flow, _engine, feed) = opened_flow(&vscreen, invite.token).await;

    flow.start_recording().unwrap();
    feed.push(Bytes::from_static(b"x"));
    flow.stop_recording().await.unwrap();
    assert_err!(flow.submit().await);
    assert!(flow.state().is_error());

    flow.start_recording().unwrap();
    assert_eq!(flow.state(), FlowState::Ready);
}

#[tokio::test(start_paused = true)]
async fn test_expired_invite_resolves_but_refuses_upload() {
    let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
    let service = Arc::new(
        InMemoryScreeningService::new(ServiceConfig::default())
            .unwrap()
            .with_clock(clock.clone()),
    );
    let vscreen = VScreen::with_api(GlobalConfig::default(), service.clone());
    let invite = service.create_invite("a@x.com").await.unwrap();
    clock.advance(chrono::Duration::days(8));

    let (mut flow, _engine, feed) = opened_flow(&vscreen, invite.token).await;
    assert_eq!(flow.state(), FlowState::Ready);

    flow.start_recording().unwrap();
    feed.push(Bytes::from_static(b"late"));
    flow.stop_recording().await.unwrap();

    let err = flow.submit().await.unwrap_err();
    assert!(matches!(err, ScreeningError::InvalidToken));
    assert!(matches!(
        flow.state(),
        FlowState::Error(FlowError::UploadFailed { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_state_stream_follows_upload() {
    let vscreen = vscreen();
    let invite = vscreen.api().create_invite("a@x.com").await.unwrap();
    let (mut flow, _engine, feed) = opened_flow(&vscreen, invite.token).await;
    let mut states = flow.watch();
    assert_eq!(states.current(), FlowState::Ready);

    flow.start_recording().unwrap();
    feed.push(Bytes::from_static(b"watched"));
    flow.stop_recording().await.unwrap();
    let receipt = flow.submit().await.unwrap();

    let done = states
        .wait_for(|s| matches!(s, FlowState::Done { .. }))
        .await;
    assert_eq!(
        done,
        Some(FlowState::Done {
            video_id: receipt.video_id
        })
    );
}

// ============================================================================
// ADMIN AND REVIEW
// ============================================================================

#[tokio::test]
async fn test_dashboard_matches_latest_videos_by_invite() {
    let vscreen = vscreen();
    let admin = vscreen.admin();

    let first = admin.create_invite("a@x.com").await.unwrap();
    let second = admin.create_invite("b@x.com").await.unwrap();
    let third = admin.create_invite("c@x.com").await.unwrap();

    let api = vscreen.api();
    api.upload(
        &second.invite.token,
        &Artifact::new(Bytes::from_static(b"older"), "video/webm"),
    )
    .await
    .unwrap();
    let newest = api
        .upload(
            &second.invite.token,
            &Artifact::new(Bytes::from_static(b"newer"), "video/webm"),
        )
        .await
        .unwrap();
    let only = api
        .upload(
            &third.invite.token,
            &Artifact::new(Bytes::from_static(b"only"), "video/mp4"),
        )
        .await
        .unwrap();

    let rows = admin.refresh().await.unwrap();
    let ids: Vec<&InviteId> = rows.iter().map(|r| &r.invite.invite_id).collect();
    assert_eq!(
        ids,
        vec![
            &first.invite.invite_id,
            &second.invite.invite_id,
            &third.invite.invite_id
        ]
    );
    assert_eq!(rows[0].latest_video, None);
    assert_eq!(rows[0].invite.status, InviteStatus::Open);
    assert_eq!(rows[1].latest_video.as_ref().map(|v| &v.id), Some(&newest));
    assert_eq!(rows[2].latest_video.as_ref().map(|v| &v.id), Some(&only));
    assert_eq!(rows[2].share_link, third.share_link);
}

#[tokio::test]
async fn test_dashboard_rejects_bad_email_without_reload() {
    let vscreen = vscreen();
    let admin = vscreen.admin();

    let err = admin.create_invite("not-an-email").await.unwrap_err();
    assert!(matches!(err, ScreeningError::InvalidEmail { .. }));
    assert!(admin.rows().is_empty());
}

#[tokio::test]
async fn test_review_page_keeps_tag_on_invalid_value() {
    let vscreen = vscreen();
    let invite = vscreen.api().create_invite("a@x.com").await.unwrap();
    let video_id = vscreen
        .api()
        .upload(
            &invite.token,
            &Artifact::new(Bytes::from_static(b"v"), "video/webm"),
        )
        .await
        .unwrap();

    let mut page = vscreen.review(video_id.clone());
    assert_eq!(page.displayed_tag(), Tag::Pending);
    assert!(page.video().is_none());
    page.load().await.unwrap();

    assert_eq!(page.set_tag("review").await.unwrap(), Tag::Review);
    let err = page.set_tag("maybe").await.unwrap_err();
    assert!(matches!(err, ScreeningError::InvalidTag { .. }));
    assert_eq!(page.displayed_tag(), Tag::Review);
    assert_eq!(
        vscreen.api().get_video(&video_id).await.unwrap().tag,
        Tag::Review
    );
}

#[tokio::test]
async fn test_review_page_for_unknown_video() {
    let vscreen = vscreen();
    let mut page = vscreen.review("missing");

    let err = page.load().await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(page.displayed_tag(), Tag::Pending);
}

#[tokio::test]
async fn test_created_invite_survives_failed_reload() {
    let service = Arc::new(InMemoryScreeningService::new(ServiceConfig::default()).unwrap());
    let api = Arc::new(FlakyService::failing_listings(service.clone()));
    let vscreen = VScreen::with_api(GlobalConfig::default(), api.clone());
    let admin = vscreen.admin();

    let created = admin.create_invite("a@x.com").await.unwrap();
    assert_eq!(
        created.share_link,
        format!("http://localhost:5173/r/{}", created.invite.token.as_str())
    );
    assert!(service.invite_record(&created.invite.invite_id).is_some());
    assert!(admin.is_stale());
    assert!(admin.rows().is_empty());

    api.listing_fails.store(false, Ordering::Release);
    let rows = admin.refresh().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].share_link, created.share_link);
    assert!(!admin.is_stale());
}

#[tokio::test]
async fn test_tag_survives_failed_reload() {
    let service = Arc::new(InMemoryScreeningService::new(ServiceConfig::default()).unwrap());
    let api = Arc::new(FlakyService::failing_listings(service.clone()));
    api.listing_fails.store(false, Ordering::Release);
    let vscreen = VScreen::with_api(GlobalConfig::default(), api.clone());
    let admin = vscreen.admin();

    let created = admin.create_invite("a@x.com").await.unwrap();
    let video_id = service
        .upload(
            &created.invite.token,
            &Artifact::new(Bytes::from_static(b"v"), "video/webm"),
        )
        .await
        .unwrap();
    admin.refresh().await.unwrap();

    api.listing_fails.store(true, Ordering::Release);
    let tagged = admin.tag_video(&video_id, "pass").await.unwrap();
    assert_eq!(tagged.tag, Tag::Pass);
    assert_eq!(service.get_video(&video_id).await.unwrap().tag, Tag::Pass);
    assert_eq!(
        admin.latest_video(&created.invite.invite_id).map(|v| v.tag),
        Some(Tag::Pass)
    );
}
