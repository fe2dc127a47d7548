//! Reference service behaviour through the screening API

use bytes::Bytes;
use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;
use tokio_test::assert_ok;
use vscreen_core::*;
use vscreen_service::*;

fn service() -> InMemoryScreeningService {
    InMemoryScreeningService::new(ServiceConfig::default()).unwrap()
}

fn webm(bytes: &[u8]) -> Artifact {
    Artifact::new(bytes.to_vec(), "video/webm;codecs=vp8,opus")
}

// ============================================================================
// INVITES
// ============================================================================

#[tokio::test]
async fn test_create_invite_issues_unique_open_tokens() {
    let service = service();
    let first = service.create_invite(" a@example.com ").await.unwrap();
    let second = service.create_invite("b@example.com").await.unwrap();

    assert_eq!(first.email, "a@example.com");
    assert_eq!(first.status, InviteStatus::Open);
    assert_eq!(first.token.as_str().len(), 32);
    assert_ne!(first.token, second.token);
    assert_ne!(first.invite_id, second.invite_id);

    let record = service.invite_record(&first.invite_id).unwrap();
    assert_eq!(record.expires_at - record.created_at, Duration::minutes(10_080));

    let listed: Vec<InviteId> = service
        .list_invites()
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.invite_id)
        .collect();
    assert_eq!(listed, vec![first.invite_id, second.invite_id]);
}

#[tokio::test]
async fn test_create_invite_rejects_malformed_email() {
    let service = service();
    let err = service.create_invite("not-an-email").await.unwrap_err();
    assert_eq!(err.status(), Some(422));
    assert!(service.list_invites().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_resolve_token() {
    let service = service();
    let invite = service.create_invite("a@example.com").await.unwrap();

    let resolved = service.resolve_token(&invite.token).await.unwrap();
    assert_eq!(resolved.invite_id, Some(invite.invite_id));

    let err = service.resolve_token(&Token::new("nope")).await.unwrap_err();
    assert!(matches!(err, ScreeningError::InvalidToken));
}

// ============================================================================
// UPLOAD VALIDATION
// ============================================================================

#[tokio::test]
async fn test_upload_stores_video_and_marks_invite_uploaded() {
    let storage = Arc::new(MemoryStorage::new());
    let service = service().with_storage(storage.clone());
    let invite = service.create_invite("a@example.com").await.unwrap();

    let video_id = service.upload(&invite.token, &webm(b"webm-bytes")).await.unwrap();

    let video = service.get_video(&video_id).await.unwrap();
    assert_eq!(video.invite_id, invite.invite_id);
    assert_eq!(video.tag, Tag::Pending);
    assert_eq!(video.original_name, "recording.webm");
    assert!(video
        .storage_key
        .starts_with(&format!("{}/", invite.invite_id)));
    assert!(video.storage_key.ends_with("-recording.webm"));
    assert_eq!(storage.len(), 1);

    let content = service.video_content(&video_id).await.unwrap();
    assert_eq!(content.data, Bytes::from_static(b"webm-bytes"));
    assert_eq!(content.content_type, "video/webm");

    let invites = service.list_invites().await.unwrap();
    assert_eq!(invites[0].status, InviteStatus::Uploaded);
}

#[tokio::test]
async fn test_unknown_token_is_invalid() {
    let service = service();
    let err = service
        .upload(&Token::new("missing"), &webm(b"x"))
        .await
        .unwrap_err();
    assert!(matches!(err, ScreeningError::InvalidToken));
}

#[tokio::test]
async fn test_expiry_is_checked_before_content() {
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
    let storage = Arc::new(MemoryStorage::new());
    let service = service()
        .with_clock(clock.clone())
        .with_storage(storage.clone());
    let invite = service.create_invite("a@example.com").await.unwrap();

    clock.advance(Duration::minutes(10_080));
    assert_ok!(
        service
            .accept_upload(invite.token.as_str(), "recording.webm", "video/webm", Bytes::from_static(b"ok"))
            .await
    );

    clock.advance(Duration::minutes(1));
    let err = service
        .accept_upload(
            invite.token.as_str(),
            "recording.mov",
            "video/quicktime",
            Bytes::from_static(b"late"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InviteExpired));
    assert_eq!(err.http_status(), 410);

    let err = service.upload(&invite.token, &webm(b"late")).await.unwrap_err();
    assert!(matches!(err, ScreeningError::InvalidToken));
    assert_eq!(storage.len(), 1);
}

#[tokio::test]
async fn test_content_type_is_checked_before_size() {
    let config = ServiceConfig {
        max_upload_mb: 1,
        ..Default::default()
    };
    let service = InMemoryScreeningService::new(config).unwrap();
    let invite = service.create_invite("a@example.com").await.unwrap();
    let oversized = Bytes::from(vec![0u8; 1024 * 1024 + 1]);

    let err = service
        .accept_upload(invite.token.as_str(), "clip.mov", "video/quicktime", oversized.clone())
        .await
        .unwrap_err();
    assert_eq!(err.http_status(), 415);

    let err = service
        .accept_upload(invite.token.as_str(), "recording.webm", "video/webm", oversized)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::TooLarge { .. }));

    let err = ScreeningError::from(err);
    assert_eq!(err.status(), Some(413));
    assert!(err.is_recoverable());

    let invites = service.list_invites().await.unwrap();
    assert_eq!(invites[0].status, InviteStatus::Open);
}

#[tokio::test]
async fn test_local_fs_backed_upload() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(LocalFsStorage::new(dir.path()));
    let service = service().with_storage(storage);
    let invite = service.create_invite("a@example.com").await.unwrap();

    let artifact = Artifact::new(b"mp4-bytes".to_vec(), "video/mp4;codecs=avc1");
    let video_id = service.upload(&invite.token, &artifact).await.unwrap();
    let video = service.get_video(&video_id).await.unwrap();

    let mut path = dir.path().to_path_buf();
    for part in video.storage_key.split('/') {
        path.push(part);
    }
    assert_eq!(std::fs::read(&path).unwrap(), b"mp4-bytes");

    let content = service.video_content(&video_id).await.unwrap();
    assert_eq!(content.content_type, "video/mp4");
}

// ============================================================================
// VIDEOS
// ============================================================================

#[tokio::test]
async fn test_latest_video_tracks_most_recent_upload() {
    let service = service();
    let invite = service.create_invite("a@example.com").await.unwrap();

    let err = service.latest_video(&invite.invite_id).await.unwrap_err();
    assert_eq!(err.status(), Some(404));

    let first = service.upload(&invite.token, &webm(b"1")).await.unwrap();
    let second = service.upload(&invite.token, &webm(b"2")).await.unwrap();

    assert_eq!(service.latest_video(&invite.invite_id).await.unwrap().id, second);
    let listed: Vec<VideoId> = service
        .list_videos(&invite.invite_id)
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.id)
        .collect();
    assert_eq!(listed, vec![first, second]);
}

#[tokio::test]
async fn test_tagging() {
    let service = service();
    let invite = service.create_invite("a@example.com").await.unwrap();
    let video_id = service.upload(&invite.token, &webm(b"1")).await.unwrap();

    let video = service.set_tag(&video_id, Tag::Advance).await.unwrap();
    assert_eq!(video.tag, Tag::Advance);
    assert_eq!(service.get_video(&video_id).await.unwrap().tag, Tag::Advance);

    let err = service
        .set_tag(&VideoId::new("missing"), Tag::Pass)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_stream_url_uses_configured_base() {
    let config = ServiceConfig {
        api_base: "https://screening.example.com/api/v1/".to_string(),
        ..Default::default()
    };
    let service = InMemoryScreeningService::new(config).unwrap();
    assert_eq!(
        service.stream_url(&VideoId::new("v1")),
        "https://screening.example.com/api/v1/videos/v1/stream"
    );
}

#[tokio::test]
async fn test_managers_run_against_service() {
    let service: Arc<dyn ScreeningApi> = Arc::new(service());
    let invites = InviteManager::new(service.clone(), ClientConfig::default());
    let uploads = UploadSubmitter::new(service.clone());
    let review = VideoReviewManager::new(service.clone());

    let invite = invites.create_invite("c@example.com").await.unwrap();
    assert_ok!(invites.resolve_token(&invite.token).await);

    let receipt = uploads.submit(&webm(b"take"), &invite.token).await.unwrap();
    let latest = review
        .latest_video_for(&invite.invite_id)
        .await
        .expect("uploaded video");
    assert_eq!(latest.id, receipt.video_id);

    let tagged = review.set_tag(&latest.id, Tag::Review).await.unwrap();
    assert_eq!(tagged.tag, Tag::Review);
}
