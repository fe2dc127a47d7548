//! Screening walkthrough
//!
//! Runs one complete screening against the in-process service: mint an
//! invite, record a short take with the mock camera, upload it, then review
//! and tag it from the admin side.
//!
//! Run with `RUST_LOG=debug` to watch every component log its transitions.

use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use vscreen::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = GlobalConfig::from_env()?;
    config.set_max_video_seconds(30);
    init_tracing(&config);

    let vscreen = VScreen::in_process(config)?;

    println!("📨 Creating invite...");
    let admin = vscreen.admin();
    let created = admin.create_invite("candidate@example.com").await?;
    println!("   Share link: {}", created.share_link);

    println!("🎥 Opening the recording page...");
    let engine = Arc::new(MockCaptureEngine::new());
    let mut flow = vscreen.recording_flow(created.invite.token.clone(), engine.clone())?;
    flow.open().await?;
    println!(
        "   State: {}, format: {}",
        flow.state(),
        flow.session().mime_type()
    );

    let feed = engine
        .last_recorder()
        .ok_or("capture engine created no recorder")?;

    println!("🔴 Recording for 3 seconds...");
    flow.start_recording()?;
    for chunk in [&b"frame-1 "[..], b"frame-2 ", b"frame-3"] {
        feed.push(Bytes::copy_from_slice(chunk));
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    let artifact = flow.stop_recording().await?;
    println!(
        "   Take: {} bytes of {} after {}s",
        artifact.len(),
        artifact.mime_type(),
        flow.session().elapsed_seconds()
    );

    println!("📤 Uploading...");
    let receipt = flow.submit().await?;
    println!("   Uploaded as video {} ({})", receipt.video_id, receipt.file_name);

    println!("📋 Admin table:");
    for row in admin.refresh().await? {
        println!(
            "   {} [{}] token {}… latest video: {}",
            row.invite.email,
            row.invite.status,
            row.invite.token.short(),
            row.latest_video
                .as_ref()
                .map(|v| v.id.to_string())
                .unwrap_or_else(|| "none".to_string())
        );
    }

    println!("🏷️  Reviewing...");
    let mut page = vscreen.review(receipt.video_id.clone());
    page.load().await?;
    println!("   Stream from {}", page.stream_url());
    println!("   Tag before: {}", page.displayed_tag());
    page.set_tag("advance").await?;
    println!("   Tag after: {}", page.displayed_tag());

    println!("✅ Walkthrough complete");
    Ok(())
}
