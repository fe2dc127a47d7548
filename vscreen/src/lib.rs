//! # vscreen - Asynchronous Video Screening
//!
//! vscreen runs one-way video interviews: an administrator mints an invite
//! for a candidate, the candidate opens a token link, records up to a time
//! limit with camera and microphone, and uploads; reviewers later watch the
//! latest video of each invite and tag it.
//!
//! ## Key Features
//!
//! - **Capture session**: exclusive device ownership, ordered chunk assembly,
//!   exact auto-stop at the time limit
//! - **Format negotiation**: configurable MP4/WebM priority list
//! - **Tolerant API client**: alias-aware decoding of invite listings
//! - **Reference service**: the whole lifecycle runs in-process for tests and demos
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vscreen::{MockCaptureEngine, VScreen};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), vscreen::ScreeningError> {
//!     let vscreen = VScreen::in_process(Default::default())?;
//!
//!     // Admin side
//!     let admin = vscreen.admin();
//!     let created = admin.create_invite("candidate@example.com").await?;
//!     println!("Send {}", created.share_link);
//!
//!     // Candidate side
//!     let mut flow = vscreen.recording_flow(created.invite.token, Arc::new(MockCaptureEngine::new()))?;
//!     flow.open().await?;
//!     flow.start_recording()?;
//!     flow.stop_recording().await?;
//!     // an empty take is refused with EmptyArtifact
//!     let _ = flow.submit().await;
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export core types for easy access
pub use vscreen_core::{
    Artifact, ClientConfig, ErrorCategory, HttpScreeningClient, Invite, InviteId, InviteManager,
    InviteStatus, ResolvedToken, ScreeningApi, ScreeningError, ScreeningResult, Tag, Token,
    UploadReceipt, UploadSubmitter, Video, VideoId, VideoReviewManager,
};

pub use vscreen_media::{
    CaptureConfig, CaptureEngine, CaptureEvent, CapturePhase, CaptureSession, FormatDescriptor,
    FormatNegotiator, MediaError, MockCaptureEngine, MockPreview, PreviewSurface, RecorderFeed,
};

#[cfg(feature = "reference-service")]
pub use vscreen_service::{
    Clock, InMemoryScreeningService, LocalFsStorage, ManualClock, MemoryStorage, ObjectStorage,
    ServiceConfig, SystemClock,
};

// Public API modules
pub mod admin;
pub mod candidate;
pub mod config;
pub mod event;
pub mod logging;
pub mod review;

// Re-export main API types
pub use admin::{AdminDashboard, CreatedInvite, InviteRow};
pub use candidate::RecordingFlow;
pub use config::GlobalConfig;
pub use event::{FlowError, FlowState, StateStream};
pub use logging::init_tracing;
pub use review::ReviewPage;

use std::sync::Arc;
use tracing::info;

/// Main entry point for vscreen
#[derive(Clone)]
pub struct VScreen {
    inner: Arc<VScreenInner>,
}

struct VScreenInner {
    config: GlobalConfig,
    api: Arc<dyn ScreeningApi>,
}

impl VScreen {
    /// Talk to a remote screening API configured from the environment
    ///
    /// # Example
    /// ```rust,no_run
    /// use vscreen::VScreen;
    ///
    /// let vscreen = VScreen::init()?;
    /// # Ok::<(), vscreen::ScreeningError>(())
    /// ```
    pub fn init() -> ScreeningResult<Self> {
        Self::init_with(GlobalConfig::from_env()?)
    }

    /// Talk to a remote screening API with explicit configuration
    ///
    /// No tracing subscriber is installed; applications call
    /// [`init_tracing`] themselves when they want vscreen's logs.
    pub fn init_with(config: GlobalConfig) -> ScreeningResult<Self> {
        config.validate()?;
        let client = HttpScreeningClient::new(config.client.clone())?;
        info!("vscreen using screening API at {}", config.client.api_root());
        Ok(Self::with_api(config, Arc::new(client)))
    }

    /// Run the whole lifecycle against the in-process reference service
    #[cfg(feature = "reference-service")]
    pub fn in_process(config: GlobalConfig) -> ScreeningResult<Self> {
        config.validate()?;
        let service = InMemoryScreeningService::new(config.service.clone())?;
        info!("vscreen using in-process screening service");
        Ok(Self::with_api(config, Arc::new(service)))
    }

    /// Use any collaborator
    pub fn with_api(config: GlobalConfig, api: Arc<dyn ScreeningApi>) -> Self {
        Self {
            inner: Arc::new(VScreenInner { config, api }),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &GlobalConfig {
        &self.inner.config
    }

    /// The collaborator every flow talks to
    pub fn api(&self) -> Arc<dyn ScreeningApi> {
        self.inner.api.clone()
    }

    /// Administrator dashboard
    pub fn admin(&self) -> AdminDashboard {
        AdminDashboard::new(self.api(), self.inner.config.client.clone())
    }

    /// Candidate flow for a token, recording with `engine`
    pub fn recording_flow(
        &self,
        token: impl Into<Token>,
        engine: Arc<dyn CaptureEngine>,
    ) -> ScreeningResult<RecordingFlow> {
        let session = CaptureSession::new(engine, self.inner.config.capture.clone())?;
        Ok(RecordingFlow::new(
            self.api(),
            self.inner.config.client.clone(),
            token.into(),
            session,
        ))
    }

    /// Review page for one video
    pub fn review(&self, video_id: impl Into<VideoId>) -> ReviewPage {
        ReviewPage::new(self.api(), video_id.into())
    }
}
