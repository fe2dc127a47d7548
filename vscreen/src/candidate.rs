//! Candidate recording flow
//!
//! Drives one token-scoped recording page: check the link, record with the
//! capture session, upload the finished take. An invalid link is terminal.
//! A failed upload can be retried, with the same take or a new one.

use crate::event::{FlowError, FlowState, StateStream};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use vscreen_core::{
    Artifact, ClientConfig, InviteId, InviteManager, ScreeningApi, ScreeningError,
    ScreeningResult, Token, UploadReceipt, UploadSubmitter,
};
use vscreen_media::{CaptureEvent, CaptureSession};

/// Candidate-side flow for one invite token
pub struct RecordingFlow {
    token: Token,
    invites: InviteManager,
    submitter: UploadSubmitter,
    session: CaptureSession,
    state: watch::Sender<FlowState>,
    invite_id: Option<InviteId>,
    receipt: Option<UploadReceipt>,
}

impl RecordingFlow {
    /// Create a flow; nothing happens until [`open`](Self::open)
    pub fn new(
        api: Arc<dyn ScreeningApi>,
        client: ClientConfig,
        token: Token,
        session: CaptureSession,
    ) -> Self {
        let (state, _) = watch::channel(FlowState::Init);
        Self {
            token,
            invites: InviteManager::new(api.clone(), client),
            submitter: UploadSubmitter::new(api),
            session,
            state,
            invite_id: None,
            receipt: None,
        }
    }

    /// Current state
    pub fn state(&self) -> FlowState {
        self.state.borrow().clone()
    }

    /// Observe state changes
    pub fn watch(&self) -> StateStream {
        StateStream::new(self.state.subscribe())
    }

    /// Invite the token resolved to, once known
    pub fn invite_id(&self) -> Option<&InviteId> {
        self.invite_id.as_ref()
    }

    /// Receipt of the accepted upload
    pub fn receipt(&self) -> Option<&UploadReceipt> {
        self.receipt.as_ref()
    }

    /// Capture session backing the page
    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    /// Mutable capture session, for driving its event pump
    pub fn session_mut(&mut self) -> &mut CaptureSession {
        &mut self.session
    }

    /// Check the link, then take the camera
    ///
    /// Any resolution failure moves the flow to the terminal invalid-link
    /// state and is never retried. A device failure leaves the flow ready so
    /// [`initialize_devices`](Self::initialize_devices) can be tried again.
    pub async fn open(&mut self) -> ScreeningResult<()> {
        if self.state() != FlowState::Init {
            return Err(self.invalid_state("init"));
        }
        match self.invites.resolve_token(&self.token).await {
            Ok(resolved) => {
                self.invite_id = resolved.invite_id;
                info!("Recording link {}… accepted", self.token.short());
                self.set_state(FlowState::Ready);
            }
            Err(e) => {
                warn!("Recording link {}… rejected: {}", self.token.short(), e);
                self.set_state(FlowState::Error(FlowError::InvalidLink));
                return Err(e);
            }
        }
        self.initialize_devices().await
    }

    /// (Re)acquire camera and microphone
    pub async fn initialize_devices(&mut self) -> ScreeningResult<()> {
        self.ensure_active()?;
        self.session.initialize().await.map_err(ScreeningError::from)
    }

    /// Begin a new take, discarding the previous one
    pub fn start_recording(&mut self) -> ScreeningResult<()> {
        self.ensure_active()?;
        if self.state() == FlowState::Uploading {
            return Err(self.invalid_state("ready"));
        }
        self.session.start()?;
        if self.state().is_error() {
            // a fresh take clears a failed upload
            self.set_state(FlowState::Ready);
        }
        Ok(())
    }

    /// Stop recording and wait for the finished take
    pub async fn stop_recording(&mut self) -> ScreeningResult<Artifact> {
        Ok(self.session.finish().await?)
    }

    /// Pump capture events until the take completes, whether stopped by hand
    /// elsewhere or by the time limit
    pub async fn wait_for_take(&mut self) -> ScreeningResult<Artifact> {
        while let Some(event) = self.session.next_event().await {
            if let CaptureEvent::Completed { artifact } = event {
                return Ok(artifact);
            }
        }
        self.session.last_artifact().cloned().ok_or_else(|| {
            ScreeningError::InvalidState {
                expected: "finished recording".to_string(),
                actual: self.session.phase().to_string(),
            }
        })
    }

    /// Upload the finished take
    ///
    /// An empty take is refused before anything is sent and the flow stays
    /// ready. Any other failure moves the flow to the retryable upload-failed
    /// state; it never reaches done.
    pub async fn submit(&mut self) -> ScreeningResult<UploadReceipt> {
        let state = self.state();
        if !state.can_upload() {
            return Err(self.invalid_state("ready"));
        }
        let artifact = self
            .session
            .last_artifact()
            .cloned()
            .ok_or_else(|| ScreeningError::InvalidState {
                expected: "finished recording".to_string(),
                actual: self.session.phase().to_string(),
            })?;
        if artifact.is_empty() {
            warn!("Recording is empty; re-record before uploading");
            if state.is_error() {
                self.set_state(FlowState::Ready);
            }
            return Err(ScreeningError::EmptyArtifact);
        }

        self.set_state(FlowState::Uploading);
        match self.submitter.submit(&artifact, &self.token).await {
            Ok(receipt) => {
                info!("Recording uploaded as video {}", receipt.video_id);
                self.set_state(FlowState::Done {
                    video_id: receipt.video_id.clone(),
                });
                self.session.teardown();
                self.receipt = Some(receipt.clone());
                Ok(receipt)
            }
            Err(e) => {
                warn!("Upload failed: {}", e);
                self.set_state(FlowState::Error(FlowError::UploadFailed {
                    reason: e.to_string(),
                }));
                Err(e)
            }
        }
    }

    /// Leave the page: release every device
    pub fn close(&mut self) {
        debug!("Closing recording flow in state {}", self.state());
        self.session.teardown();
    }

    fn ensure_active(&self) -> ScreeningResult<()> {
        match self.state() {
            FlowState::Init => Err(self.invalid_state("ready")),
            state if state.is_terminal() => Err(self.invalid_state("ready")),
            _ => Ok(()),
        }
    }

    fn set_state(&self, state: FlowState) {
        debug!("Recording flow -> {}", state);
        self.state.send_replace(state);
    }

    fn invalid_state(&self, expected: &str) -> ScreeningError {
        ScreeningError::InvalidState {
            expected: expected.to_string(),
            actual: self.state().to_string(),
        }
    }
}

impl Drop for RecordingFlow {
    fn drop(&mut self) {
        self.session.teardown();
    }
}
