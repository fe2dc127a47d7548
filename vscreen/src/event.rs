//! Candidate flow states and their change stream

use std::fmt;
use tokio::sync::watch;
use vscreen_core::VideoId;

/// Why the candidate flow is in its error state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// The link's token is unknown or expired; terminal
    InvalidLink,
    /// The upload was refused or never reached the service; the user may retry
    UploadFailed {
        /// What went wrong, for display
        reason: String,
    },
}

/// Candidate flow state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    /// Checking the link
    Init,
    /// Link valid; recording and upload allowed
    Ready,
    /// Upload in flight
    Uploading,
    /// Upload accepted
    Done {
        /// Video created by the upload
        video_id: VideoId,
    },
    /// Something failed
    Error(FlowError),
}

impl FlowState {
    /// Short name used in logs and views
    pub fn state_name(&self) -> &'static str {
        match self {
            FlowState::Init => "init",
            FlowState::Ready => "ready",
            FlowState::Uploading => "uploading",
            FlowState::Done { .. } => "done",
            FlowState::Error(_) => "error",
        }
    }

    /// No further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FlowState::Done { .. } | FlowState::Error(FlowError::InvalidLink)
        )
    }

    /// Whether an upload may be started from here
    pub fn can_upload(&self) -> bool {
        matches!(
            self,
            FlowState::Ready | FlowState::Error(FlowError::UploadFailed { .. })
        )
    }

    /// Check if this is an error state
    pub fn is_error(&self) -> bool {
        matches!(self, FlowState::Error(_))
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.state_name())
    }
}

/// Stream of flow state changes
///
/// Only the latest state is kept; a slow reader skips intermediate states.
#[derive(Debug, Clone)]
pub struct StateStream {
    receiver: watch::Receiver<FlowState>,
}

impl StateStream {
    pub(crate) fn new(receiver: watch::Receiver<FlowState>) -> Self {
        Self { receiver }
    }

    /// State right now
    pub fn current(&self) -> FlowState {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change; `None` once the flow is gone
    pub async fn next(&mut self) -> Option<FlowState> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Wait until the state satisfies `predicate`
    pub async fn wait_for<F>(&mut self, mut predicate: F) -> Option<FlowState>
    where
        F: FnMut(&FlowState) -> bool,
    {
        self.receiver
            .wait_for(|state| predicate(state))
            .await
            .ok()
            .map(|state| (*state).clone())
    }
}
