//! # vscreen media
//!
//! Candidate-side capture for vscreen: recording format negotiation, the
//! capture engine seam over camera/microphone stacks, and the capture session
//! state machine that turns a recorder's chunk stream into one finished
//! [`Artifact`](vscreen_core::Artifact).

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod mock;
pub mod session;

// Re-export main types
pub use config::{CaptureConfig, DEFAULT_TIMESLICE, DEFAULT_TIME_LIMIT_SECONDS};
pub use engine::{
    CaptureEngine, DeviceStream, FormatSupport, MediaConstraints, MediaRecorder, PreviewSurface,
    RecorderEvent, RecorderEventSender, TrackInfo, TrackKind,
};
pub use error::{MediaError, MediaResult};
pub use format::{default_priority, select_format, FormatDescriptor, FormatNegotiator};
pub use mock::{MockCaptureEngine, MockPreview, RecorderFeed};
pub use session::{CaptureEvent, CapturePhase, CaptureSession};
