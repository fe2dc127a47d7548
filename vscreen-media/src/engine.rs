//! Capture engine seam
//!
//! A capture engine hands out device streams (camera + microphone) and builds
//! recorders bound to a stream. Recorders report back through a
//! [`RecorderEventSender`], which feeds the owning session's single FIFO event
//! queue: data-available events keep their arrival order and the stop event
//! is always queued behind the last chunk of its segment.

use crate::error::MediaResult;
use crate::format::FormatDescriptor;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use tokio::sync::mpsc;

/// Runtime support predicate for recording formats
pub trait FormatSupport {
    /// Whether the engine can record into `mime_type`
    fn is_type_supported(&self, mime_type: &str) -> bool;
}

/// What to request from the devices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    /// Request a camera track
    pub video: bool,
    /// Request a microphone track
    pub audio: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            video: true,
            audio: true,
        }
    }
}

/// Kind of media track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    /// Camera
    Video,
    /// Microphone
    Audio,
}

/// Snapshot of one track of a device stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    /// Track identifier
    pub id: String,
    /// Track kind
    pub kind: TrackKind,
    /// False once the track has been stopped
    pub live: bool,
}

/// Live camera/microphone stream
pub trait DeviceStream: Send {
    /// Stream identifier
    fn id(&self) -> &str;

    /// Current tracks
    fn tracks(&self) -> Vec<TrackInfo>;

    /// Stop every track, releasing the devices. Idempotent.
    fn stop_tracks(&mut self);

    /// Whether any track is still live
    fn is_active(&self) -> bool {
        self.tracks().iter().any(|track| track.live)
    }
}

/// Recorder bound to a device stream
pub trait MediaRecorder: Send {
    /// Format the recorder actually produces, when it reports one
    fn mime_type(&self) -> Option<String>;

    /// Begin emitting data every `timeslice`
    fn start(&mut self, timeslice: Duration) -> MediaResult<()>;

    /// Request finalization
    ///
    /// Remaining data must be delivered before the stop event.
    fn stop(&mut self) -> MediaResult<()>;

    /// Whether the recorder is between `start` and its stop event
    fn is_recording(&self) -> bool;
}

/// Surface showing the live camera image
pub trait PreviewSurface: Send + Sync {
    /// Show a stream
    fn attach(&self, stream: &dyn DeviceStream);

    /// Clear the surface
    fn detach(&self);
}

/// Platform capture backend
#[async_trait]
pub trait CaptureEngine: FormatSupport + Send + Sync {
    /// Ask for device access; fails when permission is denied or no device exists
    async fn acquire_stream(&self, constraints: MediaConstraints) -> MediaResult<Box<dyn DeviceStream>>;

    /// Build a recorder for `stream`
    ///
    /// `format` is `None` when negotiation found nothing and the engine should
    /// pick its own default.
    fn create_recorder(
        &self,
        stream: &dyn DeviceStream,
        format: Option<&FormatDescriptor>,
        events: RecorderEventSender,
    ) -> MediaResult<Box<dyn MediaRecorder>>;
}

/// Notification emitted by a recorder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderEvent {
    /// A media fragment is available
    DataAvailable(Bytes),
    /// The recorder finalized; no data follows for this segment
    Stopped,
    /// The recorder failed
    Error(String),
}

/// Input to a capture session's event queue
#[derive(Debug)]
pub(crate) enum SessionInput {
    Recorder { generation: u64, event: RecorderEvent },
    Tick { segment: u64 },
    AutoStop { segment: u64 },
}

/// Handle a recorder uses to report events to its session
#[derive(Debug, Clone)]
pub struct RecorderEventSender {
    generation: u64,
    tx: mpsc::UnboundedSender<SessionInput>,
}

impl RecorderEventSender {
    pub(crate) fn new(generation: u64, tx: mpsc::UnboundedSender<SessionInput>) -> Self {
        Self { generation, tx }
    }

    /// Queue an event; returns false once the session is gone
    pub fn send(&self, event: RecorderEvent) -> bool {
        self.tx
            .send(SessionInput::Recorder {
                generation: self.generation,
                event,
            })
            .is_ok()
    }

    /// Queue a data fragment
    pub fn data_available(&self, data: impl Into<Bytes>) -> bool {
        self.send(RecorderEvent::DataAvailable(data.into()))
    }

    /// Queue the stop event
    pub fn stopped(&self) -> bool {
        self.send(RecorderEvent::Stopped)
    }

    /// Whether the owning session has been dropped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
