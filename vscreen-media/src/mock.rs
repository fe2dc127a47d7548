//! In-process capture engine
//!
//! Stands in for a camera/microphone stack in tests and headless runs. The
//! device is exclusive: a second stream cannot be acquired until the first
//! one's tracks are stopped or the stream is dropped. Recorders created by the
//! engine are driven from the outside through a [`RecorderFeed`].

use crate::engine::{
    CaptureEngine, DeviceStream, FormatSupport, MediaConstraints, MediaRecorder, PreviewSurface,
    RecorderEvent, RecorderEventSender, TrackInfo, TrackKind,
};
use crate::error::{MediaError, MediaResult};
use crate::format::FormatDescriptor;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

const MOCK_DEVICE_ID: &str = "mock_camera_0";

type DeviceSlot = Arc<Mutex<Option<String>>>;

/// Scriptable capture engine
pub struct MockCaptureEngine {
    supported: Vec<String>,
    default_mime: Option<String>,
    deny_permission: bool,
    no_device: bool,
    device: DeviceSlot,
    feeds: Mutex<Vec<RecorderFeed>>,
    acquired: AtomicUsize,
}

impl MockCaptureEngine {
    /// Engine supporting plain WebM and MP4 with VP8/H.264
    pub fn new() -> Self {
        Self::with_supported_types([
            "video/webm",
            "video/webm;codecs=vp8,opus",
            "video/mp4",
            "video/mp4;codecs=avc1",
        ])
    }

    /// Engine supporting exactly `types`
    pub fn with_supported_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            supported: types.into_iter().map(Into::into).collect(),
            default_mime: Some("video/webm".to_string()),
            deny_permission: false,
            no_device: false,
            device: Arc::new(Mutex::new(None)),
            feeds: Mutex::new(Vec::new()),
            acquired: AtomicUsize::new(0),
        }
    }

    /// Format recorders report when created without a negotiated format
    pub fn with_default_mime(mut self, mime_type: Option<&str>) -> Self {
        self.default_mime = mime_type.map(str::to_string);
        self
    }

    /// Refuse every stream request as if the user denied access
    pub fn deny_permission(mut self) -> Self {
        self.deny_permission = true;
        self
    }

    /// Behave as if no camera is connected
    pub fn without_device(mut self) -> Self {
        self.no_device = true;
        self
    }

    /// Whether a stream currently owns the device
    pub fn device_in_use(&self) -> bool {
        self.device.lock().is_some()
    }

    /// Number of successful stream acquisitions
    pub fn acquire_count(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    /// Feeds of every recorder created so far, oldest first
    pub fn recorders(&self) -> Vec<RecorderFeed> {
        self.feeds.lock().clone()
    }

    /// Feed of the most recently created recorder
    pub fn last_recorder(&self) -> Option<RecorderFeed> {
        self.feeds.lock().last().cloned()
    }
}

impl Default for MockCaptureEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatSupport for MockCaptureEngine {
    fn is_type_supported(&self, mime_type: &str) -> bool {
        self.supported.iter().any(|t| t.eq_ignore_ascii_case(mime_type))
    }
}

#[async_trait]
impl CaptureEngine for MockCaptureEngine {
    async fn acquire_stream(&self, constraints: MediaConstraints) -> MediaResult<Box<dyn DeviceStream>> {
        if self.deny_permission {
            return Err(MediaError::PermissionDenied {
                operation: "camera and microphone access".to_string(),
            });
        }
        if self.no_device || !(constraints.video || constraints.audio) {
            return Err(MediaError::DeviceNotFound {
                kind: "camera".to_string(),
            });
        }

        let stream_id = Uuid::new_v4().to_string();
        {
            let mut owner = self.device.lock();
            if owner.is_some() {
                return Err(MediaError::DeviceBusy {
                    device_id: MOCK_DEVICE_ID.to_string(),
                });
            }
            *owner = Some(stream_id.clone());
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        debug!("Mock device acquired by stream {}", stream_id);

        let mut tracks = Vec::new();
        if constraints.video {
            tracks.push(TrackInfo {
                id: format!("{}-video", stream_id),
                kind: TrackKind::Video,
                live: true,
            });
        }
        if constraints.audio {
            tracks.push(TrackInfo {
                id: format!("{}-audio", stream_id),
                kind: TrackKind::Audio,
                live: true,
            });
        }

        Ok(Box::new(MockStream {
            id: stream_id,
            tracks,
            device: Arc::clone(&self.device),
        }))
    }

    fn create_recorder(
        &self,
        stream: &dyn DeviceStream,
        format: Option<&FormatDescriptor>,
        events: RecorderEventSender,
    ) -> MediaResult<Box<dyn MediaRecorder>> {
        if !stream.is_active() {
            return Err(MediaError::Recorder {
                reason: format!("stream {} has no live tracks", stream.id()),
            });
        }
        if let Some(format) = format {
            if !self.is_type_supported(format.as_str()) {
                return Err(MediaError::UnsupportedFormat {
                    format: format.to_string(),
                });
            }
        }

        let feed = RecorderFeed::new(events);
        self.feeds.lock().push(feed.clone());
        Ok(Box::new(MockRecorder {
            mime_type: format
                .map(|f| f.as_str().to_string())
                .or_else(|| self.default_mime.clone()),
            feed,
        }))
    }
}

struct MockStream {
    id: String,
    tracks: Vec<TrackInfo>,
    device: DeviceSlot,
}

impl MockStream {
    fn release_device(&self) {
        let mut owner = self.device.lock();
        if owner.as_deref() == Some(self.id.as_str()) {
            *owner = None;
            debug!("Mock device released by stream {}", self.id);
        }
    }
}

impl DeviceStream for MockStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn tracks(&self) -> Vec<TrackInfo> {
        self.tracks.clone()
    }

    fn stop_tracks(&mut self) {
        for track in &mut self.tracks {
            track.live = false;
        }
        self.release_device();
    }
}

impl Drop for MockStream {
    fn drop(&mut self) {
        self.release_device();
    }
}

#[derive(Default)]
struct FeedState {
    recording: bool,
    starts: usize,
    stops: usize,
    timeslice: Option<Duration>,
    final_chunks: Vec<Bytes>,
}

/// External handle driving one mock recorder
#[derive(Clone)]
pub struct RecorderFeed {
    events: RecorderEventSender,
    state: Arc<Mutex<FeedState>>,
}

impl RecorderFeed {
    fn new(events: RecorderEventSender) -> Self {
        Self {
            events,
            state: Arc::new(Mutex::new(FeedState::default())),
        }
    }

    /// Emit a fragment; ignored unless the recorder is running
    pub fn push(&self, data: impl Into<Bytes>) -> bool {
        if !self.state.lock().recording {
            return false;
        }
        self.events.data_available(data)
    }

    /// Fragments flushed on the next stop, ahead of the stop event
    pub fn set_final_chunks<I, B>(&self, chunks: I)
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        self.state.lock().final_chunks = chunks.into_iter().map(Into::into).collect();
    }

    /// Report a recorder failure
    pub fn fail(&self, reason: impl Into<String>) -> bool {
        self.events.send(RecorderEvent::Error(reason.into()))
    }

    /// Whether the recorder is running
    pub fn is_recording(&self) -> bool {
        self.state.lock().recording
    }

    /// How many times the recorder was started
    pub fn start_count(&self) -> usize {
        self.state.lock().starts
    }

    /// How many times the recorder was stopped while running
    pub fn stop_count(&self) -> usize {
        self.state.lock().stops
    }

    /// Timeslice passed to the last start
    pub fn timeslice(&self) -> Option<Duration> {
        self.state.lock().timeslice
    }
}

struct MockRecorder {
    mime_type: Option<String>,
    feed: RecorderFeed,
}

impl MediaRecorder for MockRecorder {
    fn mime_type(&self) -> Option<String> {
        self.mime_type.clone()
    }

    fn start(&mut self, timeslice: Duration) -> MediaResult<()> {
        let mut state = self.feed.state.lock();
        if state.recording {
            return Err(MediaError::Recorder {
                reason: "recorder already started".to_string(),
            });
        }
        state.recording = true;
        state.starts += 1;
        state.timeslice = Some(timeslice);
        Ok(())
    }

    fn stop(&mut self) -> MediaResult<()> {
        let final_chunks = {
            let mut state = self.feed.state.lock();
            if !state.recording {
                return Ok(());
            }
            state.recording = false;
            state.stops += 1;
            std::mem::take(&mut state.final_chunks)
        };
        for chunk in final_chunks {
            self.feed.events.data_available(chunk);
        }
        self.feed.events.stopped();
        Ok(())
    }

    fn is_recording(&self) -> bool {
        self.feed.is_recording()
    }
}

/// Preview surface that remembers what it shows
#[derive(Debug, Default)]
pub struct MockPreview {
    attached: Mutex<Option<String>>,
    attach_count: AtomicUsize,
}

impl MockPreview {
    /// Empty surface
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the stream currently shown
    pub fn attached_stream(&self) -> Option<String> {
        self.attached.lock().clone()
    }

    /// Number of attach calls
    pub fn attach_count(&self) -> usize {
        self.attach_count.load(Ordering::SeqCst)
    }
}

impl PreviewSurface for MockPreview {
    fn attach(&self, stream: &dyn DeviceStream) {
        *self.attached.lock() = Some(stream.id().to_string());
        self.attach_count.fetch_add(1, Ordering::SeqCst);
    }

    fn detach(&self) {
        *self.attached.lock() = None;
    }
}
