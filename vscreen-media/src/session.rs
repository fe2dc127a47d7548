//! Capture session state machine
//!
//! A session owns at most one device stream and one recorder. Everything that
//! can change its state (recorder data, recorder stop, elapsed ticks, the
//! auto-stop deadline) is funnelled through one FIFO queue and applied by
//! [`CaptureSession::next_event`], so data chunks are always appended before
//! the stop that finalizes them and timer callbacks can never run after the
//! session moved on.
//!
//! The deadline is the exception to "only the pump acts": when the limit
//! passes, the timer task stops the recorder itself, so nothing recorded after
//! the limit reaches the take even if no one is pumping events.
//!
//! ```text
//!   Idle --start--> Recording --stop / limit--> (finalizing) --recorder stopped--> Preview
//!    ^                                                                               |
//!    +------------------------------ teardown <------------------ start (re-record) -+
//! ```

use crate::config::CaptureConfig;
use crate::engine::{
    CaptureEngine, DeviceStream, MediaConstraints, MediaRecorder, PreviewSurface, RecorderEvent,
    RecorderEventSender, SessionInput,
};
use crate::error::{MediaError, MediaResult};
use crate::format::{FormatDescriptor, FormatNegotiator};
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};
use vscreen_core::{Artifact, DEFAULT_MIME_TYPE};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Observable phase of a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapturePhase {
    /// Not recording; no finished take
    Idle,
    /// Recorder running, data accumulating
    Recording,
    /// A finished take is available for playback and upload
    Preview,
}

impl fmt::Display for CapturePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CapturePhase::Idle => "idle",
            CapturePhase::Recording => "recording",
            CapturePhase::Preview => "preview",
        };
        f.write_str(name)
    }
}

/// Something observable happened to a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// The phase changed
    PhaseChanged(CapturePhase),
    /// One more second was recorded
    Tick {
        /// Seconds recorded so far
        elapsed_seconds: u32,
    },
    /// The time limit was reached and a stop was requested
    AutoStopped {
        /// Seconds recorded, equal to the limit
        elapsed_seconds: u32,
    },
    /// The recorder finalized and the take is assembled
    Completed {
        /// The finished take
        artifact: Artifact,
    },
    /// The recorder reported a failure
    RecorderFailed {
        /// Failure reason
        reason: String,
    },
    /// Devices were released
    TornDown,
}

/// Recorder shared between the session and its deadline timer
struct RecorderSlot {
    recorder: Box<dyn MediaRecorder>,
    // segment the recorder was last started for
    segment: u64,
    // the deadline stopped the recorder for `segment`; its stop event is queued
    stopped_at_deadline: bool,
}

type SharedRecorder = Arc<Mutex<RecorderSlot>>;

/// Camera/microphone recording session
pub struct CaptureSession {
    engine: Arc<dyn CaptureEngine>,
    config: CaptureConfig,
    negotiator: FormatNegotiator,
    preview: Option<Arc<dyn PreviewSurface>>,

    stream: Option<Box<dyn DeviceStream>>,
    recorder: Option<SharedRecorder>,
    format: Option<FormatDescriptor>,

    phase: CapturePhase,
    finalizing: bool,
    chunks: Vec<Bytes>,
    elapsed_seconds: u32,
    last_artifact: Option<Artifact>,

    // bumped on every start and teardown; timer inputs carry it
    segment: u64,
    // bumped on every recorder creation; recorder inputs carry it
    generation: u64,

    input_tx: mpsc::UnboundedSender<SessionInput>,
    input_rx: mpsc::UnboundedReceiver<SessionInput>,
    outbox: VecDeque<CaptureEvent>,
    event_tx: broadcast::Sender<CaptureEvent>,

    tick_task: Option<JoinHandle<()>>,
    auto_stop_task: Option<JoinHandle<()>>,
}

impl CaptureSession {
    /// Create a session; devices are not touched until [`initialize`](Self::initialize)
    pub fn new(engine: Arc<dyn CaptureEngine>, config: CaptureConfig) -> MediaResult<Self> {
        config.validate()?;
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            engine,
            negotiator: FormatNegotiator::new(config.format_priority.clone()),
            config,
            preview: None,
            stream: None,
            recorder: None,
            format: None,
            phase: CapturePhase::Idle,
            finalizing: false,
            chunks: Vec::new(),
            elapsed_seconds: 0,
            last_artifact: None,
            segment: 0,
            generation: 0,
            input_tx,
            input_rx,
            outbox: VecDeque::new(),
            event_tx,
            tick_task: None,
            auto_stop_task: None,
        })
    }

    /// Show the live stream on `surface` whenever one is held
    pub fn with_preview(mut self, surface: Arc<dyn PreviewSurface>) -> Self {
        self.preview = Some(surface);
        self
    }

    /// Acquire devices, negotiate a format and build the recorder
    ///
    /// Any stream from a previous initialization is released first. Device
    /// failures leave the session idle with nothing held.
    pub async fn initialize(&mut self) -> MediaResult<()> {
        if self.phase == CapturePhase::Recording {
            return Err(self.invalid_state("idle or preview"));
        }
        self.release_devices();

        let mut stream = self
            .engine
            .acquire_stream(MediaConstraints::default())
            .await?;
        if let Some(preview) = &self.preview {
            preview.attach(stream.as_ref());
        }

        let format = self.negotiator.select(self.engine.as_ref());
        self.generation += 1;
        let events = RecorderEventSender::new(self.generation, self.input_tx.clone());
        let created = self
            .engine
            .create_recorder(stream.as_ref(), format.as_ref(), events);
        let recorder = match created {
            Ok(recorder) => recorder,
            Err(e) => {
                stream.stop_tracks();
                if let Some(preview) = &self.preview {
                    preview.detach();
                }
                return Err(e);
            }
        };

        info!(
            "Capture session initialized on stream {} ({})",
            stream.id(),
            format
                .as_ref()
                .map(FormatDescriptor::as_str)
                .unwrap_or("engine default format")
        );
        self.stream = Some(stream);
        self.recorder = Some(Arc::new(Mutex::new(RecorderSlot {
            recorder,
            segment: self.segment,
            stopped_at_deadline: false,
        })));
        self.format = format;
        self.chunks.clear();
        self.last_artifact = None;
        self.set_phase(CapturePhase::Idle);
        Ok(())
    }

    /// Begin a take, discarding any previous one
    pub fn start(&mut self) -> MediaResult<()> {
        if self.phase == CapturePhase::Recording {
            return Err(self.invalid_state("idle or preview"));
        }
        let handle = Handle::try_current().map_err(|e| MediaError::RuntimeUnavailable {
            reason: e.to_string(),
        })?;
        let recorder = self.recorder.clone().ok_or(MediaError::NotInitialized)?;

        self.segment += 1;
        self.chunks.clear();
        self.elapsed_seconds = 0;
        self.last_artifact = None;
        self.finalizing = false;

        {
            let mut slot = recorder.lock();
            slot.segment = self.segment;
            slot.stopped_at_deadline = false;
            slot.recorder.start(self.config.timeslice)?;
        }
        self.arm_timers(&handle, &recorder);
        debug!("Recording segment {} started", self.segment);
        self.set_phase(CapturePhase::Recording);
        Ok(())
    }

    /// Request finalization of the running take
    ///
    /// The take becomes available once the recorder's stop event has been
    /// processed by [`next_event`](Self::next_event).
    pub fn stop(&mut self) -> MediaResult<()> {
        if self.phase != CapturePhase::Recording || self.finalizing {
            return Err(self.invalid_state("recording"));
        }
        // ticks already queued belong to this take
        while let Ok(input) = self.input_rx.try_recv() {
            self.handle_input(input);
        }
        if !self.is_actively_recording() {
            // the limit or a recorder failure got there first
            return Ok(());
        }
        self.request_stop()
    }

    /// Stop and wait for the finished take
    pub async fn finish(&mut self) -> MediaResult<Artifact> {
        self.stop()?;
        while let Some(event) = self.next_event().await {
            if let CaptureEvent::Completed { artifact } = event {
                return Ok(artifact);
            }
        }
        Err(MediaError::Recorder {
            reason: "recorder stopped without delivering a recording".to_string(),
        })
    }

    /// Cancel timers, stop the recorder and release every device
    ///
    /// Safe to call in any phase and more than once.
    pub fn teardown(&mut self) {
        let had_devices = self.stream.is_some() || self.recorder.is_some();
        self.cancel_timers();
        self.release_devices();
        self.chunks.clear();
        self.finalizing = false;
        self.segment += 1;
        while self.input_rx.try_recv().is_ok() {}
        self.set_phase(CapturePhase::Idle);
        if had_devices {
            info!("Capture session torn down");
            self.emit(CaptureEvent::TornDown);
        }
    }

    /// Next event, applying queued recorder and timer input as needed
    ///
    /// Returns `None` once nothing further can happen without a call on the
    /// session.
    pub async fn next_event(&mut self) -> Option<CaptureEvent> {
        loop {
            if let Some(event) = self.outbox.pop_front() {
                return Some(event);
            }
            if let Ok(input) = self.input_rx.try_recv() {
                self.handle_input(input);
                continue;
            }
            if !self.awaiting_input() {
                return None;
            }
            let input = self.input_rx.recv().await?;
            self.handle_input(input);
        }
    }

    /// Next event without waiting
    pub fn try_next_event(&mut self) -> Option<CaptureEvent> {
        loop {
            if let Some(event) = self.outbox.pop_front() {
                return Some(event);
            }
            let input = self.input_rx.try_recv().ok()?;
            self.handle_input(input);
        }
    }

    /// Subscribe to session events
    ///
    /// Subscribers see events as they are applied by the session's pump.
    pub fn subscribe(&self) -> broadcast::Receiver<CaptureEvent> {
        self.event_tx.subscribe()
    }

    /// Current phase
    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    /// Whether a stop has been requested and the recorder has not finished yet
    pub fn is_finalizing(&self) -> bool {
        self.finalizing
    }

    /// Seconds recorded in the current take
    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    /// Configured time limit in seconds
    pub fn time_limit_seconds(&self) -> u32 {
        self.config.time_limit_seconds
    }

    /// Number of non-empty chunks buffered for the current take
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Bytes buffered for the current take
    pub fn buffered_bytes(&self) -> usize {
        self.chunks.iter().map(Bytes::len).sum()
    }

    /// Negotiated format, if any
    pub fn format(&self) -> Option<&FormatDescriptor> {
        self.format.as_ref()
    }

    /// Format the take will be labelled with
    pub fn mime_type(&self) -> String {
        self.format
            .as_ref()
            .map(|f| f.as_str().to_string())
            .or_else(|| self.recorder.as_ref().and_then(|r| r.lock().recorder.mime_type()))
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string())
    }

    /// Whether a stream and recorder are held
    pub fn is_initialized(&self) -> bool {
        self.stream.is_some() && self.recorder.is_some()
    }

    /// Whether the held stream has live tracks
    pub fn has_live_stream(&self) -> bool {
        self.stream.as_ref().is_some_and(|s| s.is_active())
    }

    /// The finished take, while in preview
    pub fn last_artifact(&self) -> Option<&Artifact> {
        self.last_artifact.as_ref()
    }

    /// Whether a tick or auto-stop timer is armed
    pub fn has_pending_timers(&self) -> bool {
        self.tick_task.is_some() || self.auto_stop_task.is_some()
    }

    fn arm_timers(&mut self, handle: &Handle, recorder: &SharedRecorder) {
        self.cancel_timers();
        let segment = self.segment;
        let now = Instant::now();

        let period = self.config.tick_interval;
        let tx = self.input_tx.clone();
        let slot = Arc::clone(recorder);
        self.tick_task = Some(handle.spawn(async move {
            let mut ticks = interval_at(now + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                {
                    let slot = slot.lock();
                    if slot.segment != segment || slot.stopped_at_deadline {
                        break;
                    }
                }
                if tx.send(SessionInput::Tick { segment }).is_err() {
                    break;
                }
            }
        }));

        let deadline = now + self.config.time_limit();
        let tx = self.input_tx.clone();
        let slot = Arc::clone(recorder);
        self.auto_stop_task = Some(handle.spawn(async move {
            sleep_until(deadline).await;
            let mut slot = slot.lock();
            if slot.segment != segment || !slot.recorder.is_recording() {
                return;
            }
            // queued ahead of the recorder's final chunks and stop event
            if tx.send(SessionInput::AutoStop { segment }).is_err() {
                return;
            }
            match slot.recorder.stop() {
                Ok(()) => slot.stopped_at_deadline = true,
                Err(e) => warn!("Recorder stop at the time limit failed: {}", e),
            }
        }));
    }

    fn cancel_timers(&mut self) {
        if let Some(task) = self.tick_task.take() {
            task.abort();
        }
        if let Some(task) = self.auto_stop_task.take() {
            task.abort();
        }
    }

    fn request_stop(&mut self) -> MediaResult<()> {
        self.cancel_timers();
        self.finalizing = true;
        let recorder = self.recorder.as_ref().ok_or(MediaError::NotInitialized)?;
        // Ok(true) while a stop event is still to come
        let outcome = {
            let mut slot = recorder.lock();
            if slot.recorder.is_recording() {
                slot.recorder.stop().map(|()| true)
            } else {
                Ok(slot.stopped_at_deadline)
            }
        };
        match outcome {
            Ok(true) => {}
            Ok(false) => {
                debug!("Recorder already idle, finalizing buffered data");
                self.finalize();
            }
            Err(e) => {
                warn!("Recorder stop failed, finalizing buffered data: {}", e);
                self.finalize();
            }
        }
        Ok(())
    }

    fn finalize(&mut self) {
        self.cancel_timers();
        self.finalizing = false;
        let artifact = Artifact::from_chunks(&self.chunks, self.mime_type());
        self.chunks.clear();
        info!(
            "Recording segment {} finalized: {} bytes, {}s",
            self.segment,
            artifact.len(),
            self.elapsed_seconds
        );
        self.last_artifact = Some(artifact.clone());
        self.set_phase(CapturePhase::Preview);
        self.emit(CaptureEvent::Completed { artifact });
    }

    fn handle_input(&mut self, input: SessionInput) {
        match input {
            SessionInput::Recorder { generation, event } => {
                if generation != self.generation {
                    trace!("Discarding event from stale recorder {}", generation);
                    return;
                }
                self.handle_recorder_event(event);
            }
            SessionInput::Tick { segment } => {
                if segment != self.segment || !self.is_actively_recording() {
                    return;
                }
                self.elapsed_seconds = (self.elapsed_seconds + 1).min(self.config.time_limit_seconds);
                self.emit(CaptureEvent::Tick {
                    elapsed_seconds: self.elapsed_seconds,
                });
            }
            SessionInput::AutoStop { segment } => {
                if segment != self.segment || !self.is_actively_recording() {
                    return;
                }
                self.elapsed_seconds = self.config.time_limit_seconds;
                info!(
                    "Time limit of {}s reached, stopping recording",
                    self.config.time_limit_seconds
                );
                self.emit(CaptureEvent::AutoStopped {
                    elapsed_seconds: self.elapsed_seconds,
                });
                if let Err(e) = self.request_stop() {
                    warn!("Auto-stop failed: {}", e);
                }
            }
        }
    }

    fn handle_recorder_event(&mut self, event: RecorderEvent) {
        match event {
            RecorderEvent::DataAvailable(data) => {
                if data.is_empty() {
                    return;
                }
                if self.phase == CapturePhase::Recording {
                    self.chunks.push(data);
                } else {
                    trace!("Dropping {} bytes received outside a take", data.len());
                }
            }
            RecorderEvent::Stopped => {
                if self.phase == CapturePhase::Recording {
                    self.finalize();
                }
            }
            RecorderEvent::Error(reason) => {
                warn!("Recorder failed: {}", reason);
                self.emit(CaptureEvent::RecorderFailed { reason });
                if self.is_actively_recording() {
                    if let Err(e) = self.request_stop() {
                        warn!("Stop after recorder failure failed: {}", e);
                    }
                }
            }
        }
    }

    fn is_actively_recording(&self) -> bool {
        self.phase == CapturePhase::Recording && !self.finalizing
    }

    fn awaiting_input(&self) -> bool {
        self.phase == CapturePhase::Recording
    }

    fn release_devices(&mut self) {
        if let Some(recorder) = self.recorder.take() {
            let mut slot = recorder.lock();
            if slot.recorder.is_recording() {
                if let Err(e) = slot.recorder.stop() {
                    debug!("Ignoring recorder stop failure during release: {}", e);
                }
            }
        }
        if let Some(mut stream) = self.stream.take() {
            stream.stop_tracks();
            debug!("Released stream {}", stream.id());
        }
        if let Some(preview) = &self.preview {
            preview.detach();
        }
        self.format = None;
    }

    fn set_phase(&mut self, phase: CapturePhase) {
        if self.phase != phase {
            debug!("Capture phase {} -> {}", self.phase, phase);
            self.phase = phase;
            self.emit(CaptureEvent::PhaseChanged(phase));
        }
    }

    fn emit(&mut self, event: CaptureEvent) {
        self.outbox.push_back(event.clone());
        let _ = self.event_tx.send(event);
    }

    fn invalid_state(&self, expected: &str) -> MediaError {
        let actual = if self.finalizing {
            "finalizing".to_string()
        } else {
            self.phase.to_string()
        };
        MediaError::InvalidState {
            expected: expected.to_string(),
            actual,
        }
    }
}

impl fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureSession")
            .field("phase", &self.phase)
            .field("finalizing", &self.finalizing)
            .field("elapsed_seconds", &self.elapsed_seconds)
            .field("chunks", &self.chunks.len())
            .field("format", &self.format)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.cancel_timers();
        self.release_devices();
    }
}
