//! Counting mock device/encoder backends shared by the session and host tests.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::models::error::CaptureError;
use crate::models::recording_result::{EncoderSummary, RecordingResult};
use crate::models::state::{EncoderState, PreviewVisibility, SessionState};
use crate::models::video_models::{CaptureParameters, DeviceInfo, FrameSize, QualityProfile, ZoomRange};
use crate::storage::sink::{MediaSink, SinkWriter};
use crate::surface::preview_binding::SurfaceTarget;
use crate::traits::capture_device::{CaptureDevice, DeviceProvider, FocusCallback};
use crate::traits::encoder_session::{EncoderFactory, EncoderFaultCallback, EncoderSession};
use crate::traits::session_delegate::SessionDelegate;

/// Every call the mocks observed.
#[derive(Debug, Default, Clone)]
pub struct MockLog {
    pub acquired: usize,
    pub device_release_calls: usize,
    pub devices_alive: usize,
    pub max_devices_alive: usize,
    pub applied: Vec<CaptureParameters>,
    pub attached: Vec<SurfaceTarget>,
    pub zooms: Vec<u32>,
    pub autofocus: usize,
    pub encoders_created: usize,
    pub encoders_alive: usize,
    pub max_encoders_alive: usize,
    pub configured: Vec<QualityProfile>,
    pub encoder_started: usize,
    pub encoder_stopped: usize,
    pub encoder_release_calls: usize,
}

/// Failure injection knobs.
#[derive(Debug, Clone)]
pub struct MockBehavior {
    pub sizes: Vec<FrameSize>,
    pub zoom: ZoomRange,
    pub acquire_error: Option<CaptureError>,
    pub prepare_error: Option<CaptureError>,
    pub stop_error: Option<CaptureError>,
    /// Raised through the fault callback from inside `start`.
    pub start_fault: Option<CaptureError>,
    /// Time `start` keeps running after raising `start_fault`.
    pub start_delay: Duration,
    pub device_release_error: bool,
    pub encoder_release_error: bool,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            sizes: vec![
                FrameSize::new(640, 480),
                FrameSize::new(1280, 720),
                FrameSize::new(1920, 1080),
            ],
            zoom: ZoomRange::new(0, 10),
            acquire_error: None,
            prepare_error: None,
            stop_error: None,
            start_fault: None,
            start_delay: Duration::ZERO,
            device_release_error: false,
            encoder_release_error: false,
        }
    }
}

/// Blocks `acquire` until opened.
#[derive(Default)]
pub struct Gate {
    closed: Mutex<bool>,
    changed: Condvar,
}

impl Gate {
    pub fn close(&self) {
        *self.closed.lock() = true;
    }

    pub fn open(&self) {
        *self.closed.lock() = false;
        self.changed.notify_all();
    }

    fn pass(&self) {
        let mut closed = self.closed.lock();
        while *closed {
            self.changed.wait(&mut closed);
        }
    }
}

/// Shared handle the test keeps to inspect and steer the mocks.
#[derive(Clone, Default)]
pub struct MockBackend {
    pub log: Arc<Mutex<MockLog>>,
    pub behavior: Arc<Mutex<MockBehavior>>,
    pub gate: Arc<Gate>,
    pub fault: Arc<Mutex<Option<EncoderFaultCallback>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> MockLog {
        self.log.lock().clone()
    }

    pub fn provider(&self) -> MockProvider {
        MockProvider { backend: self.clone() }
    }

    pub fn factory(&self) -> MockEncoderFactory {
        MockEncoderFactory { backend: self.clone() }
    }

    /// Raise a runtime fault from the running encoder.
    pub fn raise_fault(&self, error: CaptureError) {
        let callback = self.fault.lock().clone();
        if let Some(callback) = callback {
            callback(error);
        }
    }
}

pub struct MockProvider {
    backend: MockBackend,
}

impl DeviceProvider for MockProvider {
    type Device = MockDevice;

    fn acquire(&self) -> Result<MockDevice, CaptureError> {
        self.backend.gate.pass();
        if let Some(err) = self.backend.behavior.lock().acquire_error.clone() {
            return Err(err);
        }
        let mut log = self.backend.log.lock();
        log.acquired += 1;
        log.devices_alive += 1;
        log.max_devices_alive = log.max_devices_alive.max(log.devices_alive);
        Ok(MockDevice {
            backend: self.backend.clone(),
            parameters: None,
            released: false,
        })
    }
}

pub struct MockDevice {
    backend: MockBackend,
    parameters: Option<CaptureParameters>,
    released: bool,
}

impl CaptureDevice for MockDevice {
    fn info(&self) -> DeviceInfo {
        DeviceInfo {
            id: "mock-0".into(),
            name: "Mock Camera".into(),
            is_default: true,
        }
    }

    fn supported_sizes(&self) -> Vec<FrameSize> {
        self.backend.behavior.lock().sizes.clone()
    }

    fn zoom_range(&self) -> ZoomRange {
        self.backend.behavior.lock().zoom
    }

    fn parameters(&self) -> Option<CaptureParameters> {
        self.parameters
    }

    fn apply_parameters(&mut self, params: CaptureParameters) -> Result<(), CaptureError> {
        self.parameters = Some(params);
        self.backend.log.lock().applied.push(params);
        Ok(())
    }

    fn attach_output(&mut self, surface: &SurfaceTarget) -> Result<(), CaptureError> {
        self.backend.log.lock().attached.push(*surface);
        Ok(())
    }

    fn set_zoom(&mut self, level: u32) -> Result<(), CaptureError> {
        if let Some(params) = self.parameters.as_mut() {
            params.zoom = level;
        }
        self.backend.log.lock().zooms.push(level);
        Ok(())
    }

    fn autofocus(&mut self, callback: FocusCallback) {
        self.backend.log.lock().autofocus += 1;
        callback(true);
    }

    fn release(&mut self) -> Result<(), CaptureError> {
        let mut log = self.backend.log.lock();
        log.device_release_calls += 1;
        if !self.released {
            self.released = true;
            log.devices_alive -= 1;
        }
        if self.backend.behavior.lock().device_release_error {
            return Err(CaptureError::DeviceUnavailable);
        }
        Ok(())
    }
}

pub struct MockEncoderFactory {
    backend: MockBackend,
}

impl EncoderFactory for MockEncoderFactory {
    type Encoder = MockEncoder;

    fn create(&self) -> MockEncoder {
        let mut log = self.backend.log.lock();
        log.encoders_created += 1;
        log.encoders_alive += 1;
        log.max_encoders_alive = log.max_encoders_alive.max(log.encoders_alive);
        MockEncoder {
            backend: self.backend.clone(),
            state: EncoderState::Unconfigured,
            writer: None,
        }
    }
}

pub struct MockEncoder {
    backend: MockBackend,
    state: EncoderState,
    writer: Option<Box<dyn SinkWriter>>,
}

impl EncoderSession for MockEncoder {
    fn state(&self) -> EncoderState {
        self.state
    }

    fn configure(
        &mut self,
        source: &CaptureParameters,
        profile: &QualityProfile,
        mut sink: Box<dyn MediaSink>,
    ) -> Result<(), CaptureError> {
        if source.frame_size != profile.frame_size {
            return Err(CaptureError::EncoderConfigInvalid("source/profile size mismatch".into()));
        }
        self.writer = Some(sink.open()?);
        self.backend.log.lock().configured.push(*profile);
        self.state = EncoderState::Configured;
        Ok(())
    }

    fn prepare(&mut self) -> Result<(), CaptureError> {
        if let Some(err) = self.backend.behavior.lock().prepare_error.clone() {
            return Err(err);
        }
        self.state = EncoderState::Prepared;
        Ok(())
    }

    fn start(&mut self, on_fault: EncoderFaultCallback) -> Result<(), CaptureError> {
        *self.backend.fault.lock() = Some(on_fault.clone());
        self.backend.log.lock().encoder_started += 1;
        self.state = EncoderState::Running;

        let (fault, delay) = {
            let behavior = self.backend.behavior.lock();
            (behavior.start_fault.clone(), behavior.start_delay)
        };
        if let Some(fault) = fault {
            on_fault(fault);
            thread::sleep(delay);
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<EncoderSummary, CaptureError> {
        self.backend.log.lock().encoder_stopped += 1;
        self.state = EncoderState::Stopped;
        if let Some(err) = self.backend.behavior.lock().stop_error.clone() {
            return Err(err);
        }
        Ok(EncoderSummary {
            frame_count: 0,
            duration_secs: 0.0,
            bytes_written: 0,
            checksum: String::new(),
        })
    }

    fn release(&mut self) -> Result<(), CaptureError> {
        let mut log = self.backend.log.lock();
        log.encoder_release_calls += 1;
        if self.state != EncoderState::Released {
            self.state = EncoderState::Released;
            self.writer = None;
            log.encoders_alive -= 1;
        }
        if self.backend.behavior.lock().encoder_release_error {
            return Err(CaptureError::EncoderConfigInvalid("release failed".into()));
        }
        Ok(())
    }
}

/// Sink that refuses to open.
pub struct FailingSink;

impl MediaSink for FailingSink {
    fn open(&mut self) -> std::io::Result<Box<dyn SinkWriter>> {
        Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "destination is read-only"))
    }

    fn describe(&self) -> String {
        "failing".into()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    State(SessionState),
    Visibility(PreviewVisibility),
    Started(CaptureParameters),
    StartFailed(CaptureError),
    Finished(RecordingResult),
    Error(CaptureError),
    Zoom(u32),
    Focus(bool),
}

/// Delegate that records everything it is told.
#[derive(Default)]
pub struct RecordingDelegate {
    events: Mutex<Vec<Event>>,
    stall: Mutex<Option<(SessionState, Duration)>>,
}

impl RecordingDelegate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Sleep inside `on_state_changed` whenever `state` is announced.
    pub fn stall_on(&self, state: SessionState, delay: Duration) {
        *self.stall.lock() = Some((state, delay));
    }

    /// Announced states, in delivery order.
    pub fn states(&self) -> Vec<SessionState> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::State(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, matches: impl Fn(&Event) -> bool) -> usize {
        self.events.lock().iter().filter(|e| matches(e)).count()
    }

    pub fn finished(&self) -> Vec<RecordingResult> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Finished(result) => Some(result.clone()),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        self.events.lock().push(event);
    }
}

impl SessionDelegate for RecordingDelegate {
    fn on_state_changed(&self, state: &SessionState) {
        let stall = self.stall.lock().clone();
        if let Some((stalled, delay)) = stall {
            if &stalled == state {
                thread::sleep(delay);
            }
        }
        self.push(Event::State(state.clone()));
    }

    fn on_preview_visibility(&self, visibility: PreviewVisibility) {
        self.push(Event::Visibility(visibility));
    }

    fn on_recording_started(&self, parameters: &CaptureParameters) {
        self.push(Event::Started(*parameters));
    }

    fn on_start_failed(&self, error: &CaptureError) {
        self.push(Event::StartFailed(error.clone()));
    }

    fn on_recording_finished(&self, result: &RecordingResult) {
        self.push(Event::Finished(result.clone()));
    }

    fn on_error(&self, error: &CaptureError) {
        self.push(Event::Error(error.clone()));
    }

    fn on_zoom_changed(&self, level: u32) {
        self.push(Event::Zoom(level));
    }

    fn on_focus_completed(&self, success: bool) {
        self.push(Event::Focus(success));
    }
}

/// Poll `condition` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}
