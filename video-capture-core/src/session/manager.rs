use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::{Condvar, Mutex, MutexGuard, RwLock};

use crate::models::config::SessionConfiguration;
use crate::models::error::CaptureError;
use crate::models::recording_result::{EncoderSummary, RecordingResult};
use crate::models::request::RecordingRequest;
use crate::models::state::{PreviewVisibility, SessionState};
use crate::models::video_models::{CaptureParameters, FrameSize, QualitySelector};
use crate::processing::negotiation::{negotiate_parameters, NegotiatedParameters};
use crate::storage::sink::MediaSink;
use crate::surface::preview_binding::{PreviewSurfaceBinding, SurfaceTarget};
use crate::traits::capture_device::{CaptureDevice, DeviceProvider, FocusCallback};
use crate::traits::encoder_session::{EncoderFactory, EncoderFaultCallback, EncoderSession};
use crate::traits::session_control::SessionControl;
use crate::traits::session_delegate::SessionDelegate;

/// Device and encoder held for one recording cycle.
struct ActiveRecording<D, E> {
    cycle: u64,
    request_id: String,
    destination: String,
    file_path: Option<PathBuf>,
    negotiated: NegotiatedParameters,
    device: D,
    encoder: E,
}

/// Internal mutable session state, protected by `parking_lot::Mutex`.
struct SessionCore<D, E> {
    state: SessionState,
    pending: Option<RecordingRequest>,
    active: Option<ActiveRecording<D, E>>,
    prepare_in_flight: bool,
    prepare_thread: Option<ThreadId>,
    stop_requested: bool,
    /// Fault raised by the encoder of the cycle still being prepared.
    pending_fault: Option<CaptureError>,
    /// Completed preparations whose notices are not yet delivered.
    unannounced: u32,
    shut_down: bool,
    cycles: u64,
}

impl<D, E> SessionCore<D, E> {
    fn new() -> Self {
        Self {
            state: SessionState::Idle,
            pending: None,
            active: None,
            prepare_in_flight: false,
            prepare_thread: None,
            stop_requested: false,
            pending_fault: None,
            unannounced: 0,
            shut_down: false,
            cycles: 0,
        }
    }
}

/// Notification collected under the lock and delivered after it is released.
enum Notice {
    State(SessionState),
    Visibility(PreviewVisibility),
    Started(CaptureParameters),
    StartFailed(CaptureError),
    Finished(RecordingResult),
    Error(CaptureError),
    Zoom(u32),
}

/// Notices in the order they were generated.
///
/// Whichever thread finds nobody delivering drains the backlog, including
/// notices other threads queue meanwhile. Those threads wait until their
/// own notices are out, so every control call returns after its notices
/// reached the delegate.
struct NoticeQueue {
    backlog: Mutex<NoticeBacklog>,
    delivered: Condvar,
}

#[derive(Default)]
struct NoticeBacklog {
    pending: VecDeque<Notice>,
    queued: u64,
    delivered: u64,
    dispatcher: Option<ThreadId>,
}

impl NoticeQueue {
    fn new() -> Self {
        Self {
            backlog: Mutex::new(NoticeBacklog::default()),
            delivered: Condvar::new(),
        }
    }

    /// Queue notices and return the ticket to wait for. Callers hold the
    /// core lock, which fixes the order.
    fn push(&self, notices: Vec<Notice>) -> u64 {
        if notices.is_empty() {
            return 0;
        }
        let mut backlog = self.backlog.lock();
        backlog.queued += notices.len() as u64;
        backlog.pending.extend(notices);
        backlog.queued
    }

    fn dispatching_here(&self) -> bool {
        self.backlog.lock().dispatcher == Some(thread::current().id())
    }
}

struct Shared<P: DeviceProvider, F: EncoderFactory> {
    provider: P,
    factory: F,
    config: SessionConfiguration,
    surface: PreviewSurfaceBinding,
    core: Mutex<SessionCore<P::Device, F::Encoder>>,
    prepare_done: Condvar,
    notices: NoticeQueue,
    delegate: RwLock<Option<Arc<dyn SessionDelegate>>>,
}

type Prepared<D, E> = (D, E, NegotiatedParameters);

/// Capture session manager: owns the capture device and the encoder and
/// sequences `prepare → start → run → stop → release`.
///
/// All state transitions and all device/encoder calls go through one mutex.
/// Preparation (device negotiation, encoder prepare) runs on a dedicated
/// worker thread; control calls return without waiting for it.
///
/// ```text
/// [host] ─ start/stop/zoom/focus ─→ [SessionCore (mutex)] ─→ [device] [encoder]
///                                          ↑
///                    [prepare worker] ─ typed outcome
/// ```
///
/// Dropping the manager runs `shutdown`.
pub struct CaptureSessionManager<P: DeviceProvider, F: EncoderFactory> {
    shared: Arc<Shared<P, F>>,
}

impl<P: DeviceProvider, F: EncoderFactory> CaptureSessionManager<P, F> {
    pub fn new(provider: P, factory: F, surface: PreviewSurfaceBinding, config: SessionConfiguration) -> Self {
        Self {
            shared: Arc::new(Shared {
                provider,
                factory,
                config,
                surface,
                core: Mutex::new(SessionCore::new()),
                prepare_done: Condvar::new(),
                notices: NoticeQueue::new(),
                delegate: RwLock::new(None),
            }),
        }
    }

    pub fn config(&self) -> &SessionConfiguration {
        &self.shared.config
    }

    pub fn surface(&self) -> &PreviewSurfaceBinding {
        &self.shared.surface
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.core.lock().shut_down
    }

    /// Parameters currently applied to the device, while recording.
    pub fn negotiated_parameters(&self) -> Option<CaptureParameters> {
        let core = self.shared.core.lock();
        core.active
            .as_ref()
            .map(|a| a.device.parameters().unwrap_or(a.negotiated.parameters))
    }

    /// Accept a recording request.
    ///
    /// Rejected with `AlreadyRecording` unless idle with nothing pending.
    /// Preparation starts now if the preview surface is ready, otherwise as
    /// soon as it becomes ready.
    pub fn accept(&self, request: RecordingRequest) -> Result<(), CaptureError> {
        self.shared.accept(request)
    }
}

impl<P: DeviceProvider, F: EncoderFactory> SessionControl for CaptureSessionManager<P, F> {
    fn state(&self) -> SessionState {
        self.shared.core.lock().state.clone()
    }

    fn set_delegate(&self, delegate: Arc<dyn SessionDelegate>) {
        *self.shared.delegate.write() = Some(delegate);
    }

    fn start_session(&self, sink: Box<dyn MediaSink>, quality: QualitySelector) -> Result<(), CaptureError> {
        self.shared.accept(RecordingRequest::new(sink, quality))
    }

    fn stop_session(&self) {
        self.shared.stop();
    }

    fn set_zoom_level(&self, level: i32) -> Result<u32, CaptureError> {
        self.shared.set_zoom(level)
    }

    fn request_focus(&self) -> Result<(), CaptureError> {
        self.shared.focus()
    }

    fn notify_surface_ready(&self, size: FrameSize) {
        self.shared.surface_ready(size);
    }

    fn notify_surface_lost(&self) {
        self.shared.surface_lost();
    }

    fn show_preview(&self) {
        log::debug!("Request to show preview");
        self.shared.publish(vec![Notice::Visibility(PreviewVisibility::Visible)]);
    }

    fn hide_preview(&self) {
        log::debug!("Request to hide preview");
        self.shared.publish(vec![Notice::Visibility(PreviewVisibility::Hidden)]);
    }

    fn wait_for_prepare(&self, timeout: Duration) -> bool {
        self.shared.wait_for_prepare(timeout)
    }

    fn shutdown(&self) {
        self.shared.shutdown();
    }
}

impl<P: DeviceProvider, F: EncoderFactory> Drop for CaptureSessionManager<P, F> {
    fn drop(&mut self) {
        self.shared.shutdown();
    }
}

impl<P: DeviceProvider, F: EncoderFactory> Shared<P, F> {
    // --- Control entry points ---

    fn accept(self: &Arc<Self>, request: RecordingRequest) -> Result<(), CaptureError> {
        let mut notices = Vec::new();
        let (result, ticket) = {
            let mut core = self.core.lock();
            let result = if core.shut_down {
                log::warn!("Rejecting recording request {}: session shut down", request.id());
                Err(CaptureError::SessionShutDown)
            } else if !core.state.is_idle() || core.pending.is_some() {
                log::warn!(
                    "Rejecting recording request {}: already recording ({})",
                    request.id(),
                    core.state.name()
                );
                Err(CaptureError::AlreadyRecording)
            } else {
                log::info!(
                    "Accepted recording request {} ({} → {})",
                    request.id(),
                    request.quality(),
                    request.sink().describe()
                );
                core.pending = Some(request);
                self.try_begin_prepare(&mut core, &mut notices);
                Ok(())
            };
            (result, self.notices.push(notices))
        };
        self.deliver(ticket);
        result
    }

    fn stop(self: &Arc<Self>) {
        let mut notices = Vec::new();
        let ticket = {
            let mut core = self.core.lock();
            match core.state {
                SessionState::Preparing => {
                    if !core.stop_requested {
                        log::info!("Stop requested while preparing; deferring until preparation completes");
                    }
                    core.stop_requested = true;
                }
                SessionState::Recording => {
                    log::info!("Stopping recording");
                    self.teardown(&mut core, &mut notices, None);
                }
                SessionState::Idle => match core.pending.take() {
                    Some(request) => log::info!("Cancelled pending recording request {}", request.id()),
                    None => log::debug!("Stop requested while idle"),
                },
                SessionState::Stopping | SessionState::Failed(_) => {
                    log::debug!("Stop requested while {}", core.state.name());
                }
            }
            self.notices.push(notices)
        };
        self.deliver(ticket);
    }

    fn set_zoom(self: &Arc<Self>, level: i32) -> Result<u32, CaptureError> {
        let mut notices = Vec::new();
        let (result, ticket) = {
            let mut core = self.core.lock();
            let state_name = core.state.name();
            let recording = core.state.is_recording();
            let result = match core.active.as_mut() {
                Some(active) if recording => {
                    let applied = active.device.zoom_range().clamp(level);
                    if i64::from(applied) != i64::from(level) {
                        log::debug!("Zoom level {} clamped to {}", level, applied);
                    }
                    match active.device.set_zoom(applied) {
                        Ok(()) => {
                            notices.push(Notice::Zoom(applied));
                            if self.config.focus_on_zoom {
                                active.device.autofocus(self.focus_callback());
                            }
                            Ok(applied)
                        }
                        Err(e) => {
                            log::warn!("Device rejected zoom level {}: {}", applied, e);
                            Err(e)
                        }
                    }
                }
                _ => {
                    log::debug!("Ignoring zoom request while {}", state_name);
                    Err(CaptureError::NotRecording)
                }
            };
            (result, self.notices.push(notices))
        };
        self.deliver(ticket);
        result
    }

    fn focus(self: &Arc<Self>) -> Result<(), CaptureError> {
        let mut core = self.core.lock();
        let state_name = core.state.name();
        let recording = core.state.is_recording();
        match core.active.as_mut() {
            Some(active) if recording => {
                active.device.autofocus(self.focus_callback());
                Ok(())
            }
            _ => {
                log::debug!("Ignoring focus request while {}", state_name);
                Err(CaptureError::NotRecording)
            }
        }
    }

    fn surface_ready(self: &Arc<Self>, size: FrameSize) {
        let mut notices = Vec::new();
        let ticket = {
            let mut core = self.core.lock();
            if core.shut_down {
                return;
            }
            if !self.surface.is_ready() {
                log::warn!("Surface-ready notification ({}) but the binding is not ready; ignoring", size);
                return;
            }
            if core.state.is_idle() && core.pending.is_some() {
                log::debug!("Preview surface ready at {}; starting pending request", size);
                self.try_begin_prepare(&mut core, &mut notices);
            } else {
                log::debug!("Preview surface ready at {} while {}; nothing to start", size, core.state.name());
            }
            self.notices.push(notices)
        };
        self.deliver(ticket);
    }

    fn surface_lost(self: &Arc<Self>) {
        let mut notices = Vec::new();
        let ticket = {
            let mut core = self.core.lock();
            match core.state {
                SessionState::Recording => {
                    log::info!("Preview surface lost; stopping recording");
                    self.teardown(&mut core, &mut notices, None);
                }
                SessionState::Preparing => {
                    log::info!("Preview surface lost while preparing; stopping once preparation completes");
                    core.stop_requested = true;
                }
                _ => {
                    if core.pending.is_some() {
                        log::debug!("Preview surface lost; holding pending request until it returns");
                    }
                }
            }
            self.notices.push(notices)
        };
        self.deliver(ticket);
    }

    /// Waits for the worker and for its notices to reach the delegate. From
    /// inside a delegate callback only the worker is waited for, since that
    /// callback is what delivers the notices.
    fn wait_for_prepare(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let announced = !self.notices.dispatching_here();
        let busy = |core: &SessionCore<P::Device, F::Encoder>| {
            core.prepare_in_flight || (announced && core.unannounced > 0)
        };
        let mut core = self.core.lock();
        while busy(&*core) {
            if self.prepare_done.wait_until(&mut core, deadline).timed_out() {
                return !busy(&*core);
            }
        }
        true
    }

    /// Wait-then-release: an in-flight preparation always runs to completion
    /// before anything is torn down.
    fn shutdown(self: &Arc<Self>) {
        let mut notices = Vec::new();
        let ticket = {
            let mut core = self.core.lock();
            if core.shut_down {
                log::debug!("Capture session already shut down");
                return;
            }
            log::info!("Shutting down capture session ({})", core.state.name());
            core.shut_down = true;

            if let Some(request) = core.pending.take() {
                log::info!("Dropping pending recording request {}", request.id());
            }

            if core.prepare_in_flight {
                core.stop_requested = true;
                if core.prepare_thread == Some(thread::current().id()) {
                    // Called back from the worker; it reconciles on its way out.
                    return;
                }
                log::info!("Waiting for in-flight preparation before releasing resources");
                while core.prepare_in_flight {
                    self.prepare_done.wait(&mut core);
                }
            }

            if core.state.is_recording() {
                self.teardown(&mut core, &mut notices, None);
            }
            self.notices.push(notices)
        };
        self.deliver(ticket);
    }

    // --- Preparation ---

    /// Start preparing if idle, a request is pending and the surface is ready.
    fn try_begin_prepare(
        self: &Arc<Self>,
        core: &mut SessionCore<P::Device, F::Encoder>,
        notices: &mut Vec<Notice>,
    ) {
        if !core.state.is_idle() || core.shut_down || core.prepare_in_flight {
            return;
        }
        let Some(target) = self.surface.target() else {
            log::debug!("Holding recording request until the preview surface is ready");
            return;
        };
        let Some(request) = core.pending.take() else {
            return;
        };

        core.cycles += 1;
        let cycle = core.cycles;
        core.stop_requested = false;
        core.pending_fault = None;
        core.prepare_in_flight = true;
        self.set_state(core, SessionState::Preparing, notices);

        let shared = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name("capture-prepare".into())
            .spawn(move || shared.run_prepare(cycle, request, target));

        match spawned {
            Ok(handle) => core.prepare_thread = Some(handle.thread().id()),
            Err(e) => {
                log::error!("Failed to spawn prepare worker: {}", e);
                core.prepare_in_flight = false;
                self.set_state(core, SessionState::Failed(CaptureError::PreparationFailed), notices);
                self.set_state(core, SessionState::Idle, notices);
                notices.push(Notice::StartFailed(CaptureError::PreparationFailed));
                self.prepare_done.notify_all();
            }
        }
    }

    /// Body of the prepare worker thread.
    fn run_prepare(self: Arc<Self>, cycle: u64, request: RecordingRequest, target: SurfaceTarget) {
        let request_id = request.id().to_string();
        let destination = request.sink().describe();
        let file_path = request.sink().path().map(|p| p.to_path_buf());

        log::debug!("Preparing recording {} on {}", request_id, target.handle);
        let started = Instant::now();
        let outcome = self.prepare_resources(cycle, request, target);
        log::debug!("Preparation of {} finished in {:?}", request_id, started.elapsed());

        let outcome = outcome.map(|(device, encoder, negotiated)| ActiveRecording {
            cycle,
            request_id,
            destination,
            file_path,
            negotiated,
            device,
            encoder,
        });
        self.complete_prepare(outcome);
    }

    /// Acquire and configure everything. On failure, whatever this attempt
    /// acquired is released before returning.
    fn prepare_resources(
        self: &Arc<Self>,
        cycle: u64,
        request: RecordingRequest,
        target: SurfaceTarget,
    ) -> Result<Prepared<P::Device, F::Encoder>, CaptureError> {
        let mut device = self.provider.acquire().map_err(|e| {
            log::warn!("Capture device acquisition failed: {}", e);
            e
        })?;
        log::info!("Acquired capture device {}", device.info().name);

        match self.configure_pipeline(cycle, &mut device, request, target) {
            Ok((encoder, negotiated)) => Ok((device, encoder, negotiated)),
            Err(e) => {
                release_device(&mut device);
                Err(e)
            }
        }
    }

    fn configure_pipeline(
        self: &Arc<Self>,
        cycle: u64,
        device: &mut P::Device,
        request: RecordingRequest,
        target: SurfaceTarget,
    ) -> Result<(F::Encoder, NegotiatedParameters), CaptureError> {
        let requested = request.quality().profile();
        let negotiated = negotiate_parameters(device, &requested, target.size, self.config.focus_mode)?;

        // The device must never attach to a surface that went away meanwhile.
        match self.surface.target() {
            Some(current) if current.handle == target.handle => {}
            _ => return Err(CaptureError::SurfaceNotReady),
        }
        device.attach_output(&target)?;

        if self.config.focus_after_configure {
            device.autofocus(self.focus_callback());
        }

        let mut encoder = self.factory.create();
        let sink = request.into_sink();
        let configured = encoder
            .configure(&negotiated.parameters, &negotiated.profile, sink)
            .and_then(|_| encoder.prepare())
            .and_then(|_| encoder.start(self.fault_callback(cycle)));

        match configured {
            Ok(()) => {
                log::info!("Encoder started at {} ({})", negotiated.profile.frame_size, negotiated.profile.quality);
                Ok((encoder, negotiated))
            }
            Err(e) => {
                log::warn!("Encoder setup failed: {}", e);
                release_encoder(&mut encoder);
                Err(e)
            }
        }
    }

    /// Publish the worker's outcome and reconcile any stop that arrived
    /// while it was running.
    fn complete_prepare(self: &Arc<Self>, outcome: Result<ActiveRecording<P::Device, F::Encoder>, CaptureError>) {
        let mut notices = Vec::new();
        let ticket = {
            let mut core = self.core.lock();
            core.prepare_in_flight = false;
            core.prepare_thread = None;
            core.unannounced += 1;
            let stop_now = core.stop_requested || core.shut_down;
            core.stop_requested = false;
            let fault = core.pending_fault.take();

            match outcome {
                Ok(active) => {
                    let parameters = active.negotiated.parameters;
                    core.active = Some(active);
                    self.set_state(&mut core, SessionState::Recording, &mut notices);
                    notices.push(Notice::Started(parameters));
                    if let Some(fault) = fault {
                        log::error!("Encoder failed while starting: {}", fault);
                        notices.push(Notice::Error(fault.clone()));
                        self.teardown(&mut core, &mut notices, Some(fault));
                    } else if stop_now {
                        log::info!("Stop was requested during preparation; stopping the new recording");
                        self.teardown(&mut core, &mut notices, None);
                    }
                }
                Err(error) => {
                    log::warn!("Preparation failed: {}", error);
                    self.set_state(&mut core, SessionState::Failed(error), &mut notices);
                    self.set_state(&mut core, SessionState::Idle, &mut notices);
                    notices.push(Notice::StartFailed(CaptureError::PreparationFailed));
                }
            }
            self.notices.push(notices)
        };
        // Shutdown only needs the worker gone; waiters on the outcome also
        // need the notices delivered.
        self.prepare_done.notify_all();
        self.deliver(ticket);
        self.core.lock().unannounced -= 1;
        self.prepare_done.notify_all();
    }

    // --- Teardown ---

    /// Stop the encoder, then release encoder and device. Every step is
    /// attempted; failures are logged and folded into the result.
    fn teardown(
        &self,
        core: &mut SessionCore<P::Device, F::Encoder>,
        notices: &mut Vec<Notice>,
        fault: Option<CaptureError>,
    ) {
        let Some(mut active) = core.active.take() else {
            return;
        };
        self.set_state(core, SessionState::Stopping, notices);

        let (summary, stop_error) = match active.encoder.stop() {
            Ok(summary) => (summary, None),
            Err(e) => {
                log::warn!("Encoder stop failed: {}", e);
                (EncoderSummary::default(), Some(e))
            }
        };
        release_encoder(&mut active.encoder);
        release_device(&mut active.device);

        let result = RecordingResult {
            id: active.request_id,
            destination: active.destination,
            file_path: active.file_path,
            profile: active.negotiated.profile,
            frame_count: summary.frame_count,
            duration_secs: summary.duration_secs,
            bytes_written: summary.bytes_written,
            checksum: summary.checksum,
            created_at: Utc::now(),
            encoder_error: fault.or(stop_error),
        };
        log::info!(
            "Recording {} finalized: {} frames, {:.2}s, {} bytes",
            result.id,
            result.frame_count,
            result.duration_secs,
            result.bytes_written
        );

        self.set_state(core, SessionState::Idle, notices);
        notices.push(Notice::Finished(result));
    }

    fn handle_encoder_fault(self: &Arc<Self>, cycle: u64, error: CaptureError) {
        let fault = match error {
            CaptureError::EncoderFault(_) => error,
            other => CaptureError::EncoderFault(other.to_string()),
        };
        let mut notices = Vec::new();
        let ticket = {
            let mut core = self.core.lock();
            let current = core.active.as_ref().map(|a| a.cycle) == Some(cycle);
            if current && core.state.is_recording() {
                log::error!("Encoder failed while recording: {}", fault);
                notices.push(Notice::Error(fault.clone()));
                self.teardown(&mut core, &mut notices, Some(fault));
            } else if core.prepare_in_flight && core.cycles == cycle {
                // Started but not yet published; the worker tears it down.
                log::warn!("Encoder failed before recording was published: {}", fault);
                core.pending_fault.get_or_insert(fault);
            } else {
                log::debug!("Ignoring encoder fault from finished cycle {}: {}", cycle, fault);
            }
            self.notices.push(notices)
        };
        self.deliver(ticket);
    }

    // --- Internal helpers ---

    fn set_state(
        &self,
        core: &mut SessionCore<P::Device, F::Encoder>,
        state: SessionState,
        notices: &mut Vec<Notice>,
    ) {
        if core.state == state {
            return;
        }
        log::debug!("Session state {} → {}", core.state.name(), state.name());
        core.state = state.clone();
        notices.push(Notice::State(state));
    }

    fn delegate(&self) -> Option<Arc<dyn SessionDelegate>> {
        self.delegate.read().clone()
    }

    /// Queue and deliver notices that do not depend on session state.
    fn publish(&self, notices: Vec<Notice>) {
        let ticket = self.notices.push(notices);
        self.deliver(ticket);
    }

    /// Return once every notice up to `ticket` reached the delegate.
    fn deliver(&self, ticket: u64) {
        let me = thread::current().id();
        let mut backlog = self.notices.backlog.lock();
        while backlog.delivered < ticket {
            match backlog.dispatcher {
                // Raised from a delegate callback; the outer drain delivers it.
                Some(id) if id == me => return,
                Some(_) => self.notices.delivered.wait(&mut backlog),
                None => {
                    backlog.dispatcher = Some(me);
                    while let Some(notice) = backlog.pending.pop_front() {
                        MutexGuard::unlocked(&mut backlog, || self.notify(notice));
                        backlog.delivered += 1;
                    }
                    backlog.dispatcher = None;
                    self.notices.delivered.notify_all();
                }
            }
        }
    }

    fn notify(&self, notice: Notice) {
        let Some(delegate) = self.delegate() else {
            return;
        };
        match notice {
            Notice::State(state) => delegate.on_state_changed(&state),
            Notice::Visibility(visibility) => delegate.on_preview_visibility(visibility),
            Notice::Started(parameters) => delegate.on_recording_started(&parameters),
            Notice::StartFailed(error) => delegate.on_start_failed(&error),
            Notice::Finished(result) => delegate.on_recording_finished(&result),
            Notice::Error(error) => delegate.on_error(&error),
            Notice::Zoom(level) => delegate.on_zoom_changed(level),
        }
    }

    /// Autofocus completion is observational only; it never touches the
    /// session lock.
    fn focus_callback(self: &Arc<Self>) -> FocusCallback {
        let weak = Arc::downgrade(self);
        Box::new(move |success: bool| {
            if success {
                log::debug!("Autofocus succeeded");
            } else {
                log::debug!("Autofocus did not converge");
            }
            if let Some(delegate) = weak.upgrade().and_then(|shared| shared.delegate()) {
                delegate.on_focus_completed(success);
            }
        })
    }

    /// The encoder thread hands the fault to a fresh thread: stopping the
    /// encoder joins its thread while holding the session lock.
    fn fault_callback(self: &Arc<Self>, cycle: u64) -> EncoderFaultCallback {
        let weak = Arc::downgrade(self);
        Arc::new(move |error: CaptureError| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let spawned = thread::Builder::new()
                .name("capture-encoder-fault".into())
                .spawn(move || shared.handle_encoder_fault(cycle, error));
            if let Err(e) = spawned {
                log::error!("Failed to spawn encoder fault handler: {}", e);
            }
        })
    }
}

fn release_encoder<E: EncoderSession>(encoder: &mut E) {
    if let Err(e) = encoder.release() {
        log::warn!("Encoder release failed: {}", e);
    }
}

fn release_device<D: CaptureDevice>(device: &mut D) {
    if let Err(e) = device.release() {
        log::warn!("Capture device release failed: {}", e);
    }
}
