use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::models::config::SessionConfiguration;
use crate::models::error::CaptureError;
use crate::models::recording_result::{RecordingMetadata, RecordingResult};
use crate::models::state::{PreviewVisibility, SessionState};
use crate::models::video_models::{CaptureParameters, FrameSize, QualitySelector};
use crate::session::manager::CaptureSessionManager;
use crate::storage::metadata;
use crate::storage::sink::MediaSink;
use crate::surface::preview_binding::PreviewSurfaceBinding;
use crate::traits::capture_device::DeviceProvider;
use crate::traits::encoder_session::EncoderFactory;
use crate::traits::session_control::SessionControl;
use crate::traits::session_delegate::SessionDelegate;

/// Service boundary between a host process and the capture session.
///
/// Owns the preview surface binding and the session. Lifecycle callbacks
/// (`on_bind`, `surface_available`, `on_destroy`, ...) and user intents
/// (`start_recording`, `set_zoom`, ...) are translated into session control
/// calls; session notifications are forwarded to the host's observer.
pub struct RecorderHost<C: SessionControl> {
    session: C,
    surface: PreviewSurfaceBinding,
    config: SessionConfiguration,
    events: Arc<HostDelegate>,
    destroyed: Mutex<bool>,
}

impl<P: DeviceProvider, F: EncoderFactory> RecorderHost<CaptureSessionManager<P, F>> {
    /// Build a host around a `CaptureSessionManager` for the given backend.
    pub fn with_backend(provider: P, factory: F, config: SessionConfiguration) -> Result<Self, String> {
        Self::on_create(config, |surface, config| {
            CaptureSessionManager::new(provider, factory, surface, config.clone())
        })
    }
}

impl<C: SessionControl> RecorderHost<C> {
    /// Host creation: validate the configuration, create the surface binding
    /// and let `build` construct the session around it.
    pub fn on_create<B>(config: SessionConfiguration, build: B) -> Result<Self, String>
    where
        B: FnOnce(PreviewSurfaceBinding, &SessionConfiguration) -> C,
    {
        config.validate()?;
        let surface = PreviewSurfaceBinding::new();
        let session = build(surface.clone(), &config);
        let events = Arc::new(HostDelegate::new(config.write_metadata_sidecar));
        session.set_delegate(events.clone());
        log::info!("Recorder host created (default quality {})", config.default_quality);

        Ok(Self {
            session,
            surface,
            config,
            events,
            destroyed: Mutex::new(false),
        })
    }

    /// Register the host-side observer for session notifications.
    pub fn set_observer(&self, observer: Arc<dyn SessionDelegate>) {
        *self.events.observer.write() = Some(observer);
    }

    pub fn session(&self) -> &C {
        &self.session
    }

    pub fn surface(&self) -> &PreviewSurfaceBinding {
        &self.surface
    }

    pub fn config(&self) -> &SessionConfiguration {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Most recent finalized recording, if any.
    pub fn last_result(&self) -> Option<RecordingResult> {
        self.events.last_result.lock().clone()
    }

    pub fn is_destroyed(&self) -> bool {
        *self.destroyed.lock()
    }

    // --- Lifecycle ---

    /// A client bound to the host; the preview can be shown.
    pub fn on_bind(&self) {
        log::debug!("Host bound");
        self.session.show_preview();
    }

    /// The last client unbound; recording continues without a visible preview.
    pub fn on_unbind(&self) {
        log::debug!("Host unbound");
        self.session.hide_preview();
    }

    /// Forced teardown. Safe to call more than once.
    pub fn on_destroy(&self) {
        {
            let mut destroyed = self.destroyed.lock();
            if *destroyed {
                return;
            }
            *destroyed = true;
        }
        log::info!("Recorder host destroyed; shutting down capture session");
        if !self.session.wait_for_prepare(self.config.prepare_wait_timeout()) {
            log::warn!(
                "Preparation still running after {:?}; shutdown will wait for it",
                self.config.prepare_wait_timeout()
            );
        }
        self.session.shutdown();
        self.surface.mark_lost();
    }

    // --- Surface ---

    /// The rendering surface exists (or changed size).
    pub fn surface_available(&self, size: FrameSize) {
        let accepted = match self.surface.dimensions() {
            Some(current) if current == size => {
                log::debug!("Preview surface already ready at {}", size);
                true
            }
            Some(current) => {
                log::debug!("Preview surface resized {} → {}", current, size);
                self.surface.resize(size)
            }
            None => self.surface.mark_ready(size).is_some(),
        };
        if !accepted {
            return;
        }
        self.session.notify_surface_ready(size);
    }

    pub fn surface_destroyed(&self) {
        if self.surface.mark_lost() {
            log::debug!("Preview surface destroyed");
        }
        self.session.notify_surface_lost();
    }

    // --- User intents ---

    /// Request a recording into `sink`. `None` uses the configured default
    /// quality.
    pub fn start_recording(
        &self,
        sink: Box<dyn MediaSink>,
        quality: Option<QualitySelector>,
    ) -> Result<(), CaptureError> {
        if self.is_destroyed() {
            return Err(CaptureError::SessionShutDown);
        }
        let quality = quality.unwrap_or(self.config.default_quality);
        self.session.start_session(sink, quality)
    }

    pub fn stop_recording(&self) {
        self.session.stop_session();
    }

    pub fn set_zoom(&self, level: i32) -> Result<u32, CaptureError> {
        self.session.set_zoom_level(level)
    }

    pub fn request_focus(&self) -> Result<(), CaptureError> {
        self.session.request_focus()
    }
}

impl<C: SessionControl> Drop for RecorderHost<C> {
    fn drop(&mut self) {
        self.on_destroy();
    }
}

/// Delegate the host installs on the session: keeps the last result, writes
/// the metadata sidecar and forwards everything to the host's observer.
struct HostDelegate {
    observer: RwLock<Option<Arc<dyn SessionDelegate>>>,
    sidecar_enabled: bool,
    last_result: Mutex<Option<RecordingResult>>,
}

impl HostDelegate {
    fn new(sidecar_enabled: bool) -> Self {
        Self {
            observer: RwLock::new(None),
            sidecar_enabled,
            last_result: Mutex::new(None),
        }
    }

    fn observer(&self) -> Option<Arc<dyn SessionDelegate>> {
        self.observer.read().clone()
    }

    fn write_sidecar(&self, result: &RecordingResult) {
        let Some(path) = result.file_path.as_deref() else {
            log::debug!("Recording {} has no file path; skipping metadata sidecar", result.id);
            return;
        };
        match metadata::write_metadata(&RecordingMetadata::from(result), path) {
            Ok(sidecar) => log::info!("Wrote recording metadata to {}", sidecar.display()),
            Err(e) => log::warn!("Failed to write recording metadata: {}", e),
        }
    }
}

impl SessionDelegate for HostDelegate {
    fn on_state_changed(&self, state: &SessionState) {
        if let Some(observer) = self.observer() {
            observer.on_state_changed(state);
        }
    }

    fn on_preview_visibility(&self, visibility: PreviewVisibility) {
        if let Some(observer) = self.observer() {
            observer.on_preview_visibility(visibility);
        }
    }

    fn on_recording_started(&self, parameters: &CaptureParameters) {
        if let Some(observer) = self.observer() {
            observer.on_recording_started(parameters);
        }
    }

    fn on_start_failed(&self, error: &CaptureError) {
        if let Some(observer) = self.observer() {
            observer.on_start_failed(error);
        }
    }

    fn on_recording_finished(&self, result: &RecordingResult) {
        if self.sidecar_enabled {
            self.write_sidecar(result);
        }
        *self.last_result.lock() = Some(result.clone());
        if let Some(observer) = self.observer() {
            observer.on_recording_finished(result);
        }
    }

    fn on_error(&self, error: &CaptureError) {
        if let Some(observer) = self.observer() {
            observer.on_error(error);
        }
    }

    fn on_zoom_changed(&self, level: u32) {
        if let Some(observer) = self.observer() {
            observer.on_zoom_changed(level);
        }
    }

    fn on_focus_completed(&self, success: bool) {
        if let Some(observer) = self.observer() {
            observer.on_focus_completed(success);
        }
    }
}
