//! Simulated camera provider.
//!
//! Models one physical camera: a process-wide exclusive lock, a fixed list
//! of supported sizes, a zoom range and an autofocus cycle that completes
//! on its own thread after a short delay.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use video_capture_core::models::error::CaptureError;
use video_capture_core::models::video_models::{CaptureParameters, DeviceInfo, FrameSize, ZoomRange};
use video_capture_core::surface::preview_binding::SurfaceTarget;
use video_capture_core::traits::capture_device::{CaptureDevice, DeviceProvider, FocusCallback};

/// Static description of the simulated hardware.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedCameraSpec {
    pub id: String,
    pub name: String,
    pub sizes: Vec<FrameSize>,
    pub zoom: ZoomRange,
    /// Time an autofocus cycle takes to converge.
    pub autofocus_delay: Duration,
    pub autofocus_succeeds: bool,
}

impl Default for SimulatedCameraSpec {
    fn default() -> Self {
        Self {
            id: "sim-camera-0".into(),
            name: "Simulated Camera".into(),
            sizes: vec![
                FrameSize::new(640, 480),
                FrameSize::new(720, 480),
                FrameSize::new(1280, 720),
                FrameSize::new(1920, 1080),
            ],
            zoom: ZoomRange::new(0, 30),
            autofocus_delay: Duration::from_millis(20),
            autofocus_succeeds: true,
        }
    }
}

/// Hands out the simulated camera, one holder at a time.
///
/// Clones share the hardware lock, so two providers built from the same
/// value contend for the same camera the way two processes would.
#[derive(Debug, Clone)]
pub struct SimulatedCameraProvider {
    spec: Arc<SimulatedCameraSpec>,
    in_use: Arc<AtomicBool>,
    available: Arc<AtomicBool>,
    acquisitions: Arc<AtomicUsize>,
}

impl SimulatedCameraProvider {
    pub fn new(spec: SimulatedCameraSpec) -> Self {
        Self {
            spec: Arc::new(spec),
            in_use: Arc::new(AtomicBool::new(false)),
            available: Arc::new(AtomicBool::new(true)),
            acquisitions: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn spec(&self) -> &SimulatedCameraSpec {
        &self.spec
    }

    /// Whether a holder currently has the camera open.
    pub fn is_in_use(&self) -> bool {
        self.in_use.load(Ordering::SeqCst)
    }

    /// Simulate the camera being unplugged or disabled.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of successful acquisitions so far.
    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }
}

impl Default for SimulatedCameraProvider {
    fn default() -> Self {
        Self::new(SimulatedCameraSpec::default())
    }
}

impl DeviceProvider for SimulatedCameraProvider {
    type Device = SimulatedCamera;

    fn acquire(&self) -> Result<SimulatedCamera, CaptureError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(CaptureError::DeviceUnavailable);
        }
        if self
            .in_use
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::warn!("{} is held by another client", self.spec.name);
            return Err(CaptureError::DeviceBusy);
        }
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        log::debug!("Opened {}", self.spec.name);

        Ok(SimulatedCamera {
            spec: Arc::clone(&self.spec),
            in_use: Arc::clone(&self.in_use),
            parameters: None,
            attached: None,
            released: false,
        })
    }
}

/// An opened simulated camera. Releasing (or dropping) it frees the lock.
#[derive(Debug)]
pub struct SimulatedCamera {
    spec: Arc<SimulatedCameraSpec>,
    in_use: Arc<AtomicBool>,
    parameters: Option<CaptureParameters>,
    attached: Option<SurfaceTarget>,
    released: bool,
}

impl SimulatedCamera {
    /// Surface the output is currently routed to.
    pub fn attached_surface(&self) -> Option<SurfaceTarget> {
        self.attached
    }

    fn ensure_open(&self) -> Result<(), CaptureError> {
        if self.released {
            return Err(CaptureError::DeviceUnavailable);
        }
        Ok(())
    }
}

impl CaptureDevice for SimulatedCamera {
    fn info(&self) -> DeviceInfo {
        DeviceInfo {
            id: self.spec.id.clone(),
            name: self.spec.name.clone(),
            is_default: true,
        }
    }

    fn supported_sizes(&self) -> Vec<FrameSize> {
        self.spec.sizes.clone()
    }

    fn zoom_range(&self) -> ZoomRange {
        self.spec.zoom
    }

    fn parameters(&self) -> Option<CaptureParameters> {
        self.parameters
    }

    fn apply_parameters(&mut self, params: CaptureParameters) -> Result<(), CaptureError> {
        self.ensure_open()?;
        if !self.spec.sizes.contains(&params.frame_size) {
            return Err(CaptureError::ParameterNegotiationFailed(format!(
                "{} does not support {}",
                self.spec.name, params.frame_size
            )));
        }
        if !self.spec.zoom.contains(params.zoom) {
            return Err(CaptureError::ParameterNegotiationFailed(format!(
                "zoom {} outside {}..={}",
                params.zoom, self.spec.zoom.min, self.spec.zoom.max
            )));
        }
        if params.frame_rate == 0 {
            return Err(CaptureError::ParameterNegotiationFailed("frame rate must be positive".into()));
        }
        log::debug!("{} configured at {} {}fps", self.spec.name, params.frame_size, params.frame_rate);
        self.parameters = Some(params);
        Ok(())
    }

    fn attach_output(&mut self, surface: &SurfaceTarget) -> Result<(), CaptureError> {
        self.ensure_open()?;
        if self.parameters.is_none() {
            return Err(CaptureError::ParameterNegotiationFailed(
                "output attached before parameters were applied".into(),
            ));
        }
        log::debug!("{} output attached to {} ({})", self.spec.name, surface.handle, surface.size);
        self.attached = Some(*surface);
        Ok(())
    }

    fn set_zoom(&mut self, level: u32) -> Result<(), CaptureError> {
        self.ensure_open()?;
        if !self.spec.zoom.contains(level) {
            return Err(CaptureError::ParameterNegotiationFailed(format!("zoom {} out of range", level)));
        }
        if let Some(params) = self.parameters.as_mut() {
            params.zoom = level;
        }
        Ok(())
    }

    fn autofocus(&mut self, callback: FocusCallback) {
        if self.released {
            callback(false);
            return;
        }
        let delay = self.spec.autofocus_delay;
        let success = self.spec.autofocus_succeeds;
        let spawned = thread::Builder::new()
            .name("sim-autofocus".into())
            .spawn(move || {
                thread::sleep(delay);
                callback(success);
            });
        if let Err(e) = spawned {
            log::warn!("Failed to spawn autofocus thread: {}", e);
        }
    }

    fn release(&mut self) -> Result<(), CaptureError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.attached = None;
        self.in_use.store(false, Ordering::SeqCst);
        log::debug!("Released {}", self.spec.name);
        Ok(())
    }
}

impl Drop for SimulatedCamera {
    fn drop(&mut self) {
        let _ = self.release();
    }
}
