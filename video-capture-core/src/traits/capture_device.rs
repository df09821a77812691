use crate::models::error::CaptureError;
use crate::models::video_models::{CaptureParameters, DeviceInfo, FrameSize, ZoomRange};
use crate::surface::preview_binding::SurfaceTarget;

/// Callback invoked when an autofocus cycle completes.
///
/// May fire on any thread, after the device has been released. Keep it
/// observational: it must not block on the session.
pub type FocusCallback = Box<dyn FnOnce(bool) + Send + 'static>;

/// Source of capture devices.
///
/// Implemented by:
/// - `SimulatedCameraProvider` (video-capture-sim)
pub trait DeviceProvider: Send + Sync + 'static {
    type Device: CaptureDevice;

    /// Open the device for exclusive use.
    ///
    /// Fails with `DeviceBusy` while another holder has it open and with
    /// `DeviceUnavailable` when no device can be opened at all.
    fn acquire(&self) -> Result<Self::Device, CaptureError>;
}

/// An opened capture device.
pub trait CaptureDevice: Send + 'static {
    fn info(&self) -> DeviceInfo;

    /// Capture sizes the device can produce.
    fn supported_sizes(&self) -> Vec<FrameSize>;

    fn zoom_range(&self) -> ZoomRange;

    /// Parameters currently applied, `None` before negotiation.
    fn parameters(&self) -> Option<CaptureParameters>;

    fn apply_parameters(&mut self, params: CaptureParameters) -> Result<(), CaptureError>;

    /// Route the device output to a ready preview surface.
    fn attach_output(&mut self, surface: &SurfaceTarget) -> Result<(), CaptureError>;

    /// Set zoom to `level`. Callers clamp into `zoom_range()` first.
    fn set_zoom(&mut self, level: u32) -> Result<(), CaptureError>;

    /// Start an asynchronous autofocus cycle.
    fn autofocus(&mut self, callback: FocusCallback);

    /// Release the device. Safe to call more than once.
    fn release(&mut self) -> Result<(), CaptureError>;
}
