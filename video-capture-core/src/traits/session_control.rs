use std::sync::Arc;
use std::time::Duration;

use crate::models::error::CaptureError;
use crate::models::state::SessionState;
use crate::models::video_models::{FrameSize, QualitySelector};
use crate::storage::sink::MediaSink;
use crate::traits::session_delegate::SessionDelegate;

/// Control surface a host drives.
///
/// Implemented by `CaptureSessionManager`. Every call returns without waiting
/// for device or encoder work, except `shutdown` and `wait_for_prepare`.
/// Delegate notices a call produces are delivered, in order, before it
/// returns.
pub trait SessionControl: Send + Sync {
    /// Current session state.
    fn state(&self) -> SessionState;

    fn set_delegate(&self, delegate: Arc<dyn SessionDelegate>);

    /// Accept a recording request. Transitions: idle → preparing once the
    /// surface is ready.
    fn start_session(&self, sink: Box<dyn MediaSink>, quality: QualitySelector) -> Result<(), CaptureError>;

    /// Stop recording or cancel a pending request. Idempotent.
    fn stop_session(&self);

    /// Returns the zoom level actually applied.
    fn set_zoom_level(&self, level: i32) -> Result<u32, CaptureError>;

    fn request_focus(&self) -> Result<(), CaptureError>;

    fn notify_surface_ready(&self, size: FrameSize);

    fn notify_surface_lost(&self);

    fn show_preview(&self);

    fn hide_preview(&self);

    /// Block until no prepare is in flight and its outcome has reached the
    /// delegate. Returns `false` on timeout.
    fn wait_for_prepare(&self, timeout: Duration) -> bool;

    /// Tear everything down and refuse further requests. Idempotent.
    fn shutdown(&self);
}
