use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::{PreviewVisibility, SessionState};
use crate::models::video_models::CaptureParameters;

/// Event delegate for capture session notifications.
///
/// Called after the session lock is released, from whichever thread drove
/// the transition (the control caller or the prepare worker). Implementations
/// should marshal to the UI thread if needed.
pub trait SessionDelegate: Send + Sync {
    /// Called when the session state changes.
    fn on_state_changed(&self, state: &SessionState);

    /// Show/hide request for the preview window. Presentation only.
    fn on_preview_visibility(&self, visibility: PreviewVisibility);

    /// Called once the encoder is running.
    fn on_recording_started(&self, parameters: &CaptureParameters);

    /// Called once per failed start attempt.
    fn on_start_failed(&self, error: &CaptureError);

    /// Called when a recording is finalized and both resources are released.
    fn on_recording_finished(&self, result: &RecordingResult);

    /// Called when a running recording hits an error.
    fn on_error(&self, error: &CaptureError);

    fn on_zoom_changed(&self, _level: u32) {}

    fn on_focus_completed(&self, _success: bool) {}
}
