use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use video_capture_core::{
    CaptureError, CaptureParameters, PreviewVisibility, RecordingResult, SessionDelegate, SessionState,
};

/// SessionDelegate that prints every event as one JSON line on stdout.
pub struct ConsoleDelegate {
    started: Mutex<Option<CaptureParameters>>,
    failure: Mutex<Option<CaptureError>>,
}

impl ConsoleDelegate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            started: Mutex::new(None),
            failure: Mutex::new(None),
        })
    }

    /// Parameters reported when the recording started.
    pub fn started(&self) -> Option<CaptureParameters> {
        *self.started.lock()
    }

    /// Most recent start failure or runtime error.
    pub fn failure(&self) -> Option<CaptureError> {
        self.failure.lock().clone()
    }

    fn emit(&self, event: &str, payload: impl Serialize) {
        match serde_json::to_string(&EventLine { event, payload }) {
            Ok(line) => println!("{}", line),
            Err(e) => log::warn!("Failed to serialize {} event: {}", event, e),
        }
    }
}

// -- Event payloads --

#[derive(Serialize)]
struct EventLine<'a, T: Serialize> {
    event: &'a str,
    payload: T,
}

#[derive(Serialize)]
struct StateChangedPayload {
    state: &'static str,
    error: Option<String>,
}

#[derive(Serialize)]
struct StartedPayload {
    width: u32,
    height: u32,
    frame_rate: u32,
    zoom: u32,
}

#[derive(Serialize)]
struct ErrorPayload {
    message: String,
}

#[derive(Serialize)]
pub struct FinishedPayload {
    pub id: String,
    pub destination: String,
    pub quality: String,
    pub frame_size: String,
    pub frame_count: u64,
    pub duration_secs: f64,
    pub bytes_written: u64,
    pub checksum: String,
    pub encoder_error: Option<String>,
}

impl From<&RecordingResult> for FinishedPayload {
    fn from(result: &RecordingResult) -> Self {
        Self {
            id: result.id.clone(),
            destination: result.destination.clone(),
            quality: result.profile.quality.to_string(),
            frame_size: result.profile.frame_size.to_string(),
            frame_count: result.frame_count,
            duration_secs: result.duration_secs,
            bytes_written: result.bytes_written,
            checksum: result.checksum.clone(),
            encoder_error: result.encoder_error.as_ref().map(|e| e.to_string()),
        }
    }
}

impl SessionDelegate for ConsoleDelegate {
    fn on_state_changed(&self, state: &SessionState) {
        let error = match state {
            SessionState::Failed(e) => Some(e.to_string()),
            _ => None,
        };
        self.emit(
            "state-changed",
            StateChangedPayload {
                state: state.name(),
                error,
            },
        );
    }

    fn on_preview_visibility(&self, visibility: PreviewVisibility) {
        let visible = visibility == PreviewVisibility::Visible;
        self.emit("preview", serde_json::json!({ "visible": visible }));
    }

    fn on_recording_started(&self, parameters: &CaptureParameters) {
        *self.started.lock() = Some(*parameters);
        self.emit(
            "recording-started",
            StartedPayload {
                width: parameters.frame_size.width,
                height: parameters.frame_size.height,
                frame_rate: parameters.frame_rate,
                zoom: parameters.zoom,
            },
        );
    }

    fn on_start_failed(&self, error: &CaptureError) {
        *self.failure.lock() = Some(error.clone());
        self.emit(
            "start-failed",
            ErrorPayload {
                message: error.to_string(),
            },
        );
    }

    fn on_recording_finished(&self, result: &RecordingResult) {
        self.emit("recording-finished", FinishedPayload::from(result));
    }

    fn on_error(&self, error: &CaptureError) {
        *self.failure.lock() = Some(error.clone());
        self.emit(
            "error",
            ErrorPayload {
                message: error.to_string(),
            },
        );
    }

    fn on_zoom_changed(&self, level: u32) {
        self.emit("zoom-changed", serde_json::json!({ "level": level }));
    }

    fn on_focus_completed(&self, success: bool) {
        self.emit("focus-completed", serde_json::json!({ "success": success }));
    }
}
