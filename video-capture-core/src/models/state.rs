use super::error::CaptureError;

/// Capture session state machine.
///
/// State transitions:
/// ```text
/// idle → preparing → recording → stopping → idle
///            ↓
///         failed → idle
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Preparing,
    Recording,
    Stopping,
    Failed(CaptureError),
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_preparing(&self) -> bool {
        matches!(self, Self::Preparing)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    /// Short lowercase name, used in logs and host payloads.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Preparing => "preparing",
            Self::Recording => "recording",
            Self::Stopping => "stopping",
            Self::Failed(_) => "failed",
        }
    }
}

/// Encoder run state.
///
/// ```text
/// unconfigured → configured → prepared → running → stopped → released
/// ```
/// `released` is reachable from every state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderState {
    Unconfigured,
    Configured,
    Prepared,
    Running,
    Stopped,
    Released,
}

/// Presentation hint for the host's preview window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewVisibility {
    Visible,
    Hidden,
}
