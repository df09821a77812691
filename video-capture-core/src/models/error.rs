use thiserror::Error;

/// Errors that can occur during video capture operations.
///
/// Control-call misuse (`AlreadyRecording`, `NotRecording`) is non-fatal.
/// Preparation errors are collapsed into `PreparationFailed` before they
/// reach the host.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("capture device is busy")]
    DeviceBusy,

    #[error("capture device not available")]
    DeviceUnavailable,

    #[error("parameter negotiation failed: {0}")]
    ParameterNegotiationFailed(String),

    #[error("encoder configuration invalid: {0}")]
    EncoderConfigInvalid(String),

    #[error("sink I/O error: {0}")]
    SinkIo(String),

    #[error("already recording")]
    AlreadyRecording,

    #[error("not recording")]
    NotRecording,

    #[error("preview surface is not ready")]
    SurfaceNotReady,

    #[error("preparation failed")]
    PreparationFailed,

    #[error("session has been shut down")]
    SessionShutDown,

    #[error("encoder fault: {0}")]
    EncoderFault(String),
}

impl CaptureError {
    /// Whether the error leaves the session usable for another attempt.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::SessionShutDown)
    }
}

impl From<std::io::Error> for CaptureError {
    fn from(e: std::io::Error) -> Self {
        Self::SinkIo(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_to_sink_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only volume");
        let err: CaptureError = io.into();
        assert_eq!(err, CaptureError::SinkIo("read-only volume".into()));
    }

    #[test]
    fn only_shutdown_is_unrecoverable() {
        assert!(CaptureError::DeviceBusy.is_recoverable());
        assert!(CaptureError::AlreadyRecording.is_recoverable());
        assert!(!CaptureError::SessionShutDown.is_recoverable());
    }
}
