//! # video-capture-core
//!
//! Platform-agnostic video capture core library.
//!
//! Provides the capture session state machine, parameter negotiation, the
//! preview surface binding, the host adapter, the `VCAP` container format
//! and media sinks. Platform-specific backends implement `DeviceProvider`
//! and `EncoderFactory` and plug into the generic `CaptureSessionManager`.
//!
//! ## Architecture
//!
//! ```text
//! video-capture-core (this crate)
//! ├── traits/       ← DeviceProvider, CaptureDevice, EncoderFactory, EncoderSession, SessionControl, SessionDelegate
//! ├── models/       ← CaptureError, SessionState, SessionConfiguration, QualitySelector, RecordingRequest, etc.
//! ├── processing/   ← parameter negotiation, VCAP container encoding
//! ├── session/      ← CaptureSessionManager (generic orchestrator)
//! ├── surface/      ← PreviewSurfaceBinding
//! ├── storage/      ← MediaSink, FileSink, MemorySink, ContainerWriter, metadata
//! └── host/         ← RecorderHost (service boundary)
//! ```

pub mod host;
pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod surface;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use host::adapter::RecorderHost;
pub use models::config::SessionConfiguration;
pub use models::error::CaptureError;
pub use models::recording_result::{EncoderSummary, RecordingMetadata, RecordingResult};
pub use models::request::RecordingRequest;
pub use models::state::{EncoderState, PreviewVisibility, SessionState};
pub use models::video_models::{
    CaptureParameters, DeviceInfo, FocusMode, FrameSize, QualityProfile, QualitySelector, ZoomRange,
};
pub use processing::container::{read_container, ContainerError, ContainerHeader, FrameRecord};
pub use processing::negotiation::{negotiate_parameters, NegotiatedParameters};
pub use session::manager::CaptureSessionManager;
pub use storage::container_writer::ContainerWriter;
pub use storage::sink::{FileSink, MediaSink, MemorySink, SinkWriter};
pub use surface::preview_binding::{PreviewSurfaceBinding, SurfaceHandle, SurfaceReadiness, SurfaceTarget};
pub use traits::capture_device::{CaptureDevice, DeviceProvider, FocusCallback};
pub use traits::encoder_session::{EncoderFactory, EncoderFaultCallback, EncoderSession};
pub use traits::session_control::SessionControl;
pub use traits::session_delegate::SessionDelegate;
