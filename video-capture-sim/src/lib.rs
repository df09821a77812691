//! # video-capture-sim
//!
//! Software reference backend for video-capture-kit.
//!
//! Provides:
//! - `SimulatedCameraProvider`: exclusive camera with supported sizes, zoom range and autofocus
//! - `ContainerEncoderFactory`: encoder writing synthetic frames into a `VCAP` container
//!
//! ## Usage
//! ```no_run
//! use video_capture_core::{FileSink, FrameSize, QualitySelector, RecorderHost, SessionConfiguration};
//! use video_capture_sim::{ContainerEncoderFactory, SimulatedCameraProvider};
//!
//! let host = RecorderHost::with_backend(
//!     SimulatedCameraProvider::default(),
//!     ContainerEncoderFactory::default(),
//!     SessionConfiguration::default(),
//! )
//! .unwrap();
//! host.surface_available(FrameSize::new(1280, 720));
//! host.start_recording(Box::new(FileSink::new("clip.vcap")), Some(QualitySelector::Mid720p))
//!     .unwrap();
//! ```

pub mod camera;
pub mod encoder;

pub use camera::{SimulatedCamera, SimulatedCameraProvider, SimulatedCameraSpec};
pub use encoder::{synthetic_frame, ContainerEncoder, ContainerEncoderFactory, EncoderSettings};
