use std::sync::Arc;

use crate::models::error::CaptureError;
use crate::models::recording_result::EncoderSummary;
use crate::models::state::EncoderState;
use crate::models::video_models::{CaptureParameters, QualityProfile};
use crate::storage::sink::MediaSink;

/// Callback an encoder invokes when it fails while running.
///
/// Fires on the encoder's own thread. Implementations must return promptly
/// and must not wait for the encoder to stop.
pub type EncoderFaultCallback = Arc<dyn Fn(CaptureError) + Send + Sync + 'static>;

/// Creates a fresh encoder for every recording attempt.
pub trait EncoderFactory: Send + Sync + 'static {
    type Encoder: EncoderSession;

    fn create(&self) -> Self::Encoder;
}

/// Encoder/muxer consuming device output and writing a finished file.
///
/// Legal call order: `configure → prepare → start → stop`, with `release`
/// allowed at any point.
pub trait EncoderSession: Send + 'static {
    fn state(&self) -> EncoderState;

    /// Bind to the device output and destination.
    ///
    /// Fails with `EncoderConfigInvalid` when `source` and `profile` disagree
    /// and with `SinkIo` when the sink cannot be opened for writing.
    fn configure(
        &mut self,
        source: &CaptureParameters,
        profile: &QualityProfile,
        sink: Box<dyn MediaSink>,
    ) -> Result<(), CaptureError>;

    fn prepare(&mut self) -> Result<(), CaptureError>;

    fn start(&mut self, on_fault: EncoderFaultCallback) -> Result<(), CaptureError>;

    /// Stop and finalize. Must cope with zero recorded frames.
    fn stop(&mut self) -> Result<EncoderSummary, CaptureError>;

    /// Release encoder resources. Safe to call more than once.
    fn release(&mut self) -> Result<(), CaptureError>;
}
