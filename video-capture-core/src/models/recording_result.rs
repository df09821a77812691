use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::CaptureError;
use super::video_models::{FrameSize, QualityProfile, QualitySelector};

/// What an encoder reports when it is stopped and its output finalized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncoderSummary {
    pub frame_count: u64,
    pub duration_secs: f64,
    pub bytes_written: u64,
    /// SHA-256 hex digest of the finalized container.
    pub checksum: String,
}

/// Result delivered to observers when a recording cycle completes.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub id: String,
    pub destination: String,
    pub file_path: Option<PathBuf>,
    pub profile: QualityProfile,
    pub frame_count: u64,
    pub duration_secs: f64,
    pub bytes_written: u64,
    pub checksum: String,
    pub created_at: DateTime<Utc>,
    /// Set when the encoder failed mid-recording or while stopping; the file
    /// holds whatever could be finalized.
    pub encoder_error: Option<CaptureError>,
}

impl RecordingResult {
    pub fn is_clean(&self) -> bool {
        self.encoder_error.is_none()
    }
}

/// Sidecar metadata for a finished recording.
///
/// Serializable for JSON export next to the media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub quality: QualitySelector,
    pub frame_size: FrameSize,
    pub frame_rate: u32,
    pub frame_count: u64,
    pub duration_secs: f64,
    pub bytes_written: u64,
    pub checksum: String,
    pub created_at: DateTime<Utc>,
    pub complete: bool,
}

impl From<&RecordingResult> for RecordingMetadata {
    fn from(result: &RecordingResult) -> Self {
        Self {
            id: result.id.clone(),
            quality: result.profile.quality,
            frame_size: result.profile.frame_size,
            frame_rate: result.profile.frame_rate,
            frame_count: result.frame_count,
            duration_secs: result.duration_secs,
            bytes_written: result.bytes_written,
            checksum: result.checksum.clone(),
            created_at: result.created_at,
            complete: result.is_clean(),
        }
    }
}
