use std::fmt;

use chrono::{DateTime, Utc};

use super::video_models::QualitySelector;
use crate::storage::sink::MediaSink;

/// A request to record into `sink` at `quality`.
///
/// Immutable once accepted by the session manager. The sink is handed to the
/// encoder during preparation.
pub struct RecordingRequest {
    id: String,
    sink: Box<dyn MediaSink>,
    quality: QualitySelector,
    accepted_at: DateTime<Utc>,
}

impl RecordingRequest {
    pub fn new(sink: Box<dyn MediaSink>, quality: QualitySelector) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sink,
            quality,
            accepted_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn quality(&self) -> QualitySelector {
        self.quality
    }

    pub fn accepted_at(&self) -> DateTime<Utc> {
        self.accepted_at
    }

    pub fn sink(&self) -> &dyn MediaSink {
        self.sink.as_ref()
    }

    pub(crate) fn into_sink(self) -> Box<dyn MediaSink> {
        self.sink
    }
}

impl fmt::Debug for RecordingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingRequest")
            .field("id", &self.id)
            .field("sink", &self.sink.describe())
            .field("quality", &self.quality)
            .field("accepted_at", &self.accepted_at)
            .finish()
    }
}
