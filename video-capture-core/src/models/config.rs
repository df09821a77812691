use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::video_models::{FocusMode, QualitySelector};

/// Configuration for a capture session manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfiguration {
    /// Quality used by hosts that start a session without choosing one.
    pub default_quality: QualitySelector,

    /// Focus mode applied during parameter negotiation (default: auto).
    pub focus_mode: FocusMode,

    /// Run an autofocus cycle after every successful zoom change (default: true).
    pub focus_on_zoom: bool,

    /// Run an autofocus cycle once the device is configured (default: true).
    pub focus_after_configure: bool,

    /// Write a `<file>.metadata.json` sidecar for file-backed recordings.
    pub write_metadata_sidecar: bool,

    /// Upper bound for `wait_for_prepare` during host teardown, in milliseconds.
    pub prepare_wait_timeout_ms: u64,
}

impl SessionConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.prepare_wait_timeout_ms == 0 {
            return Err("prepare wait timeout must be positive".into());
        }
        Ok(())
    }

    pub fn prepare_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.prepare_wait_timeout_ms)
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| format!("invalid session configuration: {}", e))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for SessionConfiguration {
    fn default() -> Self {
        Self {
            default_quality: QualitySelector::Mid720p,
            focus_mode: FocusMode::Auto,
            focus_on_zoom: true,
            focus_after_configure: true,
            write_metadata_sidecar: false,
            prepare_wait_timeout_ms: 10_000,
        }
    }
}
