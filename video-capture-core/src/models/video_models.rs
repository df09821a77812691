use std::fmt;

use serde::{Deserialize, Serialize};

/// Pixel dimensions of a frame or surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Quality preset selected by the caller when starting a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualitySelector {
    High1080p,
    Mid720p,
    Low480p,
}

impl QualitySelector {
    /// Resolution, frame rate and bitrate bundle for this preset.
    pub fn profile(self) -> QualityProfile {
        match self {
            Self::High1080p => QualityProfile {
                quality: self,
                frame_size: FrameSize::new(1920, 1080),
                frame_rate: 30,
                video_bitrate: 17_000_000,
            },
            Self::Mid720p => QualityProfile {
                quality: self,
                frame_size: FrameSize::new(1280, 720),
                frame_rate: 30,
                video_bitrate: 12_000_000,
            },
            Self::Low480p => QualityProfile {
                quality: self,
                frame_size: FrameSize::new(720, 480),
                frame_rate: 30,
                video_bitrate: 2_000_000,
            },
        }
    }

    /// Stable numeric code stored in the container header.
    pub fn code(self) -> u16 {
        match self {
            Self::Low480p => 1,
            Self::Mid720p => 2,
            Self::High1080p => 3,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::Low480p),
            2 => Some(Self::Mid720p),
            3 => Some(Self::High1080p),
            _ => None,
        }
    }
}

impl fmt::Display for QualitySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::High1080p => "1080p",
            Self::Mid720p => "720p",
            Self::Low480p => "480p",
        };
        f.write_str(name)
    }
}

/// Concrete encoder profile. Starts from a `QualitySelector` preset and has
/// its frame size overridden by parameter negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityProfile {
    pub quality: QualitySelector,
    pub frame_size: FrameSize,
    pub frame_rate: u32,
    pub video_bitrate: u32,
}

impl QualityProfile {
    /// Copy of this profile forced to `size`.
    pub fn with_frame_size(mut self, size: FrameSize) -> Self {
        self.frame_size = size;
        self
    }
}

/// Focus behaviour requested from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusMode {
    Auto,
    ContinuousVideo,
    Fixed,
}

/// Inclusive zoom range supported by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomRange {
    pub min: u32,
    pub max: u32,
}

impl ZoomRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Clamp a requested level to the nearest supported one.
    ///
    /// Levels below `min` (including negative ones) map to `min`, levels
    /// above `max` map to `max`.
    pub fn clamp(&self, level: i32) -> u32 {
        if i64::from(level) <= i64::from(self.min) {
            self.min
        } else {
            u32::try_from(level).map_or(self.min, |level| level.min(self.max))
        }
    }

    pub fn contains(&self, level: u32) -> bool {
        (self.min..=self.max).contains(&level)
    }
}

/// Parameters currently applied to an opened capture device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureParameters {
    pub frame_size: FrameSize,
    pub frame_rate: u32,
    pub zoom: u32,
    pub focus_mode: FocusMode,
}

/// Identity of an opened capture device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: String,
    pub name: String,
    pub is_default: bool,
}
