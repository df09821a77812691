//! `VCAP` container format.
//!
//! A minimal muxed video container: a fixed header followed by
//! length-prefixed frame records. The header is written with zero counts
//! when recording starts and patched when the encoder finalizes.
//!
//! Header layout (little-endian):
//! ```text
//! [0-3]    "VCAP"
//! [4-5]    version (1)
//! [6-7]    quality code
//! [8-11]   width
//! [12-15]  height
//! [16-19]  frame rate
//! [20-23]  video bitrate
//! [24-27]  frame count      (patched on finalize)
//! [28-35]  duration in ms   (patched on finalize)
//! [36-39]  reserved (0)
//! ```
//!
//! Frame record:
//! ```text
//! [payload_len u32] [pts_us u64] [payload...]
//! ```

use thiserror::Error;

use crate::models::video_models::{FrameSize, QualityProfile, QualitySelector};

pub const CONTAINER_MAGIC: &[u8; 4] = b"VCAP";
pub const CONTAINER_VERSION: u16 = 1;
pub const CONTAINER_HEADER_SIZE: usize = 40;
pub const FRAME_RECORD_HEADER_SIZE: usize = 12;

pub const FRAME_COUNT_OFFSET: u64 = 24;
pub const DURATION_OFFSET: u64 = 28;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContainerError {
    #[error("container truncated at byte {0}")]
    Truncated(usize),

    #[error("not a VCAP container")]
    BadMagic,

    #[error("unsupported container version {0}")]
    UnsupportedVersion(u16),

    #[error("unknown quality code {0}")]
    UnknownQuality(u16),

    #[error("header declares {declared} frames but {found} were found")]
    FrameCountMismatch { declared: u32, found: u32 },
}

/// Decoded container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub quality: QualitySelector,
    pub frame_size: FrameSize,
    pub frame_rate: u32,
    pub video_bitrate: u32,
    pub frame_count: u32,
    pub duration_ms: u64,
}

impl ContainerHeader {
    /// Header for a fresh recording with zero frames.
    pub fn for_profile(profile: &QualityProfile) -> Self {
        Self {
            quality: profile.quality,
            frame_size: profile.frame_size,
            frame_rate: profile.frame_rate,
            video_bitrate: profile.video_bitrate,
            frame_count: 0,
            duration_ms: 0,
        }
    }
}

/// One decoded frame record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRecord {
    pub pts_us: u64,
    pub payload: Vec<u8>,
}

pub fn generate_header(header: &ContainerHeader) -> [u8; CONTAINER_HEADER_SIZE] {
    let mut out = [0u8; CONTAINER_HEADER_SIZE];
    out[0..4].copy_from_slice(CONTAINER_MAGIC);
    out[4..6].copy_from_slice(&CONTAINER_VERSION.to_le_bytes());
    out[6..8].copy_from_slice(&header.quality.code().to_le_bytes());
    out[8..12].copy_from_slice(&header.frame_size.width.to_le_bytes());
    out[12..16].copy_from_slice(&header.frame_size.height.to_le_bytes());
    out[16..20].copy_from_slice(&header.frame_rate.to_le_bytes());
    out[20..24].copy_from_slice(&header.video_bitrate.to_le_bytes());
    out[24..28].copy_from_slice(&header.frame_count.to_le_bytes());
    out[28..36].copy_from_slice(&header.duration_ms.to_le_bytes());
    out
}

pub fn parse_header(bytes: &[u8]) -> Result<ContainerHeader, ContainerError> {
    if bytes.len() < CONTAINER_HEADER_SIZE {
        return Err(ContainerError::Truncated(bytes.len()));
    }
    if &bytes[0..4] != CONTAINER_MAGIC {
        return Err(ContainerError::BadMagic);
    }
    let version = read_u16(bytes, 4);
    if version != CONTAINER_VERSION {
        return Err(ContainerError::UnsupportedVersion(version));
    }
    let code = read_u16(bytes, 6);
    let quality = QualitySelector::from_code(code).ok_or(ContainerError::UnknownQuality(code))?;

    Ok(ContainerHeader {
        quality,
        frame_size: FrameSize::new(read_u32(bytes, 8), read_u32(bytes, 12)),
        frame_rate: read_u32(bytes, 16),
        video_bitrate: read_u32(bytes, 20),
        frame_count: read_u32(bytes, 24),
        duration_ms: u64::from_le_bytes(bytes[28..36].try_into().unwrap_or_default()),
    })
}

/// Encode a frame record ready to append after the header.
pub fn encode_frame_record(pts_us: u64, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(FRAME_RECORD_HEADER_SIZE + payload.len());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&pts_us.to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// Decode a whole container, checking that the declared frame count matches
/// the records present.
pub fn read_container(bytes: &[u8]) -> Result<(ContainerHeader, Vec<FrameRecord>), ContainerError> {
    let header = parse_header(bytes)?;
    let mut frames = Vec::new();
    let mut offset = CONTAINER_HEADER_SIZE;

    while offset < bytes.len() {
        if bytes.len() - offset < FRAME_RECORD_HEADER_SIZE {
            return Err(ContainerError::Truncated(offset));
        }
        let len = read_u32(bytes, offset) as usize;
        let pts_us = u64::from_le_bytes(bytes[offset + 4..offset + 12].try_into().unwrap_or_default());
        let start = offset + FRAME_RECORD_HEADER_SIZE;
        if bytes.len() - start < len {
            return Err(ContainerError::Truncated(start));
        }
        frames.push(FrameRecord {
            pts_us,
            payload: bytes[start..start + len].to_vec(),
        });
        offset = start + len;
    }

    if frames.len() as u32 != header.frame_count {
        return Err(ContainerError::FrameCountMismatch {
            declared: header.frame_count,
            found: frames.len() as u32,
        });
    }
    Ok((header, frames))
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
