//! Capture parameter negotiation.
//!
//! Picks the device capture size closest to the preview surface and forces
//! it on both the device and the encoder profile so the two never disagree.

use crate::models::error::CaptureError;
use crate::models::video_models::{CaptureParameters, FocusMode, FrameSize, QualityProfile};
use crate::traits::capture_device::CaptureDevice;

/// Outcome of a successful negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegotiatedParameters {
    /// Applied to the device.
    pub parameters: CaptureParameters,
    /// Requested profile with its frame size forced to the negotiated one.
    pub profile: QualityProfile,
}

/// Closest supported size to `target`.
///
/// Minimizes the absolute area difference. Ties go to the larger area, then
/// to the wider size. Empty sizes are never chosen.
pub fn closest_supported_size(supported: &[FrameSize], target: FrameSize) -> Option<FrameSize> {
    let wanted = target.area();
    supported
        .iter()
        .copied()
        .filter(|s| !s.is_empty())
        .min_by(|a, b| {
            a.area()
                .abs_diff(wanted)
                .cmp(&b.area().abs_diff(wanted))
                .then_with(|| b.area().cmp(&a.area()))
                .then_with(|| b.width.cmp(&a.width))
        })
}

/// Negotiate and apply capture parameters on `device`.
pub fn negotiate_parameters<D: CaptureDevice + ?Sized>(
    device: &mut D,
    requested: &QualityProfile,
    preview: FrameSize,
    focus_mode: FocusMode,
) -> Result<NegotiatedParameters, CaptureError> {
    let supported = device.supported_sizes();
    let chosen = closest_supported_size(&supported, preview).ok_or_else(|| {
        CaptureError::ParameterNegotiationFailed("device reports no usable capture sizes".into())
    })?;

    let parameters = CaptureParameters {
        frame_size: chosen,
        frame_rate: requested.frame_rate,
        zoom: device.zoom_range().min,
        focus_mode,
    };

    device.apply_parameters(parameters).map_err(|e| match e {
        CaptureError::ParameterNegotiationFailed(_) => e,
        other => CaptureError::ParameterNegotiationFailed(other.to_string()),
    })?;

    log::debug!(
        "Negotiated {} for preview {} (profile {} asked {})",
        chosen,
        preview,
        requested.quality,
        requested.frame_size
    );

    Ok(NegotiatedParameters {
        parameters,
        profile: requested.with_frame_size(chosen),
    })
}
