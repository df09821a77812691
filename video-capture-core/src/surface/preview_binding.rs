use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::models::video_models::FrameSize;

/// Opaque identity of one preview surface instance.
///
/// A new handle is issued every time the host creates a surface, so a
/// target captured before a loss never matches the replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(u64);

impl SurfaceHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceReadiness {
    Ready,
    NotReady,
}

/// Snapshot of a ready surface that a device output can attach to.
///
/// Only obtainable from a ready binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceTarget {
    pub handle: SurfaceHandle,
    pub size: FrameSize,
}

#[derive(Debug, Default)]
struct BindingInner {
    current: Option<SurfaceTarget>,
    issued: u64,
}

/// Shared view of the preview rendering target.
///
/// The host owns the lifecycle (`mark_ready` / `mark_lost` / `resize`);
/// the session manager only reads it. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct PreviewSurfaceBinding {
    inner: Arc<RwLock<BindingInner>>,
}

impl PreviewSurfaceBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a surface of `size` became available.
    ///
    /// Returns the new handle, or `None` if `size` is empty (such a surface
    /// cannot take device output). Marking an already-ready binding replaces
    /// its surface.
    pub fn mark_ready(&self, size: FrameSize) -> Option<SurfaceHandle> {
        if size.is_empty() {
            log::warn!("Ignoring preview surface with empty size {}", size);
            return None;
        }
        let mut inner = self.inner.write();
        inner.issued += 1;
        let handle = SurfaceHandle(inner.issued);
        inner.current = Some(SurfaceTarget { handle, size });
        log::debug!("Preview {} ready at {}", handle, size);
        Some(handle)
    }

    /// Update the size of the current surface without replacing it.
    pub fn resize(&self, size: FrameSize) -> bool {
        let mut inner = self.inner.write();
        match inner.current.as_mut() {
            Some(target) if !size.is_empty() => {
                target.size = size;
                true
            }
            _ => false,
        }
    }

    /// Record that the surface was destroyed. Returns whether it was ready.
    pub fn mark_lost(&self) -> bool {
        let lost = self.inner.write().current.take();
        if let Some(target) = lost {
            log::debug!("Preview {} lost", target.handle);
        }
        lost.is_some()
    }

    pub fn readiness(&self) -> SurfaceReadiness {
        if self.inner.read().current.is_some() {
            SurfaceReadiness::Ready
        } else {
            SurfaceReadiness::NotReady
        }
    }

    pub fn is_ready(&self) -> bool {
        self.readiness() == SurfaceReadiness::Ready
    }

    pub fn dimensions(&self) -> Option<FrameSize> {
        self.inner.read().current.map(|t| t.size)
    }

    /// Snapshot of the current surface, `None` while not ready.
    pub fn target(&self) -> Option<SurfaceTarget> {
        self.inner.read().current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_not_ready() {
        let binding = PreviewSurfaceBinding::new();
        assert_eq!(binding.readiness(), SurfaceReadiness::NotReady);
        assert!(binding.target().is_none());
        assert!(!binding.mark_lost());
    }

    #[test]
    fn ready_then_lost() {
        let binding = PreviewSurfaceBinding::new();
        let handle = binding.mark_ready(FrameSize::new(1280, 720)).unwrap();

        let target = binding.target().unwrap();
        assert_eq!(target.handle, handle);
        assert_eq!(binding.dimensions(), Some(FrameSize::new(1280, 720)));

        assert!(binding.mark_lost());
        assert!(!binding.is_ready());
    }

    #[test]
    fn each_surface_gets_a_new_handle() {
        let binding = PreviewSurfaceBinding::new();
        let first = binding.mark_ready(FrameSize::new(640, 480)).unwrap();
        binding.mark_lost();
        let second = binding.mark_ready(FrameSize::new(640, 480)).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn empty_surface_is_not_ready() {
        let binding = PreviewSurfaceBinding::new();
        assert!(binding.mark_ready(FrameSize::new(0, 720)).is_none());
        assert!(!binding.is_ready());
    }

    #[test]
    fn clones_share_state_and_resize_keeps_handle() {
        let host_side = PreviewSurfaceBinding::new();
        let manager_side = host_side.clone();

        let handle = host_side.mark_ready(FrameSize::new(768, 432)).unwrap();
        assert!(host_side.resize(FrameSize::new(1920, 1080)));

        let target = manager_side.target().unwrap();
        assert_eq!(target.handle, handle);
        assert_eq!(target.size, FrameSize::new(1920, 1080));
    }
}
