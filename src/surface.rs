use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Size of a surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height, or `None` when either side is zero.
    pub fn aspect(&self) -> Option<f32> {
        (self.width > 0 && self.height > 0).then(|| self.width as f32 / self.height as f32)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for SurfaceSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for SurfaceSize {
    type Err = anyhow::Error;

    /// Parses `WIDTHxHEIGHT`.
    fn from_str(s: &str) -> Result<Self> {
        let (width, height) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| anyhow!("size {s:?} must look like WIDTHxHEIGHT"))?;
        Ok(Self {
            width: width.parse().with_context(|| format!("bad width in {s:?}"))?,
            height: height.parse().with_context(|| format!("bad height in {s:?}"))?,
        })
    }
}

/// Something the engine draws into.
///
/// The logical size is owned by the page layout. The engine only ever
/// changes the backing size.
pub trait Surface {
    fn logical_size(&self) -> SurfaceSize;
    fn backing_size(&self) -> SurfaceSize;
    fn set_backing_size(&self, size: SurfaceSize);
}

impl<T> Surface for Arc<T>
where
    T: Surface + ?Sized,
{
    fn logical_size(&self) -> SurfaceSize {
        (**self).logical_size()
    }

    fn backing_size(&self) -> SurfaceSize {
        (**self).backing_size()
    }

    fn set_backing_size(&self, size: SurfaceSize) {
        (**self).set_backing_size(size)
    }
}

#[derive(Debug)]
struct HeadlessState {
    logical: SurfaceSize,
    backing: SurfaceSize,
    reallocations: u64,
}

/// In-memory surface. Clones share state, so a test can keep one clone to
/// change the layout while the engine owns another.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    state: Arc<RwLock<HeadlessState>>,
}

impl HeadlessSurface {
    pub fn new(logical: SurfaceSize, backing: SurfaceSize) -> Self {
        Self {
            state: Arc::new(RwLock::new(HeadlessState {
                logical,
                backing,
                reallocations: 0,
            })),
        }
    }

    /// Surface whose backing store already matches its layout.
    pub fn matching(size: SurfaceSize) -> Self {
        Self::new(size, size)
    }

    /// Simulates a layout change.
    pub fn set_logical_size(&self, size: SurfaceSize) {
        self.state.write().logical = size;
    }

    /// Number of backing-store resizes so far.
    pub fn reallocations(&self) -> u64 {
        self.state.read().reallocations
    }
}

impl Surface for HeadlessSurface {
    fn logical_size(&self) -> SurfaceSize {
        self.state.read().logical
    }

    fn backing_size(&self) -> SurfaceSize {
        self.state.read().backing
    }

    fn set_backing_size(&self, size: SurfaceSize) {
        let mut state = self.state.write();
        state.backing = size;
        state.reallocations += 1;
    }
}

/// Detects drift between the backing store and the layout size.
#[derive(Debug, Default)]
pub struct SurfaceSizeMonitor {
    corrections: u64,
}

impl SurfaceSizeMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-reads both sizes and reports whether they differ.
    pub fn needs_resize<S: Surface + ?Sized>(&self, surface: &S) -> bool {
        surface.logical_size() != surface.backing_size()
    }

    /// Resizes the backing store to the logical size when they differ and
    /// returns the new size. Does nothing otherwise.
    pub fn apply<S: Surface + ?Sized>(&mut self, surface: &S) -> Option<SurfaceSize> {
        if !self.needs_resize(surface) {
            return None;
        }
        let logical = surface.logical_size();
        log::debug!(
            "resizing backing store {} -> {}",
            surface.backing_size(),
            logical
        );
        surface.set_backing_size(logical);
        self.corrections += 1;
        Some(logical)
    }

    pub fn corrections(&self) -> u64 {
        self.corrections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_is_idempotent() {
        let surface = HeadlessSurface::new(SurfaceSize::new(800, 600), SurfaceSize::new(300, 150));
        let mut monitor = SurfaceSizeMonitor::new();
        assert!(monitor.needs_resize(&surface));
        assert_eq!(monitor.apply(&surface), Some(SurfaceSize::new(800, 600)));
        assert!(!monitor.needs_resize(&surface));
        assert_eq!(monitor.apply(&surface), None);
        assert_eq!(surface.reallocations(), 1);
        assert_eq!(monitor.corrections(), 1);
    }

    #[test]
    fn logical_size_is_never_touched() {
        let surface = HeadlessSurface::new(SurfaceSize::new(0, 0), SurfaceSize::new(300, 150));
        let mut monitor = SurfaceSizeMonitor::new();
        monitor.apply(&surface);
        assert_eq!(surface.logical_size(), SurfaceSize::new(0, 0));
        assert_eq!(surface.backing_size(), SurfaceSize::new(0, 0));
        assert!(!monitor.needs_resize(&surface));
    }

    #[test]
    fn aspect_needs_area() {
        assert_eq!(SurfaceSize::new(200, 100).aspect(), Some(2.0));
        assert_eq!(SurfaceSize::new(200, 0).aspect(), None);
    }

    #[test]
    fn size_parses_from_text() {
        assert_eq!("640x480".parse::<SurfaceSize>().unwrap(), SurfaceSize::new(640, 480));
        assert!("640".parse::<SurfaceSize>().is_err());
        assert!("ax480".parse::<SurfaceSize>().is_err());
    }
}
