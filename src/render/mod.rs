//! Draw backends.

#[cfg(target_arch = "wasm32")]
pub mod canvas;
pub mod headless;

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasBackend;
pub use headless::{DrawLog, FrameRecord, HeadlessBackend};

use crate::camera::Camera;
use crate::error::DrawError;
use crate::scene::SceneGraph;

/// Receives the scene once per tick.
///
/// The scene is borrowed for the call only. An error fails this frame and
/// nothing else.
pub trait DrawBackend {
    fn draw(&mut self, scene: &SceneGraph, camera: &Camera) -> Result<(), DrawError>;
}

impl<B: DrawBackend + ?Sized> DrawBackend for Box<B> {
    fn draw(&mut self, scene: &SceneGraph, camera: &Camera) -> Result<(), DrawError> {
        (**self).draw(scene, camera)
    }
}
