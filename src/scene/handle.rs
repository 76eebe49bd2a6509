use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{SceneGraph, SceneObject};

/// Shared handle to a scene graph.
///
/// Clones point at the same graph. The engine holds the write lock for a
/// whole tick, so an insertion from a loader lands either before or after a
/// tick, never inside one.
#[derive(Debug, Default)]
pub struct SceneHandle {
    scene: Arc<RwLock<SceneGraph>>,
}

impl Clone for SceneHandle {
    fn clone(&self) -> Self {
        Self {
            scene: Arc::clone(&self.scene),
        }
    }
}

impl SceneHandle {
    pub fn new(scene: SceneGraph) -> Self {
        Self {
            scene: Arc::new(RwLock::new(scene)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, SceneGraph> {
        self.scene.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, SceneGraph> {
        self.scene.write()
    }

    /// Appends an object and returns its index.
    pub fn insert(&self, object: SceneObject) -> usize {
        self.scene.write().insert(object)
    }

    pub fn len(&self) -> usize {
        self.scene.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.scene.read().is_empty()
    }

    /// Returns a clone of the object at `index`.
    pub fn object(&self, index: usize) -> Option<SceneObject> {
        self.scene.read().get(index).cloned()
    }

    /// Runs `reader` against the current graph.
    pub fn with<R>(&self, reader: impl FnOnce(&SceneGraph) -> R) -> R {
        reader(&self.scene.read())
    }
}

impl From<SceneGraph> for SceneHandle {
    fn from(scene: SceneGraph) -> Self {
        Self::new(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{build, PolyhedronParams, PrimitiveParams};
    use crate::material::Material;
    use glam::Vec3;

    #[test]
    fn clones_share_the_graph() {
        let handle = SceneHandle::default();
        let other = handle.clone();
        assert!(other.is_empty());

        let geometry = build(&PrimitiveParams::Icosahedron(PolyhedronParams::default()))
            .unwrap()
            .into_shared();
        other.insert(SceneObject::new(geometry, Material::default(), Vec3::X));
        assert_eq!(handle.len(), 1);
        assert_eq!(handle.object(0).map(|o| o.position), Some(Vec3::X));
        assert!(handle.object(1).is_none());
    }

    #[test]
    fn with_reads_camera() {
        let handle = SceneHandle::default();
        let fov = handle.with(|scene| scene.camera().fov_y_degrees);
        assert_eq!(fov, 75.0);
    }
}
