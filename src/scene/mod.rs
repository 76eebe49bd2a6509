//! Scene graph: placed objects, one camera, lights and a background.

mod handle;
mod manifest;

use std::sync::Arc;

use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::config::{AnimationProfile, EngineConfig, LightConfig};
use crate::geometry::{Geometry, PrimitiveKind};
use crate::material::Material;

pub use handle::SceneHandle;
pub use manifest::{AssetEntry, ObjectEntry, SceneManifest};

/// Placed instance of a geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub geometry: Arc<Geometry>,
    pub material: Material,
    pub position: Vec3,
    /// Radians per second, assigned on insertion.
    pub speed: f32,
    /// Euler angles (XYZ), overwritten every tick.
    pub rotation: Vec3,
}

impl SceneObject {
    pub fn new(geometry: Arc<Geometry>, material: Material, position: Vec3) -> Self {
        Self {
            geometry,
            material,
            position,
            speed: 0.0,
            rotation: Vec3::ZERO,
        }
    }

    pub fn kind(&self) -> Option<PrimitiveKind> {
        self.geometry.kind()
    }

    pub fn model_matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Mat4::from_rotation_translation(rotation, self.position)
    }
}

/// Directional light shining from `position` towards the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

impl Light {
    pub fn direction(&self) -> Vec3 {
        (-self.position).normalize_or_zero()
    }
}

impl From<&LightConfig> for Light {
    fn from(config: &LightConfig) -> Self {
        Self {
            position: config.position,
            color: config.color,
            intensity: config.intensity,
        }
    }
}

/// Append-only collection of scene objects.
///
/// Objects keep their insertion order and are never removed. Each one gets
/// its rotation speed from the animation profile when it is inserted.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    objects: Vec<SceneObject>,
    camera: Camera,
    lights: Vec<Light>,
    background: Option<Vec3>,
    animation: AnimationProfile,
}

impl SceneGraph {
    pub fn new(camera: Camera, animation: AnimationProfile) -> Self {
        Self {
            objects: Vec::new(),
            camera,
            lights: Vec::new(),
            background: None,
            animation,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            objects: Vec::new(),
            camera: Camera::from_config(&config.camera),
            lights: config.lights.iter().map(Light::from).collect(),
            background: config.background,
            animation: config.animation,
        }
    }

    /// Appends `object` and returns its index.
    pub fn insert(&mut self, mut object: SceneObject) -> usize {
        let index = self.objects.len();
        object.speed = self.animation.speed(index);
        self.objects.push(object);
        index
    }

    pub fn for_each_object(&self, mut visit: impl FnMut(usize, &SceneObject)) {
        for (index, object) in self.objects.iter().enumerate() {
            visit(index, object);
        }
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn get(&self, index: usize) -> Option<&SceneObject> {
        self.objects.get(index)
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn background(&self) -> Option<Vec3> {
        self.background
    }

    pub fn animation(&self) -> AnimationProfile {
        self.animation
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Sets every rotation from the absolute animation time.
    pub(crate) fn set_rotations(&mut self, seconds: f32) {
        for object in &mut self.objects {
            let angle = seconds * object.speed;
            object.rotation = Vec3::new(angle, angle, 0.0);
        }
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{build, BoxParams, PrimitiveParams};
    use approx::assert_abs_diff_eq;

    fn cube() -> Arc<Geometry> {
        build(&PrimitiveParams::Box(BoxParams::cube(1.0)))
            .unwrap()
            .into_shared()
    }

    #[test]
    fn insert_assigns_speed_by_index() {
        let mut scene = SceneGraph::from_config(&EngineConfig::cubes());
        let geometry = cube();
        for x in [-2.0, 0.0, 2.0] {
            scene.insert(SceneObject::new(
                Arc::clone(&geometry),
                Material::default(),
                Vec3::new(x, 0.0, 0.0),
            ));
        }
        let speeds: Vec<f32> = scene.objects().iter().map(|o| o.speed).collect();
        assert_abs_diff_eq!(speeds[0], 1.0);
        assert_abs_diff_eq!(speeds[1], 1.1, epsilon = 1e-6);
        assert_abs_diff_eq!(speeds[2], 1.2, epsilon = 1e-6);
        assert_eq!(Arc::strong_count(&geometry), 4);
    }

    #[test]
    fn duplicates_are_kept_in_order() {
        let mut scene = SceneGraph::default();
        let object = SceneObject::new(cube(), Material::default(), Vec3::ZERO);
        assert_eq!(scene.insert(object.clone()), 0);
        assert_eq!(scene.insert(object), 1);
        let mut visited = Vec::new();
        scene.for_each_object(|index, object| visited.push((index, object.position)));
        assert_eq!(visited, vec![(0, Vec3::ZERO), (1, Vec3::ZERO)]);
    }

    #[test]
    fn rotations_are_set_not_accumulated() {
        let mut scene = SceneGraph::default();
        scene.insert(SceneObject::new(cube(), Material::default(), Vec3::ZERO));
        scene.set_rotations(2.0);
        scene.set_rotations(2.0);
        assert_eq!(scene.objects()[0].rotation, Vec3::new(2.0, 2.0, 0.0));
    }

    #[test]
    fn lights_point_at_origin() {
        let scene = SceneGraph::from_config(&EngineConfig::primitives());
        assert_eq!(scene.lights().len(), 2);
        let direction = scene.lights()[0].direction();
        assert_abs_diff_eq!(direction.length(), 1.0, epsilon = 1e-6);
        assert!(direction.x > 0.0 && direction.y < 0.0);
    }
}
