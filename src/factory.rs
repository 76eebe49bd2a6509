use std::sync::Arc;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::EngineConfig;
use crate::error::ConfigurationError;
use crate::geometry::{self, Geometry, PrimitiveParams, Topology};
use crate::material::{ColorPolicy, Material};
use crate::scene::{SceneGraph, SceneObject};

/// Builds primitive geometry and materials and places them on the grid.
#[derive(Debug, Clone)]
pub struct GeometryFactory {
    spread: f32,
    rng: StdRng,
}

impl GeometryFactory {
    pub fn new(spread: f32) -> Self {
        Self {
            spread,
            rng: StdRng::from_entropy(),
        }
    }

    /// Factory whose random hues repeat from run to run.
    pub fn with_seed(spread: f32, seed: u64) -> Self {
        Self {
            spread,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.spread)
    }

    pub fn spread(&self) -> f32 {
        self.spread
    }

    /// Validates `params` and builds the geometry. Nothing is built when a
    /// parameter is rejected.
    pub fn create_primitive(&self, params: &PrimitiveParams) -> Result<Geometry, ConfigurationError> {
        geometry::build(params)
    }

    /// Resolves `policy` into a material. A random hue is drawn here, once.
    pub fn create_material(&mut self, policy: ColorPolicy) -> Result<Material, ConfigurationError> {
        policy.validate()?;
        let material = match policy {
            ColorPolicy::Fixed(color) => Material::solid(color),
            ColorPolicy::RandomHue {
                saturation,
                luminance,
            } => {
                let hue: f32 = self.rng.gen();
                Material::from_hsl(hue, saturation, luminance)
            }
        };
        Ok(material)
    }

    /// Inserts an object at `(grid_x, grid_y) * spread` and returns its index.
    pub fn place_at(
        &self,
        scene: &mut SceneGraph,
        grid_x: f32,
        grid_y: f32,
        geometry: Arc<Geometry>,
        material: Material,
    ) -> usize {
        place_at(scene, self.spread, grid_x, grid_y, geometry, material)
    }

    /// Builds, colors and places a primitive in one go. Line geometry gets a
    /// line material.
    pub fn add_primitive(
        &mut self,
        scene: &mut SceneGraph,
        grid_x: f32,
        grid_y: f32,
        params: &PrimitiveParams,
        policy: ColorPolicy,
    ) -> Result<usize, ConfigurationError> {
        let geometry = self.create_primitive(params)?;
        let mut material = self.create_material(policy)?;
        if geometry.topology() == Topology::Lines {
            material.wireframe = true;
        }
        Ok(self.place_at(scene, grid_x, grid_y, geometry.into_shared(), material))
    }
}

/// Grid placement shared by the factory and the asset bridge.
pub fn place_at(
    scene: &mut SceneGraph,
    spread: f32,
    grid_x: f32,
    grid_y: f32,
    geometry: Arc<Geometry>,
    material: Material,
) -> usize {
    let position = Vec3::new(grid_x * spread, grid_y * spread, 0.0);
    log::debug!(
        "placing {} at ({:.2}, {:.2})",
        geometry.kind().map_or("mesh", |kind| kind.name()),
        position.x,
        position.y
    );
    scene.insert(SceneObject::new(geometry, material, position))
}
