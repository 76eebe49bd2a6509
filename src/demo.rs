//! Ready-made scenes for the two presets.

use std::f32::consts::PI;

use crate::config::{EngineConfig, Preset};
use crate::error::ConfigurationError;
use crate::factory::GeometryFactory;
use crate::geometry::{
    BoxParams, CircleParams, ConeParams, CylinderParams, ExtrudeParams, PlaneParams,
    PolyhedronParams, PrimitiveParams, SphereParams, TorusKnotParams, TorusParams,
    WireframeParams,
};
use crate::material::ColorPolicy;
use crate::scene::SceneGraph;

/// Three unit cubes side by side, each a fixed color.
pub fn spinning_cubes(factory: &mut GeometryFactory) -> Result<SceneGraph, ConfigurationError> {
    let mut scene = SceneGraph::from_config(&EngineConfig::cubes());
    let cube = PrimitiveParams::Box(BoxParams::cube(1.0));
    for (x, color) in [(0.0, 0x44aa88), (-2.0, 0x8844aa), (2.0, 0xaa8844)] {
        factory.add_primitive(&mut scene, x, 0.0, &cube, ColorPolicy::hex(color))?;
    }
    Ok(scene)
}

/// Box, circle sector, cone, cylinder and dodecahedron in a row, each with
/// a random hue.
pub fn primitives_showcase(
    factory: &mut GeometryFactory,
) -> Result<SceneGraph, ConfigurationError> {
    let mut scene = SceneGraph::from_config(&EngineConfig::primitives());
    for (x, params) in showcase_row() {
        factory.add_primitive(&mut scene, x, 0.0, &params, ColorPolicy::default())?;
    }
    Ok(scene)
}

/// The showcase row plus every other generated kind on the rows above and
/// below. Text needs a font and is left out.
pub fn primitive_gallery(factory: &mut GeometryFactory) -> Result<SceneGraph, ConfigurationError> {
    let mut scene = primitives_showcase(factory)?;
    let upper = [
        (-2.0, PrimitiveParams::Icosahedron(PolyhedronParams::new(7.0))),
        (-1.0, PrimitiveParams::Plane(PlaneParams {
            width: 9.0,
            height: 9.0,
            width_segments: 2,
            height_segments: 2,
        })),
        (0.0, PrimitiveParams::Sphere(SphereParams {
            radius: 7.0,
            width_segments: 12,
            height_segments: 8,
        })),
        (1.0, PrimitiveParams::Torus(TorusParams {
            radius: 5.0,
            tube: 2.0,
            radial_segments: 8,
            tubular_segments: 24,
            ..TorusParams::default()
        })),
        (2.0, PrimitiveParams::TorusKnot(TorusKnotParams {
            radius: 3.5,
            tube: 1.5,
            tubular_segments: 64,
            radial_segments: 8,
            p: 2,
            q: 3,
        })),
    ];
    for (x, params) in upper {
        factory.add_primitive(&mut scene, x, 1.0, &params, ColorPolicy::default())?;
    }

    let mut heart = ExtrudeParams::default();
    heart.curve_segments = 6;
    factory.add_primitive(
        &mut scene,
        -1.0,
        -1.0,
        &PrimitiveParams::ExtrudedShape(heart),
        ColorPolicy::default(),
    )?;
    let edges = WireframeParams::edges(PrimitiveParams::Box(BoxParams::cube(8.0)), 1.0);
    factory.add_primitive(
        &mut scene,
        1.0,
        -1.0,
        &PrimitiveParams::Wireframe(edges),
        ColorPolicy::hex(0x000000),
    )?;
    Ok(scene)
}

/// Scene for `preset`.
pub fn scene_for(
    preset: Preset,
    factory: &mut GeometryFactory,
) -> Result<SceneGraph, ConfigurationError> {
    match preset {
        Preset::Cubes => spinning_cubes(factory),
        Preset::Primitives => primitives_showcase(factory),
    }
}

fn showcase_row() -> [(f32, PrimitiveParams); 5] {
    [
        (0.0, PrimitiveParams::Box(BoxParams::cube(8.0))),
        (1.5, PrimitiveParams::CircleSector(CircleParams {
            radius: 6.0,
            segments: 24,
            theta_start: PI / 3.0,
            theta_length: PI * 5.0 / 3.0,
        })),
        (-1.5, PrimitiveParams::Cone(ConeParams {
            radius: 6.0,
            height: 8.0,
            radial_segments: 16,
            ..ConeParams::default()
        })),
        (3.0, PrimitiveParams::Cylinder(CylinderParams {
            radius_top: 4.0,
            radius_bottom: 6.0,
            height: 8.0,
            radial_segments: 12,
            ..CylinderParams::default()
        })),
        (-3.0, PrimitiveParams::Dodecahedron(PolyhedronParams::new(5.0))),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PrimitiveKind;
    use crate::material::Side;
    use approx::assert_abs_diff_eq;
    use glam::Vec3;

    #[test]
    fn cubes_have_fixed_colors() {
        let mut factory = GeometryFactory::with_seed(1.0, 0);
        let scene = spinning_cubes(&mut factory).unwrap();
        let xs: Vec<f32> = scene.objects().iter().map(|o| o.position.x).collect();
        assert_eq!(xs, vec![0.0, -2.0, 2.0]);
        assert_eq!(
            scene.objects()[0].material.color,
            crate::color::from_hex(0x44aa88)
        );
        assert_abs_diff_eq!(scene.objects()[2].speed, 1.2, epsilon = 1e-6);
    }

    #[test]
    fn showcase_spreads_five_kinds() {
        let mut factory = GeometryFactory::with_seed(15.0, 0);
        let scene = primitives_showcase(&mut factory).unwrap();
        let kinds: Vec<_> = scene.objects().iter().filter_map(|o| o.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                PrimitiveKind::Box,
                PrimitiveKind::CircleSector,
                PrimitiveKind::Cone,
                PrimitiveKind::Cylinder,
                PrimitiveKind::Dodecahedron,
            ]
        );
        assert_eq!(scene.objects()[1].position, Vec3::new(22.5, 0.0, 0.0));
        assert_eq!(scene.objects()[4].position, Vec3::new(-45.0, 0.0, 0.0));
        assert!(scene.objects().iter().all(|o| o.material.side == Side::Double));
    }

    #[test]
    fn gallery_builds_every_generated_kind() {
        let mut factory = GeometryFactory::with_seed(15.0, 0);
        let scene = primitive_gallery(&mut factory).unwrap();
        assert_eq!(scene.len(), 12);
        let wire = scene.objects().last().unwrap();
        assert_eq!(wire.kind(), Some(PrimitiveKind::Wireframe));
        assert_eq!(wire.geometry.primitive_count(), 12);
    }
}
