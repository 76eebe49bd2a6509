use std::collections::HashMap;

use glam::Vec3;

use super::{
    build, require_finite, require_non_negative, Geometry, PrimitiveKind, PrimitiveParams,
    Topology, Vertex,
};
use crate::error::ConfigurationError;

/// Positions closer than this collapse into one wireframe vertex.
const WELD_PRECISION: f32 = 1e-4;

/// Line rendering of another primitive.
///
/// Without a threshold every distinct triangle edge is drawn. With one, only
/// edges whose adjacent faces meet at more than `threshold_angle` degrees
/// (and open boundary edges) survive.
#[derive(Debug, Clone, PartialEq)]
pub struct WireframeParams {
    pub source: Box<PrimitiveParams>,
    pub threshold_angle: Option<f32>,
}

impl WireframeParams {
    pub fn new(source: PrimitiveParams) -> Self {
        Self {
            source: Box::new(source),
            threshold_angle: None,
        }
    }

    pub fn edges(source: PrimitiveParams, threshold_angle: f32) -> Self {
        Self {
            source: Box::new(source),
            threshold_angle: Some(threshold_angle),
        }
    }

    pub(super) fn validate(&self) -> Result<(), ConfigurationError> {
        if matches!(*self.source, PrimitiveParams::Wireframe(_)) {
            return Err(ConfigurationError::NestedWireframe);
        }
        if let Some(angle) = self.threshold_angle {
            require_finite(PrimitiveKind::Wireframe, "threshold_angle", angle)?;
            require_non_negative(PrimitiveKind::Wireframe, "threshold_angle", angle)?;
        }
        self.source.validate()
    }
}

impl Default for WireframeParams {
    fn default() -> Self {
        Self::new(PrimitiveParams::Box(Default::default()))
    }
}

#[derive(Default)]
struct EdgeFaces {
    normals: Vec<Vec3>,
}

pub(super) fn wireframe_geometry(params: &WireframeParams) -> Result<Geometry, ConfigurationError> {
    let source = build(&params.source)?;
    let threshold_dot = params
        .threshold_angle
        .map(|degrees| degrees.to_radians().cos());

    let mut welded: HashMap<[i64; 3], u32> = HashMap::new();
    let mut vertices = Vec::new();
    let mut weld = |position: Vec3| -> u32 {
        let key = (position / WELD_PRECISION).round().as_i64vec3().to_array();
        *welded.entry(key).or_insert_with(|| {
            vertices.push(Vertex::new(position, Vec3::ZERO));
            (vertices.len() - 1) as u32
        })
    };

    let mut order: Vec<(u32, u32)> = Vec::new();
    let mut faces: HashMap<(u32, u32), EdgeFaces> = HashMap::new();
    let source_vertices = source.vertices();
    for triangle in source.indices().chunks_exact(3) {
        let corners = [triangle[0], triangle[1], triangle[2]]
            .map(|i| source_vertices[i as usize].position());
        let normal = (corners[1] - corners[0])
            .cross(corners[2] - corners[0])
            .normalize_or_zero();
        if threshold_dot.is_some() && normal == Vec3::ZERO {
            continue;
        }
        let welded_corners = corners.map(&mut weld);
        for k in 0..3 {
            let (a, b) = (welded_corners[k], welded_corners[(k + 1) % 3]);
            if a == b {
                continue;
            }
            let key = (a.min(b), a.max(b));
            let entry = faces.entry(key).or_insert_with(|| {
                order.push(key);
                EdgeFaces::default()
            });
            entry.normals.push(normal);
        }
    }

    let indices = order
        .into_iter()
        .filter(|key| match threshold_dot {
            None => true,
            Some(limit) => match faces[key].normals.as_slice() {
                [first, second, ..] => first.dot(*second) <= limit,
                _ => true,
            },
        })
        .flat_map(|(a, b)| [a, b])
        .collect();

    Ok(Geometry::new(
        Some(PrimitiveKind::Wireframe),
        Topology::Lines,
        vertices,
        indices,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{BoxParams, SphereParams};

    #[test]
    fn box_wireframe_includes_face_diagonals() {
        let geometry = wireframe_geometry(&WireframeParams::default()).unwrap();
        assert_eq!(geometry.topology(), Topology::Lines);
        assert_eq!(geometry.primitive_count(), 18);
        assert_eq!(geometry.vertices().len(), 8);
    }

    #[test]
    fn threshold_keeps_only_hard_edges() {
        let params = WireframeParams::edges(PrimitiveParams::Box(BoxParams::cube(8.0)), 1.0);
        let geometry = wireframe_geometry(&params).unwrap();
        assert_eq!(geometry.primitive_count(), 12);
    }

    #[test]
    fn smooth_surface_with_large_threshold_has_no_edges() {
        let sphere = PrimitiveParams::Sphere(SphereParams {
            radius: 5.0,
            width_segments: 24,
            height_segments: 12,
        });
        let geometry = wireframe_geometry(&WireframeParams::edges(sphere, 45.0)).unwrap();
        assert_eq!(geometry.primitive_count(), 0);
    }

    #[test]
    fn nested_wireframe_is_rejected() {
        let inner = PrimitiveParams::Wireframe(WireframeParams::default());
        let outer = PrimitiveParams::Wireframe(WireframeParams::new(inner));
        assert_eq!(build(&outer), Err(ConfigurationError::NestedWireframe));
    }

    #[test]
    fn invalid_source_is_reported() {
        let params = WireframeParams::new(PrimitiveParams::Box(BoxParams::cube(-1.0)));
        assert!(matches!(
            params.validate(),
            Err(ConfigurationError::NonPositive { kind: PrimitiveKind::Box, .. })
        ));
    }
}
