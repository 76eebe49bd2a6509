use std::f32::consts::FRAC_PI_2;

use glam::{Vec2, Vec3};

use super::path::{triangulate, Path, Shape, ShapePoints};
use super::{
    require_finite, require_non_negative, require_positive, require_segments, Geometry,
    MeshBuilder, PrimitiveKind,
};
use crate::error::ConfigurationError;

/// Rounded rim added around both caps of an extrusion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bevel {
    /// Depth of the bevel along the extrusion axis.
    pub thickness: f32,
    /// Distance the bevel reaches beyond the outline.
    pub size: f32,
    pub offset: f32,
    pub segments: u32,
}

impl Default for Bevel {
    fn default() -> Self {
        Self {
            thickness: 0.2,
            size: 0.1,
            offset: 0.0,
            segments: 3,
        }
    }
}

/// Flat shapes pushed along +Z from 0 to `depth`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtrudeParams {
    pub shapes: Vec<Shape>,
    pub depth: f32,
    pub steps: u32,
    pub curve_segments: u32,
    pub bevel: Option<Bevel>,
}

impl ExtrudeParams {
    pub fn new(shape: Shape) -> Self {
        Self {
            shapes: vec![shape],
            depth: 1.0,
            steps: 1,
            curve_segments: 12,
            bevel: None,
        }
    }

    pub(super) fn validate(&self) -> Result<(), ConfigurationError> {
        self.validate_as(PrimitiveKind::ExtrudedShape)
    }

    pub(super) fn validate_as(&self, kind: PrimitiveKind) -> Result<(), ConfigurationError> {
        require_positive(kind, "depth", self.depth)?;
        require_segments(kind, "steps", self.steps, 1)?;
        require_segments(kind, "curve_segments", self.curve_segments, 1)?;
        if let Some(bevel) = &self.bevel {
            require_non_negative(kind, "bevel_thickness", bevel.thickness)?;
            require_non_negative(kind, "bevel_size", bevel.size)?;
            require_finite(kind, "bevel_offset", bevel.offset)?;
            require_segments(kind, "bevel_segments", bevel.segments, 1)?;
        }
        if self.shapes.is_empty() {
            return Err(ConfigurationError::DegenerateShape(0));
        }
        for shape in &self.shapes {
            let points = shape.outline.points(self.curve_segments);
            if points.len() < 3 {
                return Err(ConfigurationError::DegenerateShape(points.len()));
            }
        }
        Ok(())
    }
}

impl Default for ExtrudeParams {
    fn default() -> Self {
        Self {
            shapes: vec![heart()],
            depth: 2.0,
            steps: 2,
            curve_segments: 12,
            bevel: Some(Bevel {
                thickness: 1.0,
                size: 1.0,
                offset: 0.0,
                segments: 2,
            }),
        }
    }
}

/// Heart outline roughly 11 units wide, centered near the origin.
pub fn heart() -> Shape {
    let (x, y) = (-2.5, -5.0);
    let v = |dx: f32, dy: f32| Vec2::new(x + dx, y + dy);
    let mut path = Path::new(v(2.5, 2.5));
    path.bezier_to(v(2.5, 2.5), v(2.0, 0.0), v(0.0, 0.0))
        .bezier_to(v(-3.0, 0.0), v(-3.0, 3.5), v(-3.0, 3.5))
        .bezier_to(v(-3.0, 5.5), v(-1.5, 7.7), v(2.5, 9.5))
        .bezier_to(v(6.0, 7.7), v(8.0, 4.5), v(8.0, 3.5))
        .bezier_to(v(8.0, 3.5), v(8.0, 0.0), v(5.0, 0.0))
        .bezier_to(v(3.5, 0.0), v(2.5, 2.5), v(2.5, 2.5));
    Shape::new(path)
}

pub(super) fn extrude_geometry(params: &ExtrudeParams) -> Result<Geometry, ConfigurationError> {
    extrude_as(params, PrimitiveKind::ExtrudedShape)
}

pub(super) fn extrude_as(
    params: &ExtrudeParams,
    kind: PrimitiveKind,
) -> Result<Geometry, ConfigurationError> {
    let layers = layers(params);
    let mut mesh = MeshBuilder::new();
    for shape in &params.shapes {
        let points = shape.extract_points(params.curve_segments);
        if points.contour.len() < 3 {
            return Err(ConfigurationError::DegenerateShape(points.contour.len()));
        }
        extrude_shape(&mut mesh, &points, &layers);
    }
    Ok(mesh.build(kind))
}

/// `(z, outline growth)` for every cross-section from front to back.
fn layers(params: &ExtrudeParams) -> Vec<(f32, f32)> {
    let steps = params.steps;
    let Some(bevel) = params.bevel else {
        return (0..=steps)
            .map(|s| (params.depth * s as f32 / steps as f32, 0.0))
            .collect();
    };

    let rim = |b: u32| {
        let t = b as f32 / bevel.segments as f32 * FRAC_PI_2;
        (bevel.thickness * t.cos(), bevel.size * t.sin() + bevel.offset)
    };
    let mut layers = Vec::with_capacity((steps + 1 + 2 * bevel.segments) as usize);
    layers.extend((0..bevel.segments).map(|b| {
        let (z, growth) = rim(b);
        (-z, growth)
    }));
    layers.extend(
        (0..=steps).map(|s| (params.depth * s as f32 / steps as f32, bevel.size + bevel.offset)),
    );
    layers.extend((0..bevel.segments).rev().map(|b| {
        let (z, growth) = rim(b);
        (params.depth + z, growth)
    }));
    layers
}

fn extrude_shape(mesh: &mut MeshBuilder, points: &ShapePoints, layers: &[(f32, f32)]) {
    let mut rings: Vec<&[Vec2]> = vec![&points.contour];
    rings.extend(points.holes.iter().filter(|h| h.len() >= 3).map(Vec::as_slice));
    let holes: Vec<Vec<Vec2>> = rings[1..].iter().map(|h| h.to_vec()).collect();
    let miters: Vec<Vec<Vec2>> = rings.iter().map(|ring| miter_vectors(ring)).collect();

    // Cross-sections laid out ring after ring, matching the triangulation indices.
    let sections: Vec<Vec<Vec3>> = layers
        .iter()
        .map(|&(z, growth)| {
            rings
                .iter()
                .zip(&miters)
                .flat_map(|(ring, miter)| {
                    ring.iter()
                        .zip(miter)
                        .map(move |(&p, &m)| (p + m * growth).extend(z))
                })
                .collect()
        })
        .collect();

    let caps = triangulate(&points.contour, &holes);
    if let (Some(front), Some(back)) = (sections.first(), sections.last()) {
        for &[a, b, c] in &caps {
            mesh.flat_triangle(front[c], front[b], front[a]);
            mesh.flat_triangle(back[a], back[b], back[c]);
        }
    }

    let mut start = 0;
    for ring in &rings {
        let n = ring.len();
        for j in 0..n {
            let k = (j + 1) % n;
            for pair in sections.windows(2) {
                let (lower, upper) = (&pair[0], &pair[1]);
                let (a, b) = (lower[start + j], lower[start + k]);
                let (c, d) = (upper[start + k], upper[start + j]);
                mesh.flat_triangle(a, b, c);
                mesh.flat_triangle(a, c, d);
            }
        }
        start += n;
    }
}

/// Per-vertex offsets that push every edge outward by one unit. Works for
/// counter-clockwise contours and clockwise holes alike.
fn miter_vectors(ring: &[Vec2]) -> Vec<Vec2> {
    let n = ring.len();
    let outward = |from: Vec2, to: Vec2| {
        let edge = (to - from).normalize_or_zero();
        Vec2::new(edge.y, -edge.x)
    };
    (0..n)
        .map(|i| {
            let prev = ring[(i + n - 1) % n];
            let here = ring[i];
            let next = ring[(i + 1) % n];
            let n1 = outward(prev, here);
            let n2 = outward(here, next);
            let denominator = 1.0 + n1.dot(n2);
            if denominator.abs() < 1e-4 {
                n1
            } else {
                (n1 + n2) / denominator
            }
        })
        .collect()
}
