use std::f32::consts::{PI, TAU};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{
    require_finite, require_non_negative, require_positive, require_segments, Geometry,
    MeshBuilder, PrimitiveKind,
};
use crate::error::ConfigurationError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxParams {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    pub width_segments: u32,
    pub height_segments: u32,
    pub depth_segments: u32,
}

impl BoxParams {
    pub fn cube(size: f32) -> Self {
        Self::new(size, size, size)
    }

    pub fn new(width: f32, height: f32, depth: f32) -> Self {
        Self {
            width,
            height,
            depth,
            ..Self::default()
        }
    }

    pub(super) fn validate(&self) -> Result<(), ConfigurationError> {
        let kind = PrimitiveKind::Box;
        require_positive(kind, "width", self.width)?;
        require_positive(kind, "height", self.height)?;
        require_positive(kind, "depth", self.depth)?;
        require_segments(kind, "width_segments", self.width_segments, 1)?;
        require_segments(kind, "height_segments", self.height_segments, 1)?;
        require_segments(kind, "depth_segments", self.depth_segments, 1)
    }
}

impl Default for BoxParams {
    fn default() -> Self {
        Self {
            width: 1.0,
            height: 1.0,
            depth: 1.0,
            width_segments: 1,
            height_segments: 1,
            depth_segments: 1,
        }
    }
}

/// Flat disc or pie slice in the XY plane. Angles are in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleParams {
    pub radius: f32,
    pub segments: u32,
    pub theta_start: f32,
    pub theta_length: f32,
}

impl CircleParams {
    pub(super) fn validate(&self) -> Result<(), ConfigurationError> {
        let kind = PrimitiveKind::CircleSector;
        require_positive(kind, "radius", self.radius)?;
        require_segments(kind, "segments", self.segments, 3)?;
        require_finite(kind, "theta_start", self.theta_start)?;
        require_positive(kind, "theta_length", self.theta_length)
    }
}

impl Default for CircleParams {
    fn default() -> Self {
        Self {
            radius: 1.0,
            segments: 32,
            theta_start: 0.0,
            theta_length: TAU,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConeParams {
    pub radius: f32,
    pub height: f32,
    pub radial_segments: u32,
    pub height_segments: u32,
    pub open_ended: bool,
}

impl ConeParams {
    pub(super) fn validate(&self) -> Result<(), ConfigurationError> {
        let kind = PrimitiveKind::Cone;
        require_positive(kind, "radius", self.radius)?;
        require_positive(kind, "height", self.height)?;
        require_segments(kind, "radial_segments", self.radial_segments, 3)?;
        require_segments(kind, "height_segments", self.height_segments, 1)
    }
}

impl Default for ConeParams {
    fn default() -> Self {
        Self {
            radius: 1.0,
            height: 1.0,
            radial_segments: 32,
            height_segments: 1,
            open_ended: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CylinderParams {
    pub radius_top: f32,
    pub radius_bottom: f32,
    pub height: f32,
    pub radial_segments: u32,
    pub height_segments: u32,
    pub open_ended: bool,
}

impl CylinderParams {
    pub(super) fn validate(&self) -> Result<(), ConfigurationError> {
        let kind = PrimitiveKind::Cylinder;
        require_non_negative(kind, "radius_top", self.radius_top)?;
        require_non_negative(kind, "radius_bottom", self.radius_bottom)?;
        if self.radius_top == 0.0 && self.radius_bottom == 0.0 {
            return Err(ConfigurationError::NonPositive {
                kind,
                parameter: "radius_bottom",
                value: 0.0,
            });
        }
        require_positive(kind, "height", self.height)?;
        require_segments(kind, "radial_segments", self.radial_segments, 3)?;
        require_segments(kind, "height_segments", self.height_segments, 1)
    }
}

impl Default for CylinderParams {
    fn default() -> Self {
        Self {
            radius_top: 1.0,
            radius_bottom: 1.0,
            height: 1.0,
            radial_segments: 32,
            height_segments: 1,
            open_ended: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneParams {
    pub width: f32,
    pub height: f32,
    pub width_segments: u32,
    pub height_segments: u32,
}

impl PlaneParams {
    pub(super) fn validate(&self) -> Result<(), ConfigurationError> {
        let kind = PrimitiveKind::Plane;
        require_positive(kind, "width", self.width)?;
        require_positive(kind, "height", self.height)?;
        require_segments(kind, "width_segments", self.width_segments, 1)?;
        require_segments(kind, "height_segments", self.height_segments, 1)
    }
}

impl Default for PlaneParams {
    fn default() -> Self {
        Self {
            width: 1.0,
            height: 1.0,
            width_segments: 1,
            height_segments: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphereParams {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
}

impl SphereParams {
    pub(super) fn validate(&self) -> Result<(), ConfigurationError> {
        let kind = PrimitiveKind::Sphere;
        require_positive(kind, "radius", self.radius)?;
        require_segments(kind, "width_segments", self.width_segments, 3)?;
        require_segments(kind, "height_segments", self.height_segments, 2)
    }
}

impl Default for SphereParams {
    fn default() -> Self {
        Self {
            radius: 1.0,
            width_segments: 32,
            height_segments: 16,
        }
    }
}

/// `radius` is the distance from the center to the middle of the tube.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TorusParams {
    pub radius: f32,
    pub tube: f32,
    pub radial_segments: u32,
    pub tubular_segments: u32,
    pub arc: f32,
}

impl TorusParams {
    pub(super) fn validate(&self) -> Result<(), ConfigurationError> {
        let kind = PrimitiveKind::Torus;
        require_positive(kind, "radius", self.radius)?;
        require_positive(kind, "tube", self.tube)?;
        require_segments(kind, "radial_segments", self.radial_segments, 2)?;
        require_segments(kind, "tubular_segments", self.tubular_segments, 3)?;
        require_positive(kind, "arc", self.arc)
    }
}

impl Default for TorusParams {
    fn default() -> Self {
        Self {
            radius: 1.0,
            tube: 0.4,
            radial_segments: 12,
            tubular_segments: 48,
            arc: TAU,
        }
    }
}

/// `p` winds around the axis of rotational symmetry, `q` around the tube interior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TorusKnotParams {
    pub radius: f32,
    pub tube: f32,
    pub tubular_segments: u32,
    pub radial_segments: u32,
    pub p: u32,
    pub q: u32,
}

impl TorusKnotParams {
    pub(super) fn validate(&self) -> Result<(), ConfigurationError> {
        let kind = PrimitiveKind::TorusKnot;
        require_positive(kind, "radius", self.radius)?;
        require_positive(kind, "tube", self.tube)?;
        require_segments(kind, "tubular_segments", self.tubular_segments, 3)?;
        require_segments(kind, "radial_segments", self.radial_segments, 3)?;
        require_segments(kind, "p", self.p, 1)?;
        require_segments(kind, "q", self.q, 1)
    }
}

impl Default for TorusKnotParams {
    fn default() -> Self {
        Self {
            radius: 1.0,
            tube: 0.4,
            tubular_segments: 64,
            radial_segments: 8,
            p: 2,
            q: 3,
        }
    }
}

pub(super) fn box_geometry(params: &BoxParams) -> Geometry {
    let mut mesh = MeshBuilder::new();
    let (w, h, d) = (params.width, params.height, params.depth);
    let (ws, hs, ds) = (
        params.width_segments,
        params.height_segments,
        params.depth_segments,
    );

    // (normal, u axis, v axis, u extent, v extent, normal extent, u segments, v segments)
    let faces = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y, d, h, w, ds, hs),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y, d, h, w, ds, hs),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z, w, d, h, ws, ds),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z, w, d, h, ws, ds),
        (Vec3::Z, Vec3::X, Vec3::Y, w, h, d, ws, hs),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y, w, h, d, ws, hs),
    ];

    for (normal, u_axis, v_axis, u_extent, v_extent, n_extent, u_segments, v_segments) in faces {
        let center = normal * (n_extent * 0.5);
        let base = mesh.next_index();
        for iv in 0..=v_segments {
            let v = -v_extent * 0.5 + v_extent * iv as f32 / v_segments as f32;
            for iu in 0..=u_segments {
                let u = -u_extent * 0.5 + u_extent * iu as f32 / u_segments as f32;
                mesh.vertex(center + u_axis * u + v_axis * v, normal);
            }
        }
        let row = u_segments + 1;
        for iv in 0..v_segments {
            for iu in 0..u_segments {
                let a = base + iv * row + iu;
                let b = a + 1;
                let c = a + row + 1;
                let d = a + row;
                mesh.triangle(a, b, c);
                mesh.triangle(a, c, d);
            }
        }
    }

    mesh.build(PrimitiveKind::Box)
}

pub(super) fn circle_geometry(params: &CircleParams) -> Geometry {
    let mut mesh = MeshBuilder::new();
    let center = mesh.vertex(Vec3::ZERO, Vec3::Z);
    for s in 0..=params.segments {
        let angle = params.theta_start + params.theta_length * s as f32 / params.segments as f32;
        let (sin, cos) = angle.sin_cos();
        mesh.vertex(Vec3::new(cos, sin, 0.0) * params.radius, Vec3::Z);
    }
    for s in 1..=params.segments {
        mesh.triangle(center, s, s + 1);
    }
    mesh.build(PrimitiveKind::CircleSector)
}

pub(super) fn cone_geometry(params: &ConeParams) -> Geometry {
    let cylinder = CylinderParams {
        radius_top: 0.0,
        radius_bottom: params.radius,
        height: params.height,
        radial_segments: params.radial_segments,
        height_segments: params.height_segments,
        open_ended: params.open_ended,
    };
    cylinder_geometry(&cylinder, PrimitiveKind::Cone)
}

pub(super) fn cylinder_geometry(params: &CylinderParams, kind: PrimitiveKind) -> Geometry {
    let mut mesh = MeshBuilder::new();
    let half_height = params.height * 0.5;
    let radial = params.radial_segments;
    let slope = (params.radius_bottom - params.radius_top) / params.height;
    let row = radial + 1;

    let base = mesh.next_index();
    for y in 0..=params.height_segments {
        let v = y as f32 / params.height_segments as f32;
        let radius = v * (params.radius_bottom - params.radius_top) + params.radius_top;
        for x in 0..=radial {
            let theta = TAU * x as f32 / radial as f32;
            let (sin, cos) = theta.sin_cos();
            let position = Vec3::new(radius * sin, -v * params.height + half_height, radius * cos);
            let normal = Vec3::new(sin, slope, cos).normalize();
            mesh.vertex(position, normal);
        }
    }
    for y in 0..params.height_segments {
        for x in 0..radial {
            let a = base + y * row + x;
            let b = base + (y + 1) * row + x;
            let c = b + 1;
            let d = a + 1;
            mesh.triangle(a, b, d);
            mesh.triangle(b, c, d);
        }
    }

    if !params.open_ended {
        if params.radius_top > 0.0 {
            cylinder_cap(&mut mesh, params.radius_top, half_height, radial, true);
        }
        if params.radius_bottom > 0.0 {
            cylinder_cap(&mut mesh, params.radius_bottom, half_height, radial, false);
        }
    }

    mesh.build(kind)
}

fn cylinder_cap(mesh: &mut MeshBuilder, radius: f32, half_height: f32, radial: u32, top: bool) {
    let sign = if top { 1.0 } else { -1.0 };
    let normal = Vec3::new(0.0, sign, 0.0);
    let center = mesh.vertex(Vec3::new(0.0, half_height * sign, 0.0), normal);
    let rim = mesh.next_index();
    for x in 0..=radial {
        let theta = TAU * x as f32 / radial as f32;
        let (sin, cos) = theta.sin_cos();
        mesh.vertex(Vec3::new(radius * sin, half_height * sign, radius * cos), normal);
    }
    for x in 0..radial {
        let i = rim + x;
        if top {
            mesh.triangle(i, i + 1, center);
        } else {
            mesh.triangle(i + 1, i, center);
        }
    }
}

pub(super) fn plane_geometry(params: &PlaneParams) -> Geometry {
    let mut mesh = MeshBuilder::new();
    let (gx, gy) = (params.width_segments, params.height_segments);
    let segment_width = params.width / gx as f32;
    let segment_height = params.height / gy as f32;
    for iy in 0..=gy {
        let y = params.height * 0.5 - iy as f32 * segment_height;
        for ix in 0..=gx {
            let x = ix as f32 * segment_width - params.width * 0.5;
            mesh.vertex(Vec3::new(x, y, 0.0), Vec3::Z);
        }
    }
    let row = gx + 1;
    for iy in 0..gy {
        for ix in 0..gx {
            let a = ix + row * iy;
            let b = ix + row * (iy + 1);
            let c = ix + 1 + row * (iy + 1);
            let d = ix + 1 + row * iy;
            mesh.triangle(a, b, d);
            mesh.triangle(b, c, d);
        }
    }
    mesh.build(PrimitiveKind::Plane)
}

pub(super) fn sphere_geometry(params: &SphereParams) -> Geometry {
    let mut mesh = MeshBuilder::new();
    let (ws, hs) = (params.width_segments, params.height_segments);
    for iy in 0..=hs {
        let theta = PI * iy as f32 / hs as f32;
        for ix in 0..=ws {
            let phi = TAU * ix as f32 / ws as f32;
            let direction = Vec3::new(
                -phi.cos() * theta.sin(),
                theta.cos(),
                phi.sin() * theta.sin(),
            );
            mesh.vertex(direction * params.radius, direction.normalize_or_zero());
        }
    }
    let row = ws + 1;
    for iy in 0..hs {
        for ix in 0..ws {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;
            // The pole rows collapse to a point; skip their degenerate halves.
            if iy != 0 {
                mesh.triangle(a, b, d);
            }
            if iy != hs - 1 {
                mesh.triangle(b, c, d);
            }
        }
    }
    mesh.build(PrimitiveKind::Sphere)
}

pub(super) fn torus_geometry(params: &TorusParams) -> Geometry {
    let mut mesh = MeshBuilder::new();
    let (radial, tubular) = (params.radial_segments, params.tubular_segments);
    for j in 0..=radial {
        let v = TAU * j as f32 / radial as f32;
        for i in 0..=tubular {
            let u = params.arc * i as f32 / tubular as f32;
            let ring = params.radius + params.tube * v.cos();
            let position = Vec3::new(ring * u.cos(), ring * u.sin(), params.tube * v.sin());
            let center = Vec3::new(params.radius * u.cos(), params.radius * u.sin(), 0.0);
            mesh.vertex(position, (position - center).normalize_or_zero());
        }
    }
    let row = tubular + 1;
    for j in 1..=radial {
        for i in 1..=tubular {
            let a = row * j + i - 1;
            let b = row * (j - 1) + i - 1;
            let c = row * (j - 1) + i;
            let d = row * j + i;
            mesh.triangle(a, b, d);
            mesh.triangle(b, c, d);
        }
    }
    mesh.build(PrimitiveKind::Torus)
}

pub(super) fn torus_knot_geometry(params: &TorusKnotParams) -> Geometry {
    let mut mesh = MeshBuilder::new();
    let (tubular, radial) = (params.tubular_segments, params.radial_segments);
    let (p, q) = (params.p as f32, params.q as f32);

    let curve = |u: f32| -> Vec3 {
        let quo = q / p * u;
        let cs = quo.cos();
        Vec3::new(
            params.radius * (2.0 + cs) * 0.5 * u.cos(),
            params.radius * (2.0 + cs) * 0.5 * u.sin(),
            params.radius * quo.sin() * 0.5,
        )
    };

    for i in 0..=tubular {
        let u = i as f32 / tubular as f32 * p * TAU;
        let p1 = curve(u);
        let p2 = curve(u + 0.01);
        let tangent = p2 - p1;
        let binormal = tangent.cross(p2 + p1).normalize_or_zero();
        let normal = binormal.cross(tangent).normalize_or_zero();

        for j in 0..=radial {
            let v = TAU * j as f32 / radial as f32;
            let cx = -params.tube * v.cos();
            let cy = params.tube * v.sin();
            let position = p1 + normal * cx + binormal * cy;
            mesh.vertex(position, (position - p1).normalize_or_zero());
        }
    }
    let row = radial + 1;
    for j in 1..=tubular {
        for i in 1..=radial {
            let a = row * (j - 1) + (i - 1);
            let b = row * j + (i - 1);
            let c = row * j + i;
            let d = row * (j - 1) + i;
            mesh.triangle(a, b, d);
            mesh.triangle(b, c, d);
        }
    }
    mesh.build(PrimitiveKind::TorusKnot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{build, PrimitiveParams, MAX_SEGMENTS};
    use approx::assert_abs_diff_eq;

    #[test]
    fn box_extents_match_parameters() {
        let geometry = build(&PrimitiveParams::Box(BoxParams::cube(8.0))).unwrap();
        let size = geometry.bounds().size();
        assert_eq!(size, Vec3::splat(8.0));
        assert_eq!(geometry.bounds().center(), Vec3::ZERO);
        assert_eq!(geometry.primitive_count(), 12);
    }

    #[test]
    fn box_rejects_zero_depth() {
        let err = build(&PrimitiveParams::Box(BoxParams::new(8.0, 8.0, 0.0))).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::NonPositive {
                kind: PrimitiveKind::Box,
                parameter: "depth",
                value: 0.0,
            }
        );
    }

    #[test]
    fn box_faces_point_outwards() {
        let geometry = box_geometry(&BoxParams::cube(2.0));
        let vertices = geometry.vertices();
        for tri in geometry.indices().chunks_exact(3) {
            let a = vertices[tri[0] as usize].position();
            let b = vertices[tri[1] as usize].position();
            let c = vertices[tri[2] as usize].position();
            let face = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(face.dot(centroid) > 0.0, "inward face at {centroid:?}");
        }
    }

    #[test]
    fn circle_sector_spans_requested_arc() {
        let params = CircleParams {
            radius: 6.0,
            segments: 24,
            theta_start: PI / 3.0,
            theta_length: PI * 5.0 / 3.0,
        };
        let geometry = circle_geometry(&params);
        assert_eq!(geometry.primitive_count(), 24);
        assert_eq!(geometry.vertices().len(), 26);
        let first = geometry.vertices()[1].position();
        assert_abs_diff_eq!(first.x, 6.0 * (PI / 3.0).cos(), epsilon = 1e-5);
        assert_abs_diff_eq!(first.y, 6.0 * (PI / 3.0).sin(), epsilon = 1e-5);
    }

    #[test]
    fn cone_has_point_on_top_and_cap_below() {
        let params = ConeParams {
            radius: 6.0,
            height: 8.0,
            radial_segments: 16,
            ..ConeParams::default()
        };
        let geometry = build(&PrimitiveParams::Cone(params)).unwrap();
        let bounds = geometry.bounds();
        assert_abs_diff_eq!(bounds.max.y, 4.0, epsilon = 1e-5);
        assert_abs_diff_eq!(bounds.min.y, -4.0, epsilon = 1e-5);
        // Side plus bottom cap only.
        assert_eq!(geometry.primitive_count(), 16 * 2 + 16);
    }

    #[test]
    fn cylinder_validation() {
        let both_zero = CylinderParams {
            radius_top: 0.0,
            radius_bottom: 0.0,
            ..CylinderParams::default()
        };
        assert!(both_zero.validate().is_err());
        let few_segments = CylinderParams {
            radial_segments: 2,
            ..CylinderParams::default()
        };
        assert!(matches!(
            few_segments.validate(),
            Err(ConfigurationError::TooFewSegments { minimum: 3, .. })
        ));
    }

    #[test]
    fn huge_segment_counts_are_rejected() {
        let params = PrimitiveParams::Sphere(SphereParams {
            width_segments: u32::MAX,
            ..SphereParams::default()
        });
        assert!(matches!(
            build(&params),
            Err(ConfigurationError::TooManySegments {
                parameter: "width_segments",
                ..
            })
        ));
        let largest = SphereParams {
            width_segments: MAX_SEGMENTS,
            height_segments: 2,
            ..SphereParams::default()
        };
        assert!(largest.validate().is_ok());
    }

    #[test]
    fn sphere_vertices_lie_on_radius() {
        let geometry = sphere_geometry(&SphereParams {
            radius: 3.0,
            width_segments: 12,
            height_segments: 8,
        });
        for vertex in geometry.vertices() {
            assert_abs_diff_eq!(vertex.position().length(), 3.0, epsilon = 1e-4);
        }
        assert_eq!(geometry.primitive_count(), 12 * 8 * 2 - 2 * 12);
    }

    #[test]
    fn torus_fits_inside_outer_radius() {
        let geometry = torus_geometry(&TorusParams {
            radius: 5.0,
            tube: 2.0,
            radial_segments: 8,
            tubular_segments: 24,
            arc: TAU,
        });
        let bounds = geometry.bounds();
        assert_abs_diff_eq!(bounds.max.x, 7.0, epsilon = 1e-4);
        assert_abs_diff_eq!(bounds.max.z, 2.0, epsilon = 1e-3);
    }

    #[test]
    fn plane_is_flat() {
        let geometry = plane_geometry(&PlaneParams {
            width: 9.0,
            height: 9.0,
            width_segments: 2,
            height_segments: 2,
        });
        assert_eq!(geometry.bounds().size(), Vec3::new(9.0, 9.0, 0.0));
        assert_eq!(geometry.primitive_count(), 8);
    }

    #[test]
    fn torus_knot_rejects_zero_winding() {
        let params = TorusKnotParams {
            p: 0,
            ..TorusKnotParams::default()
        };
        assert!(build(&PrimitiveParams::TorusKnot(params)).is_err());
    }
}
