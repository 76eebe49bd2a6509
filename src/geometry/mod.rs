//! Procedural geometry.
//!
//! Every primitive is described by a [`PrimitiveParams`] value and turned into
//! a [`Geometry`] by [`build`]. Parameters are validated up front so that a bad
//! description never produces a half-built mesh.

mod extrude;
mod font;
mod path;
mod polyhedron;
mod shapes;
mod wireframe;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

pub use extrude::{heart, Bevel, ExtrudeParams};
pub use font::{Font, TextParams, TextStyle};
pub use path::{signed_area, triangulate, Path, PathSegment, Shape, ShapePoints};
pub use polyhedron::PolyhedronParams;
pub use shapes::{
    BoxParams, CircleParams, ConeParams, CylinderParams, PlaneParams, SphereParams, TorusKnotParams,
    TorusParams,
};
pub use wireframe::WireframeParams;

/// Interleaved vertex layout handed to draw backends.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Topology {
    /// Every three indices form a triangle.
    Triangles,
    /// Every two indices form a line segment.
    Lines,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// Closed set of generatable shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrimitiveKind {
    Box,
    CircleSector,
    Cone,
    Cylinder,
    Dodecahedron,
    Icosahedron,
    Plane,
    Torus,
    TorusKnot,
    Sphere,
    ExtrudedShape,
    Wireframe,
    Text,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 13] = [
        Self::Box,
        Self::CircleSector,
        Self::Cone,
        Self::Cylinder,
        Self::Dodecahedron,
        Self::Icosahedron,
        Self::Plane,
        Self::Torus,
        Self::TorusKnot,
        Self::Sphere,
        Self::ExtrudedShape,
        Self::Wireframe,
        Self::Text,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Box => "box",
            Self::CircleSector => "circle-sector",
            Self::Cone => "cone",
            Self::Cylinder => "cylinder",
            Self::Dodecahedron => "dodecahedron",
            Self::Icosahedron => "icosahedron",
            Self::Plane => "plane",
            Self::Torus => "torus",
            Self::TorusKnot => "torus-knot",
            Self::Sphere => "sphere",
            Self::ExtrudedShape => "extruded-shape",
            Self::Wireframe => "wireframe",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PrimitiveKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        let kind = match normalized.as_str() {
            "circle" => Self::CircleSector,
            "extrude" | "extruded" => Self::ExtrudedShape,
            "edges" => Self::Wireframe,
            other => Self::ALL
                .into_iter()
                .find(|kind| kind.name() == other)
                .ok_or_else(|| anyhow!("unknown primitive kind {s:?}"))?,
        };
        Ok(kind)
    }
}

/// Declarative description of a primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveParams {
    Box(BoxParams),
    CircleSector(CircleParams),
    Cone(ConeParams),
    Cylinder(CylinderParams),
    Dodecahedron(PolyhedronParams),
    Icosahedron(PolyhedronParams),
    Plane(PlaneParams),
    Torus(TorusParams),
    TorusKnot(TorusKnotParams),
    Sphere(SphereParams),
    ExtrudedShape(ExtrudeParams),
    Wireframe(WireframeParams),
    Text(TextParams),
}

impl PrimitiveParams {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Self::Box(_) => PrimitiveKind::Box,
            Self::CircleSector(_) => PrimitiveKind::CircleSector,
            Self::Cone(_) => PrimitiveKind::Cone,
            Self::Cylinder(_) => PrimitiveKind::Cylinder,
            Self::Dodecahedron(_) => PrimitiveKind::Dodecahedron,
            Self::Icosahedron(_) => PrimitiveKind::Icosahedron,
            Self::Plane(_) => PrimitiveKind::Plane,
            Self::Torus(_) => PrimitiveKind::Torus,
            Self::TorusKnot(_) => PrimitiveKind::TorusKnot,
            Self::Sphere(_) => PrimitiveKind::Sphere,
            Self::ExtrudedShape(_) => PrimitiveKind::ExtrudedShape,
            Self::Wireframe(_) => PrimitiveKind::Wireframe,
            Self::Text(_) => PrimitiveKind::Text,
        }
    }

    /// Checks every parameter without building anything.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self {
            Self::Box(p) => p.validate(),
            Self::CircleSector(p) => p.validate(),
            Self::Cone(p) => p.validate(),
            Self::Cylinder(p) => p.validate(),
            Self::Dodecahedron(p) => p.validate(PrimitiveKind::Dodecahedron),
            Self::Icosahedron(p) => p.validate(PrimitiveKind::Icosahedron),
            Self::Plane(p) => p.validate(),
            Self::Torus(p) => p.validate(),
            Self::TorusKnot(p) => p.validate(),
            Self::Sphere(p) => p.validate(),
            Self::ExtrudedShape(p) => p.validate(),
            Self::Wireframe(p) => p.validate(),
            Self::Text(p) => p.validate(),
        }
    }
}

/// Validates `params` and builds the geometry.
pub fn build(params: &PrimitiveParams) -> Result<Geometry, ConfigurationError> {
    params.validate()?;
    let geometry = match params {
        PrimitiveParams::Box(p) => shapes::box_geometry(p),
        PrimitiveParams::CircleSector(p) => shapes::circle_geometry(p),
        PrimitiveParams::Cone(p) => shapes::cone_geometry(p),
        PrimitiveParams::Cylinder(p) => shapes::cylinder_geometry(p, PrimitiveKind::Cylinder),
        PrimitiveParams::Dodecahedron(p) => polyhedron::dodecahedron(p),
        PrimitiveParams::Icosahedron(p) => polyhedron::icosahedron(p),
        PrimitiveParams::Plane(p) => shapes::plane_geometry(p),
        PrimitiveParams::Torus(p) => shapes::torus_geometry(p),
        PrimitiveParams::TorusKnot(p) => shapes::torus_knot_geometry(p),
        PrimitiveParams::Sphere(p) => shapes::sphere_geometry(p),
        PrimitiveParams::ExtrudedShape(p) => extrude::extrude_geometry(p)?,
        PrimitiveParams::Wireframe(p) => wireframe::wireframe_geometry(p)?,
        PrimitiveParams::Text(p) => font::text_geometry(p)?,
    };
    Ok(geometry)
}

/// Immutable mesh data shared between scene objects.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    kind: Option<PrimitiveKind>,
    topology: Topology,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    bounds: Aabb,
}

impl Geometry {
    pub fn new(
        kind: Option<PrimitiveKind>,
        topology: Topology,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
    ) -> Self {
        let bounds = Aabb::from_points(vertices.iter().map(Vertex::position)).unwrap_or(Aabb {
            min: Vec3::ZERO,
            max: Vec3::ZERO,
        });
        Self {
            kind,
            topology,
            vertices,
            indices,
            bounds,
        }
    }

    /// `None` for meshes that were loaded rather than generated.
    pub fn kind(&self) -> Option<PrimitiveKind> {
        self.kind
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn primitive_count(&self) -> usize {
        match self.topology {
            Topology::Triangles => self.indices.len() / 3,
            Topology::Lines => self.indices.len() / 2,
        }
    }

    /// Moves the mesh so its bounding-box center sits at the local origin and
    /// returns the translation that was applied.
    pub fn center(&mut self) -> Vec3 {
        let offset = -self.bounds.center();
        if offset == Vec3::ZERO {
            return offset;
        }
        for vertex in &mut self.vertices {
            vertex.position = (vertex.position() + offset).to_array();
        }
        self.bounds = Aabb {
            min: self.bounds.min + offset,
            max: self.bounds.max + offset,
        };
        offset
    }

    pub fn into_shared(self) -> Arc<Geometry> {
        Arc::new(self)
    }
}

/// Incremental mesh assembly used by the generators.
#[derive(Debug, Default)]
pub(crate) struct MeshBuilder {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl MeshBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Segment limits keep the vertex count inside `u32`.
    pub(crate) fn next_index(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub(crate) fn vertex(&mut self, position: Vec3, normal: Vec3) -> u32 {
        let index = self.next_index();
        self.vertices.push(Vertex::new(position, normal));
        index
    }

    pub(crate) fn triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Emits a triangle with its own vertices and a face normal.
    pub(crate) fn flat_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3) {
        let normal = (b - a).cross(c - a).normalize_or_zero();
        let base = self.vertex(a, normal);
        self.vertex(b, normal);
        self.vertex(c, normal);
        self.triangle(base, base + 1, base + 2);
    }

    pub(crate) fn build(self, kind: PrimitiveKind) -> Geometry {
        Geometry::new(Some(kind), Topology::Triangles, self.vertices, self.indices)
    }
}

pub(crate) fn require_positive(
    kind: PrimitiveKind,
    parameter: &'static str,
    value: f32,
) -> Result<(), ConfigurationError> {
    require_finite(kind, parameter, value)?;
    if value <= 0.0 {
        return Err(ConfigurationError::NonPositive {
            kind,
            parameter,
            value,
        });
    }
    Ok(())
}

pub(crate) fn require_non_negative(
    kind: PrimitiveKind,
    parameter: &'static str,
    value: f32,
) -> Result<(), ConfigurationError> {
    require_finite(kind, parameter, value)?;
    if value < 0.0 {
        return Err(ConfigurationError::Negative {
            kind,
            parameter,
            value,
        });
    }
    Ok(())
}

pub(crate) fn require_finite(
    kind: PrimitiveKind,
    parameter: &'static str,
    value: f32,
) -> Result<(), ConfigurationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigurationError::NotFinite { kind, parameter })
    }
}

/// Upper bound for any segment count. Keeps vertex counts well inside `u32`
/// indices.
pub const MAX_SEGMENTS: u32 = 1024;

pub(crate) fn require_segments(
    kind: PrimitiveKind,
    parameter: &'static str,
    value: u32,
    minimum: u32,
) -> Result<(), ConfigurationError> {
    if value < minimum {
        return Err(ConfigurationError::TooFewSegments {
            kind,
            parameter,
            minimum,
            value,
        });
    }
    require_at_most(kind, parameter, value, MAX_SEGMENTS)
}

pub(crate) fn require_at_most(
    kind: PrimitiveKind,
    parameter: &'static str,
    value: u32,
    maximum: u32,
) -> Result<(), ConfigurationError> {
    if value > maximum {
        return Err(ConfigurationError::TooManySegments {
            kind,
            parameter,
            maximum,
            value,
        });
    }
    Ok(())
}
