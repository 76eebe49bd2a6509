use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{require_at_most, require_positive, Geometry, MeshBuilder, PrimitiveKind};
use crate::error::ConfigurationError;

const PHI: f32 = 1.618_034;
/// Each face splits into `(detail + 1)^2` triangles.
const MAX_DETAIL: u32 = 64;

/// Regular polyhedron projected onto a sphere of `radius`. A `detail` above
/// zero subdivides every face and smooths the normals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolyhedronParams {
    pub radius: f32,
    pub detail: u32,
}

impl PolyhedronParams {
    pub fn new(radius: f32) -> Self {
        Self { radius, detail: 0 }
    }

    pub(super) fn validate(&self, kind: PrimitiveKind) -> Result<(), ConfigurationError> {
        require_positive(kind, "radius", self.radius)?;
        require_at_most(kind, "detail", self.detail, MAX_DETAIL)
    }
}

impl Default for PolyhedronParams {
    fn default() -> Self {
        Self::new(1.0)
    }
}

pub(super) fn icosahedron(params: &PolyhedronParams) -> Geometry {
    let t = PHI;
    #[rustfmt::skip]
    let vertices = [
        [-1.0, t, 0.0], [1.0, t, 0.0], [-1.0, -t, 0.0], [1.0, -t, 0.0],
        [0.0, -1.0, t], [0.0, 1.0, t], [0.0, -1.0, -t], [0.0, 1.0, -t],
        [t, 0.0, -1.0], [t, 0.0, 1.0], [-t, 0.0, -1.0], [-t, 0.0, 1.0],
    ];
    #[rustfmt::skip]
    let faces = [
        [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
        [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
        [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
        [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
    ];
    polyhedron(&vertices, &faces, params, PrimitiveKind::Icosahedron)
}

pub(super) fn dodecahedron(params: &PolyhedronParams) -> Geometry {
    let t = PHI;
    let r = 1.0 / PHI;
    #[rustfmt::skip]
    let vertices = [
        [-1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, -1.0], [-1.0, 1.0, 1.0],
        [1.0, -1.0, -1.0], [1.0, -1.0, 1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0],
        [0.0, -r, -t], [0.0, -r, t], [0.0, r, -t], [0.0, r, t],
        [-r, -t, 0.0], [-r, t, 0.0], [r, -t, 0.0], [r, t, 0.0],
        [-t, 0.0, -r], [t, 0.0, -r], [-t, 0.0, r], [t, 0.0, r],
    ];
    #[rustfmt::skip]
    let faces = [
        [3, 11, 7], [3, 7, 15], [3, 15, 13],
        [7, 19, 17], [7, 17, 6], [7, 6, 15],
        [17, 4, 8], [17, 8, 10], [17, 10, 6],
        [8, 0, 16], [8, 16, 2], [8, 2, 10],
        [0, 12, 1], [0, 1, 18], [0, 18, 16],
        [6, 10, 2], [6, 2, 13], [6, 13, 15],
        [2, 16, 18], [2, 18, 3], [2, 3, 13],
        [18, 1, 9], [18, 9, 11], [18, 11, 3],
        [4, 14, 12], [4, 12, 0], [4, 0, 8],
        [11, 9, 5], [11, 5, 19], [11, 19, 7],
        [19, 5, 14], [19, 14, 4], [19, 4, 17],
        [1, 12, 14], [1, 14, 5], [1, 5, 9],
    ];
    polyhedron(&vertices, &faces, params, PrimitiveKind::Dodecahedron)
}

fn polyhedron(
    vertices: &[[f32; 3]],
    faces: &[[usize; 3]],
    params: &PolyhedronParams,
    kind: PrimitiveKind,
) -> Geometry {
    let mut mesh = MeshBuilder::new();
    let project = |p: Vec3| p.normalize() * params.radius;

    for face in faces {
        let [a, b, c] = face.map(|i| Vec3::from_array(vertices[i]));
        for [p, q, s] in subdivide(a, b, c, params.detail) {
            let (p, q, s) = (project(p), project(q), project(s));
            if params.detail == 0 {
                mesh.flat_triangle(p, q, s);
            } else {
                let i = mesh.vertex(p, p.normalize());
                mesh.vertex(q, q.normalize());
                mesh.vertex(s, s.normalize());
                mesh.triangle(i, i + 1, i + 2);
            }
        }
    }

    mesh.build(kind)
}

/// Splits triangle `abc` into `(detail + 1)^2` triangles with the same winding.
fn subdivide(a: Vec3, b: Vec3, c: Vec3, detail: u32) -> Vec<[Vec3; 3]> {
    let cols = detail as usize + 1;
    let mut grid: Vec<Vec<Vec3>> = Vec::with_capacity(cols + 1);
    for i in 0..=cols {
        let t = i as f32 / cols as f32;
        let aj = a.lerp(c, t);
        let bj = b.lerp(c, t);
        let rows = cols - i;
        let row = (0..=rows)
            .map(|j| {
                if rows == 0 {
                    aj
                } else {
                    aj.lerp(bj, j as f32 / rows as f32)
                }
            })
            .collect();
        grid.push(row);
    }

    let mut triangles = Vec::with_capacity(cols * cols);
    for i in 0..cols {
        for j in 0..2 * (cols - i) - 1 {
            let k = j / 2;
            if j % 2 == 0 {
                triangles.push([grid[i][k + 1], grid[i + 1][k], grid[i][k]]);
            } else {
                triangles.push([grid[i][k + 1], grid[i + 1][k + 1], grid[i + 1][k]]);
            }
        }
    }
    triangles
}
