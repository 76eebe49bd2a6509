use std::collections::HashMap;

use anyhow::{anyhow, bail, Context, Result};
use glam::Vec3;

use crate::geometry::{Geometry, Topology, Vertex};

/// Parses Wavefront OBJ text into an indexed triangle mesh.
///
/// Polygons are fanned into triangles. Texture coordinates are ignored and
/// vertices without a normal get a smoothed one from the adjacent faces.
pub fn parse_obj(data: &str) -> Result<Geometry> {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut triangles: Vec<[Corner; 3]> = Vec::new();

    for (line_no, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };
        let line_no = line_no + 1;
        match tag {
            "v" => positions
                .push(parse_vec3(parts).with_context(|| format!("bad vertex on line {line_no}"))?),
            "vn" => normals
                .push(parse_vec3(parts).with_context(|| format!("bad normal on line {line_no}"))?),
            "f" => {
                let polygon = parse_face(parts, positions.len(), normals.len())
                    .with_context(|| format!("bad face on line {line_no}"))?;
                triangles.extend(
                    (1..polygon.len() - 1).map(|i| [polygon[0], polygon[i], polygon[i + 1]]),
                );
            }
            _ => {}
        }
    }

    if positions.is_empty() {
        bail!("OBJ data defines no vertices");
    }
    if triangles.is_empty() {
        bail!("OBJ data defines no faces");
    }

    let (mut vertices, indices, missing_normals) = weld(&positions, &normals, &triangles);
    if missing_normals {
        smooth_normals(&mut vertices, &indices);
    }
    Ok(Geometry::new(None, Topology::Triangles, vertices, indices))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Corner {
    position: usize,
    normal: Option<usize>,
}

fn parse_vec3<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec3> {
    let mut component = || -> Result<f32> {
        let token = parts
            .next()
            .ok_or_else(|| anyhow!("missing vector component"))?;
        token
            .parse::<f32>()
            .with_context(|| format!("invalid number {token:?}"))
    };
    Ok(Vec3::new(component()?, component()?, component()?))
}

/// Resolves corners against the vertices and normals defined so far.
fn parse_face<'a>(
    parts: impl Iterator<Item = &'a str>,
    position_count: usize,
    normal_count: usize,
) -> Result<Vec<Corner>> {
    let mut corners = Vec::new();
    for part in parts {
        let mut fields = part.split('/');
        let position = fields
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("missing vertex index in {part:?}"))?
            .parse::<i64>()
            .with_context(|| format!("invalid vertex index in {part:?}"))?;
        let position = resolve(position, position_count)
            .ok_or_else(|| anyhow!("vertex index {position} out of range"))?;
        let _texture = fields.next();
        let normal = match fields.next().filter(|s| !s.is_empty()) {
            Some(text) => {
                let index = text
                    .parse::<i64>()
                    .with_context(|| format!("invalid normal index in {part:?}"))?;
                Some(
                    resolve(index, normal_count)
                        .ok_or_else(|| anyhow!("normal index {index} out of range"))?,
                )
            }
            None => None,
        };
        corners.push(Corner { position, normal });
    }
    if corners.len() < 3 {
        bail!("faces need at least 3 vertices, got {}", corners.len());
    }
    Ok(corners)
}

/// One-based indices count from the start, negative ones back from `len`.
fn resolve(index: i64, len: usize) -> Option<usize> {
    if index > 0 {
        let zero_based = (index - 1) as usize;
        (zero_based < len).then_some(zero_based)
    } else if index < 0 {
        let back = index.unsigned_abs() as usize;
        (back <= len).then(|| len - back)
    } else {
        None
    }
}

fn weld(
    positions: &[Vec3],
    normals: &[Vec3],
    triangles: &[[Corner; 3]],
) -> (Vec<Vertex>, Vec<u32>, bool) {
    let mut lookup: HashMap<(usize, Option<usize>), u32> = HashMap::new();
    let mut vertices = Vec::new();
    let mut indices = Vec::with_capacity(triangles.len() * 3);
    let mut missing_normals = false;

    for &Corner { position, normal } in triangles.iter().flatten() {
        missing_normals |= normal.is_none();
        let index = *lookup.entry((position, normal)).or_insert_with(|| {
            let n = normal.map_or(Vec3::ZERO, |i| normals[i]);
            vertices.push(Vertex::new(positions[position], n));
            (vertices.len() - 1) as u32
        });
        indices.push(index);
    }

    (vertices, indices, missing_normals)
}

fn smooth_normals(vertices: &mut [Vertex], indices: &[u32]) {
    let mut accum = vec![Vec3::ZERO; vertices.len()];
    for triangle in indices.chunks_exact(3) {
        let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
        let face = (vertices[b].position() - vertices[a].position())
            .cross(vertices[c].position() - vertices[a].position());
        if face.length_squared() > f32::EPSILON {
            let face = face.normalize();
            accum[a] += face;
            accum[b] += face;
            accum[c] += face;
        }
    }
    for (vertex, normal) in vertices.iter_mut().zip(accum) {
        if vertex.normal == [0.0; 3] {
            vertex.normal = normal.normalize_or_zero().to_array();
        }
    }
}
