//! 2D outlines and their triangulation.

use glam::Vec2;

const EPSILON: f32 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    Line(Vec2),
    Quadratic { control: Vec2, to: Vec2 },
    Cubic { control1: Vec2, control2: Vec2, to: Vec2 },
}

impl PathSegment {
    fn end(&self) -> Vec2 {
        match *self {
            Self::Line(to) | Self::Quadratic { to, .. } | Self::Cubic { to, .. } => to,
        }
    }
}

/// Closed outline made of straight and curved segments. The last point is
/// implicitly joined back to the start.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    start: Vec2,
    segments: Vec<PathSegment>,
}

impl Path {
    pub fn new(start: Vec2) -> Self {
        Self {
            start,
            segments: Vec::new(),
        }
    }

    /// Polygon through `points`. An empty slice yields an empty outline at the origin.
    pub fn from_points(points: &[Vec2]) -> Self {
        let mut path = Self::new(points.first().copied().unwrap_or(Vec2::ZERO));
        for &point in points.iter().skip(1) {
            path.line_to(point);
        }
        path
    }

    pub fn line_to(&mut self, to: Vec2) -> &mut Self {
        self.segments.push(PathSegment::Line(to));
        self
    }

    pub fn quadratic_to(&mut self, control: Vec2, to: Vec2) -> &mut Self {
        self.segments.push(PathSegment::Quadratic { control, to });
        self
    }

    pub fn bezier_to(&mut self, control1: Vec2, control2: Vec2, to: Vec2) -> &mut Self {
        self.segments.push(PathSegment::Cubic {
            control1,
            control2,
            to,
        });
        self
    }

    pub fn current_point(&self) -> Vec2 {
        self.segments.last().map_or(self.start, PathSegment::end)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Flattens the outline, sampling each curve with `divisions` steps.
    /// Repeated points and the closing duplicate are dropped.
    pub fn points(&self, divisions: u32) -> Vec<Vec2> {
        let divisions = divisions.max(1);
        let mut points = vec![self.start];
        let mut from = self.start;
        for segment in &self.segments {
            match *segment {
                PathSegment::Line(to) => push_distinct(&mut points, to),
                PathSegment::Quadratic { control, to } => {
                    for step in 1..=divisions {
                        let t = step as f32 / divisions as f32;
                        let s = 1.0 - t;
                        let p = from * (s * s) + control * (2.0 * s * t) + to * (t * t);
                        push_distinct(&mut points, p);
                    }
                }
                PathSegment::Cubic {
                    control1,
                    control2,
                    to,
                } => {
                    for step in 1..=divisions {
                        let t = step as f32 / divisions as f32;
                        let s = 1.0 - t;
                        let p = from * (s * s * s)
                            + control1 * (3.0 * s * s * t)
                            + control2 * (3.0 * s * t * t)
                            + to * (t * t * t);
                        push_distinct(&mut points, p);
                    }
                }
            }
            from = segment.end();
        }
        if points.len() > 1 && points[0].distance_squared(points[points.len() - 1]) <= EPSILON {
            points.pop();
        }
        points
    }
}

fn push_distinct(points: &mut Vec<Vec2>, point: Vec2) {
    if points
        .last()
        .map_or(true, |last| last.distance_squared(point) > EPSILON)
    {
        points.push(point);
    }
}

/// Outline with optional holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub outline: Path,
    pub holes: Vec<Path>,
}

/// Flattened shape. The contour winds counter-clockwise and every hole clockwise.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapePoints {
    pub contour: Vec<Vec2>,
    pub holes: Vec<Vec<Vec2>>,
}

impl Shape {
    pub fn new(outline: Path) -> Self {
        Self {
            outline,
            holes: Vec::new(),
        }
    }

    pub fn from_points(points: &[Vec2]) -> Self {
        Self::new(Path::from_points(points))
    }

    pub fn with_hole(mut self, hole: Path) -> Self {
        self.holes.push(hole);
        self
    }

    pub fn extract_points(&self, divisions: u32) -> ShapePoints {
        let mut contour = self.outline.points(divisions);
        if signed_area(&contour) < 0.0 {
            contour.reverse();
        }
        let holes = self
            .holes
            .iter()
            .map(|hole| {
                let mut points = hole.points(divisions);
                if signed_area(&points) > 0.0 {
                    points.reverse();
                }
                points
            })
            .collect();
        ShapePoints { contour, holes }
    }
}

/// Shoelace area. Positive for counter-clockwise polygons.
pub fn signed_area(points: &[Vec2]) -> f32 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f32 = (0..n)
        .map(|i| points[i].perp_dot(points[(i + 1) % n]))
        .sum();
    twice * 0.5
}

/// Triangulates a polygon with holes by ear clipping.
///
/// Indices refer to the concatenation of `contour` followed by every hole in
/// order. Triangles wind counter-clockwise.
pub fn triangulate(contour: &[Vec2], holes: &[Vec<Vec2>]) -> Vec<[usize; 3]> {
    if contour.len() < 3 {
        return Vec::new();
    }

    let mut points = contour.to_vec();
    let mut ring: Vec<usize> = (0..contour.len()).collect();
    if signed_area(contour) < 0.0 {
        ring.reverse();
    }

    let mut hole_rings = Vec::with_capacity(holes.len());
    for hole in holes.iter().filter(|hole| hole.len() >= 3) {
        let start = points.len();
        points.extend_from_slice(hole);
        let mut hole_ring: Vec<usize> = (start..points.len()).collect();
        if signed_area(hole) > 0.0 {
            hole_ring.reverse();
        }
        hole_rings.push(hole_ring);
    }

    // Bridging from the right keeps later bridges clear of earlier ones.
    hole_rings.sort_by(|a, b| max_x(&points, b).total_cmp(&max_x(&points, a)));
    for (index, hole) in hole_rings.iter().enumerate() {
        bridge_hole(&points, &mut ring, hole, &hole_rings[index + 1..]);
    }

    ear_clip(&points, ring)
}

fn max_x(points: &[Vec2], ring: &[usize]) -> f32 {
    ring.iter()
        .map(|&i| points[i].x)
        .fold(f32::NEG_INFINITY, f32::max)
}

fn bridge_hole(points: &[Vec2], ring: &mut Vec<usize>, hole: &[usize], pending: &[Vec<usize>]) {
    let Some(m) = (0..hole.len()).max_by(|&a, &b| points[hole[a]].x.total_cmp(&points[hole[b]].x))
    else {
        return;
    };
    let hole_point = points[hole[m]];

    let mut candidates: Vec<usize> = (0..ring.len()).collect();
    candidates.sort_by(|&a, &b| {
        let da = points[ring[a]].distance_squared(hole_point);
        let db = points[ring[b]].distance_squared(hole_point);
        da.total_cmp(&db)
    });

    let visible = |position: usize| {
        let target = points[ring[position]];
        let blocked = edges(ring)
            .chain(edges(hole))
            .chain(pending.iter().flat_map(|p| edges(p)))
            .any(|(a, b)| {
                let (a, b) = (points[a], points[b]);
                segments_cross(hole_point, target, a, b)
            });
        if blocked {
            return false;
        }
        let midpoint = (hole_point + target) * 0.5;
        contains(points, ring, midpoint)
            && !contains(points, hole, midpoint)
            && pending.iter().all(|p| !contains(points, p, midpoint))
    };

    let position = match candidates.iter().copied().find(|&c| visible(c)) {
        Some(position) => position,
        None => {
            log::debug!("no clear bridge for hole at {hole_point:?}, using nearest vertex");
            candidates[0]
        }
    };

    let anchor = ring[position];
    let mut spliced = Vec::with_capacity(ring.len() + hole.len() + 2);
    spliced.extend_from_slice(&ring[..=position]);
    spliced.extend((0..=hole.len()).map(|k| hole[(m + k) % hole.len()]));
    spliced.push(anchor);
    spliced.extend_from_slice(&ring[position + 1..]);
    *ring = spliced;
}

fn edges(ring: &[usize]) -> impl Iterator<Item = (usize, usize)> + '_ {
    (0..ring.len()).map(move |i| (ring[i], ring[(i + 1) % ring.len()]))
}

fn orient(o: Vec2, a: Vec2, b: Vec2) -> f32 {
    (a - o).perp_dot(b - o)
}

/// Proper crossing only; touching endpoints do not count.
fn segments_cross(a: Vec2, b: Vec2, c: Vec2, d: Vec2) -> bool {
    let d1 = orient(c, d, a);
    let d2 = orient(c, d, b);
    let d3 = orient(a, b, c);
    let d4 = orient(a, b, d);
    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

/// Even-odd point in polygon test.
fn contains(points: &[Vec2], ring: &[usize], p: Vec2) -> bool {
    let mut inside = false;
    let mut j = ring.len().wrapping_sub(1);
    for i in 0..ring.len() {
        let a = points[ring[i]];
        let b = points[ring[j]];
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn in_triangle(a: Vec2, b: Vec2, c: Vec2, p: Vec2) -> bool {
    orient(a, b, p) >= 0.0 && orient(b, c, p) >= 0.0 && orient(c, a, p) >= 0.0
}

fn ear_clip(points: &[Vec2], mut ring: Vec<usize>) -> Vec<[usize; 3]> {
    let mut triangles = Vec::with_capacity(ring.len().saturating_sub(2));
    let mut i = 0;
    let mut stalled = 0;

    while ring.len() > 3 {
        let n = ring.len();
        let (prev, cur, next) = (ring[(i + n - 1) % n], ring[i], ring[(i + 1) % n]);
        let (a, b, c) = (points[prev], points[cur], points[next]);
        let turn = orient(a, b, c);

        let ear = turn > EPSILON
            && !ring.iter().any(|&k| {
                let p = points[k];
                p != a && p != b && p != c && in_triangle(a, b, c, p)
            });

        if turn.abs() <= EPSILON || ear || stalled > n {
            if turn > EPSILON {
                triangles.push([prev, cur, next]);
            }
            ring.remove(i);
            if i >= ring.len() {
                i = 0;
            }
            stalled = 0;
        } else {
            i = (i + 1) % n;
            stalled += 1;
        }
    }

    if let [a, b, c] = ring[..] {
        if orient(points[a], points[b], points[c]) > EPSILON {
            triangles.push([a, b, c]);
        }
    }
    triangles
}
