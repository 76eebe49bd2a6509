//! Typeface JSON fonts and extruded text.

use std::collections::HashMap;
use std::str::SplitWhitespace;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use glam::Vec2;
use serde::Deserialize;

use super::extrude::{extrude_as, Bevel, ExtrudeParams};
use super::path::{signed_area, Path, Shape};
use super::{
    require_finite, require_non_negative, require_positive, require_segments, Geometry,
    PrimitiveKind,
};
use crate::error::ConfigurationError;

#[derive(Debug, Clone, Copy, PartialEq)]
enum OutlineCommand {
    Move(Vec2),
    Line(Vec2),
    Quadratic { to: Vec2, control: Vec2 },
    Cubic { to: Vec2, control1: Vec2, control2: Vec2 },
}

#[derive(Debug, Clone, PartialEq)]
struct Glyph {
    advance: f32,
    outline: Vec<OutlineCommand>,
}

#[derive(Deserialize)]
struct RawGlyph {
    ha: f32,
    #[serde(default)]
    o: Option<String>,
}

#[derive(Deserialize)]
struct RawBoundingBox {
    #[serde(rename = "yMin")]
    y_min: f32,
    #[serde(rename = "yMax")]
    y_max: f32,
}

#[derive(Deserialize)]
struct RawFont {
    glyphs: HashMap<String, RawGlyph>,
    resolution: f32,
    #[serde(rename = "boundingBox")]
    bounding_box: RawBoundingBox,
    #[serde(rename = "underlineThickness", default)]
    underline_thickness: f32,
    #[serde(rename = "familyName", default)]
    family_name: String,
}

/// Glyph outlines in the typeface JSON layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    family_name: String,
    glyphs: HashMap<char, Glyph>,
    resolution: f32,
    line_height: f32,
}

impl Font {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_json_slice(json.as_bytes())
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let raw: RawFont = serde_json::from_slice(bytes).context("invalid typeface JSON")?;
        if !(raw.resolution.is_finite() && raw.resolution > 0.0) {
            bail!("font resolution must be positive, got {}", raw.resolution);
        }

        let mut glyphs = HashMap::with_capacity(raw.glyphs.len());
        for (key, glyph) in raw.glyphs {
            let mut chars = key.chars();
            let (Some(ch), None) = (chars.next(), chars.next()) else {
                log::debug!("skipping glyph entry {key:?}");
                continue;
            };
            let outline = match glyph.o.as_deref() {
                Some(text) => {
                    parse_outline(text).with_context(|| format!("glyph {key:?} outline"))?
                }
                None => Vec::new(),
            };
            glyphs.insert(
                ch,
                Glyph {
                    advance: glyph.ha,
                    outline,
                },
            );
        }

        let box_height = raw.bounding_box.y_max - raw.bounding_box.y_min;
        Ok(Self {
            family_name: raw.family_name,
            glyphs,
            resolution: raw.resolution,
            line_height: box_height + raw.underline_thickness,
        })
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    pub fn has_glyph(&self, ch: char) -> bool {
        self.glyphs.contains_key(&ch)
    }

    /// Lays `text` out left to right at `size` units per em. Newlines start a
    /// new line below; characters without a glyph use `?` when the font has one.
    pub fn shapes(&self, text: &str, size: f32) -> Vec<Shape> {
        let scale = size / self.resolution;
        let line_height = self.line_height * scale;
        let mut offset = Vec2::ZERO;
        let mut shapes = Vec::new();

        for ch in text.chars() {
            if ch == '\n' {
                offset = Vec2::new(0.0, offset.y - line_height);
                continue;
            }
            let Some(glyph) = self.glyphs.get(&ch).or_else(|| self.glyphs.get(&'?')) else {
                log::warn!("font {:?} has no glyph for {ch:?}", self.family_name);
                continue;
            };
            shapes.extend(glyph_shapes(glyph, scale, offset));
            offset.x += glyph.advance * scale;
        }
        shapes
    }
}

fn parse_outline(text: &str) -> Result<Vec<OutlineCommand>> {
    let mut tokens = text.split_whitespace();
    let mut commands = Vec::new();
    while let Some(action) = tokens.next() {
        let command = match action {
            "m" => OutlineCommand::Move(next_point(&mut tokens)?),
            "l" => OutlineCommand::Line(next_point(&mut tokens)?),
            "q" => OutlineCommand::Quadratic {
                to: next_point(&mut tokens)?,
                control: next_point(&mut tokens)?,
            },
            "b" => OutlineCommand::Cubic {
                to: next_point(&mut tokens)?,
                control1: next_point(&mut tokens)?,
                control2: next_point(&mut tokens)?,
            },
            "z" => continue,
            other => bail!("unknown outline command {other:?}"),
        };
        commands.push(command);
    }
    Ok(commands)
}

fn next_point(tokens: &mut SplitWhitespace<'_>) -> Result<Vec2> {
    let mut coordinate = || -> Result<f32> {
        let token = tokens
            .next()
            .ok_or_else(|| anyhow!("outline ends mid-command"))?;
        token
            .parse::<f32>()
            .map_err(|err| anyhow!("bad coordinate {token:?}: {err}"))
    };
    let x = coordinate()?;
    let y = coordinate()?;
    Ok(Vec2::new(x, y))
}

fn glyph_shapes(glyph: &Glyph, scale: f32, offset: Vec2) -> Vec<Shape> {
    let place = |p: Vec2| p * scale + offset;
    let mut paths: Vec<Path> = Vec::new();
    let mut current: Option<Path> = None;

    for command in &glyph.outline {
        match *command {
            OutlineCommand::Move(to) => {
                paths.extend(current.take());
                current = Some(Path::new(place(to)));
            }
            OutlineCommand::Line(to) => {
                current
                    .get_or_insert_with(|| Path::new(offset))
                    .line_to(place(to));
            }
            OutlineCommand::Quadratic { to, control } => {
                current
                    .get_or_insert_with(|| Path::new(offset))
                    .quadratic_to(place(control), place(to));
            }
            OutlineCommand::Cubic {
                to,
                control1,
                control2,
            } => {
                current
                    .get_or_insert_with(|| Path::new(offset))
                    .bezier_to(place(control1), place(control2), place(to));
            }
        }
    }
    paths.extend(current);

    let mut outlines: Vec<(Path, Vec<Vec2>, f32)> = paths
        .into_iter()
        .map(|path| {
            let points = path.points(4);
            let area = signed_area(&points);
            (path, points, area)
        })
        .filter(|(_, points, area)| points.len() >= 3 && *area != 0.0)
        .collect();
    let Some(dominant) = outlines
        .iter()
        .map(|(_, _, area)| *area)
        .max_by(|a, b| a.abs().total_cmp(&b.abs()))
    else {
        return Vec::new();
    };

    // Outlines wound like the largest one are solids, the rest are holes.
    let (solids, holes): (Vec<_>, Vec<_>) = outlines
        .drain(..)
        .partition(|(_, _, area)| area.signum() == dominant.signum());

    let mut shapes: Vec<(Shape, Vec<Vec2>)> = solids
        .into_iter()
        .map(|(path, points, _)| (Shape::new(path), points))
        .collect();
    for (hole, points, _) in holes {
        let probe = points[0];
        let owner = shapes
            .iter()
            .position(|(_, outline)| point_in_polygon(outline, probe))
            .unwrap_or(0);
        if let Some((shape, _)) = shapes.get_mut(owner) {
            shape.holes.push(hole);
        }
    }
    shapes.into_iter().map(|(shape, _)| shape).collect()
}

fn point_in_polygon(polygon: &[Vec2], p: Vec2) -> bool {
    let mut inside = false;
    let mut j = polygon.len().wrapping_sub(1);
    for (i, &a) in polygon.iter().enumerate() {
        let b = polygon[j];
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Sizing and extrusion of text geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub depth: f32,
    pub curve_segments: u32,
    pub bevel: Option<Bevel>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            size: 3.0,
            depth: 0.2,
            curve_segments: 12,
            bevel: Some(Bevel {
                thickness: 0.15,
                size: 0.3,
                offset: 0.0,
                segments: 5,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextParams {
    pub font: Arc<Font>,
    pub text: String,
    pub style: TextStyle,
}

impl TextParams {
    pub fn new(font: Arc<Font>, text: impl Into<String>) -> Self {
        Self {
            font,
            text: text.into(),
            style: TextStyle::default(),
        }
    }

    pub(super) fn validate(&self) -> Result<(), ConfigurationError> {
        let kind = PrimitiveKind::Text;
        if self.text.trim().is_empty() {
            return Err(ConfigurationError::EmptyText(self.text.clone()));
        }
        require_positive(kind, "size", self.style.size)?;
        require_positive(kind, "depth", self.style.depth)?;
        require_segments(kind, "curve_segments", self.style.curve_segments, 1)?;
        if let Some(bevel) = &self.style.bevel {
            require_non_negative(kind, "bevel_thickness", bevel.thickness)?;
            require_non_negative(kind, "bevel_size", bevel.size)?;
            require_finite(kind, "bevel_offset", bevel.offset)?;
            require_segments(kind, "bevel_segments", bevel.segments, 1)?;
        }
        Ok(())
    }
}

pub(super) fn text_geometry(params: &TextParams) -> Result<Geometry, ConfigurationError> {
    let shapes = params.font.shapes(&params.text, params.style.size);
    if shapes.is_empty() {
        return Err(ConfigurationError::EmptyText(params.text.clone()));
    }
    let extrude = ExtrudeParams {
        shapes,
        depth: params.style.depth,
        steps: 1,
        curve_segments: params.style.curve_segments,
        bevel: params.style.bevel,
    };
    extrude_as(&extrude, PrimitiveKind::Text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{build, PrimitiveParams};
    use approx::assert_abs_diff_eq;

    const RING_FONT: &str = r#"{
        "familyName": "Ring",
        "resolution": 100,
        "underlineThickness": 10,
        "boundingBox": { "xMin": 0, "xMax": 120, "yMin": -20, "yMax": 100 },
        "glyphs": {
            "o": { "ha": 120, "o": "m 0 0 l 100 0 l 100 100 l 0 100 m 25 25 l 25 75 l 75 75 l 75 25" },
            "?": { "ha": 50, "o": "m 0 0 l 40 0 q 40 40 40 0" },
            " ": { "ha": 60 }
        }
    }"#;

    fn ring_font() -> Arc<Font> {
        Arc::new(Font::from_json_str(RING_FONT).unwrap())
    }

    #[test]
    fn glyph_with_inner_loop_becomes_shape_with_hole() {
        let shapes = ring_font().shapes("oo", 1.0);
        assert_eq!(shapes.len(), 2);
        assert!(shapes.iter().all(|shape| shape.holes.len() == 1));
        let second = shapes[1].outline.points(1);
        assert_abs_diff_eq!(second[0].x, 1.2, epsilon = 1e-6);
    }

    #[test]
    fn newline_moves_down_one_line() {
        let shapes = ring_font().shapes("o\no", 1.0);
        let second = shapes[1].outline.points(1);
        assert_abs_diff_eq!(second[0].x, 0.0);
        assert_abs_diff_eq!(second[0].y, -1.3, epsilon = 1e-6);
    }

    #[test]
    fn missing_glyph_falls_back_to_question_mark() {
        let font = ring_font();
        assert!(!font.has_glyph('x'));
        assert_eq!(font.shapes("x", 1.0).len(), 1);
    }

    #[test]
    fn text_without_outlines_is_rejected() {
        let mut params = TextParams::new(ring_font(), "   ");
        assert!(matches!(
            build(&PrimitiveParams::Text(params.clone())),
            Err(ConfigurationError::EmptyText(_))
        ));
        params.text = "o".into();
        let geometry = build(&PrimitiveParams::Text(params)).unwrap();
        assert_eq!(geometry.kind(), Some(PrimitiveKind::Text));
        assert!(geometry.primitive_count() > 0);
    }

    #[test]
    fn malformed_outline_reports_glyph() {
        let json = RING_FONT.replace("m 0 0 l 40 0", "m 0 0 k 40 0");
        let err = Font::from_json_str(&json).unwrap_err();
        assert!(format!("{err:#}").contains("unknown outline command"));
    }
}
