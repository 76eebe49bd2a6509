use glam::{Mat4, Vec3, Vec4};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::DrawBackend;
use crate::camera::Camera;
use crate::error::DrawError;
use crate::geometry::{Geometry, Topology};
use crate::scene::{SceneGraph, SceneObject};

const DEFAULT_BACKGROUND: &str = "#06060a";

/// Draws every object as a projected wireframe on a 2D canvas.
pub struct CanvasBackend {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    show_stats: bool,
}

impl CanvasBackend {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, DrawError> {
        let context = canvas
            .get_context("2d")
            .map_err(|err| DrawError::Backend(format!("failed to query canvas context: {err:?}")))?
            .ok_or(DrawError::SurfaceUnavailable)?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| DrawError::Backend("failed to cast canvas context".into()))?;
        Ok(Self {
            canvas,
            context,
            show_stats: false,
        })
    }

    /// Prints the object count in the corner of every frame.
    pub fn with_stats(mut self, show_stats: bool) -> Self {
        self.show_stats = show_stats;
        self
    }

    fn clear(&self, background: Option<Vec3>, width: f64, height: f64) {
        let fill = background.map_or_else(|| DEFAULT_BACKGROUND.to_string(), css_color);
        self.context.set_fill_style(&fill.into());
        self.context.fill_rect(0.0, 0.0, width, height);
    }

    fn stroke_object(&self, object: &SceneObject, view_projection: Mat4, width: f64, height: f64) {
        let mvp = view_projection * object.model_matrix();
        let projected: Vec<Option<(f64, f64)>> = object
            .geometry
            .vertices()
            .iter()
            .map(|vertex| to_screen(mvp, vertex.position(), width, height))
            .collect();

        self.context.set_stroke_style(&css_color(object.material.color).into());
        self.context.begin_path();
        for (a, b) in edges(&object.geometry) {
            if let (Some(Some(from)), Some(Some(to))) =
                (projected.get(a as usize), projected.get(b as usize))
            {
                self.context.move_to(from.0, from.1);
                self.context.line_to(to.0, to.1);
            }
        }
        self.context.stroke();
    }
}

impl DrawBackend for CanvasBackend {
    fn draw(&mut self, scene: &SceneGraph, camera: &Camera) -> Result<(), DrawError> {
        let width = self.canvas.width() as f64;
        let height = self.canvas.height() as f64;
        if width == 0.0 || height == 0.0 {
            return Ok(());
        }

        self.clear(scene.background(), width, height);
        let view_projection = camera.view_projection();
        scene.for_each_object(|_, object| {
            self.stroke_object(object, view_projection, width, height);
        });

        if self.show_stats {
            self.context.set_fill_style(&"gray".into());
            self.context
                .fill_text(&format!("Objects: {}", scene.len()), 10.0, 24.0)
                .map_err(|err: JsValue| DrawError::Backend(format!("{err:?}")))?;
        }
        Ok(())
    }
}

fn edges(geometry: &Geometry) -> Vec<(u32, u32)> {
    let indices = geometry.indices();
    match geometry.topology() {
        Topology::Lines => indices.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect(),
        Topology::Triangles => indices
            .chunks_exact(3)
            .flat_map(|tri| [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])])
            .collect(),
    }
}

/// Clip space to canvas pixels. `None` for points behind the camera.
fn to_screen(mvp: Mat4, position: Vec3, width: f64, height: f64) -> Option<(f64, f64)> {
    let clip = mvp * Vec4::new(position.x, position.y, position.z, 1.0);
    if clip.w <= f32::EPSILON {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    Some((
        (ndc.x as f64 * 0.5 + 0.5) * width,
        (0.5 - ndc.y as f64 * 0.5) * height,
    ))
}

fn css_color(color: Vec3) -> String {
    let [r, g, b] = (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round().to_array();
    format!("rgb({}, {}, {})", r as u8, g as u8, b as u8)
}
