#![cfg(target_arch = "wasm32")]

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlCanvasElement, Window};

use crate::assets::{AssetBridge, AssetRequest, FetchLoader};
use crate::config::Preset;
use crate::demo;
use crate::engine::Engine;
use crate::error::SchedulerError;
use crate::factory::GeometryFactory;
use crate::logging::{init_logging, LoggingConfig};
use crate::material::ColorPolicy;
use crate::refresh::{FrameCallback, FrameRequestId, RefreshSignal};
use crate::render::CanvasBackend;
use crate::scene::{SceneHandle, SceneManifest};
use crate::surface::{Surface, SurfaceSize};

/// Canvas element as a surface: the layout size is `clientWidth` and
/// `clientHeight`, the backing store is `width` and `height`.
#[derive(Debug, Clone)]
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self { canvas }
    }
}

impl Surface for CanvasSurface {
    fn logical_size(&self) -> SurfaceSize {
        SurfaceSize::new(
            self.canvas.client_width().max(0) as u32,
            self.canvas.client_height().max(0) as u32,
        )
    }

    fn backing_size(&self) -> SurfaceSize {
        SurfaceSize::new(self.canvas.width(), self.canvas.height())
    }

    fn set_backing_size(&self, size: SurfaceSize) {
        self.canvas.set_width(size.width);
        self.canvas.set_height(size.height);
    }
}

/// `requestAnimationFrame` as a refresh signal.
pub struct AnimationFrameRefresh {
    window: Window,
}

impl AnimationFrameRefresh {
    pub fn new() -> Result<Self, SchedulerError> {
        let window = web_sys::window()
            .ok_or_else(|| SchedulerError::RefreshUnavailable("window not available".into()))?;
        Ok(Self { window })
    }
}

impl RefreshSignal for AnimationFrameRefresh {
    fn request_frame(&self, callback: FrameCallback) -> Result<FrameRequestId, SchedulerError> {
        let function = Closure::once_into_js(move |timestamp: f64| callback(timestamp));
        let handle = self
            .window
            .request_animation_frame(function.unchecked_ref())
            .map_err(|err| SchedulerError::RefreshUnavailable(format!("{err:?}")))?;
        Ok(FrameRequestId(handle as u32 as u64))
    }

    fn cancel_frame(&self, id: FrameRequestId) {
        if let Err(err) = self.window.cancel_animation_frame(id.0 as u32 as i32) {
            log::warn!("cancelAnimationFrame failed: {err:?}");
        }
    }
}

#[wasm_bindgen(start)]
pub fn bootstrap() {
    init_logging(LoggingConfig::default());
}

/// A running scene bound to one canvas.
#[wasm_bindgen]
pub struct WebScene {
    engine: Engine,
    scene: SceneHandle,
    assets: AssetBridge,
    factory: GeometryFactory,
}

/// Builds the preset scene (`"cubes"` or `"primitives"`, the default) and
/// starts animating it on `canvas`. `show_stats` prints the object count in
/// the corner of every frame.
#[wasm_bindgen]
pub fn create_scene(
    canvas: HtmlCanvasElement,
    preset: Option<String>,
    show_stats: Option<bool>,
) -> Result<WebScene, JsValue> {
    let preset = match preset {
        Some(name) => name.parse::<Preset>().map_err(to_js)?,
        None => Preset::default(),
    };
    let config = crate::config::EngineConfig::preset(preset);
    let mut factory = GeometryFactory::from_config(&config);
    let scene = demo::scene_for(preset, &mut factory).map_err(to_js)?;
    WebScene::start(
        canvas,
        SceneHandle::new(scene),
        factory,
        "",
        show_stats.unwrap_or(false),
    )
}

#[wasm_bindgen]
impl WebScene {
    /// Builds a scene from manifest XML, starts it and begins loading its
    /// assets relative to `asset_base`.
    #[wasm_bindgen(js_name = fromManifest)]
    pub fn from_manifest(
        canvas: HtmlCanvasElement,
        xml: &str,
        asset_base: &str,
        show_stats: Option<bool>,
    ) -> Result<WebScene, JsValue> {
        let manifest = SceneManifest::from_xml(xml).map_err(to_js)?;
        let mut factory = GeometryFactory::from_config(&manifest.config);
        let scene = manifest.instantiate(&mut factory).map_err(to_js)?;
        let mut web = Self::start(
            canvas,
            SceneHandle::new(scene),
            factory,
            asset_base,
            show_stats.unwrap_or(false),
        )?;
        for asset in &manifest.assets {
            web.spawn(asset.request.clone(), asset.grid.x, asset.grid.y, asset.color)?;
        }
        Ok(web)
    }

    /// Loads an OBJ mesh and places it at the grid cell once it arrives.
    #[wasm_bindgen(js_name = loadMesh)]
    pub fn load_mesh(&mut self, url: &str, grid_x: f32, grid_y: f32) -> Result<(), JsValue> {
        self.spawn(AssetRequest::mesh(url), grid_x, grid_y, ColorPolicy::default())
    }

    /// Loads a typeface font and places `text` at the grid cell.
    #[wasm_bindgen(js_name = loadText)]
    pub fn load_text(
        &mut self,
        font_url: &str,
        text: &str,
        grid_x: f32,
        grid_y: f32,
    ) -> Result<(), JsValue> {
        self.spawn(AssetRequest::text(font_url, text), grid_x, grid_y, ColorPolicy::default())
    }

    #[wasm_bindgen(js_name = objectCount)]
    pub fn object_count(&self) -> usize {
        self.scene.len()
    }

    #[wasm_bindgen(js_name = framesDrawn)]
    pub fn frames_drawn(&self) -> f64 {
        self.engine.frames_drawn() as f64
    }

    /// Stops the animation loop. Loads already in flight still land in the
    /// scene.
    pub fn dispose(&self) {
        self.engine.dispose();
    }
}

impl WebScene {
    fn start(
        canvas: HtmlCanvasElement,
        scene: SceneHandle,
        factory: GeometryFactory,
        asset_base: &str,
        show_stats: bool,
    ) -> Result<WebScene, JsValue> {
        let backend = CanvasBackend::new(canvas.clone())
            .map_err(to_js)?
            .with_stats(show_stats);
        let refresh = AnimationFrameRefresh::new().map_err(to_js)?;
        let engine = Engine::new(scene.clone(), backend, refresh);
        engine.start(CanvasSurface::new(canvas)).map_err(to_js)?;
        let assets = AssetBridge::new(FetchLoader::new(asset_base), factory.spread());
        Ok(WebScene {
            engine,
            scene,
            assets,
            factory,
        })
    }

    fn spawn(
        &mut self,
        request: AssetRequest,
        grid_x: f32,
        grid_y: f32,
        color: ColorPolicy,
    ) -> Result<(), JsValue> {
        let material = self.factory.create_material(color).map_err(to_js)?;
        let assets = self.assets.clone();
        let scene = self.scene.clone();
        spawn_local(async move {
            // Failures are logged by the bridge.
            let _ = assets
                .spawn_into_scene(request, grid_x, grid_y, material, &scene)
                .await;
        });
        Ok(())
    }
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{err:#}"))
}
