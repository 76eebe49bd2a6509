//! Asynchronous asset loading.
//!
//! Loaders report through callbacks. [`AssetBridge`] turns each load into a
//! future that resolves exactly once and feeds the result into the scene.

#[cfg(target_arch = "wasm32")]
mod fetch;
mod fs;
mod memory;

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use parking_lot::Mutex;

use crate::error::AssetLoadError;
use crate::factory;
use crate::geometry::{self, Font, Geometry, PrimitiveParams, TextParams, TextStyle};
use crate::material::Material;
use crate::obj::parse_obj;
use crate::scene::SceneHandle;

#[cfg(target_arch = "wasm32")]
pub use fetch::FetchLoader;
pub use fs::FsLoader;
pub use memory::MemoryLoader;

/// Bytes received so far. `total` is unknown for streamed responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    pub loaded: u64,
    pub total: Option<u64>,
}

pub type SuccessCallback = Box<dyn FnMut(Vec<u8>) + Send>;
pub type ProgressCallback = Box<dyn FnMut(LoadProgress) + Send>;
pub type FailureCallback = Box<dyn FnMut(String) + Send>;

/// Callback-style source of raw asset bytes.
///
/// A well-behaved loader calls exactly one of `on_success` or `on_failure`.
/// Extra calls are ignored, and dropping both without calling either
/// resolves the load as abandoned.
pub trait AssetLoader {
    fn load(
        &self,
        url: &str,
        on_success: SuccessCallback,
        on_progress: ProgressCallback,
        on_failure: FailureCallback,
    );
}

/// Something to load and place in the scene.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetRequest {
    /// Wavefront OBJ mesh.
    Mesh { url: String },
    /// Extruded text using a typeface JSON font.
    Text {
        font_url: String,
        text: String,
        style: TextStyle,
    },
}

impl AssetRequest {
    pub fn mesh(url: impl Into<String>) -> Self {
        Self::Mesh { url: url.into() }
    }

    pub fn text(font_url: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Text {
            font_url: font_url.into(),
            text: text.into(),
            style: TextStyle::default(),
        }
    }

    /// The url that will be fetched.
    pub fn url(&self) -> &str {
        match self {
            Self::Mesh { url } => url,
            Self::Text { font_url, .. } => font_url,
        }
    }
}

type Outcome = Result<Vec<u8>, String>;

/// Write-once slot shared by the success and failure callbacks.
struct Resolution {
    url: String,
    sender: Mutex<Option<oneshot::Sender<Outcome>>>,
}

impl Resolution {
    fn resolve(&self, outcome: Outcome) {
        match self.sender.lock().take() {
            // The receiver may already be gone; nothing to report then.
            Some(sender) => {
                let _ = sender.send(outcome);
            }
            None => log::warn!("ignoring repeated resolution of {}", self.url),
        }
    }
}

/// Future returned by [`AssetBridge::fetch`].
#[derive(Debug)]
pub struct PendingAsset {
    url: String,
    receiver: oneshot::Receiver<Outcome>,
}

impl Future for PendingAsset {
    type Output = Result<Vec<u8>, AssetLoadError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let outcome = match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(outcome) => outcome,
        };
        let url = self.url.clone();
        Poll::Ready(match outcome {
            Ok(Ok(bytes)) => Ok(bytes),
            Ok(Err(reason)) => Err(AssetLoadError::Transport { url, reason }),
            Err(oneshot::Canceled) => Err(AssetLoadError::Abandoned { url }),
        })
    }
}

/// Adapts an [`AssetLoader`] to futures and inserts finished geometry into
/// a scene.
#[derive(Clone)]
pub struct AssetBridge {
    loader: Rc<dyn AssetLoader>,
    spread: f32,
}

impl AssetBridge {
    pub fn new(loader: impl AssetLoader + 'static, spread: f32) -> Self {
        Self {
            loader: Rc::new(loader),
            spread,
        }
    }

    pub fn spread(&self) -> f32 {
        self.spread
    }

    /// Starts loading `url` and returns a future for its bytes.
    pub fn fetch(&self, url: &str) -> PendingAsset {
        let (sender, receiver) = oneshot::channel();
        let resolution = Arc::new(Resolution {
            url: url.to_string(),
            sender: Mutex::new(Some(sender)),
        });

        let on_success = {
            let resolution = Arc::clone(&resolution);
            Box::new(move |bytes: Vec<u8>| resolution.resolve(Ok(bytes))) as SuccessCallback
        };
        let on_failure = {
            let resolution = Arc::clone(&resolution);
            Box::new(move |reason: String| resolution.resolve(Err(reason))) as FailureCallback
        };
        let on_progress = {
            let url = url.to_string();
            Box::new(move |progress: LoadProgress| match progress.total {
                Some(total) => log::trace!("{url}: {}/{total} bytes", progress.loaded),
                None => log::trace!("{url}: {} bytes", progress.loaded),
            }) as ProgressCallback
        };
        drop(resolution);

        self.loader.load(url, on_success, on_progress, on_failure);
        PendingAsset {
            url: url.to_string(),
            receiver,
        }
    }

    /// Loads and parses a Wavefront OBJ mesh.
    pub async fn load_mesh(&self, url: &str) -> Result<Geometry, AssetLoadError> {
        let bytes = self.fetch(url).await?;
        let text = String::from_utf8(bytes).map_err(|err| AssetLoadError::Parse {
            url: url.to_string(),
            reason: err.to_string(),
        })?;
        parse_obj(&text).map_err(|err| AssetLoadError::Parse {
            url: url.to_string(),
            reason: format!("{err:#}"),
        })
    }

    /// Loads a typeface JSON font.
    pub async fn load_font(&self, url: &str) -> Result<Arc<Font>, AssetLoadError> {
        let bytes = self.fetch(url).await?;
        Font::from_json_slice(&bytes)
            .map(Arc::new)
            .map_err(|err| AssetLoadError::Parse {
                url: url.to_string(),
                reason: format!("{err:#}"),
            })
    }

    /// Loads a font and extrudes `text` with it.
    pub async fn load_text(
        &self,
        font_url: &str,
        text: &str,
        style: TextStyle,
    ) -> Result<Geometry, AssetLoadError> {
        let font = self.load_font(font_url).await?;
        let params = PrimitiveParams::Text(TextParams {
            font,
            text: text.to_string(),
            style,
        });
        geometry::build(&params).map_err(|source| AssetLoadError::Geometry {
            url: font_url.to_string(),
            source,
        })
    }

    /// Loads whatever `request` describes.
    pub async fn load(&self, request: &AssetRequest) -> Result<Geometry, AssetLoadError> {
        match request {
            AssetRequest::Mesh { url } => self.load_mesh(url).await,
            AssetRequest::Text {
                font_url,
                text,
                style,
            } => self.load_text(font_url, text, *style).await,
        }
    }

    /// Loads `request`, centers it on its bounding box and places it at the
    /// grid cell. On failure the scene is not touched.
    ///
    /// The object picks up its rotation from the engine clock on the next
    /// tick, like any other object.
    pub async fn spawn_into_scene(
        &self,
        request: AssetRequest,
        grid_x: f32,
        grid_y: f32,
        material: Material,
        scene: &SceneHandle,
    ) -> Result<usize, AssetLoadError> {
        let mut geometry = match self.load(&request).await {
            Ok(geometry) => geometry,
            Err(err) => {
                log::error!("{err}");
                return Err(err);
            }
        };
        geometry.center();
        let index = factory::place_at(
            &mut scene.write(),
            self.spread,
            grid_x,
            grid_y,
            geometry.into_shared(),
            material,
        );
        log::info!("loaded {} as object {index}", request.url());
        Ok(index)
    }
}
