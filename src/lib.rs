//! Responsive render loop for procedurally generated primitive scenes.
//!
//! A [`GeometryFactory`] builds primitives and places them in a
//! [`SceneGraph`]. An [`Engine`] animates the graph from a refresh signal,
//! keeps the surface backing store in step with its layout size, and hands
//! every frame to a [`DrawBackend`]. The [`AssetBridge`] loads meshes and
//! text in the background and inserts them between ticks.
//!
//! The platform pieces (surface, refresh signal, draw backend, asset loader)
//! are traits, so the whole loop runs headless in tests and on the command
//! line.

pub mod assets;
pub mod camera;
pub mod clock;
pub mod color;
pub mod config;
pub mod demo;
pub mod engine;
pub mod error;
pub mod factory;
pub mod geometry;
pub mod logging;
pub mod material;
pub mod obj;
pub mod refresh;
pub mod render;
pub mod scene;
pub mod surface;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use assets::{
    AssetBridge, AssetLoader, AssetRequest, FsLoader, LoadProgress, MemoryLoader,
};
pub use camera::Camera;
pub use clock::{AnimationClock, FrameTime};
pub use config::{AnimationProfile, CameraConfig, EngineConfig, LightConfig, Preset};
pub use engine::{Engine, EngineState};
pub use error::{AssetLoadError, ConfigurationError, DrawError, SchedulerError};
pub use factory::GeometryFactory;
pub use geometry::{Geometry, PrimitiveKind, PrimitiveParams, Topology, Vertex};
pub use material::{ColorPolicy, Material, Side};
pub use obj::parse_obj;
pub use refresh::{FrameCallback, FrameRequestId, ManualRefresh, RefreshSignal};
pub use render::{DrawBackend, DrawLog, FrameRecord, HeadlessBackend};
pub use scene::{Light, SceneGraph, SceneHandle, SceneManifest, SceneObject};
pub use surface::{HeadlessSurface, Surface, SurfaceSize, SurfaceSizeMonitor};
