use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;

use primitives_runtime::demo;
use primitives_runtime::logging::{init_logging, LoggingConfig};
use primitives_runtime::{
    AssetBridge, AssetLoadError, Engine, EngineConfig, FsLoader, GeometryFactory, HeadlessBackend,
    HeadlessSurface, ManualRefresh, Preset, SceneGraph, SceneHandle, SceneManifest, Surface,
    SurfaceSize,
};

/// Default backing store of a fresh canvas element.
const INITIAL_BACKING: SurfaceSize = SurfaceSize::new(300, 150);

#[derive(Parser, Debug)]
#[command(name = "primitives-runtime")]
#[command(about = "Animates a primitive scene headlessly and reports what was drawn")]
struct Cli {
    /// Scene manifest (XML). Without one the preset scene is used.
    manifest: Option<PathBuf>,

    /// Preset scene, used when no manifest is given.
    #[arg(long, default_value = "primitives")]
    preset: Preset,

    /// Number of refresh callbacks to fire.
    #[arg(long, default_value_t = 60)]
    frames: u32,

    /// Simulated refresh rate used to derive timestamps.
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// Layout width of the surface.
    #[arg(long, default_value_t = 300)]
    width: u32,

    /// Layout height of the surface.
    #[arg(long, default_value_t = 150)]
    height: u32,

    /// Change the layout size before a frame, e.g. `30:640x480`.
    #[arg(long = "resize-at", value_name = "FRAME:WxH")]
    resize_at: Vec<ResizeEvent>,

    /// Directory that asset urls are resolved against. Defaults to the
    /// manifest's directory.
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Seed for random hues.
    #[arg(long)]
    seed: Option<u64>,

    /// Print the scene and exit without animating.
    #[arg(long)]
    summary_only: bool,
}

#[derive(Debug, Clone, Copy)]
struct ResizeEvent {
    frame: u32,
    size: SurfaceSize,
}

impl FromStr for ResizeEvent {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (frame, size) = s
            .split_once(':')
            .ok_or_else(|| anyhow!("expected FRAME:WIDTHxHEIGHT, got {s:?}"))?;
        Ok(Self {
            frame: frame
                .trim()
                .parse()
                .with_context(|| format!("bad frame number in {s:?}"))?,
            size: size.parse()?,
        })
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    init_logging(LoggingConfig::default());
    if let Err(err) = run(Cli::parse()) {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

fn factory_for(config: &EngineConfig, seed: Option<u64>) -> GeometryFactory {
    match seed {
        Some(seed) => GeometryFactory::with_seed(config.spread, seed),
        None => GeometryFactory::from_config(config),
    }
}

fn run(cli: Cli) -> Result<()> {
    let (scene, manifest) = match &cli.manifest {
        Some(path) => {
            let xml = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read manifest {}", path.display()))?;
            let manifest = SceneManifest::from_xml(&xml)
                .with_context(|| format!("failed to parse manifest {}", path.display()))?;
            let mut factory = factory_for(&manifest.config, cli.seed);
            let scene = manifest.instantiate(&mut factory)?;
            (scene, Some((manifest, factory)))
        }
        None => {
            let config = EngineConfig::preset(cli.preset);
            let mut factory = factory_for(&config, cli.seed);
            let scene = demo::scene_for(cli.preset, &mut factory)
                .with_context(|| format!("failed to build the {} scene", cli.preset))?;
            (scene, None)
        }
    };

    print_scene(&scene);
    if cli.summary_only {
        return Ok(());
    }

    let handle = SceneHandle::new(scene);
    let refresh = ManualRefresh::new();
    let backend = HeadlessBackend::new();
    let draw_log = backend.log();
    let surface = HeadlessSurface::new(SurfaceSize::new(cli.width, cli.height), INITIAL_BACKING);
    let engine = Engine::new(handle.clone(), backend, refresh.clone());
    engine
        .start(surface.clone())
        .context("failed to start the animation loop")?;

    let mut pool = LocalPool::new();
    let outcomes: Rc<RefCell<Vec<Result<usize, AssetLoadError>>>> = Rc::default();
    if let Some((manifest, mut factory)) = manifest {
        let root = asset_root(cli.assets.as_deref(), cli.manifest.as_deref());
        let bridge = AssetBridge::new(FsLoader::new(root), factory.spread());
        for asset in manifest.assets {
            let material = factory.create_material(asset.color)?;
            let bridge = bridge.clone();
            let scene = handle.clone();
            let outcomes = Rc::clone(&outcomes);
            pool.spawner()
                .spawn_local(async move {
                    let outcome = bridge
                        .spawn_into_scene(asset.request, asset.grid.x, asset.grid.y, material, &scene)
                        .await;
                    outcomes.borrow_mut().push(outcome);
                })
                .map_err(|err| anyhow!("failed to spawn asset load: {err:?}"))?;
        }
    }

    let step = 1000.0 / cli.fps.max(1.0);
    for frame in 0..cli.frames {
        for event in cli.resize_at.iter().filter(|event| event.frame == frame) {
            surface.set_logical_size(event.size);
        }
        pool.run_until_stalled();
        refresh.fire(frame as f64 * step);
    }
    engine.dispose();
    // Loads still in flight land in the scene but are never drawn.
    pool.run();

    println!(
        "Drew {} frame(s) at {}",
        draw_log.frames(),
        surface.backing_size()
    );
    println!("Resized backing store {} time(s)", surface.reallocations());
    let outcomes = outcomes.borrow();
    if !outcomes.is_empty() {
        let failed = outcomes.iter().filter(|outcome| outcome.is_err()).count();
        println!(
            "Loaded {} asset(s), {failed} failed",
            outcomes.len() - failed
        );
    }
    if let Some(error) = engine.last_error() {
        println!("Last error: {error}");
    }
    print_final_state(&handle);
    Ok(())
}

fn asset_root(assets: Option<&Path>, manifest: Option<&Path>) -> PathBuf {
    match (assets, manifest.and_then(Path::parent)) {
        (Some(dir), _) => dir.to_path_buf(),
        (None, Some(parent)) => parent.to_path_buf(),
        (None, None) => PathBuf::from("."),
    }
}

fn print_scene(scene: &SceneGraph) {
    println!(
        "Scene: {} objects ({} lights)",
        scene.len(),
        scene.lights().len()
    );
    scene.for_each_object(|index, object| {
        println!(
            " - #{index} {} pos=({:.2}, {:.2}, {:.2}) color=({:.2}, {:.2}, {:.2})",
            object.kind().map_or("mesh", |kind| kind.name()),
            object.position.x,
            object.position.y,
            object.position.z,
            object.material.color.x,
            object.material.color.y,
            object.material.color.z
        );
    });
}

fn print_final_state(scene: &SceneHandle) {
    println!("Final object states:");
    scene.with(|scene| {
        scene.for_each_object(|index, object| {
            println!(
                " - #{index} {} rot=({:.2}, {:.2}, {:.2})",
                object.kind().map_or("mesh", |kind| kind.name()),
                object.rotation.x,
                object.rotation.y,
                object.rotation.z
            );
        });
    });
}
