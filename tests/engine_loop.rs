use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use approx::assert_abs_diff_eq;
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use glam::Vec3;

use primitives_runtime::demo;
use primitives_runtime::geometry::{
    build, BoxParams, Font, PrimitiveParams, TextParams, WireframeParams,
};
use primitives_runtime::{
    AssetBridge, AssetLoadError, AssetRequest, ColorPolicy, ConfigurationError, DrawLog, Engine,
    EngineConfig, EngineState, FrameCallback, FrameRequestId, GeometryFactory, HeadlessBackend,
    HeadlessSurface, ManualRefresh, Material, MemoryLoader, PrimitiveKind, RefreshSignal,
    SceneGraph, SceneHandle, SchedulerError, Surface, SurfaceSize,
};

const TRIANGLE_OBJ: &str = "v -1 0 0\nv 1 0 0\nv 0 2 0\nf 1 2 3\n";

struct Harness {
    engine: Engine,
    refresh: ManualRefresh,
    backend: HeadlessBackend,
    log: DrawLog,
    surface: HeadlessSurface,
    scene: SceneHandle,
}

impl Harness {
    fn new(scene: SceneGraph, surface: HeadlessSurface) -> Self {
        let scene = SceneHandle::new(scene);
        let refresh = ManualRefresh::new();
        let backend = HeadlessBackend::new();
        let log = backend.log();
        let engine = Engine::new(scene.clone(), backend.clone(), refresh.clone());
        engine.start(surface.clone()).unwrap();
        Self {
            engine,
            refresh,
            backend,
            log,
            surface,
            scene,
        }
    }

    fn cubes() -> Self {
        let mut factory = GeometryFactory::with_seed(1.0, 0);
        let scene = demo::spinning_cubes(&mut factory).unwrap();
        Self::new(scene, HeadlessSurface::matching(SurfaceSize::new(300, 150)))
    }

    fn rotations(&self) -> Vec<Vec3> {
        self.scene
            .with(|scene| scene.objects().iter().map(|o| o.rotation).collect())
    }
}

/// Forwards requests but ignores cancellation, so a frame queued before
/// disposal still fires.
struct StickyRefresh(ManualRefresh);

impl RefreshSignal for StickyRefresh {
    fn request_frame(&self, callback: FrameCallback) -> Result<FrameRequestId, SchedulerError> {
        self.0.request_frame(callback)
    }

    fn cancel_frame(&self, _id: FrameRequestId) {}
}

#[test]
fn rotation_depends_only_on_the_timestamp() {
    let busy = Harness::cubes();
    for ms in (0..=2000).step_by(16) {
        busy.refresh.fire(ms as f64);
    }
    busy.refresh.fire(2000.0);

    let idle = Harness::cubes();
    idle.refresh.fire(2000.0);

    let busy_rotations = busy.rotations();
    assert_eq!(busy_rotations, idle.rotations());
    for (index, rotation) in busy_rotations.iter().enumerate() {
        let speed = 1.0 + index as f32 * 0.1;
        assert_abs_diff_eq!(rotation.x, 2.0 * speed, epsilon = 1e-5);
        assert_abs_diff_eq!(rotation.y, 2.0 * speed, epsilon = 1e-5);
        assert_eq!(rotation.z, 0.0);
    }
}

#[test]
fn resize_lands_before_the_draw() {
    let mut factory = GeometryFactory::with_seed(15.0, 0);
    let scene = demo::primitives_showcase(&mut factory).unwrap();
    let surface = HeadlessSurface::new(SurfaceSize::new(800, 600), SurfaceSize::new(300, 150));
    let harness = Harness::new(scene, surface);

    harness.refresh.fire(16.0);
    assert_eq!(harness.surface.backing_size(), SurfaceSize::new(800, 600));
    assert_abs_diff_eq!(harness.log.last().unwrap().aspect, 800.0 / 600.0);

    harness.refresh.fire(32.0);
    assert_eq!(harness.surface.reallocations(), 1);

    harness.surface.set_logical_size(SurfaceSize::new(400, 400));
    harness.refresh.fire(48.0);
    assert_eq!(harness.surface.backing_size(), SurfaceSize::new(400, 400));
    assert_abs_diff_eq!(harness.log.last().unwrap().aspect, 1.0);
    assert_eq!(harness.engine.resize_corrections(), 2);
}

#[test]
fn zero_area_surface_keeps_the_aspect() {
    let surface = HeadlessSurface::new(SurfaceSize::new(0, 0), SurfaceSize::new(300, 150));
    let harness = Harness::new(SceneGraph::default(), surface);
    harness.refresh.fire(0.0);
    assert_eq!(harness.surface.backing_size(), SurfaceSize::new(0, 0));
    assert_eq!(harness.log.last().unwrap().aspect, 2.0);
}

#[test]
fn starting_twice_runs_one_loop() {
    let harness = Harness::cubes();
    harness
        .engine
        .start(HeadlessSurface::matching(SurfaceSize::new(10, 10)))
        .unwrap();
    assert_eq!(harness.refresh.pending(), 1);
    assert_eq!(harness.refresh.fire(16.0), 1);
    assert_eq!(harness.refresh.pending(), 1);
    assert_eq!(harness.log.frames(), 1);
    // The second surface was ignored.
    assert_eq!(harness.log.last().unwrap().aspect, 2.0);
}

#[test]
fn nothing_draws_after_dispose() {
    let manual = ManualRefresh::new();
    let backend = HeadlessBackend::new();
    let log = backend.log();
    let engine = Engine::new(
        SceneHandle::new(SceneGraph::default()),
        backend,
        StickyRefresh(manual.clone()),
    );
    engine
        .start(HeadlessSurface::matching(SurfaceSize::new(300, 150)))
        .unwrap();
    manual.fire(16.0);
    assert_eq!(log.frames(), 1);

    engine.dispose();
    assert_eq!(engine.state(), EngineState::Disposed);
    // The stale request still fires but finds the engine disposed.
    assert_eq!(manual.fire(32.0), 1);
    assert_eq!(log.calls(), 1);
    assert_eq!(manual.pending(), 0);
}

#[test]
fn dispose_cancels_the_pending_frame() {
    let harness = Harness::cubes();
    harness.engine.dispose();
    harness.engine.dispose();
    assert_eq!(harness.refresh.pending(), 0);
    assert_eq!(harness.refresh.cancelled(), 1);
    assert_eq!(harness.refresh.fire(16.0), 0);
    assert_eq!(harness.log.calls(), 0);
}

#[test]
fn box_extents_and_rejection() {
    let factory = GeometryFactory::with_seed(15.0, 0);
    let geometry = factory
        .create_primitive(&PrimitiveParams::Box(BoxParams::cube(8.0)))
        .unwrap();
    assert_eq!(geometry.bounds().size(), Vec3::splat(8.0));

    let err = factory
        .create_primitive(&PrimitiveParams::Box(BoxParams::new(8.0, 8.0, 0.0)))
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigurationError::NonPositive {
            parameter: "depth",
            ..
        }
    ));
}

#[test]
fn late_asset_follows_the_global_clock() {
    let harness = Harness::cubes();
    let loader = MemoryLoader::deferred().with_asset("tri.obj", TRIANGLE_OBJ);
    let bridge = AssetBridge::new(loader.clone(), 1.0);
    let mut pool = LocalPool::new();

    let scene = harness.scene.clone();
    let future_bridge = bridge.clone();
    pool.spawner()
        .spawn_local(async move {
            future_bridge
                .spawn_into_scene(AssetRequest::mesh("tri.obj"), 0.0, 1.0, Material::default(), &scene)
                .await
                .unwrap();
        })
        .unwrap();

    for tick in 0..10 {
        pool.run_until_stalled();
        harness.refresh.fire(tick as f64 * 100.0);
    }
    assert_eq!(harness.scene.len(), 3);

    loader.flush();
    pool.run_until_stalled();
    assert_eq!(harness.scene.len(), 4);

    harness.refresh.fire(1100.0);
    let object = harness.scene.object(3).unwrap();
    assert_abs_diff_eq!(object.speed, 1.3, epsilon = 1e-6);
    assert_abs_diff_eq!(object.rotation.x, 1.1 * 1.3, epsilon = 1e-5);
    assert_eq!(object.position, Vec3::new(0.0, 1.0, 0.0));
    assert_eq!(harness.log.last().unwrap().object_count, 4);
}

#[test]
fn objects_in_one_cell_coincide() {
    let mut factory = GeometryFactory::with_seed(15.0, 0);
    let mut scene = SceneGraph::from_config(&EngineConfig::primitives());
    let geometry = factory
        .create_primitive(&PrimitiveParams::Box(BoxParams::cube(8.0)))
        .unwrap()
        .into_shared();
    let a = factory.place_at(&mut scene, 2.0, -1.0, Arc::clone(&geometry), Material::default());
    let b = factory.place_at(&mut scene, 2.0, -1.0, geometry, Material::default());
    assert_eq!(scene.objects()[a].position, scene.objects()[b].position);
    assert_eq!(scene.objects()[a].position, Vec3::new(30.0, -15.0, 0.0));
}

#[test]
fn failed_load_leaves_scene_and_loop_alone() {
    let harness = Harness::cubes();
    let loader = MemoryLoader::deferred();
    let bridge = AssetBridge::new(loader.clone(), 1.0);
    let outcome = Rc::new(RefCell::new(None));
    let mut pool = LocalPool::new();

    let slot = Rc::clone(&outcome);
    let scene = harness.scene.clone();
    pool.spawner()
        .spawn_local(async move {
            let result = bridge
                .spawn_into_scene(AssetRequest::mesh("missing.obj"), 0.0, 0.0, Material::default(), &scene)
                .await;
            *slot.borrow_mut() = Some(result);
        })
        .unwrap();

    harness.refresh.fire(0.0);
    pool.run_until_stalled();
    loader.fail_pending("connection reset");
    pool.run_until_stalled();

    match outcome.borrow_mut().take() {
        Some(Err(AssetLoadError::Transport { url, reason })) => {
            assert_eq!(url, "missing.obj");
            assert_eq!(reason, "connection reset");
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(harness.scene.len(), 3);

    harness.refresh.fire(16.0);
    harness.refresh.fire(32.0);
    assert_eq!(harness.log.frames(), 3);
    assert!(harness.engine.is_running());
}

#[test]
fn draw_errors_do_not_stop_the_loop() {
    let harness = Harness::cubes();
    harness.backend.fail_next(2);
    for tick in 0..4 {
        harness.refresh.fire(tick as f64 * 16.0);
    }
    assert_eq!(harness.log.calls(), 4);
    assert_eq!(harness.log.frames(), 2);
    assert_eq!(harness.engine.draw_failures(), 2);
    assert!(harness.engine.last_error().unwrap().contains("injected"));
    assert_eq!(harness.refresh.pending(), 1);
}

#[test]
fn backwards_timestamps_are_clamped() {
    let harness = Harness::cubes();
    harness.refresh.fire(1000.0);
    let before = harness.rotations();
    harness.refresh.fire(500.0);
    assert_eq!(harness.rotations(), before);
    assert_eq!(harness.engine.clamped_timestamps(), 1);
    assert_abs_diff_eq!(harness.engine.clock_seconds(), 1.0);
}

#[test]
fn random_hues_hold_across_ticks() {
    let mut factory = GeometryFactory::with_seed(15.0, 11);
    let scene = demo::primitives_showcase(&mut factory).unwrap();
    let harness = Harness::new(scene, HeadlessSurface::matching(SurfaceSize::new(300, 150)));
    for tick in 0..5 {
        harness.refresh.fire(tick as f64 * 16.0);
    }
    let records = harness.log.records();
    assert_eq!(records.len(), 5);
    assert!(records.windows(2).all(|pair| pair[0].colors == pair[1].colors));
}

#[test]
fn box_wireframe_edge_counts() {
    let cube = PrimitiveParams::Box(BoxParams::cube(8.0));
    let all = build(&PrimitiveParams::Wireframe(WireframeParams::new(cube.clone()))).unwrap();
    assert_eq!(all.primitive_count(), 18);
    let outline =
        build(&PrimitiveParams::Wireframe(WireframeParams::edges(cube, 1.0))).unwrap();
    assert_eq!(outline.primitive_count(), 12);
    assert_eq!(outline.kind(), Some(PrimitiveKind::Wireframe));
}

#[test]
fn text_is_extruded_to_depth() {
    let font = Arc::new(
        Font::from_json_str(
            r#"{
                "familyName": "Block",
                "resolution": 100,
                "boundingBox": { "xMin": 0, "xMax": 40, "yMin": 0, "yMax": 100 },
                "glyphs": { "I": { "ha": 40, "o": "m 0 0 l 30 0 l 30 100 l 0 100" } }
            }"#,
        )
        .unwrap(),
    );
    let mut params = TextParams::new(font, "II");
    params.style.bevel = None;
    params.style.depth = 0.2;
    let geometry = build(&PrimitiveParams::Text(params.clone())).unwrap();
    assert_abs_diff_eq!(geometry.bounds().size().z, 0.2, epsilon = 1e-5);

    params.style = Default::default();
    let beveled = build(&PrimitiveParams::Text(params)).unwrap();
    assert_abs_diff_eq!(beveled.bounds().size().z, 0.5, epsilon = 1e-5);
}

#[test]
fn color_policy_rejects_out_of_range_luminance() {
    let mut factory = GeometryFactory::with_seed(1.0, 0);
    let err = factory
        .create_material(ColorPolicy::RandomHue {
            saturation: 1.0,
            luminance: 1.5,
        })
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::ColorOutOfRange { .. }));
}
