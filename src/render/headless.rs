use std::collections::VecDeque;
use std::sync::Arc;

use glam::Vec3;
use parking_lot::Mutex;

use super::DrawBackend;
use crate::camera::Camera;
use crate::error::DrawError;
use crate::scene::SceneGraph;

const DEFAULT_HISTORY: usize = 256;

/// What one successful draw saw.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    /// Index among all draw calls, failed ones included.
    pub frame: u64,
    pub aspect: f32,
    pub object_count: usize,
    pub primitive_count: usize,
    pub rotations: Vec<Vec3>,
    pub colors: Vec<Vec3>,
}

#[derive(Debug)]
struct LogState {
    calls: u64,
    drawn: u64,
    failures: u64,
    fail_remaining: u32,
    history: VecDeque<FrameRecord>,
    history_limit: usize,
}

/// Shared view of what a [`HeadlessBackend`] has drawn.
#[derive(Debug, Clone)]
pub struct DrawLog {
    state: Arc<Mutex<LogState>>,
}

impl DrawLog {
    /// Successful draws.
    pub fn frames(&self) -> u64 {
        self.state.lock().drawn
    }

    /// Draw calls that returned an error.
    pub fn failures(&self) -> u64 {
        self.state.lock().failures
    }

    /// Draw calls of either outcome.
    pub fn calls(&self) -> u64 {
        self.state.lock().calls
    }

    pub fn last(&self) -> Option<FrameRecord> {
        self.state.lock().history.back().cloned()
    }

    /// Most recent successful frames, oldest first.
    pub fn records(&self) -> Vec<FrameRecord> {
        self.state.lock().history.iter().cloned().collect()
    }
}

/// Backend that draws nothing and records frame statistics.
#[derive(Debug, Clone)]
pub struct HeadlessBackend {
    log: DrawLog,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::with_history(DEFAULT_HISTORY)
    }

    /// Keeps at most `limit` frame records.
    pub fn with_history(limit: usize) -> Self {
        Self {
            log: DrawLog {
                state: Arc::new(Mutex::new(LogState {
                    calls: 0,
                    drawn: 0,
                    failures: 0,
                    fail_remaining: 0,
                    history: VecDeque::new(),
                    history_limit: limit,
                })),
            },
        }
    }

    pub fn log(&self) -> DrawLog {
        self.log.clone()
    }

    /// Makes the next `count` draws fail with a backend error.
    pub fn fail_next(&self, count: u32) {
        self.log.state.lock().fail_remaining = count;
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawBackend for HeadlessBackend {
    fn draw(&mut self, scene: &SceneGraph, camera: &Camera) -> Result<(), DrawError> {
        let mut state = self.log.state.lock();
        let frame = state.calls;
        state.calls += 1;
        if state.fail_remaining > 0 {
            state.fail_remaining -= 1;
            state.failures += 1;
            return Err(DrawError::Backend(format!("injected failure on frame {frame}")));
        }

        let objects = scene.objects();
        let record = FrameRecord {
            frame,
            aspect: camera.aspect(),
            object_count: objects.len(),
            primitive_count: objects.iter().map(|o| o.geometry.primitive_count()).sum(),
            rotations: objects.iter().map(|o| o.rotation).collect(),
            colors: objects.iter().map(|o| o.material.color).collect(),
        };
        log::debug!(
            "frame {frame}: {} objects, {} primitives, aspect {:.3}",
            record.object_count,
            record.primitive_count,
            record.aspect
        );

        state.drawn += 1;
        if state.history_limit > 0 {
            if state.history.len() == state.history_limit {
                state.history.pop_front();
            }
            state.history.push_back(record);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::factory::GeometryFactory;
    use crate::geometry::{BoxParams, PrimitiveParams};
    use crate::material::ColorPolicy;

    fn scene_with_cube() -> SceneGraph {
        let mut scene = SceneGraph::from_config(&EngineConfig::cubes());
        let mut factory = GeometryFactory::with_seed(1.0, 0);
        factory
            .add_primitive(
                &mut scene,
                0.0,
                0.0,
                &PrimitiveParams::Box(BoxParams::cube(1.0)),
                ColorPolicy::hex(0x44aa88),
            )
            .unwrap();
        scene
    }

    #[test]
    fn records_frame_statistics() {
        let scene = scene_with_cube();
        let mut backend = HeadlessBackend::new();
        let log = backend.log();
        backend.draw(&scene, scene.camera()).unwrap();
        let record = log.last().unwrap();
        assert_eq!(record.object_count, 1);
        assert_eq!(record.primitive_count, 12);
        assert_eq!(record.aspect, 2.0);
        assert_eq!(log.frames(), 1);
    }

    #[test]
    fn injected_failures_are_counted() {
        let scene = scene_with_cube();
        let mut backend = HeadlessBackend::new();
        backend.fail_next(1);
        assert!(matches!(
            backend.draw(&scene, scene.camera()),
            Err(DrawError::Backend(_))
        ));
        backend.draw(&scene, scene.camera()).unwrap();
        let log = backend.log();
        assert_eq!((log.calls(), log.frames(), log.failures()), (2, 1, 1));
        assert_eq!(log.last().unwrap().frame, 1);
    }

    #[test]
    fn history_is_bounded() {
        let scene = scene_with_cube();
        let mut backend = HeadlessBackend::with_history(2);
        for _ in 0..5 {
            backend.draw(&scene, scene.camera()).unwrap();
        }
        let frames: Vec<u64> = backend.log().records().iter().map(|r| r.frame).collect();
        assert_eq!(frames, vec![3, 4]);
    }
}
