//! The animation loop.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::clock::AnimationClock;
use crate::error::SchedulerError;
use crate::refresh::{FrameRequestId, RefreshSignal};
use crate::render::DrawBackend;
use crate::scene::SceneHandle;
use crate::surface::{Surface, SurfaceSizeMonitor};

/// Lifecycle of an [`Engine`]. `Disposed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Disposed,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Disposed => "disposed",
        };
        f.write_str(name)
    }
}

struct EngineCore {
    state: EngineState,
    scene: SceneHandle,
    backend: Box<dyn DrawBackend>,
    refresh: Rc<dyn RefreshSignal>,
    surface: Option<Box<dyn Surface>>,
    monitor: SurfaceSizeMonitor,
    clock: AnimationClock,
    pending: Option<FrameRequestId>,
    frames_drawn: u64,
    draw_failures: u64,
    last_error: Option<String>,
}

impl EngineCore {
    /// Resize check, rotation update and draw. The scene stays write-locked
    /// for the whole tick.
    fn tick(&mut self, timestamp_ms: f64) {
        let frame = self.clock.tick(timestamp_ms);
        let mut scene = self.scene.write();

        if let Some(surface) = &self.surface {
            self.monitor.apply(surface.as_ref());
            match surface.logical_size().aspect() {
                Some(aspect) if aspect != scene.camera().aspect() => {
                    scene.camera_mut().set_aspect(aspect);
                }
                Some(_) => {}
                None => log::debug!("surface has no area, keeping camera aspect"),
            }
        }

        scene.set_rotations(frame.seconds);

        let camera = *scene.camera();
        match self.backend.draw(&scene, &camera) {
            Ok(()) => self.frames_drawn += 1,
            Err(err) => {
                log::error!("draw failed on frame {}: {err}", frame.frame_index);
                self.draw_failures += 1;
                self.last_error = Some(err.to_string());
            }
        }
    }
}

/// Drives a scene from a refresh signal.
///
/// Each tick corrects the surface size, sets every rotation from the
/// absolute clock, draws, and asks for the next frame. Dropping the engine
/// disposes it.
pub struct Engine {
    core: Rc<RefCell<EngineCore>>,
}

impl Engine {
    pub fn new(
        scene: SceneHandle,
        backend: impl DrawBackend + 'static,
        refresh: impl RefreshSignal + 'static,
    ) -> Self {
        Self {
            core: Rc::new(RefCell::new(EngineCore {
                state: EngineState::Idle,
                scene,
                backend: Box::new(backend),
                refresh: Rc::new(refresh),
                surface: None,
                monitor: SurfaceSizeMonitor::new(),
                clock: AnimationClock::new(),
                pending: None,
                frames_drawn: 0,
                draw_failures: 0,
                last_error: None,
            })),
        }
    }

    /// Starts the loop on `surface`. Does nothing unless the engine is idle.
    pub fn start(&self, surface: impl Surface + 'static) -> Result<(), SchedulerError> {
        {
            let mut core = self.core.borrow_mut();
            if core.state != EngineState::Idle {
                log::debug!("start ignored, engine is {}", core.state);
                return Ok(());
            }
            core.surface = Some(Box::new(surface));
            core.state = EngineState::Running;
        }

        if let Err(err) = schedule(&self.core) {
            let mut core = self.core.borrow_mut();
            core.state = EngineState::Idle;
            core.surface = None;
            core.last_error = Some(err.to_string());
            return Err(err);
        }
        log::info!("engine started with {} objects", self.core.borrow().scene.len());
        Ok(())
    }

    /// Stops the loop for good and cancels the pending frame.
    pub fn dispose(&self) {
        let (refresh, pending, frames) = {
            let mut core = self.core.borrow_mut();
            if core.state == EngineState::Disposed {
                return;
            }
            core.state = EngineState::Disposed;
            (Rc::clone(&core.refresh), core.pending.take(), core.frames_drawn)
        };
        if let Some(id) = pending {
            refresh.cancel_frame(id);
        }
        log::info!("engine disposed after {frames} frames");
    }

    pub fn state(&self) -> EngineState {
        self.core.borrow().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == EngineState::Running
    }

    pub fn scene(&self) -> SceneHandle {
        self.core.borrow().scene.clone()
    }

    /// Draw calls that succeeded.
    pub fn frames_drawn(&self) -> u64 {
        self.core.borrow().frames_drawn
    }

    pub fn draw_failures(&self) -> u64 {
        self.core.borrow().draw_failures
    }

    /// Animation time at the latest tick.
    pub fn clock_seconds(&self) -> f32 {
        self.core.borrow().clock.seconds()
    }

    /// Timestamps clamped because they went backwards.
    pub fn clamped_timestamps(&self) -> u64 {
        self.core.borrow().clock.clamped()
    }

    /// Backing-store corrections made so far.
    pub fn resize_corrections(&self) -> u64 {
        self.core.borrow().monitor.corrections()
    }

    /// Most recent draw or scheduling failure.
    pub fn last_error(&self) -> Option<String> {
        self.core.borrow().last_error.clone()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn schedule(core: &Rc<RefCell<EngineCore>>) -> Result<(), SchedulerError> {
    let refresh = {
        let core = core.borrow();
        if core.state != EngineState::Running {
            return Ok(());
        }
        Rc::clone(&core.refresh)
    };
    let weak: Weak<RefCell<EngineCore>> = Rc::downgrade(core);
    let id = refresh.request_frame(Box::new(move |timestamp_ms| {
        if let Some(core) = weak.upgrade() {
            run_frame(&core, timestamp_ms);
        }
    }))?;
    core.borrow_mut().pending = Some(id);
    Ok(())
}

fn run_frame(core: &Rc<RefCell<EngineCore>>, timestamp_ms: f64) {
    {
        let mut engine = core.borrow_mut();
        engine.pending = None;
        if engine.state != EngineState::Running {
            return;
        }
        engine.tick(timestamp_ms);
    }
    if let Err(err) = schedule(core) {
        log::error!("could not schedule next frame, engine is idle: {err}");
        let mut engine = core.borrow_mut();
        engine.state = EngineState::Idle;
        engine.pending = None;
        engine.surface = None;
        engine.last_error = Some(err.to_string());
    }
}
