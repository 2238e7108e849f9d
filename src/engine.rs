//! The engine abstraction the composer builds against.
//!
//! An [`Engine`] is bound to one display surface and drives any number of
//! render loops. Each loop is a callback that receives a [`Renderer`] once per
//! frame and typically asks it to draw a scene. Two engines exist:
//! [`GpuEngine`](crate::flow::GpuEngine) renders through wgpu into a window or
//! canvas, [`HeadlessEngine`](crate::headless::HeadlessEngine) only plans
//! frames and records what would have been drawn.

use std::{cell::Cell, rc::Rc};

use crate::{
    config::EngineOptions,
    data_structures::scene::Scene,
    error::{RenderError, SceneError},
    host::DisplaySurface,
};

/// Draws scenes for the frame currently being produced.
pub trait Renderer {
    fn render_scene(&mut self, scene: &Scene) -> Result<(), RenderError>;
}

/// Invoked once per frame while its [`RenderLoop`] is running.
pub type RenderCallback = Box<dyn FnMut(&mut dyn Renderer) -> Result<(), RenderError>>;

/// Handle of a registered render loop. Clones refer to the same loop.
#[derive(Clone, Debug)]
pub struct RenderLoop {
    running: Rc<Cell<bool>>,
}

impl RenderLoop {
    fn new() -> Self {
        Self {
            running: Rc::new(Cell::new(true)),
        }
    }

    /// Stops the loop. The callback is not invoked again, not even for the
    /// frame in progress if it has not reached this loop yet.
    pub fn stop(&self) {
        self.running.set(false);
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }
}

pub trait Engine: Sized {
    /// Binds a new engine to `surface`.
    fn create(surface: DisplaySurface, options: &EngineOptions) -> Result<Self, SceneError>;

    fn surface(&self) -> &DisplaySurface;

    /// Registers `callback` to be invoked once per frame until the returned
    /// handle is stopped.
    fn run_render_loop(&mut self, callback: RenderCallback) -> RenderLoop;
}

struct Entry {
    handle: RenderLoop,
    callback: RenderCallback,
}

/// Render loops registered with an engine, in registration order.
#[derive(Default)]
pub(crate) struct RenderLoops {
    entries: Vec<Entry>,
}

impl RenderLoops {
    pub fn register(&mut self, callback: RenderCallback) -> RenderLoop {
        let handle = RenderLoop::new();
        self.entries.push(Entry {
            handle: handle.clone(),
            callback,
        });
        handle
    }

    /// True once every registered loop was stopped. Stopped entries are only
    /// dropped by the next [`RenderLoops::run_frame`].
    pub fn all_stopped(&self) -> bool {
        self.entries.iter().all(|e| !e.handle.is_running())
    }

    /// Runs one frame of every live loop and drops the stopped ones.
    /// A failing callback is reported through `on_error`; the remaining loops still run.
    ///
    /// Returns the number of callbacks invoked.
    pub fn run_frame(
        &mut self,
        renderer: &mut dyn Renderer,
        mut on_error: impl FnMut(RenderError),
    ) -> usize {
        self.entries.retain(|e| e.handle.is_running());
        let mut invoked = 0;
        for entry in self.entries.iter_mut() {
            if !entry.handle.is_running() {
                continue;
            }
            invoked += 1;
            if let Err(e) = (entry.callback)(&mut *renderer) {
                on_error(e);
            }
        }
        invoked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recording {
        scenes: usize,
    }

    impl Renderer for Recording {
        fn render_scene(&mut self, _scene: &Scene) -> Result<(), RenderError> {
            self.scenes += 1;
            Ok(())
        }
    }

    #[test]
    fn stopped_loops_are_skipped_and_dropped() {
        let mut loops = RenderLoops::default();
        let scene = Rc::new(Scene::new());
        let first = {
            let scene = scene.clone();
            loops.register(Box::new(move |r: &mut dyn Renderer| r.render_scene(&scene)))
        };
        let calls = Rc::new(Cell::new(0));
        {
            let calls = calls.clone();
            loops.register(Box::new(move |_: &mut dyn Renderer| {
                calls.set(calls.get() + 1);
                Ok(())
            }));
        }

        let mut renderer = Recording::default();
        assert_eq!(loops.run_frame(&mut renderer, |_| {}), 2);
        first.stop();
        assert_eq!(loops.run_frame(&mut renderer, |_| {}), 1);
        assert_eq!(renderer.scenes, 1);
        assert_eq!(calls.get(), 2);
        assert_eq!(loops.entries.len(), 1);
    }

    #[test]
    fn a_failing_loop_does_not_starve_the_others() {
        let mut loops = RenderLoops::default();
        loops.register(Box::new(|_: &mut dyn Renderer| Err(RenderError::NoActiveCamera)));
        let ran = Rc::new(Cell::new(false));
        {
            let ran = ran.clone();
            loops.register(Box::new(move |_: &mut dyn Renderer| {
                ran.set(true);
                Ok(())
            }));
        }
        let errors = RefCell::new(Vec::new());
        loops.run_frame(&mut Recording::default(), |e| errors.borrow_mut().push(e));
        assert!(ran.get());
        assert!(matches!(errors.borrow()[0], RenderError::NoActiveCamera));
    }

    #[test]
    fn stopping_a_clone_stops_the_loop() {
        let mut loops = RenderLoops::default();
        let handle = loops.register(Box::new(|_: &mut dyn Renderer| Ok(())));
        let clone = handle.clone();
        clone.stop();
        assert!(!handle.is_running());
        assert!(loops.all_stopped());
        assert_eq!(loops.entries.len(), 1);
        loops.run_frame(&mut Recording::default(), |_| {});
        assert!(loops.entries.is_empty());
    }
}
