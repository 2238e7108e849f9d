#![allow(dead_code)]

use std::cell::Cell;

use seascape::{
    composer::{Composition, compose},
    config::{CANVAS_ID, EngineOptions, SceneConfig},
    engine::{Engine, RenderCallback, RenderLoop},
    error::SceneError,
    headless::{HeadlessEngine, HeadlessHost},
    host::DisplaySurface,
};

/// The showcase scene composed on a headless engine with a `renderCanvas` surface.
pub fn composed() -> Composition<HeadlessEngine> {
    let host = HeadlessHost::new([CANVAS_ID]);
    compose::<HeadlessEngine>(&host, &SceneConfig::default(), &EngineOptions::default())
        .expect("the headless host provides renderCanvas")
}

thread_local! {
    static ENGINES_CREATED: Cell<usize> = const { Cell::new(0) };
}

pub fn engines_created() -> usize {
    ENGINES_CREATED.with(|c| c.get())
}

/// A headless engine that counts how often one was created on this thread.
pub struct CountingEngine(pub HeadlessEngine);

impl Engine for CountingEngine {
    fn create(surface: DisplaySurface, options: &EngineOptions) -> Result<Self, SceneError> {
        ENGINES_CREATED.with(|c| c.set(c.get() + 1));
        HeadlessEngine::create(surface, options).map(CountingEngine)
    }

    fn surface(&self) -> &DisplaySurface {
        self.0.surface()
    }

    fn run_render_loop(&mut self, callback: RenderCallback) -> RenderLoop {
        self.0.run_render_loop(callback)
    }
}
