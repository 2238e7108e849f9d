//! An [`Engine`] without a GPU.
//!
//! Frames are produced on demand with [`HeadlessEngine::tick`]. Every scene a
//! render loop hands to the renderer is planned exactly like the GPU engine
//! would plan it, and the outcome is recorded as [`FrameStats`].

use std::collections::HashMap;

use cgmath::Point3;

use crate::{
    config::EngineOptions,
    data_structures::{
        material::MaterialKind,
        scene::{MeshId, Scene},
    },
    engine::{Engine, RenderCallback, RenderLoop, RenderLoops, Renderer},
    error::{RenderError, SceneError},
    host::{DisplaySurface, Host},
    render::{PassKind, plan_frame},
};

/// A host that knows a fixed set of surface ids.
#[derive(Clone, Debug, Default)]
pub struct HeadlessHost {
    surfaces: Vec<String>,
}

impl HeadlessHost {
    pub fn new<I, S>(surfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            surfaces: surfaces.into_iter().map(Into::into).collect(),
        }
    }
}

impl Host for HeadlessHost {
    fn find_surface(&self, id: &str) -> Option<DisplaySurface> {
        self.surfaces
            .iter()
            .any(|s| s == id)
            .then(|| DisplaySurface::new(id))
    }
}

/// What one rendered scene would have put on screen.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameStats {
    /// Meshes drawn in the main pass, in draw order.
    pub drawn: Vec<MeshId>,
    /// Main pass draws per material kind; `None` counts meshes without material.
    pub by_kind: HashMap<Option<MaterialKind>, usize>,
    pub reflection_passes: usize,
    pub refraction_passes: usize,
    /// Meshes drawn by each offscreen pass, in pass order.
    pub offscreen_draws: Vec<Vec<MeshId>>,
    pub camera_position: Point3<f32>,
}

#[derive(Default)]
struct Recorder {
    frames: Vec<FrameStats>,
}

impl Renderer for Recorder {
    fn render_scene(&mut self, scene: &Scene) -> Result<(), RenderError> {
        let plan = plan_frame(scene)?;
        let camera = scene.active_camera().ok_or(RenderError::NoActiveCamera)?;

        let mut stats = FrameStats {
            drawn: Vec::new(),
            by_kind: HashMap::new(),
            reflection_passes: 0,
            refraction_passes: 0,
            offscreen_draws: Vec::new(),
            camera_position: camera.position,
        };
        for item in &plan.main {
            stats.drawn.push(item.mesh);
            *stats.by_kind.entry(item.pipeline.kind).or_default() += 1;
        }
        for pass in &plan.offscreen {
            match pass.kind {
                PassKind::Reflection => stats.reflection_passes += 1,
                PassKind::Refraction => stats.refraction_passes += 1,
            }
            stats
                .offscreen_draws
                .push(pass.draws.iter().map(|d| d.mesh).collect());
        }
        log::trace!("headless frame {:?}", stats);
        self.frames.push(stats);
        Ok(())
    }
}

pub struct HeadlessEngine {
    surface: DisplaySurface,
    loops: RenderLoops,
    recorder: Recorder,
    ticks: usize,
    errors: Vec<RenderError>,
}

impl HeadlessEngine {
    /// Produces one frame. Returns how many render loops ran.
    pub fn tick(&mut self) -> usize {
        self.ticks += 1;
        let errors = &mut self.errors;
        self.loops.run_frame(&mut self.recorder, |e| {
            log::error!("render loop failed: {}", e);
            errors.push(e);
        })
    }

    pub fn tick_n(&mut self, n: usize) {
        for _ in 0..n {
            self.tick();
        }
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    /// Recorded scene renders, oldest first.
    pub fn frames(&self) -> &[FrameStats] {
        &self.recorder.frames
    }

    /// Hands over the recorded frames and starts recording afresh.
    /// Long-running drivers call this to keep memory bounded.
    pub fn take_frames(&mut self) -> Vec<FrameStats> {
        std::mem::take(&mut self.recorder.frames)
    }

    pub fn errors(&self) -> &[RenderError] {
        &self.errors
    }

    pub fn take_errors(&mut self) -> Vec<RenderError> {
        std::mem::take(&mut self.errors)
    }
}

impl Engine for HeadlessEngine {
    fn create(surface: DisplaySurface, _options: &EngineOptions) -> Result<Self, SceneError> {
        log::debug!("headless engine on surface {}", surface.id());
        Ok(Self {
            surface,
            loops: RenderLoops::default(),
            recorder: Recorder::default(),
            ticks: 0,
            errors: Vec::new(),
        })
    }

    fn surface(&self) -> &DisplaySurface {
        &self.surface
    }

    fn run_render_loop(&mut self, callback: RenderCallback) -> RenderLoop {
        self.loops.register(callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{camera::FreeCamera, data_structures::mesh::Mesh};
    use std::rc::Rc;

    #[test]
    fn host_only_knows_its_surfaces() {
        let host = HeadlessHost::new(["a"]);
        assert_eq!(host.find_surface("a").map(|s| s.id().to_string()), Some("a".into()));
        assert!(host.find_surface("b").is_none());
    }

    #[test]
    fn errors_are_collected_per_frame() {
        let mut engine =
            HeadlessEngine::create(DisplaySurface::new("a"), &EngineOptions::default()).unwrap();
        let empty = Rc::new(Scene::new());
        engine.run_render_loop(Box::new(move |r: &mut dyn Renderer| r.render_scene(&empty)));
        engine.tick_n(2);
        assert_eq!(engine.errors().len(), 2);
        assert!(engine.frames().is_empty());
        assert_eq!(engine.ticks(), 2);
    }

    #[test]
    fn taking_frames_and_errors_drains_them() {
        let mut scene = Scene::new();
        scene.add_camera(FreeCamera::new("c", Point3::new(0.0, 1.0, 0.0)));
        let scene = Rc::new(scene);
        let empty = Rc::new(Scene::new());
        let mut engine =
            HeadlessEngine::create(DisplaySurface::new("a"), &EngineOptions::default()).unwrap();
        engine.run_render_loop(Box::new(move |r: &mut dyn Renderer| r.render_scene(&scene)));
        engine.run_render_loop(Box::new(move |r: &mut dyn Renderer| r.render_scene(&empty)));
        engine.tick_n(3);
        assert_eq!(engine.take_frames().len(), 3);
        assert_eq!(engine.take_errors().len(), 3);
        assert!(engine.frames().is_empty());
        assert!(engine.errors().is_empty());
        engine.tick();
        assert_eq!(engine.frames().len(), 1);
        assert_eq!(engine.ticks(), 4);
    }

    #[test]
    fn records_main_pass() {
        let mut scene = Scene::new();
        scene.add_camera(FreeCamera::new("c", Point3::new(1.0, 2.0, 3.0)));
        scene.add_mesh(Mesh::create_box("box", 1.0));
        let scene = Rc::new(scene);
        let mut engine =
            HeadlessEngine::create(DisplaySurface::new("a"), &EngineOptions::default()).unwrap();
        engine.run_render_loop(Box::new(move |r: &mut dyn Renderer| r.render_scene(&scene)));
        assert_eq!(engine.tick(), 1);
        let frame = &engine.frames()[0];
        assert_eq!(frame.drawn.len(), 1);
        assert_eq!(frame.by_kind.get(&None), Some(&1));
        assert_eq!(frame.camera_position, Point3::new(1.0, 2.0, 3.0));
    }
}
