//! seascape
//!
//! A small scene composer on top of a wgpu renderer: a free camera, a
//! hemispheric light, an atmospheric sky box, a grid-shaded sphere and ground,
//! and an animated water plane that reflects and refracts them. Runs natively
//! in a window and in the browser on a `<canvas id="renderCanvas">`.
//!
//! High-level modules
//! - `composer`: builds the scene and registers its render loop with an engine
//! - `engine`: the `Engine`/`Renderer` traits and render loop handles
//! - `flow`: the wgpu/winit engine and the application entry point
//! - `headless`: an engine that plans frames without a GPU, for tests
//! - `camera`: free camera, input controller and view uniforms
//! - `context`: GPU device, surface and per-frame bindings
//! - `data_structures`: scene graph, meshes, geometry, materials, lights
//! - `pipelines`: sky, grid, water and default lit pipelines with their shaders
//! - `resources`: asset loading and GPU copies of scene data
//! - `render`: frame planning and GPU rendering
//! - `config`: literal scene parameters and engine options

pub mod camera;
pub mod composer;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod engine;
pub mod error;
pub mod flow;
pub mod headless;
pub mod host;
pub mod pipelines;
pub mod render;
pub mod resources;

pub use composer::{Composition, SceneContext, build_scene, compose};
pub use engine::{Engine, RenderLoop, Renderer};
pub use error::{RenderError, SceneError};
pub use flow::{GpuEngine, run};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), JsValue> {
    run().map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}
