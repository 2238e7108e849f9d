//! The GPU engine and its winit event loop.
//!
//! [`GpuEngine`] implements [`Engine`] on top of wgpu. Creating it only records
//! the surface; the window (or canvas binding) and the GPU context are created
//! once [`GpuEngine::run`] starts the event loop.
//!
//! # Lifecycle
//!
//! 1. `resumed` opens the window and initializes the [`Context`] (blocking on
//!    native, through an event-loop user event in the browser)
//! 2. window events feed the camera controller, resize the surface or close the app
//! 3. `RedrawRequested` advances time and the camera, runs every registered
//!    render loop against a [`GpuRenderer`], presents, and requests the next frame
//! 4. textures the scene asked for are loaded in the background and delivered
//!    back as user events

use std::sync::Arc;

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
};

use crate::{
    composer::{Composition, compose},
    config::{EngineOptions, SceneConfig},
    context::Context,
    engine::{Engine, RenderCallback, RenderLoop, RenderLoops},
    error::{RenderError, SceneError},
    host::DisplaySurface,
    render::{GpuRenderer, ViewState},
    resources::{scene::SceneResources, texture::load_binary},
};

/// Renders through wgpu into a native window or a browser canvas.
pub struct GpuEngine {
    surface: DisplaySurface,
    options: EngineOptions,
    loops: RenderLoops,
}

impl Engine for GpuEngine {
    fn create(surface: DisplaySurface, options: &EngineOptions) -> Result<Self, SceneError> {
        Ok(Self {
            surface,
            options: options.clone(),
            loops: RenderLoops::default(),
        })
    }

    fn surface(&self) -> &DisplaySurface {
        &self.surface
    }

    fn run_render_loop(&mut self, callback: RenderCallback) -> RenderLoop {
        self.loops.register(callback)
    }
}

impl GpuEngine {
    /// Runs the event loop until the window is closed.
    pub fn run(self) -> anyhow::Result<()> {
        let event_loop: EventLoop<EngineEvent> = EventLoop::with_user_event().build()?;
        let mut app = App::new(&event_loop, self)?;
        event_loop.run_app(&mut app)?;
        Ok(())
    }
}

pub(crate) enum EngineEvent {
    /// The browser finished creating the GPU context.
    #[allow(dead_code)]
    Initialized(Box<Context>),
    TextureLoaded {
        path: String,
        bytes: Result<Vec<u8>, String>,
    },
}

struct AppState {
    ctx: Context,
    resources: SceneResources,
    view: ViewState,
}

impl AppState {
    fn new(ctx: Context) -> Self {
        let resources = SceneResources::new(&ctx);
        let view = ViewState::new(ctx.config.width, ctx.config.height);
        Self {
            ctx,
            resources,
            view,
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.resize(width, height);
            self.view.resize(width, height);
        }
    }
}

struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<EngineEvent>,
    engine: GpuEngine,
    state: Option<AppState>,
    started: bool,
    last_time: Instant,
}

impl App {
    fn new(event_loop: &EventLoop<EngineEvent>, engine: GpuEngine) -> anyhow::Result<Self> {
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy: event_loop.create_proxy(),
            engine,
            state: None,
            started: false,
            last_time: Instant::now(),
        })
    }

    fn install(&mut self, ctx: Context) {
        let mut state = AppState::new(ctx);
        let size = state.ctx.window.inner_size();
        state.resize(size.width, size.height);
        state.ctx.window.request_redraw();
        self.last_time = Instant::now();
        self.state = Some(state);
    }
}

impl ApplicationHandler<EngineEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.started {
            return;
        }
        self.started = true;

        let attributes = self.engine.surface.window_attributes(&self.engine.options);
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Cannot open window for `{}`: {}", self.engine.surface.id(), e);
                event_loop.exit();
                return;
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(Context::new(window)) {
                Ok(ctx) => self.install(ctx),
                Err(e) => {
                    log::error!("App initialization failed. Cannot create the main context: {:#}", e);
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match Context::new(window).await {
                    Ok(ctx) => {
                        if proxy.send_event(EngineEvent::Initialized(Box::new(ctx))).is_err() {
                            log::error!("Event loop closed before the context was ready");
                        }
                    }
                    Err(e) => {
                        log::error!("App initialization failed. Cannot create the main context: {:#}", e)
                    }
                }
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: EngineEvent) {
        match event {
            EngineEvent::Initialized(ctx) => self.install(*ctx),
            EngineEvent::TextureLoaded { path, bytes } => {
                if let Some(state) = &mut self.state {
                    state.resources.texture_loaded(&state.ctx, &path, bytes);
                    state.ctx.window.request_redraw();
                }
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.view.handle_window_events(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();
                state.view.advance(dt);

                let mut lost = false;
                let mut renderer =
                    GpuRenderer::new(&mut state.ctx, &mut state.resources, &mut state.view);
                self.engine.loops.run_frame(&mut renderer, |e| match e {
                    // Reconfigure the surface if it's lost or outdated
                    RenderError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        lost = true
                    }
                    e => log::error!("Unable to render {}", e),
                });
                renderer.present();

                if lost {
                    let size = state.ctx.window.inner_size();
                    state.resize(size.width, size.height);
                }

                spawn_texture_loads(
                    #[cfg(not(target_arch = "wasm32"))]
                    &self.async_runtime,
                    &self.proxy,
                    state.resources.take_texture_requests(),
                );

                if self.engine.loops.all_stopped() {
                    log::info!("all render loops stopped");
                } else {
                    state.ctx.window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

fn spawn_texture_loads(
    #[cfg(not(target_arch = "wasm32"))] async_runtime: &tokio::runtime::Runtime,
    proxy: &EventLoopProxy<EngineEvent>,
    paths: Vec<String>,
) {
    for path in paths {
        let proxy = proxy.clone();
        let load = async move {
            let bytes = load_binary(&path).await.map_err(|e| format!("{:#}", e));
            if proxy
                .send_event(EngineEvent::TextureLoaded { path, bytes })
                .is_err()
            {
                log::warn!("Event loop closed before a texture finished loading");
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        async_runtime.spawn(load);

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(load);
    }
}

/// Sets up logging, composes the showcase scene on the platform's display
/// surface and runs it until the window closes.
pub fn run() -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| anyhow::anyhow!("Could not initialize logger: {}", e))?;
    }

    #[cfg(not(target_arch = "wasm32"))]
    let host = crate::host::DesktopHost;
    #[cfg(target_arch = "wasm32")]
    let host = crate::host::BrowserHost;

    let Composition { engine, .. } =
        compose::<GpuEngine>(&host, &SceneConfig::default(), &EngineOptions::default())?;
    engine.run()
}
