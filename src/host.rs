//! Display surface discovery.
//!
//! The composer asks a [`Host`] for the surface it should render into. In the
//! browser that is a `<canvas>` element looked up by id; natively the surface
//! is realized as a window once the engine starts.

use crate::config::EngineOptions;

/// A render target provided by the host environment.
#[derive(Clone, Debug)]
pub struct DisplaySurface {
    id: String,
    #[cfg(target_arch = "wasm32")]
    canvas: Option<web_sys::HtmlCanvasElement>,
}

impl DisplaySurface {
    /// A surface without a backing element. The GPU engine opens a window for it.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            #[cfg(target_arch = "wasm32")]
            canvas: None,
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn from_canvas(id: impl Into<String>, canvas: web_sys::HtmlCanvasElement) -> Self {
        Self {
            id: id.into(),
            canvas: Some(canvas),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    #[cfg(target_arch = "wasm32")]
    pub fn canvas(&self) -> Option<&web_sys::HtmlCanvasElement> {
        self.canvas.as_ref()
    }

    pub(crate) fn window_attributes(&self, options: &EngineOptions) -> winit::window::WindowAttributes {
        #[allow(unused_mut)]
        let mut attributes = winit::window::Window::default_attributes().with_title(options.title.clone());

        #[cfg(not(target_arch = "wasm32"))]
        {
            attributes = attributes.with_inner_size(winit::dpi::LogicalSize::new(
                options.width,
                options.height,
            ));
        }

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;
            attributes = attributes.with_canvas(self.canvas.clone());
        }

        attributes
    }
}

/// Looks up display surfaces by id.
pub trait Host {
    fn find_surface(&self, id: &str) -> Option<DisplaySurface>;
}

/// Native host: every id resolves, the window is created when the engine runs.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct DesktopHost;

#[cfg(not(target_arch = "wasm32"))]
impl Host for DesktopHost {
    fn find_surface(&self, id: &str) -> Option<DisplaySurface> {
        Some(DisplaySurface::new(id))
    }
}

/// Browser host: resolves ids to `<canvas>` elements of the current document.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
pub struct BrowserHost;

#[cfg(target_arch = "wasm32")]
impl Host for BrowserHost {
    fn find_surface(&self, id: &str) -> Option<DisplaySurface> {
        use wasm_bindgen::JsCast;

        let document = web_sys::window()?.document()?;
        let canvas = document
            .get_element_by_id(id)?
            .dyn_into::<web_sys::HtmlCanvasElement>()
            .ok()?;
        Some(DisplaySurface::from_canvas(id, canvas))
    }
}
