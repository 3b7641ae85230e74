//! winit event loop — window lifecycle and the redraw handler.

use std::sync::Arc;

use log::info;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

use crate::demo;
use crate::font::{FontError, FontFace};
use crate::gpu::{Gpu, GpuError, Renderer};

/// Startup failure, mapped to the process exit code in `main`.
#[derive(Debug)]
pub enum RunError {
    Font(FontError),
    Gpu(GpuError),
    EventLoop(String),
}

impl RunError {
    /// Font problems exit with 1, windowing/GPU problems with -1.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Font(_) => 1,
            RunError::Gpu(_) | RunError::EventLoop(_) => -1,
        }
    }
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::Font(e) => write!(f, "font: {e}"),
            RunError::Gpu(e) => write!(f, "gpu: {e}"),
            RunError::EventLoop(e) => write!(f, "event loop: {e}"),
        }
    }
}

impl std::error::Error for RunError {}

struct WindowState {
    window: Arc<Window>,
    gpu: Gpu,
    renderer: Renderer,
}

pub struct App {
    /// Taken (and dropped) during window creation: the face is only
    /// needed for the one-time glyph preload.
    face: Option<FontFace>,
    state: Option<WindowState>,
    init_error: Option<RunError>,
}

impl App {
    /// Load the font, run the event loop until the window closes, and
    /// surface any startup failure to the caller.
    pub fn run() -> Result<(), RunError> {
        // Font loading happens before any windowing so a missing font
        // fails fast with its own exit code.
        let face = FontFace::load(demo::FONT_PIXEL_SIZE).map_err(RunError::Font)?;

        let event_loop = EventLoop::new().map_err(|e| RunError::EventLoop(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Wait);

        let mut app = App {
            face: Some(face),
            state: None,
            init_error: None,
        };
        event_loop
            .run_app(&mut app)
            .map_err(|e| RunError::EventLoop(e.to_string()))?;

        match app.init_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn create_state(event_loop: &ActiveEventLoop, face: &FontFace) -> Result<WindowState, RunError> {
        let attrs = Window::default_attributes()
            .with_title(demo::TEXT)
            .with_inner_size(LogicalSize::new(demo::WIDTH, demo::HEIGHT));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .map_err(|e| RunError::Gpu(GpuError(format!("create window: {e}"))))?,
        );

        let gpu = Gpu::new(&window).map_err(RunError::Gpu)?;
        let mut renderer = Renderer::new(&gpu);
        renderer.preload(&gpu, face, demo::TEXT);

        info!("window: {}x{}", demo::WIDTH, demo::HEIGHT);

        Ok(WindowState {
            window,
            gpu,
            renderer,
        })
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let Some(face) = self.face.take() else {
            return;
        };
        // The face drops at the end of this scope; only the glyph cache
        // needs it, and that is now populated.
        match Self::create_state(event_loop, &face) {
            Ok(state) => {
                state.window.request_redraw();
                self.state = Some(state);
            }
            Err(e) => {
                self.init_error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed
                    && event.logical_key == Key::Named(NamedKey::Escape)
                {
                    event_loop.exit();
                }
            }
            WindowEvent::Resized(size) => {
                state.gpu.resize(size.width, size.height);
                state.window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                state.renderer.draw_frame(&state.gpu);
                // Continuous redraw, vsync-paced: the vivid line re-rolls
                // its colors when the wall-clock second ticks over.
                state.window.request_redraw();
            }
            _ => {}
        }
    }
}
