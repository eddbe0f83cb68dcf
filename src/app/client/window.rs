use std::{
    sync::Arc,
    time::{
        Duration,
        Instant
    }
};

use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{
        ElementState,
        WindowEvent
    },
    event_loop::{
        ActiveEventLoop,
        EventLoop
    },
    keyboard::{
        Key,
        NamedKey
    },
    platform::pump_events::{
        EventLoopExtPumpEvents,
        PumpStatus
    },
    window::{
        Window,
        WindowId
    }
};

use crate::view::{
    frame_loop::{
        FrameRenderer,
        LoopExit
    },
    overlay::OverlayBox,
    scale::WindowConfig,
    shapes::AgentShape
};

use super::{
    renderer::{
        Renderer,
        RendererError
    },
    tessellation::FrameBatch
};

const WINDOW_OPEN_TIMEOUT: Duration = Duration::from_secs(5);
const WINDOW_OPEN_POLL: Duration = Duration::from_millis(10);

#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error("Could not create window, reason='{0}'")]
    Os(#[from] winit::error::OsError),

    #[error("Could not create renderer, reason='{0}'")]
    Renderer(#[from] RendererError),

    #[error("Event loop exited before the window opened")]
    EventLoopExited,

    #[error("Window did not open within {0:?}")]
    OpenTimeout(Duration),
}

struct ViewerApp<'m> {
    title: String,
    window_config: WindowConfig,
    background: &'m image::RgbaImage,
    renderer: Option<Renderer>,
    error: Option<WindowError>,
    quit: Option<LoopExit>,
    batch: FrameBatch,
    closing: bool,
}

impl ViewerApp<'_> {
    /// Windows can only be created from inside the event loop, so this runs from the handlers.
    fn ensure_window(&mut self, event_loop: &ActiveEventLoop) {
        if self.closing || self.renderer.is_some() || self.error.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(LogicalSize::new(self.window_config.width, self.window_config.height))
            .with_resizable(false);

        let result = event_loop
            .create_window(attributes)
            .map_err(WindowError::from)
            .and_then(|window| {
                pollster::block_on(Renderer::new(Arc::new(window), self.background))
                    .map_err(WindowError::from)
            });

        match result {
            Ok(renderer) => {
                renderer.get_window().request_redraw();
                self.renderer = Some(renderer);
            },
            Err(e) => self.error = Some(e),
        }
    }
}

impl ApplicationHandler for ViewerApp<'_> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        self.ensure_window(event_loop);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.ensure_window(event_loop);
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::debug!("The close button was pressed");
                self.quit = Some(LoopExit::WindowClosed);
            },
            WindowEvent::KeyboardInput { device_id: _, event, is_synthetic: _ } => {
                if event.state == ElementState::Pressed && event.logical_key == Key::Named(NamedKey::Escape) {
                    self.quit = Some(LoopExit::WindowClosed);
                }
            },
            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size);
                }
            },
            _ => (),
        }
    }
}

/// Display window of one session. Closed when dropped.
pub struct ViewerWindow<'e, 'm> {
    event_loop: &'e mut EventLoop<()>,
    app: ViewerApp<'m>,
}

impl<'e, 'm> ViewerWindow<'e, 'm> {
    pub fn open(
        event_loop: &'e mut EventLoop<()>,
        title: &str,
        window_config: WindowConfig,
        background: &'m image::RgbaImage,
    ) -> Result<Self, WindowError> {
        let mut app = ViewerApp {
            title: title.to_string(),
            window_config,
            background,
            renderer: None,
            error: None,
            quit: None,
            batch: FrameBatch::default(),
            closing: false,
        };

        let deadline = Instant::now() + WINDOW_OPEN_TIMEOUT;
        while app.renderer.is_none() {
            if let PumpStatus::Exit(_) = event_loop.pump_app_events(Some(WINDOW_OPEN_POLL), &mut app) {
                return Err(WindowError::EventLoopExited);
            }
            if let Some(e) = app.error.take() {
                return Err(e);
            }
            if Instant::now() > deadline {
                return Err(WindowError::OpenTimeout(WINDOW_OPEN_TIMEOUT));
            }
        }

        log::info!("Window opened {}x{}", window_config.width, window_config.height);
        Ok(Self { event_loop, app })
    }
}

impl FrameRenderer for ViewerWindow<'_, '_> {
    fn poll_quit(&mut self) -> Option<LoopExit> {
        if let PumpStatus::Exit(_) = self.event_loop.pump_app_events(Some(Duration::ZERO), &mut self.app) {
            return Some(LoopExit::WindowClosed);
        }
        self.app.quit
    }

    fn draw_background(&mut self) {
        // the map texture is drawn first by `Renderer::render`
        self.app.batch.clear();
    }

    fn draw_overlay_box(&mut self, overlay_box: &OverlayBox) {
        self.app.batch.push_overlay_box(overlay_box);
    }

    fn draw_shape(&mut self, shape: &AgentShape) {
        self.app.batch.push_shape(shape);
    }

    fn present(&mut self) {
        let logical_size = self.app.window_config.size();
        if let Some(renderer) = self.app.renderer.as_mut() {
            renderer.render(&self.app.batch, logical_size);
        }
    }
}

impl Drop for ViewerWindow<'_, '_> {
    fn drop(&mut self) {
        self.app.closing = true;
        self.app.renderer = None;
        // let the platform process the window destruction
        let _ = self.event_loop.pump_app_events(Some(Duration::ZERO), &mut self.app);
        log::debug!("Window closed");
    }
}
