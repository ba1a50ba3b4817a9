//! Windowed host: winit for the event loop, softbuffer for presentation.
//!
//! | Key | Action |
//! |-----|--------|
//! | `1`-`7` | select a variant |
//! | `T` | toggle the theme |
//! | `Space` | pause or resume |
//! | `S` | write a PNG snapshot |
//! | `Esc` | quit |

use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::ViewerError;
use crate::scheduler::{FrameHandle, Scheduler};
use crate::variants::VariantKind;

/// Schedules frames as window redraw requests.
///
/// winit cannot withdraw a redraw request, so `cancel` does nothing; the
/// engine ignores the stale redraw that follows.
#[derive(Debug, Default)]
pub struct WinitScheduler {
    window: Option<Arc<Window>>,
    next_id: u64,
}

impl WinitScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, window: Arc<Window>) {
        self.window = Some(window);
    }
}

impl Scheduler for WinitScheduler {
    fn schedule(&mut self) -> FrameHandle {
        self.next_id += 1;
        if let Some(window) = &self.window {
            window.request_redraw();
        }
        FrameHandle(self.next_id)
    }

    fn cancel(&mut self, _handle: FrameHandle) {}
}

/// Viewer window settings.
#[derive(Debug, Clone)]
pub struct ViewerOptions {
    /// Initial logical window size.
    pub width: f32,
    pub height: f32,
    /// Where `S` writes snapshots.
    pub snapshot_path: PathBuf,
}

struct Presenter {
    surface: softbuffer::Surface<Arc<Window>, Arc<Window>>,
    size: (u32, u32),
}

impl Presenter {
    fn new(window: Arc<Window>) -> Result<Self, ViewerError> {
        let context = softbuffer::Context::new(Arc::clone(&window))?;
        let surface = softbuffer::Surface::new(&context, window)?;
        Ok(Self { surface, size: (0, 0) })
    }

    fn present(&mut self, engine: &Engine<WinitScheduler>) -> Result<(), ViewerError> {
        let Some(canvas) = engine.surface().canvas() else {
            return Ok(());
        };
        let size = (canvas.width(), canvas.height());
        let (Some(w), Some(h)) = (NonZeroU32::new(size.0), NonZeroU32::new(size.1)) else {
            return Ok(());
        };
        if size != self.size {
            self.surface.resize(w, h)?;
            self.size = size;
        }
        let mut buffer = self.surface.buffer_mut()?;
        canvas.write_xrgb(engine.theme().palette().background, &mut buffer);
        buffer.present()?;
        Ok(())
    }
}

struct App {
    engine: Engine<WinitScheduler>,
    options: ViewerOptions,
    window: Option<Arc<Window>>,
    presenter: Option<Presenter>,
    clock: Instant,
    paused: bool,
    error: Option<ViewerError>,
}

impl App {
    fn new(config: EngineConfig, options: ViewerOptions) -> Self {
        Self {
            engine: Engine::new(config, WinitScheduler::new()),
            options,
            window: None,
            presenter: None,
            clock: Instant::now(),
            paused: false,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: ViewerError) {
        error!(%err, "viewer stopped");
        self.engine.dispose();
        self.error = Some(err);
        event_loop.exit();
    }

    /// Re-read the window's size after a resize or scale change.
    fn sync_size(&mut self) {
        let Some(window) = &self.window else {
            return;
        };
        let scale = window.scale_factor();
        let logical: LogicalSize<f32> = window.inner_size().to_logical(scale);
        self.engine.resize(logical.width, logical.height, scale as f32);
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, code: KeyCode) {
        let digit = match code {
            KeyCode::Digit1 => Some(0),
            KeyCode::Digit2 => Some(1),
            KeyCode::Digit3 => Some(2),
            KeyCode::Digit4 => Some(3),
            KeyCode::Digit5 => Some(4),
            KeyCode::Digit6 => Some(5),
            KeyCode::Digit7 => Some(6),
            _ => None,
        };
        if let Some(i) = digit {
            self.engine.select_variant(VariantKind::ALL[i]);
            return;
        }

        match code {
            KeyCode::KeyT => {
                let theme = self.engine.theme().toggled();
                self.engine.set_theme(theme);
                // A paused engine still shows the new colours.
                self.engine.render();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            KeyCode::Space => {
                self.paused = !self.paused;
                if self.paused {
                    self.engine.stop();
                } else {
                    self.engine.start();
                }
                info!(paused = self.paused, "toggled pause");
            }
            KeyCode::KeyS => {
                if let Err(err) = self.engine.snapshot(&self.options.snapshot_path) {
                    warn!(%err, "snapshot failed");
                }
            }
            KeyCode::Escape => {
                self.engine.dispose();
                event_loop.exit();
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attrs = Window::default_attributes()
            .with_title("backdrop")
            .with_inner_size(LogicalSize::new(self.options.width, self.options.height));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => return self.fail(event_loop, err.into()),
        };
        let presenter = match Presenter::new(Arc::clone(&window)) {
            Ok(presenter) => presenter,
            Err(err) => return self.fail(event_loop, err),
        };
        self.engine.scheduler_mut().attach(Arc::clone(&window));
        self.window = Some(window);
        self.presenter = Some(presenter);

        self.sync_size();
        self.engine.start();
        info!(variant = %self.engine.variant().kind(), theme = %self.engine.theme(), "viewer started");
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.engine.dispose();
                event_loop.exit();
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                self.sync_size();
            }
            WindowEvent::Occluded(hidden) => {
                if hidden {
                    self.engine.stop();
                } else if !self.paused {
                    self.engine.start();
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(event_loop, code),
            WindowEvent::CursorMoved { .. } | WindowEvent::Touch(_) => {
                self.engine.handle_window_event(&event);
            }
            WindowEvent::RedrawRequested => {
                self.engine.pump(self.clock.elapsed());
                let presented = match &mut self.presenter {
                    Some(presenter) => presenter.present(&self.engine),
                    None => Ok(()),
                };
                if let Err(err) = presented {
                    self.fail(event_loop, err);
                }
            }
            _ => {}
        }
    }
}

/// Open a window and run until it is closed.
pub fn run(config: EngineConfig, options: ViewerOptions) -> Result<(), ViewerError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config, options);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
