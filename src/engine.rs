//! The engine: one surface, one variant, one frame loop.
//!
//! An [`Engine`] owns everything a running background needs. Hosts feed it
//! viewport changes and pointer events, and fire the frame handles its
//! [`Scheduler`] hands out. Each fired frame runs exactly one simulation
//! step followed by exactly one render.
//!
//! ```ignore
//! let mut engine = Engine::new(EngineConfig::default(), ManualScheduler::new());
//! engine.mount(800.0, 600.0, 2.0);
//! engine.pointer_moved(Vec2::new(400.0, 300.0));
//! engine.pump(Duration::from_millis(16));
//! ```

use std::path::Path;
use std::time::Duration;

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, info, trace};
use winit::event::WindowEvent;

use crate::config::{EngineConfig, Profile};
use crate::error::SnapshotError;
use crate::input::InputTracker;
use crate::scheduler::{FrameDriver, FrameHandle, Scheduler};
use crate::snapshot;
use crate::surface::Surface;
use crate::theme::Theme;
use crate::time::Time;
use crate::variants::{self, PaintContext, StepContext, Variant, VariantKind};

/// Owns one surface and one running variant, and drives both from the
/// scheduler `S`.
///
/// The host forwards input and resizes; the engine steps the variant and
/// paints it once per scheduled frame.
pub struct Engine<S: Scheduler> {
    config: EngineConfig,
    profile: Profile,
    surface: Surface,
    input: InputTracker,
    variant: Box<dyn Variant>,
    theme: Theme,
    driver: FrameDriver<S>,
    time: Time,
    rng: SmallRng,
}

impl<S: Scheduler> Engine<S> {
    /// An unmounted engine. Nothing is drawn until [`mount`](Self::mount).
    pub fn new(config: EngineConfig, scheduler: S) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let profile = Profile::Desktop;
        let variant = variants::build(config.variant, &config, profile);
        let theme = config.theme;
        Self {
            config,
            profile,
            surface: Surface::new(),
            input: InputTracker::new(),
            variant,
            theme,
            driver: FrameDriver::new(scheduler),
            time: Time::new(),
            rng,
        }
    }

    /// Attach to a viewport and start the frame loop.
    pub fn mount(&mut self, width: f32, height: f32, pixel_ratio: f32) {
        self.resize(width, height, pixel_ratio);
        self.start();
    }

    /// Resize the surface and repopulate the pool for the new bounds.
    ///
    /// The device profile is re-picked from the new logical width. The
    /// pointer keeps its position.
    pub fn resize(&mut self, width: f32, height: f32, pixel_ratio: f32) {
        self.surface.configure(width, height, pixel_ratio);
        let profile = Profile::for_width(self.surface.viewport().width, self.config.mobile_breakpoint);
        if profile != self.profile {
            debug!(?profile, "device profile changed");
            self.profile = profile;
        }
        self.rebuild(self.variant.kind());
    }

    fn rebuild(&mut self, kind: VariantKind) {
        let bounds = self.surface.viewport().bounds();
        let mut variant = variants::build(kind, &self.config, self.profile);
        variant.populate(bounds, &mut self.rng);
        self.input.set_recenter_on_release(variant.recenters_on_release());
        debug!(
            variant = %kind,
            agents = variant.agent_count(),
            width = bounds.x,
            height = bounds.y,
            "populated"
        );
        self.variant = variant;
    }

    /// Switch to another variant. The old pool is dropped and a new one is
    /// populated; a running loop keeps running on the new variant.
    pub fn select_variant(&mut self, kind: VariantKind) {
        let was_running = self.driver.is_running();
        self.driver.stop();
        self.rebuild(kind);
        if was_running {
            self.driver.start();
        }
        info!(variant = %kind, "variant selected");
    }

    pub fn set_theme(&mut self, theme: Theme) {
        if theme != self.theme {
            info!(%theme, "theme changed");
        }
        self.theme = theme;
    }

    pub fn pointer_moved(&mut self, position: Vec2) {
        self.input.on_move(position);
    }

    pub fn touch_started(&mut self, position: Vec2) {
        self.input.on_touch_start(position);
    }

    pub fn touch_moved(&mut self, position: Vec2) {
        self.input.on_touch_move(position);
    }

    /// The primary touch lifted; pointer-field variants ease back to the centre.
    pub fn touch_ended(&mut self) {
        self.input.on_touch_end(self.surface.viewport().center());
    }

    /// Route a winit cursor or touch event. Returns `true` if it was used.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        self.input.handle_window_event(event, self.surface.viewport())
    }

    pub fn start(&mut self) {
        self.driver.start();
    }

    /// Stop the frame loop. Safe to call at any time, any number of times.
    pub fn stop(&mut self) {
        self.driver.stop();
    }

    /// Stop and release the canvas. A later [`resize`](Self::resize) or
    /// [`mount`](Self::mount) brings it back.
    pub fn dispose(&mut self) {
        self.driver.stop();
        self.surface.detach();
        debug!("disposed");
    }

    pub fn is_running(&self) -> bool {
        self.driver.is_running()
    }

    /// The frame handle the loop is waiting on.
    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.driver.pending()
    }

    /// Run the frame for a fired `handle` at host time `now`.
    ///
    /// Stale handles and frames fired after [`stop`](Self::stop) are ignored;
    /// returns whether a frame ran.
    pub fn fire(&mut self, handle: FrameHandle, now: Duration) -> bool {
        if !self.driver.begin_frame(handle) {
            trace!(handle = handle.0, "ignored stale frame");
            return false;
        }
        self.frame(now);
        self.driver.end_frame();
        true
    }

    /// Fire whatever frame is pending. Returns whether a frame ran.
    pub fn pump(&mut self, now: Duration) -> bool {
        match self.driver.pending() {
            Some(handle) => self.fire(handle, now),
            None => false,
        }
    }

    fn frame(&mut self, now: Duration) {
        let (now_ms, dt_ms) = self.time.advance_to(now);
        self.input.tick_release();
        self.input.sample_speed(dt_ms);

        let ctx = StepContext {
            bounds: self.surface.viewport().bounds(),
            pointer: self.input.state(),
            now_ms,
            dt_ms,
        };
        self.variant.step(&ctx, &mut self.rng);
        self.render();
    }

    /// Paint the current state without stepping.
    pub fn render(&mut self) {
        let paint = PaintContext {
            palette: self.theme.palette(),
            theme: self.theme,
            pointer: self.input.current(),
            bounds: self.surface.viewport().bounds(),
        };
        match self.surface.canvas_mut() {
            Some(canvas) => self.variant.render(canvas, &paint),
            None => trace!("no canvas, frame not drawn"),
        }
    }

    /// Write the current canvas, composited over the theme background, as a PNG.
    pub fn snapshot(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        snapshot::save_png(&self.surface, self.theme.palette().background, path)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn variant(&self) -> &dyn Variant {
        self.variant.as_ref()
    }

    pub fn variant_mut(&mut self) -> &mut dyn Variant {
        self.variant.as_mut()
    }

    pub fn input(&self) -> &InputTracker {
        &self.input
    }

    pub fn time(&self) -> &Time {
        &self.time
    }

    pub fn scheduler(&self) -> &S {
        self.driver.scheduler()
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        self.driver.scheduler_mut()
    }
}
