//! # backdrop
//!
//! Interactive 2D particle backdrops: pointer-reactive background
//! animations rendered on the CPU into a pixel canvas.
//!
//! ## Quick Start
//!
//! ```ignore
//! use backdrop::prelude::*;
//!
//! let config = EngineConfig {
//!     variant: VariantKind::BlackHole,
//!     seed: Some(42),
//!     ..EngineConfig::default()
//! };
//! let mut engine = Engine::new(config, ManualScheduler::new());
//! engine.mount(1280.0, 720.0, 1.0);
//! engine.pointer_moved(Vec2::new(640.0, 360.0));
//!
//! for i in 1..=120 {
//!     engine.pump(Duration::from_micros(16_667 * i));
//! }
//! engine.snapshot("frame.png")?;
//! ```
//!
//! ## Core Concepts
//!
//! ### Variants
//!
//! A variant is one kind of background: it owns a pool of agents, advances
//! them once per frame, and paints them. Seven are built in; see
//! [`variants`] for the full table.
//!
//! ### The frame loop
//!
//! The [`Engine`] never spins on its own. It asks a [`Scheduler`] for the
//! next frame and runs exactly one step and one render when the host fires
//! that frame. The windowed viewer schedules with redraw requests; tests
//! and headless runs use [`ManualScheduler`] and fire frames by hand.
//!
//! ### Coordinates
//!
//! Simulation and pointer input use logical pixels. The canvas is
//! allocated at `logical * pixel_ratio` and all painting is scaled, so
//! output stays sharp on high-density displays.
//!
//! ### Pointer
//!
//! Mouse moves and touches are folded into one pointer position. The
//! static field and black hole variants ease the pointer back to the
//! viewport centre once a touch is released.
//!
//! ## Configuration
//!
//! Every tunable has a default in [`EngineConfig`]. A TOML file only
//! needs the values it changes; see [`config`].

pub mod config;
pub mod engine;
pub mod error;
pub mod glyphs;
pub mod input;
pub mod paint;
pub mod scheduler;
pub mod snapshot;
mod spatial;
pub mod surface;
pub mod theme;
pub mod time;
pub mod variants;
pub mod viewer;

pub use config::{EngineConfig, Profile, Span};
pub use engine::Engine;
pub use error::{ConfigError, ParseKindError, SnapshotError, ViewerError};
pub use glam::{Vec2, Vec3, Vec4};
pub use input::{InputTracker, PointerState};
pub use scheduler::{FrameDriver, FrameHandle, ManualScheduler, Scheduler};
pub use surface::{Canvas, Surface, Viewport};
pub use theme::{Palette, Theme};
pub use time::Time;
pub use variants::{Agent, Variant, VariantKind};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use backdrop::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{EngineConfig, Profile};
    pub use crate::engine::Engine;
    pub use crate::scheduler::{ManualScheduler, Scheduler};
    pub use crate::theme::Theme;
    pub use crate::variants::{Agent, Variant, VariantKind};
    pub use crate::{Vec2, Vec3};
    pub use std::time::Duration;
}
