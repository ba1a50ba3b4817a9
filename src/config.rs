//! Engine configuration.
//!
//! Every tunable lives here with its default. A TOML file only needs to
//! mention the values it changes:
//!
//! ```toml
//! variant = "black-hole"
//! theme = "light"
//! seed = 42
//!
//! [black_hole.desktop]
//! count = 900
//! spiral = 0.5
//! ```
//!
//! The two pointer-field variants carry separate desktop and mobile profiles;
//! the engine picks one from the logical viewport width each time the surface
//! is resized.

use std::path::Path;

use rand::Rng;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::theme::Theme;
use crate::variants::VariantKind;

/// Closed-open range `[min, max)` sampled uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Uniform sample in `[min, max)`. A collapsed span always yields `min`.
    #[inline]
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        self.min + rng.gen::<f32>() * (self.max - self.min)
    }

    #[inline]
    pub fn contains(&self, v: f32) -> bool {
        v >= self.min && v <= self.max
    }

    fn check(&self, field: &'static str) -> Result<(), ConfigError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(ConfigError::invalid(field, "bounds must be finite"));
        }
        if self.min > self.max {
            return Err(ConfigError::invalid(
                field,
                format!("min {} is greater than max {}", self.min, self.max),
            ));
        }
        Ok(())
    }

    fn check_non_negative(&self, field: &'static str) -> Result<(), ConfigError> {
        self.check(field)?;
        if self.min < 0.0 {
            return Err(ConfigError::invalid(field, "must not be negative"));
        }
        Ok(())
    }
}

/// Device class a configuration profile is tuned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    #[default]
    Desktop,
    Mobile,
}

impl Profile {
    /// Mobile when the logical width is at or below `breakpoint`.
    pub fn for_width(width: f32, breakpoint: f32) -> Self {
        if width <= breakpoint {
            Profile::Mobile
        } else {
            Profile::Desktop
        }
    }
}

/// Built-in defaults for the two device profiles of a config block.
pub trait ProfileDefaults: Sized {
    fn desktop() -> Self;
    fn mobile() -> Self;
}

/// A desktop and a mobile variant of the same settings.
///
/// Each side of a config file overrides only the keys it names; the rest
/// come from that side's own defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profiled<T> {
    pub desktop: T,
    pub mobile: T,
}

impl<T> Profiled<T> {
    pub fn get(&self, profile: Profile) -> &T {
        match profile {
            Profile::Desktop => &self.desktop,
            Profile::Mobile => &self.mobile,
        }
    }
}

impl<T: ProfileDefaults> Default for Profiled<T> {
    fn default() -> Self {
        Self {
            desktop: T::desktop(),
            mobile: T::mobile(),
        }
    }
}

impl<'de, T> Deserialize<'de> for Profiled<T>
where
    T: ProfileDefaults + Serialize + DeserializeOwned,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Sides {
            #[serde(default)]
            desktop: Option<toml::Table>,
            #[serde(default)]
            mobile: Option<toml::Table>,
        }

        let sides = Sides::deserialize(deserializer)?;
        Ok(Self {
            desktop: overlay(T::desktop(), sides.desktop).map_err(D::Error::custom)?,
            mobile: overlay(T::mobile(), sides.mobile).map_err(D::Error::custom)?,
        })
    }
}

/// Apply the keys of `changes` on top of `base`.
fn overlay<T: Serialize + DeserializeOwned>(base: T, changes: Option<toml::Table>) -> Result<T, String> {
    let Some(changes) = changes else {
        return Ok(base);
    };
    let mut merged = match toml::Value::try_from(base).map_err(|e| e.to_string())? {
        toml::Value::Table(table) => table,
        other => return Err(format!("expected a table of defaults, got {}", other.type_str())),
    };
    merged.extend(changes);
    toml::Value::Table(merged).try_into().map_err(|e: toml::de::Error| e.to_string())
}

/// Pointer-revealed constellation of drifting particles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticFieldConfig {
    pub count: usize,
    pub size: Span,
    /// Speed band every particle is clamped into, px/step.
    pub speed: Span,
    pub connection_radius: f32,
    pub pointer_radius: f32,
    pub pointer_force: f32,
    pub max_connections: usize,
    /// Alpha particles ease toward when away from the pointer.
    pub base_alpha: f32,
    pub friction: f32,
    /// Total width of the per-step random velocity nudge.
    pub jitter: f32,
    /// Pointer speed (px/ms) at which the pointer force reaches full strength.
    pub agitation_speed: f32,
    /// Bucket the connection scan with a uniform grid.
    pub use_grid: bool,
}

impl ProfileDefaults for StaticFieldConfig {
    fn desktop() -> Self {
        Self {
            count: 2500,
            size: Span::new(1.5, 2.5),
            speed: Span::new(0.5, 0.7),
            connection_radius: 100.0,
            pointer_radius: 350.0,
            pointer_force: 0.05,
            max_connections: 1000,
            base_alpha: 0.08,
            friction: 0.99,
            jitter: 0.005,
            agitation_speed: 1.0,
            use_grid: true,
        }
    }

    fn mobile() -> Self {
        Self {
            count: 1000,
            size: Span::new(2.0, 3.0),
            speed: Span::new(0.3, 0.6),
            connection_radius: 80.0,
            pointer_radius: 150.0,
            max_connections: 3,
            base_alpha: 0.1,
            ..Self::desktop()
        }
    }
}

impl Default for StaticFieldConfig {
    fn default() -> Self {
        Self::desktop()
    }
}

/// Particles swallowed by a spiralling well under the pointer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlackHoleConfig {
    pub count: usize,
    pub size: Span,
    pub speed: Span,
    pub attraction_radius: f32,
    /// Particles closer than this are captured. Must be positive.
    pub core_radius: f32,
    pub max_force: f32,
    /// Tangential force as a fraction of the radial pull.
    pub spiral: f32,
    pub respawn_delay_ms: Span,
    pub drag: f32,
    /// Alpha particles ease toward every step.
    pub idle_alpha: f32,
}

impl ProfileDefaults for BlackHoleConfig {
    fn desktop() -> Self {
        Self {
            count: 600,
            size: Span::new(1.0, 3.0),
            speed: Span::new(0.5, 2.0),
            attraction_radius: 300.0,
            core_radius: 5.0,
            max_force: 2.0,
            spiral: 0.3,
            respawn_delay_ms: Span::new(0.0, 2000.0),
            drag: 0.98,
            idle_alpha: 0.08,
        }
    }

    fn mobile() -> Self {
        Self {
            count: 300,
            size: Span::new(1.5, 3.5),
            speed: Span::new(0.4, 1.5),
            attraction_radius: 200.0,
            max_force: 1.5,
            idle_alpha: 0.1,
            ..Self::desktop()
        }
    }
}

impl Default for BlackHoleConfig {
    fn default() -> Self {
        Self::desktop()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseFlowConfig {
    pub count: usize,
    pub noise_scale: f32,
    /// Noise time advance per step.
    pub flow_speed: f32,
    pub speed: Span,
    /// Steps before a particle is reset.
    pub life: f32,
    pub size: f32,
    pub pointer_radius: f32,
    pub trail_length: f32,
    pub fade: f32,
}

impl Default for NoiseFlowConfig {
    fn default() -> Self {
        Self {
            count: 1000,
            noise_scale: 0.01,
            flow_speed: 0.001,
            speed: Span::new(1.0, 3.0),
            life: 100.0,
            size: 1.0,
            pointer_radius: 200.0,
            trail_length: 10.0,
            fade: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixConfig {
    /// Fixed number of drops in the pool.
    pub drops: usize,
    pub font_size: f32,
    pub speed: Span,
    /// Trail length in glyphs.
    pub length: Span,
    pub glyph_refresh_ms: Span,
    pub pointer_radius: f32,
    /// Chance that a respawning drop picks a column near the pointer.
    pub pointer_bias: f32,
    pub pointer_jitter: f32,
    pub respawn_delay_ms: Span,
    /// Share of the pool already falling right after populate.
    pub initial_active: f32,
    pub fade: f32,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            drops: 40,
            font_size: 16.0,
            speed: Span::new(1.0, 3.0),
            length: Span::new(5.0, 15.0),
            glyph_refresh_ms: Span::new(50.0, 150.0),
            pointer_radius: 100.0,
            pointer_bias: 2.0 / 3.0,
            pointer_jitter: 50.0,
            respawn_delay_ms: Span::new(0.0, 2500.0),
            initial_active: 0.25,
            fade: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyFieldConfig {
    pub lines: usize,
    pub length: Span,
    pub width: Span,
    /// Lifetime in steps.
    pub life: Span,
    /// Expired lines per step that may respawn near the pointer.
    pub spawn_rate: usize,
    pub pointer_radius: f32,
    pub near_pointer_chance: f32,
    pub sparks: usize,
    pub spark_length: Span,
}

impl Default for EnergyFieldConfig {
    fn default() -> Self {
        Self {
            lines: 50,
            length: Span::new(50.0, 150.0),
            width: Span::new(1.0, 3.0),
            life: Span::new(30.0, 60.0),
            spawn_rate: 2,
            pointer_radius: 200.0,
            near_pointer_chance: 0.7,
            sparks: 3,
            spark_length: Span::new(50.0, 250.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarfieldConfig {
    pub count: usize,
    pub speed: Span,
    pub size: Span,
    pub depth: f32,
    /// Fraction of the pointer's offset from centre applied as parallax.
    pub pointer_influence: f32,
    pub fade: f32,
}

impl Default for StarfieldConfig {
    fn default() -> Self {
        Self {
            count: 200,
            speed: Span::new(0.5, 2.0),
            size: Span::new(0.5, 2.0),
            depth: 1000.0,
            pointer_influence: 0.3,
            fade: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WavesConfig {
    pub lines: usize,
    /// Phase advance per step.
    pub speed: f32,
    /// Amplitude of the first line as a fraction of the height.
    pub amplitude_factor: f32,
    pub frequency_factor: f32,
    /// Peak pointer displacement in px.
    pub pointer_amplitude: f32,
    /// Horizontal falloff distance of the pointer bump.
    pub pointer_falloff: f32,
    /// Horizontal spacing of line samples.
    pub resolution: f32,
    pub line_width: f32,
    pub tint_alpha: f32,
}

impl Default for WavesConfig {
    fn default() -> Self {
        Self {
            lines: 3,
            speed: 0.002,
            amplitude_factor: 0.3,
            frequency_factor: 0.5,
            pointer_amplitude: 50.0,
            pointer_falloff: 200.0,
            resolution: 2.0,
            line_width: 2.0,
            tint_alpha: 0.1,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Variant shown at start.
    pub variant: VariantKind,
    pub theme: Theme,
    /// Fixed RNG seed for reproducible runs. Entropy-seeded when absent.
    pub seed: Option<u64>,
    /// Logical width at or below which the mobile profile is used.
    pub mobile_breakpoint: f32,
    pub static_field: Profiled<StaticFieldConfig>,
    pub black_hole: Profiled<BlackHoleConfig>,
    pub noise_flow: NoiseFlowConfig,
    pub matrix: MatrixConfig,
    pub energy_field: EnergyFieldConfig,
    pub starfield: StarfieldConfig,
    pub waves: WavesConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            variant: VariantKind::default(),
            theme: Theme::default(),
            seed: None,
            mobile_breakpoint: 768.0,
            static_field: Profiled::default(),
            black_hole: Profiled::default(),
            noise_flow: NoiseFlowConfig::default(),
            matrix: MatrixConfig::default(),
            energy_field: EnergyFieldConfig::default(),
            starfield: StarfieldConfig::default(),
            waves: WavesConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Read, parse, and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), variant = %config.variant, "loaded config");
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize back to TOML, for `--print-config`.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.mobile_breakpoint >= 0.0) {
            return Err(ConfigError::invalid("mobile_breakpoint", "must be a non-negative number"));
        }
        for profile in [&self.static_field.desktop, &self.static_field.mobile] {
            validate_static_field(profile)?;
        }
        for profile in [&self.black_hole.desktop, &self.black_hole.mobile] {
            validate_black_hole(profile)?;
        }

        let n = &self.noise_flow;
        positive("noise_flow.life", n.life)?;
        positive("noise_flow.pointer_radius", n.pointer_radius)?;
        n.speed.check_non_negative("noise_flow.speed")?;
        unit("noise_flow.fade", n.fade)?;

        let m = &self.matrix;
        positive("matrix.font_size", m.font_size)?;
        positive("matrix.pointer_radius", m.pointer_radius)?;
        m.speed.check_non_negative("matrix.speed")?;
        m.length.check("matrix.length")?;
        if m.length.min < 1.0 {
            return Err(ConfigError::invalid("matrix.length", "drops need at least one glyph"));
        }
        m.glyph_refresh_ms.check_non_negative("matrix.glyph_refresh_ms")?;
        m.respawn_delay_ms.check_non_negative("matrix.respawn_delay_ms")?;
        unit("matrix.pointer_bias", m.pointer_bias)?;
        unit("matrix.initial_active", m.initial_active)?;
        unit("matrix.fade", m.fade)?;

        let e = &self.energy_field;
        e.length.check_non_negative("energy_field.length")?;
        e.width.check_non_negative("energy_field.width")?;
        e.life.check("energy_field.life")?;
        if e.life.min < 1.0 {
            return Err(ConfigError::invalid("energy_field.life", "lines must live at least one step"));
        }
        e.spark_length.check_non_negative("energy_field.spark_length")?;
        unit("energy_field.near_pointer_chance", e.near_pointer_chance)?;

        let s = &self.starfield;
        positive("starfield.depth", s.depth)?;
        s.speed.check("starfield.speed")?;
        if s.speed.min <= 0.0 {
            return Err(ConfigError::invalid("starfield.speed", "stars must move toward the viewer"));
        }
        s.size.check_non_negative("starfield.size")?;
        unit("starfield.fade", s.fade)?;

        let w = &self.waves;
        positive("waves.resolution", w.resolution)?;
        positive("waves.pointer_falloff", w.pointer_falloff)?;
        Ok(())
    }
}

fn validate_static_field(c: &StaticFieldConfig) -> Result<(), ConfigError> {
    c.size.check_non_negative("static_field.size")?;
    c.speed.check_non_negative("static_field.speed")?;
    positive("static_field.connection_radius", c.connection_radius)?;
    positive("static_field.pointer_radius", c.pointer_radius)?;
    positive("static_field.agitation_speed", c.agitation_speed)?;
    unit("static_field.friction", c.friction)?;
    unit("static_field.base_alpha", c.base_alpha)?;
    Ok(())
}

fn validate_black_hole(c: &BlackHoleConfig) -> Result<(), ConfigError> {
    c.size.check_non_negative("black_hole.size")?;
    c.speed.check_non_negative("black_hole.speed")?;
    c.respawn_delay_ms.check_non_negative("black_hole.respawn_delay_ms")?;
    positive("black_hole.core_radius", c.core_radius)?;
    positive("black_hole.attraction_radius", c.attraction_radius)?;
    unit("black_hole.drag", c.drag)?;
    unit("black_hole.idle_alpha", c.idle_alpha)?;
    Ok(())
}

fn positive(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be positive, got {v}")))
    }
}

fn unit(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be within 0..=1, got {v}")))
    }
}
