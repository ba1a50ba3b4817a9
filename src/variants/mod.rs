//! Background variants.
//!
//! A variant owns its agent pool and knows how to populate it, advance it
//! by one step, and paint it. The engine only ever talks to the boxed
//! [`Variant`] trait object, so switching variants is a matter of dropping
//! one box and building another.
//!
//! | Variant | Agents | Boundary | Trails |
//! |---------|--------|----------|--------|
//! | [`StaticField`] | drifting particles with pointer-revealed links | reflect | no |
//! | [`BlackHole`] | particles spiralling into the pointer | deactivate and respawn | no |
//! | [`NoiseFlow`] | particles steered by a noise field | reset | yes |
//! | [`Matrix`] | falling glyph columns | deactivate and respawn | yes |
//! | [`EnergyField`] | short-lived crackling lines | recycle | no |
//! | [`Starfield`] | stars flying toward the viewer | reset at depth | yes |
//! | [`Waves`] | layered sine lines bent by the pointer | none | no |

mod black_hole;
mod energy_field;
mod matrix;
mod noise_flow;
mod starfield;
mod static_field;
mod waves;

pub use black_hole::{BlackHole, BlackHoleParticle};
pub use energy_field::{EnergyField, EnergyLine, Spark};
pub use matrix::{Matrix, RainDrop};
pub use noise_flow::{FlowParticle, NoiseFlow};
pub use starfield::{Star, Starfield};
pub use static_field::{FieldParticle, StaticField};
pub use waves::{WaveLine, Waves};

use std::any::Any;
use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, Profile};
use crate::error::ParseKindError;
use crate::input::PointerState;
use crate::surface::Canvas;
use crate::theme::{Palette, Theme};

/// Below this, distances and vector lengths are treated as zero.
pub(crate) const EPSILON: f32 = 1e-6;

/// Common view of one agent, whatever the variant.
pub trait Agent {
    /// Logical position.
    fn position(&self) -> Vec2;

    /// Inactive agents are waiting to respawn and are not drawn.
    fn is_active(&self) -> bool {
        true
    }
}

/// Everything a simulation step may read.
#[derive(Debug, Clone, Copy)]
pub struct StepContext {
    /// Logical size of the viewport.
    pub bounds: Vec2,
    /// Pointer position and the speed sampled for this step.
    pub pointer: PointerState,
    /// Milliseconds since the first frame.
    pub now_ms: f64,
    /// Milliseconds since the previous frame.
    pub dt_ms: f32,
}

/// Everything a render pass may read.
#[derive(Debug, Clone, Copy)]
pub struct PaintContext<'a> {
    pub palette: &'a Palette,
    pub theme: Theme,
    pub pointer: Vec2,
    pub bounds: Vec2,
}

/// One background animation.
pub trait Variant: fmt::Debug {
    fn kind(&self) -> VariantKind;

    /// Replace the pool with freshly randomized agents inside `bounds`.
    fn populate(&mut self, bounds: Vec2, rng: &mut SmallRng);

    /// Advance every agent by one step.
    fn step(&mut self, ctx: &StepContext, rng: &mut SmallRng);

    /// Paint the current state. Must not change it.
    fn render(&self, canvas: &mut Canvas, ctx: &PaintContext<'_>);

    /// Pool size. Constant between populates.
    fn agent_count(&self) -> usize;

    /// Visit every agent in pool order.
    fn for_each_agent(&self, f: &mut dyn FnMut(&dyn Agent));

    /// Whether a lifted touch should ease the pointer back to the centre.
    fn recenters_on_release(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<'a> dyn Variant + 'a {
    /// Borrow the concrete variant, if it is a `T`.
    pub fn downcast_ref<T: Variant + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Variant + 'static>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// The selectable variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariantKind {
    #[default]
    StaticField,
    BlackHole,
    NoiseFlow,
    Matrix,
    EnergyField,
    Starfield,
    Waves,
}

impl VariantKind {
    /// All variants, in selector order.
    pub const ALL: [VariantKind; 7] = [
        VariantKind::StaticField,
        VariantKind::BlackHole,
        VariantKind::NoiseFlow,
        VariantKind::Matrix,
        VariantKind::EnergyField,
        VariantKind::Starfield,
        VariantKind::Waves,
    ];

    pub fn name(self) -> &'static str {
        match self {
            VariantKind::StaticField => "static-field",
            VariantKind::BlackHole => "black-hole",
            VariantKind::NoiseFlow => "noise-flow",
            VariantKind::Matrix => "matrix",
            VariantKind::EnergyField => "energy-field",
            VariantKind::Starfield => "starfield",
            VariantKind::Waves => "waves",
        }
    }

    /// The next variant in selector order, wrapping around.
    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|k| *k == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VariantKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| ParseKindError {
                kind: "variant",
                value: s.to_string(),
                expected: "static-field, black-hole, noise-flow, matrix, energy-field, starfield, waves",
            })
    }
}

/// Build an empty variant of `kind` for `profile`. Call
/// [`Variant::populate`] before stepping it.
pub fn build(kind: VariantKind, config: &EngineConfig, profile: Profile) -> Box<dyn Variant> {
    match kind {
        VariantKind::StaticField => Box::new(StaticField::new(config.static_field.get(profile).clone())),
        VariantKind::BlackHole => Box::new(BlackHole::new(config.black_hole.get(profile).clone())),
        VariantKind::NoiseFlow => Box::new(NoiseFlow::new(config.noise_flow.clone())),
        VariantKind::Matrix => Box::new(Matrix::new(config.matrix.clone())),
        VariantKind::EnergyField => Box::new(EnergyField::new(config.energy_field.clone())),
        VariantKind::Starfield => Box::new(Starfield::new(config.starfield.clone())),
        VariantKind::Waves => Box::new(Waves::new(config.waves.clone())),
    }
}

// Shared helpers for the variant implementations.

/// Uniform point in `[0, bounds]`. Zero bounds give the origin.
pub(crate) fn random_point(bounds: Vec2, rng: &mut SmallRng) -> Vec2 {
    Vec2::new(rng.gen::<f32>() * bounds.x, rng.gen::<f32>() * bounds.y)
}

/// Unit vector at a uniformly random angle.
pub(crate) fn random_direction(rng: &mut SmallRng) -> Vec2 {
    Vec2::from_angle(rng.gen::<f32>() * std::f32::consts::TAU)
}

/// Uniform point on one of the four edges of `[0, bounds]`.
pub(crate) fn random_edge_point(bounds: Vec2, rng: &mut SmallRng) -> Vec2 {
    match rng.gen_range(0..4u8) {
        0 => Vec2::new(rng.gen::<f32>() * bounds.x, 0.0),
        1 => Vec2::new(bounds.x, rng.gen::<f32>() * bounds.y),
        2 => Vec2::new(rng.gen::<f32>() * bounds.x, bounds.y),
        _ => Vec2::new(0.0, rng.gen::<f32>() * bounds.y),
    }
}

#[inline]
pub(crate) fn in_bounds(p: Vec2, bounds: Vec2) -> bool {
    p.x >= 0.0 && p.x <= bounds.x && p.y >= 0.0 && p.y <= bounds.y
}

/// Rescale `v` so its length lies within `[min, max]`, keeping direction.
/// A zero vector gets a random direction at `min`.
pub(crate) fn clamp_speed(v: Vec2, min: f32, max: f32, rng: &mut SmallRng) -> Vec2 {
    let speed = v.length();
    if !(speed > EPSILON) || !speed.is_finite() {
        return random_direction(rng) * min;
    }
    if speed < min {
        v * (min / speed)
    } else if speed > max {
        v * (max / speed)
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_kind_parse_and_display() {
        for kind in VariantKind::ALL {
            assert_eq!(kind.to_string().parse::<VariantKind>().unwrap(), kind);
        }
        assert_eq!("Black_Hole".parse::<VariantKind>().unwrap(), VariantKind::BlackHole);
        assert_eq!("nope".parse::<VariantKind>().unwrap_err().kind, "variant");
    }

    #[test]
    fn test_next_cycles_through_all() {
        let mut kind = VariantKind::StaticField;
        for _ in 0..VariantKind::ALL.len() {
            kind = kind.next();
        }
        assert_eq!(kind, VariantKind::StaticField);
    }

    #[test]
    fn test_build_matches_kind() {
        let config = EngineConfig::default();
        for kind in VariantKind::ALL {
            let variant = build(kind, &config, Profile::Desktop);
            assert_eq!(variant.kind(), kind);
            assert_eq!(variant.agent_count(), 0);
        }
    }

    #[test]
    fn test_clamp_speed() {
        let mut rng = SmallRng::seed_from_u64(3);
        let v = clamp_speed(Vec2::new(3.0, 4.0), 0.5, 0.7, &mut rng);
        assert!((v.length() - 0.7).abs() < 1e-5);
        assert!(v.x > 0.0 && v.y > 0.0);

        let v = clamp_speed(Vec2::new(0.0, 0.1), 0.5, 0.7, &mut rng);
        assert!((v - Vec2::new(0.0, 0.5)).length() < 1e-5);

        let v = clamp_speed(Vec2::ZERO, 0.5, 0.7, &mut rng);
        assert!((v.length() - 0.5).abs() < 1e-5);

        let v = clamp_speed(Vec2::new(f32::NAN, 0.0), 0.5, 0.7, &mut rng);
        assert!(v.is_finite());
    }

    #[test]
    fn test_edge_points_lie_on_edges() {
        let mut rng = SmallRng::seed_from_u64(11);
        let bounds = Vec2::new(300.0, 200.0);
        for _ in 0..200 {
            let p = random_edge_point(bounds, &mut rng);
            assert!(in_bounds(p, bounds));
            assert!(p.x == 0.0 || p.y == 0.0 || p.x == bounds.x || p.y == bounds.y);
        }
    }
}
