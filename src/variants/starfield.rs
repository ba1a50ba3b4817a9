//! Stars flying toward the viewer, with pointer parallax.

use std::any::Any;

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::Rng;

use super::{Agent, PaintContext, StepContext, Variant, VariantKind};
use crate::config::StarfieldConfig;
use crate::paint::ColorStop;
use crate::surface::Canvas;

#[derive(Debug, Clone, PartialEq)]
pub struct Star {
    /// Offset from the viewport centre before projection.
    pub offset: Vec2,
    /// Distance from the viewer, `0..=depth`.
    pub z: f32,
    pub size: f32,
    pub speed: f32,
    /// Screen position from the last step.
    pub projected: Vec2,
}

impl Agent for Star {
    fn position(&self) -> Vec2 {
        self.projected
    }
}

fn perspective(depth: f32, z: f32) -> f32 {
    depth / (depth + z.max(0.0))
}

#[derive(Debug)]
pub struct Starfield {
    config: StarfieldConfig,
    stars: Vec<Star>,
}

impl Starfield {
    pub fn new(config: StarfieldConfig) -> Self {
        Self {
            config,
            stars: Vec::new(),
        }
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    /// Perspective scale at depth `z`. Nearer stars are larger.
    pub fn scale_at(&self, z: f32) -> f32 {
        perspective(self.config.depth, z)
    }

    fn random_offset(bounds: Vec2, rng: &mut SmallRng) -> Vec2 {
        Vec2::new(rng.gen::<f32>() - 0.5, rng.gen::<f32>() - 0.5) * bounds * 2.0
    }
}

impl Variant for Starfield {
    fn kind(&self) -> VariantKind {
        VariantKind::Starfield
    }

    fn populate(&mut self, bounds: Vec2, rng: &mut SmallRng) {
        let c = &self.config;
        let center = bounds * 0.5;
        let mut stars = Vec::with_capacity(c.count);
        for _ in 0..c.count {
            let offset = Self::random_offset(bounds, rng);
            let z = rng.gen::<f32>() * c.depth;
            let size = c.size.sample(rng);
            let speed = c.speed.sample(rng);
            stars.push(Star {
                offset,
                z,
                size,
                speed,
                projected: center + offset * self.scale_at(z),
            });
        }
        self.stars = stars;
    }

    fn step(&mut self, ctx: &StepContext, rng: &mut SmallRng) {
        let depth = self.config.depth;
        let center = ctx.bounds * 0.5;
        let parallax = (ctx.pointer.position - center) * self.config.pointer_influence;

        for star in &mut self.stars {
            star.z -= star.speed;
            if star.z <= 0.0 {
                star.z = depth;
                star.offset = Self::random_offset(ctx.bounds, rng);
            }
            star.projected = center + (star.offset + parallax) * perspective(depth, star.z);
        }
    }

    fn render(&self, canvas: &mut Canvas, ctx: &PaintContext<'_>) {
        let palette = ctx.palette;
        let depth = self.config.depth;

        canvas.fade(palette.background, self.config.fade);

        for star in &self.stars {
            let radius = star.size * self.scale_at(star.z) * 2.0;
            let alpha = ((1.0 - star.z / depth) * 0.8).clamp(0.0, 1.0);
            let stops = [
                ColorStop::new(0.0, palette.primary, alpha),
                ColorStop::new(0.5, palette.secondary, alpha * 0.4),
                ColorStop::new(1.0, palette.background, 0.0),
            ];
            canvas.fill_radial(star.projected, radius, radius, &stops);
        }
    }

    fn agent_count(&self) -> usize {
        self.stars.len()
    }

    fn for_each_agent(&self, f: &mut dyn FnMut(&dyn Agent)) {
        for star in &self.stars {
            f(star);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
