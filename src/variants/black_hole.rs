//! Particles pulled into a spiralling well under the pointer.

use std::any::Any;

use glam::Vec2;
use rand::rngs::SmallRng;

use super::{
    in_bounds, random_direction, random_edge_point, random_point, Agent, PaintContext, StepContext, Variant,
    VariantKind, EPSILON,
};
use crate::config::BlackHoleConfig;
use crate::paint::ColorStop;
use crate::surface::Canvas;

#[derive(Debug, Clone, PartialEq)]
pub struct BlackHoleParticle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: f32,
    pub alpha: f32,
    active: bool,
    inactive_since_ms: f64,
    respawn_delay_ms: f32,
}

impl BlackHoleParticle {
    pub fn new(position: Vec2, velocity: Vec2, size: f32) -> Self {
        Self {
            position,
            velocity,
            size,
            alpha: 1.0,
            active: true,
            inactive_since_ms: 0.0,
            respawn_delay_ms: 0.0,
        }
    }

    /// Earliest time the particle may come back, while it is inactive.
    pub fn respawn_at_ms(&self) -> Option<f64> {
        (!self.active).then(|| self.inactive_since_ms + f64::from(self.respawn_delay_ms))
    }

    fn deactivate(&mut self, now_ms: f64, delay_ms: f32) {
        self.active = false;
        self.inactive_since_ms = now_ms;
        self.respawn_delay_ms = delay_ms;
    }
}

impl Agent for BlackHoleParticle {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

#[derive(Debug)]
pub struct BlackHole {
    config: BlackHoleConfig,
    particles: Vec<BlackHoleParticle>,
}

impl BlackHole {
    pub fn new(config: BlackHoleConfig) -> Self {
        Self {
            config,
            particles: Vec::new(),
        }
    }

    pub fn from_particles(config: BlackHoleConfig, particles: Vec<BlackHoleParticle>) -> Self {
        Self { config, particles }
    }

    pub fn config(&self) -> &BlackHoleConfig {
        &self.config
    }

    pub fn particles(&self) -> &[BlackHoleParticle] {
        &self.particles
    }

    pub fn active_count(&self) -> usize {
        self.particles.iter().filter(|p| p.active).count()
    }
}

impl Variant for BlackHole {
    fn kind(&self) -> VariantKind {
        VariantKind::BlackHole
    }

    fn populate(&mut self, bounds: Vec2, rng: &mut SmallRng) {
        let c = &self.config;
        self.particles = (0..c.count)
            .map(|_| {
                let position = random_point(bounds, rng);
                let velocity = random_direction(rng) * c.speed.sample(rng);
                BlackHoleParticle::new(position, velocity, c.size.sample(rng))
            })
            .collect();
    }

    fn step(&mut self, ctx: &StepContext, rng: &mut SmallRng) {
        let c = &self.config;
        let pointer = ctx.pointer.position;
        let radius = c.attraction_radius;
        let core = c.core_radius.max(EPSILON);

        for p in &mut self.particles {
            if !p.active {
                if ctx.now_ms - p.inactive_since_ms >= f64::from(p.respawn_delay_ms) {
                    p.position = random_edge_point(ctx.bounds, rng);
                    p.velocity = random_direction(rng) * c.speed.sample(rng);
                    p.alpha = 1.0;
                    p.active = true;
                }
                continue;
            }

            let to_pointer = pointer - p.position;
            let d = to_pointer.length();
            // NaN distances are captured too.
            if !(d >= core) {
                p.deactivate(ctx.now_ms, c.respawn_delay_ms.sample(rng));
                continue;
            }

            if d < radius {
                let dir = to_pointer / d;
                let force = (1.0 - d / radius) * c.max_force;
                let tangent = Vec2::new(-dir.y, dir.x);
                p.velocity += dir * force + tangent * (c.spiral * force);
                p.alpha = (d / radius).max(0.2);
            }

            p.position += p.velocity;
            p.velocity *= c.drag;

            if !in_bounds(p.position, ctx.bounds) {
                p.deactivate(ctx.now_ms, c.respawn_delay_ms.sample(rng));
                continue;
            }

            p.alpha = (p.alpha * 0.95 + c.idle_alpha * 0.05).clamp(0.0, 1.0);
        }
    }

    fn render(&self, canvas: &mut Canvas, ctx: &PaintContext<'_>) {
        let radius = self.config.attraction_radius;
        let [start, mid, end] = ctx.palette.gradient;

        canvas.clear();

        let glow = [
            ColorStop::new(0.0, mid, 0.3),
            ColorStop::new(0.1, start, 0.15),
            ColorStop::new(0.5, end, 0.05),
            ColorStop::new(1.0, ctx.palette.background, 0.0),
        ];
        canvas.fill_radial(ctx.pointer, radius, radius, &glow);

        for p in self.particles.iter().filter(|p| p.active) {
            let to_pointer = ctx.pointer - p.position;
            let d = to_pointer.length();
            let ratio = if radius > 0.0 { (d / radius).min(1.0) } else { 1.0 };

            if d < radius * 1.2 && d > EPSILON {
                let length = (5.0 + (1.0 - ratio) * 15.0).min(20.0);
                let tail = p.position - to_pointer / d * length;
                let stops = [
                    ColorStop::new(0.0, start, (p.alpha * (1.0 - ratio) * 0.7).clamp(0.0, 1.0)),
                    ColorStop::new(1.0, end, 0.0),
                ];
                canvas.stroke_line(p.position, tail, p.size, &stops);
            }

            let color = if ratio < 0.5 {
                start
            } else if ratio < 0.8 {
                mid
            } else {
                end
            };
            canvas.fill_circle(p.position, p.size, color, p.alpha.clamp(0.0, 1.0));
        }
    }

    fn agent_count(&self) -> usize {
        self.particles.len()
    }

    fn for_each_agent(&self, f: &mut dyn FnMut(&dyn Agent)) {
        for p in &self.particles {
            f(p);
        }
    }

    fn recenters_on_release(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
