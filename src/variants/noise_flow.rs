//! Particles carried along a slowly shifting noise field.

use std::any::Any;
use std::f32::consts::PI;
use std::fmt;

use glam::Vec2;
use noise::{NoiseFn, OpenSimplex};
use rand::rngs::SmallRng;
use rand::Rng;

use super::{in_bounds, random_point, Agent, PaintContext, StepContext, Variant, VariantKind};
use crate::config::NoiseFlowConfig;
use crate::paint::ColorStop;
use crate::surface::Canvas;

#[derive(Debug, Clone, PartialEq)]
pub struct FlowParticle {
    pub position: Vec2,
    /// Steps since the last reset.
    pub age: f32,
    pub speed: f32,
    /// Flow heading of the last step, kept for drawing the trail.
    pub angle: f32,
}

impl Agent for FlowParticle {
    fn position(&self) -> Vec2 {
        self.position
    }
}

pub struct NoiseFlow {
    config: NoiseFlowConfig,
    particles: Vec<FlowParticle>,
    noise: OpenSimplex,
    seed: u32,
    time: f64,
}

impl fmt::Debug for NoiseFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoiseFlow")
            .field("particles", &self.particles.len())
            .field("seed", &self.seed)
            .field("time", &self.time)
            .finish_non_exhaustive()
    }
}

impl NoiseFlow {
    pub fn new(config: NoiseFlowConfig) -> Self {
        Self {
            config,
            particles: Vec::new(),
            noise: OpenSimplex::new(0),
            seed: 0,
            time: 0.0,
        }
    }

    pub fn particles(&self) -> &[FlowParticle] {
        &self.particles
    }

    /// Noise time, advanced by the flow speed every step.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Trail and dot alpha for a particle of the given age.
    pub fn alpha(&self, age: f32) -> f32 {
        ((1.0 - age / self.config.life) * 0.5).clamp(0.0, 1.0)
    }

    fn flow_angle(&self, p: Vec2) -> f32 {
        let s = f64::from(self.config.noise_scale);
        let v = self.noise.get([f64::from(p.x) * s, f64::from(p.y) * s, self.time]);
        v as f32 * 4.0 * PI
    }
}

impl Variant for NoiseFlow {
    fn kind(&self) -> VariantKind {
        VariantKind::NoiseFlow
    }

    fn populate(&mut self, bounds: Vec2, rng: &mut SmallRng) {
        self.seed = rng.gen();
        self.noise = OpenSimplex::new(self.seed);
        self.time = 0.0;
        let c = &self.config;
        self.particles = (0..c.count)
            .map(|_| FlowParticle {
                position: random_point(bounds, rng),
                age: rng.gen::<f32>() * c.life,
                speed: c.speed.sample(rng),
                angle: 0.0,
            })
            .collect();
    }

    fn step(&mut self, ctx: &StepContext, rng: &mut SmallRng) {
        self.time += f64::from(self.config.flow_speed);
        let pointer = ctx.pointer.position;
        let radius = self.config.pointer_radius;
        let life = self.config.life;

        for i in 0..self.particles.len() {
            let angle = self.flow_angle(self.particles[i].position);
            let p = &mut self.particles[i];
            let to_pointer = pointer - p.position;
            let influence = (1.0 - to_pointer.length() / radius).max(0.0);

            p.angle = angle;
            p.position += (Vec2::from_angle(angle) + to_pointer * influence * 0.01) * p.speed;
            p.age += 1.0;

            if p.age > life || !in_bounds(p.position, ctx.bounds) {
                p.position = random_point(ctx.bounds, rng);
                p.age = 0.0;
            }
        }
    }

    fn render(&self, canvas: &mut Canvas, ctx: &PaintContext<'_>) {
        let palette = ctx.palette;
        let size = self.config.size;
        let trail = self.config.trail_length;

        canvas.fade(palette.background, self.config.fade);

        for p in &self.particles {
            let alpha = self.alpha(p.age);
            canvas.fill_circle(p.position, size, palette.primary, alpha);

            if p.age > 1.0 {
                let tail = p.position - Vec2::from_angle(p.angle) * trail;
                let stops = [
                    ColorStop::new(0.0, palette.secondary, 0.0),
                    ColorStop::new(1.0, palette.secondary, alpha * 0.5),
                ];
                canvas.stroke_line(tail, p.position, size, &stops);
            }
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

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
