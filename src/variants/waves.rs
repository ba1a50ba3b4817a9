//! Layered sine lines that bulge under the pointer.

use std::any::Any;
use std::f32::consts::TAU;

use glam::Vec2;
use rand::rngs::SmallRng;

use super::{Agent, PaintContext, StepContext, Variant, VariantKind};
use crate::config::WavesConfig;
use crate::paint::ColorStop;
use crate::surface::Canvas;

#[derive(Debug, Clone, PartialEq)]
pub struct WaveLine {
    pub index: usize,
    pub alpha: f32,
    /// Sampled curve, left to right.
    pub points: Vec<Vec2>,
}

impl Agent for WaveLine {
    fn position(&self) -> Vec2 {
        self.points.first().copied().unwrap_or(Vec2::ZERO)
    }
}

#[derive(Debug)]
pub struct Waves {
    config: WavesConfig,
    lines: Vec<WaveLine>,
    /// Steps since populate.
    time: f32,
}

impl Waves {
    pub fn new(config: WavesConfig) -> Self {
        Self {
            config,
            lines: Vec::new(),
            time: 0.0,
        }
    }

    pub fn lines(&self) -> &[WaveLine] {
        &self.lines
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Height of line `index` at horizontal position `x`.
    pub fn height_at(&self, index: usize, x: f32, bounds: Vec2, pointer: Vec2) -> f32 {
        let c = &self.config;
        let n = self.lines.len().max(1) as f32;
        let i = index as f32;
        let (w, h) = (bounds.x, bounds.y);

        let amplitude = h * c.amplitude_factor * (1.0 - i / n);
        let frequency = c.frequency_factor * (i + 1.0);
        let phase = i / n * TAU;
        let u = if w > 0.0 { x / w } else { 0.0 };
        let wave = (u * TAU * frequency + self.time * c.speed * (i + 1.0) + phase).sin();

        let pu = if w > 0.0 { pointer.x / w } else { 0.0 };
        let pv = if h > 0.0 { pointer.y / h } else { 0.0 };
        let bump = (pu * TAU + pv * TAU).sin() * c.pointer_amplitude;
        let falloff = (-(x - pointer.x).abs() / c.pointer_falloff).exp();

        h * 0.5 + amplitude * wave + bump * falloff
    }

    fn trace(&mut self, bounds: Vec2, pointer: Vec2) {
        let step = self.config.resolution;
        let samples = if step > 0.0 && bounds.x > 0.0 {
            (bounds.x / step).floor() as usize + 1
        } else {
            1
        };
        for index in 0..self.lines.len() {
            let points: Vec<Vec2> = (0..samples)
                .map(|k| {
                    let x = k as f32 * step;
                    Vec2::new(x, self.height_at(index, x, bounds, pointer))
                })
                .collect();
            self.lines[index].points = points;
        }
    }
}

impl Variant for Waves {
    fn kind(&self) -> VariantKind {
        VariantKind::Waves
    }

    fn populate(&mut self, bounds: Vec2, _rng: &mut SmallRng) {
        self.time = 0.0;
        self.lines = (0..self.config.lines)
            .map(|index| WaveLine {
                index,
                alpha: (0.1 - index as f32 * 0.02).max(0.0),
                points: Vec::new(),
            })
            .collect();
        self.trace(bounds, Vec2::ZERO);
    }

    fn step(&mut self, ctx: &StepContext, _rng: &mut SmallRng) {
        self.time += 1.0;
        self.trace(ctx.bounds, ctx.pointer.position);
    }

    fn render(&self, canvas: &mut Canvas, ctx: &PaintContext<'_>) {
        let palette = ctx.palette;
        let tint = self.config.tint_alpha;

        canvas.clear();
        canvas.fill_linear_gradient(
            Vec2::ZERO,
            ctx.bounds,
            &[
                ColorStop::new(0.0, palette.primary, tint),
                ColorStop::new(1.0, palette.secondary, tint),
            ],
        );
        for line in &self.lines {
            canvas.stroke_polyline(&line.points, self.config.line_width, palette.primary, line.alpha);
        }
    }

    fn agent_count(&self) -> usize {
        self.lines.len()
    }

    fn for_each_agent(&self, f: &mut dyn FnMut(&dyn Agent)) {
        for line in &self.lines {
            f(line);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
