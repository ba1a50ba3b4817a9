//! Drifting particles that link up around the pointer.
//!
//! Particles wander with a clamped speed and bounce off the edges. Near the
//! pointer, pairs closer than the connection radius grow links that fade in,
//! brighten toward the pointer, and fade out again once the pair drifts
//! apart or the pointer leaves. A fast-moving pointer also tugs particles
//! toward itself.

use std::any::Any;
use std::collections::BTreeMap;

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::Rng;

use super::{clamp_speed, random_direction, random_point, Agent, PaintContext, StepContext, Variant, VariantKind, EPSILON};
use crate::config::StaticFieldConfig;
use crate::paint::ColorStop;
use crate::spatial::SpatialGrid;
use crate::surface::Canvas;

/// Links at or below this strength are dropped.
const PRUNE_BELOW: f32 = 0.01;

/// One drifting point of the constellation.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldParticle {
    /// Logical pixels, kept inside the viewport.
    pub position: Vec2,
    /// Pixels per step. Its length stays within the configured speed band.
    pub velocity: Vec2,
    /// Dot radius.
    pub size: f32,
    /// Eased opacity in `0..=1`.
    pub alpha: f32,
    connections: BTreeMap<usize, f32>,
}

impl FieldParticle {
    pub fn new(position: Vec2, velocity: Vec2, size: f32) -> Self {
        Self {
            position,
            velocity,
            size,
            alpha: 1.0,
            connections: BTreeMap::new(),
        }
    }

    /// Linked neighbours by pool index, with link strength in `0..=1`.
    pub fn connections(&self) -> &BTreeMap<usize, f32> {
        &self.connections
    }

    pub fn strength_to(&self, other: usize) -> Option<f32> {
        self.connections.get(&other).copied()
    }

    /// Strongest link, or zero without links.
    pub fn max_strength(&self) -> f32 {
        self.connections.values().copied().fold(0.0, f32::max)
    }
}

impl Agent for FieldParticle {
    fn position(&self) -> Vec2 {
        self.position
    }
}

/// Set the link between `i` and `j` on both endpoints at once.
fn link(particles: &mut [FieldParticle], i: usize, j: usize, strength: f32) {
    let strength = strength.clamp(0.0, 1.0);
    particles[i].connections.insert(j, strength);
    particles[j].connections.insert(i, strength);
}

fn unlink(particles: &mut [FieldParticle], i: usize, j: usize) {
    particles[i].connections.remove(&j);
    particles[j].connections.remove(&i);
}

#[derive(Debug)]
pub struct StaticField {
    config: StaticFieldConfig,
    particles: Vec<FieldParticle>,
    grid: SpatialGrid,
    // Per-step scratch buffers.
    positions: Vec<Vec2>,
    pointer_distance: Vec<f32>,
    candidates: Vec<usize>,
    links: Vec<(usize, f32)>,
}

impl StaticField {
    pub fn new(config: StaticFieldConfig) -> Self {
        Self {
            config,
            particles: Vec::new(),
            grid: SpatialGrid::new(),
            positions: Vec::new(),
            pointer_distance: Vec::new(),
            candidates: Vec::new(),
            links: Vec::new(),
        }
    }

    /// A field with a hand-placed pool.
    pub fn from_particles(config: StaticFieldConfig, particles: Vec<FieldParticle>) -> Self {
        Self {
            particles,
            ..Self::new(config)
        }
    }

    pub fn config(&self) -> &StaticFieldConfig {
        &self.config
    }

    pub fn particles(&self) -> &[FieldParticle] {
        &self.particles
    }

    /// Number of distinct links in the pool.
    pub fn link_count(&self) -> usize {
        self.particles
            .iter()
            .enumerate()
            .map(|(i, p)| p.connections.range(i + 1..).count())
            .sum()
    }

    fn move_particles(&mut self, ctx: &StepContext, rng: &mut SmallRng) {
        let c = &self.config;
        let bounds = ctx.bounds;
        let agitation = pointer_agitation(ctx.pointer.speed, c.agitation_speed);
        let pointer = ctx.pointer.position;

        for p in &mut self.particles {
            p.position += p.velocity;

            if p.position.x < 0.0 || p.position.x > bounds.x {
                p.velocity.x = -p.velocity.x;
                p.position.x = p.position.x.clamp(0.0, bounds.x);
            }
            if p.position.y < 0.0 || p.position.y > bounds.y {
                p.velocity.y = -p.velocity.y;
                p.position.y = p.position.y.clamp(0.0, bounds.y);
            }

            p.velocity *= c.friction;
            p.velocity += Vec2::new(rng.gen::<f32>() - 0.5, rng.gen::<f32>() - 0.5) * c.jitter;

            if agitation > 0.0 {
                let to_pointer = pointer - p.position;
                let d = to_pointer.length();
                if d > EPSILON && d < c.pointer_radius {
                    let falloff = 1.0 - d / c.pointer_radius;
                    p.velocity += to_pointer / d * (c.pointer_force * falloff * agitation);
                }
            }

            p.velocity = clamp_speed(p.velocity, c.speed.min, c.speed.max, rng);
        }
    }

    fn update_connections(&mut self, pointer: Vec2, bounds: Vec2) {
        let cr = self.config.connection_radius;
        let pr = self.config.pointer_radius;
        let max = self.config.max_connections;
        let n = self.particles.len();

        self.pointer_distance.clear();
        self.pointer_distance
            .extend(self.particles.iter().map(|p| p.position.distance(pointer)));

        // Existing links, each unordered pair once.
        for i in 0..n {
            self.links.clear();
            self.links
                .extend(self.particles[i].connections.range(i + 1..).map(|(&j, &s)| (j, s)));
            for k in 0..self.links.len() {
                let (j, strength) = self.links[k];
                let a = self.particles[i].position;
                let b = self.particles[j].position;
                let d = a.distance(b);
                let md = ((a + b) * 0.5).distance(pointer);
                let next = if d < cr && md < pr {
                    let target = (1.0 - d / cr) * (1.0 - md / pr);
                    strength * 0.9 + target * 0.1
                } else {
                    strength * 0.8
                };
                if next > PRUNE_BELOW {
                    link(&mut self.particles, i, j, next);
                } else {
                    unlink(&mut self.particles, i, j);
                }
            }
        }

        // New links between pairs that are both near the pointer.
        if self.config.use_grid {
            self.positions.clear();
            self.positions.extend(self.particles.iter().map(|p| p.position));
            self.grid.rebuild(bounds, cr, &self.positions);
        }
        let mut candidates = std::mem::take(&mut self.candidates);
        for i in 0..n {
            let di = self.pointer_distance[i];
            if !(di < pr) || self.particles[i].connections.len() >= max {
                continue;
            }
            if self.config.use_grid {
                self.grid.candidates_after(i, &mut candidates);
            } else {
                candidates.clear();
                candidates.extend(i + 1..n);
            }
            for &j in &candidates {
                if self.particles[i].connections.len() >= max {
                    break;
                }
                let dj = self.pointer_distance[j];
                if !(dj < pr)
                    || self.particles[j].connections.len() >= max
                    || self.particles[i].connections.contains_key(&j)
                {
                    continue;
                }
                let d = self.particles[i].position.distance(self.particles[j].position);
                if d < cr {
                    let distance_factor = 1.0 - d / cr;
                    let pointer_factor = (1.0 - di / pr).min(1.0 - dj / pr);
                    let seed = PRUNE_BELOW + distance_factor * pointer_factor * 0.2;
                    if seed > PRUNE_BELOW {
                        link(&mut self.particles, i, j, seed);
                    }
                }
            }
        }
        self.candidates = candidates;
    }

    fn update_alpha(&mut self) {
        let pr = self.config.pointer_radius;
        let base = self.config.base_alpha;
        for (p, &d) in self.particles.iter_mut().zip(&self.pointer_distance) {
            let target = if d < pr { 0.4 + 0.6 * p.max_strength() } else { base };
            p.alpha = (p.alpha * 0.95 + target * 0.05).clamp(0.0, 1.0);
        }
    }
}

/// Pointer speed mapped to `0..=1`. A resting pointer does not pull.
fn pointer_agitation(speed: f32, full_at: f32) -> f32 {
    if !(speed > 0.0) || !(full_at > 0.0) {
        return 0.0;
    }
    (speed / full_at).min(1.0)
}

impl Variant for StaticField {
    fn kind(&self) -> VariantKind {
        VariantKind::StaticField
    }

    fn populate(&mut self, bounds: Vec2, rng: &mut SmallRng) {
        let c = &self.config;
        self.particles = (0..c.count)
            .map(|_| {
                let position = random_point(bounds, rng);
                let velocity = random_direction(rng) * c.speed.sample(rng);
                FieldParticle::new(position, velocity, c.size.sample(rng))
            })
            .collect();
    }

    fn step(&mut self, ctx: &StepContext, rng: &mut SmallRng) {
        self.move_particles(ctx, rng);
        self.update_connections(ctx.pointer.position, ctx.bounds);
        self.update_alpha();
    }

    fn render(&self, canvas: &mut Canvas, ctx: &PaintContext<'_>) {
        let pr = self.config.pointer_radius;
        let [start, mid, end] = ctx.palette.gradient;
        let light = ctx.theme.is_light();
        let link_alpha = if light { 0.5 } else { 0.3 };
        let max_width = if light { 2.5 } else { 2.0 };
        let dot_alpha = if light { 0.6 } else { 0.4 };
        let glow_scale = if light { 3.0 } else { 2.0 };

        canvas.clear();

        for (i, a) in self.particles.iter().enumerate() {
            for (&j, &strength) in a.connections.range(i + 1..) {
                let b = &self.particles[j];
                let md = ((a.position + b.position) * 0.5).distance(ctx.pointer);
                let pointer_factor = if md < pr { 1.0 - md / pr } else { 0.0 };
                let alpha = strength * (link_alpha + pointer_factor * 0.7);
                let stops = [
                    ColorStop::new(0.0, start, alpha * a.alpha),
                    ColorStop::new(0.5, mid, alpha * a.alpha.max(b.alpha)),
                    ColorStop::new(1.0, end, alpha * b.alpha),
                ];
                let width = (1.0 + strength * pointer_factor * 1.5).min(max_width);
                canvas.stroke_line(a.position, b.position, width, &stops);
            }
        }

        for p in &self.particles {
            let d = p.position.distance(ctx.pointer);
            let influence = if d < pr { 1.0 - d / pr } else { 0.0 };
            let alpha = dot_alpha + influence * 0.6;
            let stops = [
                ColorStop::new(0.0, mid, alpha),
                ColorStop::new(0.5, start, alpha * 0.6),
                ColorStop::new(1.0, end, 0.0),
            ];
            canvas.fill_radial(
                p.position,
                p.size * (1.0 + influence * 0.8),
                p.size * glow_scale,
                &stops,
            );
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
