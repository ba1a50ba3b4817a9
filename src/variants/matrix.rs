//! Falling columns of glyphs.
//!
//! The pool is a fixed set of drops, a share of which starts mid-fall. A drop
//! falls until its whole trail is below the bottom edge, then waits a random
//! delay and re-enters at the top, usually in a column near the pointer.

use std::any::Any;

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::Rng;

use super::{Agent, PaintContext, StepContext, Variant, VariantKind};
use crate::config::MatrixConfig;
use crate::glyphs::{atlas_len, glyph};
use crate::surface::Canvas;

#[derive(Debug, Clone, PartialEq)]
pub struct RainDrop {
    /// Left edge of the column.
    pub x: f32,
    /// Baseline of the leading glyph.
    pub head_y: f32,
    pub speed: f32,
    /// Atlas indices, leading glyph first.
    pub glyphs: Vec<u16>,
    refresh_ms: f32,
    last_refresh_ms: f64,
    active: bool,
    /// `None` until the first step sees the drop inactive.
    inactive_since_ms: Option<f64>,
    respawn_delay_ms: f32,
}

impl RainDrop {
    fn waiting(respawn_delay_ms: f32) -> Self {
        Self {
            x: 0.0,
            head_y: 0.0,
            speed: 0.0,
            glyphs: Vec::new(),
            refresh_ms: 0.0,
            last_refresh_ms: 0.0,
            active: false,
            inactive_since_ms: None,
            respawn_delay_ms,
        }
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn respawn_at_ms(&self) -> Option<f64> {
        if self.active {
            return None;
        }
        self.inactive_since_ms
            .map(|since| since + f64::from(self.respawn_delay_ms))
    }
}

impl Agent for RainDrop {
    fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.head_y)
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

fn random_glyph(rng: &mut SmallRng) -> u16 {
    rng.gen_range(0..atlas_len()) as u16
}

#[derive(Debug)]
pub struct Matrix {
    config: MatrixConfig,
    drops: Vec<RainDrop>,
}

impl Matrix {
    pub fn new(config: MatrixConfig) -> Self {
        Self {
            config,
            drops: Vec::new(),
        }
    }

    pub fn drops(&self) -> &[RainDrop] {
        &self.drops
    }

    pub fn active_count(&self) -> usize {
        self.drops.iter().filter(|d| d.active).count()
    }

    /// Column for a drop entering now.
    fn spawn_column(&self, width: f32, pointer: Vec2, rng: &mut SmallRng) -> f32 {
        let c = &self.config;
        let font = c.font_size;
        let x = if rng.gen::<f32>() < c.pointer_bias {
            let column = (pointer.x / font).floor() * font;
            column + (rng.gen::<f32>() * 2.0 - 1.0) * c.pointer_jitter
        } else {
            self.random_column(width, rng)
        };
        if x.is_finite() {
            x.clamp(0.0, width.max(0.0))
        } else {
            0.0
        }
    }

    fn random_column(&self, width: f32, rng: &mut SmallRng) -> f32 {
        let font = self.config.font_size;
        let columns = (width / font).floor();
        (rng.gen::<f32>() * columns).floor() * font
    }

    fn launch(&self, drop: &mut RainDrop, x: f32, now_ms: f64, rng: &mut SmallRng) {
        let c = &self.config;
        let len = (c.length.sample(rng).floor() as usize).max(1);
        drop.x = x;
        drop.head_y = 0.0;
        drop.speed = c.speed.sample(rng);
        drop.glyphs.clear();
        drop.glyphs.extend((0..len).map(|_| random_glyph(rng)));
        drop.refresh_ms = c.glyph_refresh_ms.sample(rng);
        drop.last_refresh_ms = now_ms;
        drop.active = true;
        drop.inactive_since_ms = None;
    }
}

impl Variant for Matrix {
    fn kind(&self) -> VariantKind {
        VariantKind::Matrix
    }

    /// The first `initial_active` share of drops starts mid-fall at random
    /// heights; the rest wait off-screen with a staggered entry delay.
    fn populate(&mut self, bounds: Vec2, rng: &mut SmallRng) {
        let c = &self.config;
        let falling = (c.drops as f32 * c.initial_active.clamp(0.0, 1.0)).round() as usize;
        let mut drops = Vec::with_capacity(c.drops);
        for i in 0..c.drops {
            let mut drop = RainDrop::waiting(c.respawn_delay_ms.sample(rng));
            if i < falling {
                let x = self.random_column(bounds.x, rng).clamp(0.0, bounds.x.max(0.0));
                self.launch(&mut drop, x, 0.0, rng);
                drop.head_y = rng.gen::<f32>() * bounds.y.max(0.0);
            }
            drops.push(drop);
        }
        self.drops = drops;
    }

    fn step(&mut self, ctx: &StepContext, rng: &mut SmallRng) {
        let font = self.config.font_size;
        let now = ctx.now_ms;
        let mut drops = std::mem::take(&mut self.drops);

        for drop in &mut drops {
            if !drop.active {
                let since = *drop.inactive_since_ms.get_or_insert(now);
                if now - since >= f64::from(drop.respawn_delay_ms) {
                    let x = self.spawn_column(ctx.bounds.x, ctx.pointer.position, rng);
                    self.launch(drop, x, now, rng);
                }
                continue;
            }

            if now - drop.last_refresh_ms > f64::from(drop.refresh_ms) {
                for g in &mut drop.glyphs {
                    *g = random_glyph(rng);
                }
                drop.last_refresh_ms = now;
            }

            drop.head_y += drop.speed;

            if drop.head_y - drop.len() as f32 * font >= ctx.bounds.y {
                drop.active = false;
                drop.inactive_since_ms = Some(now);
                drop.respawn_delay_ms = self.config.respawn_delay_ms.sample(rng);
            }
        }

        self.drops = drops;
    }

    fn render(&self, canvas: &mut Canvas, ctx: &PaintContext<'_>) {
        let c = &self.config;
        let font = c.font_size;
        let palette = ctx.palette;

        canvas.fade(palette.background, c.fade);

        for drop in self.drops.iter().filter(|d| d.active) {
            let len = drop.len() as f32;
            for (i, &index) in drop.glyphs.iter().enumerate() {
                let y = drop.head_y - i as f32 * font;
                if y < 0.0 {
                    continue;
                }
                let d = Vec2::new(drop.x, y).distance(ctx.pointer);
                let alpha = if d < c.pointer_radius {
                    1.0 - d / c.pointer_radius
                } else {
                    (1.0 - i as f32 / len) * 0.8
                };
                let (color, alpha) = if i == 0 {
                    (palette.primary, alpha)
                } else {
                    (palette.secondary, alpha * 0.8)
                };
                canvas.fill_glyph(glyph(index), Vec2::new(drop.x, y - font), font, color, alpha.clamp(0.0, 1.0));
            }
        }
    }

    fn agent_count(&self) -> usize {
        self.drops.len()
    }

    fn for_each_agent(&self, f: &mut dyn FnMut(&dyn Agent)) {
        for d in &self.drops {
            f(d);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Span;
    use crate::input::PointerState;
    use rand::SeedableRng;

    fn ctx(bounds: Vec2, pointer: Vec2, now_ms: f64) -> StepContext {
        StepContext {
            bounds,
            pointer: PointerState { position: pointer, speed: 0.0 },
            now_ms,
            dt_ms: 16.0,
        }
    }

    #[test]
    fn test_populate_starts_a_share_falling() {
        let mut rng = SmallRng::seed_from_u64(1);
        let bounds = Vec2::new(800.0, 600.0);
        let mut matrix = Matrix::new(MatrixConfig::default());
        matrix.populate(bounds, &mut rng);
        assert_eq!(matrix.agent_count(), 40);
        assert_eq!(matrix.active_count(), 10);
        for d in matrix.drops().iter().filter(|d| d.is_active()) {
            assert!(d.head_y >= 0.0 && d.head_y <= bounds.y);
            assert!(d.x >= 0.0 && d.x <= bounds.x);
            assert!(!d.is_empty());
        }
        assert!(matrix.drops().iter().all(|d| d.respawn_at_ms().is_none()));
    }

    #[test]
    fn test_populate_can_start_all_waiting() {
        let config = MatrixConfig {
            initial_active: 0.0,
            ..MatrixConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(1);
        let mut matrix = Matrix::new(config);
        matrix.populate(Vec2::new(800.0, 600.0), &mut rng);
        assert_eq!(matrix.active_count(), 0);
        assert!(matrix.drops().iter().all(|d| d.is_empty()));
    }

    #[test]
    fn test_drops_enter_over_time() {
        let mut rng = SmallRng::seed_from_u64(2);
        let bounds = Vec2::new(800.0, 600.0);
        let mut matrix = Matrix::new(MatrixConfig::default());
        matrix.populate(bounds, &mut rng);
        for frame in 0..200 {
            matrix.step(&ctx(bounds, Vec2::new(400.0, 300.0), frame as f64 * 16.0), &mut rng);
        }
        assert!(matrix.active_count() > 0);
        for d in matrix.drops().iter().filter(|d| d.is_active()) {
            assert!(d.x >= 0.0 && d.x <= bounds.x);
            assert!((5..15).contains(&d.len()));
        }
    }

    #[test]
    fn test_pointer_bias_picks_nearby_column() {
        let config = MatrixConfig {
            pointer_bias: 1.0,
            initial_active: 0.0,
            respawn_delay_ms: Span::new(0.0, 0.0),
            ..MatrixConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(3);
        let bounds = Vec2::new(1000.0, 600.0);
        let mut matrix = Matrix::new(config);
        matrix.populate(bounds, &mut rng);
        matrix.step(&ctx(bounds, Vec2::new(500.0, 100.0), 0.0), &mut rng);
        assert_eq!(matrix.active_count(), 40);
        for d in matrix.drops() {
            assert!((d.x - 496.0).abs() <= 50.0);
        }
    }

    #[test]
    fn test_drop_leaves_and_respawns_in_window() {
        let config = MatrixConfig {
            drops: 1,
            speed: Span::new(100.0, 100.0),
            length: Span::new(1.0, 1.0),
            initial_active: 0.0,
            respawn_delay_ms: Span::new(0.0, 0.0),
            ..MatrixConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(4);
        let bounds = Vec2::new(100.0, 100.0);
        let mut matrix = Matrix::new(config);
        matrix.populate(bounds, &mut rng);
        matrix.step(&ctx(bounds, Vec2::ZERO, 0.0), &mut rng);
        assert_eq!(matrix.active_count(), 1);

        // 100 px per step; the one-glyph trail clears a 100 px tall view on the second step.
        matrix.step(&ctx(bounds, Vec2::ZERO, 16.0), &mut rng);
        assert_eq!(matrix.active_count(), 1);
        matrix.step(&ctx(bounds, Vec2::ZERO, 32.0), &mut rng);
        assert_eq!(matrix.active_count(), 0);

        matrix.config.respawn_delay_ms = Span::new(40.0, 60.0);
        matrix.drops[0].respawn_delay_ms = 50.0;
        assert_eq!(matrix.drops()[0].respawn_at_ms(), Some(82.0));
        matrix.step(&ctx(bounds, Vec2::ZERO, 81.0), &mut rng);
        assert_eq!(matrix.active_count(), 0);
        matrix.step(&ctx(bounds, Vec2::ZERO, 82.0), &mut rng);
        assert_eq!(matrix.active_count(), 1);
        assert_eq!(matrix.drops()[0].head_y, 0.0);
    }

    #[test]
    fn test_glyphs_refresh() {
        let config = MatrixConfig {
            drops: 1,
            speed: Span::new(0.0, 0.0),
            length: Span::new(12.0, 12.0),
            glyph_refresh_ms: Span::new(10.0, 10.0),
            initial_active: 0.0,
            respawn_delay_ms: Span::new(0.0, 0.0),
            ..MatrixConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(5);
        let bounds = Vec2::new(100.0, 100.0);
        let mut matrix = Matrix::new(config);
        matrix.populate(bounds, &mut rng);
        matrix.step(&ctx(bounds, Vec2::ZERO, 0.0), &mut rng);
        let before = matrix.drops()[0].glyphs.clone();
        matrix.step(&ctx(bounds, Vec2::ZERO, 5.0), &mut rng);
        assert_eq!(matrix.drops()[0].glyphs, before);
        matrix.step(&ctx(bounds, Vec2::ZERO, 11.0), &mut rng);
        assert_ne!(matrix.drops()[0].glyphs, before);
    }
}
