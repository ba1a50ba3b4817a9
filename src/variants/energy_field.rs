//! Short-lived crackling lines that shrink and fade as they expire.

use std::any::Any;

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::Rng;

use super::{random_direction, random_point, Agent, PaintContext, StepContext, Variant, VariantKind};
use crate::config::EnergyFieldConfig;
use crate::paint::ColorStop;
use crate::surface::Canvas;

/// Side stroke sticking out of a line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spark {
    pub origin: Vec2,
    pub tip: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnergyLine {
    pub start: Vec2,
    pub end: Vec2,
    /// Remaining steps.
    pub life: f32,
    pub max_life: f32,
    pub width: f32,
    pub sparks: Vec<Spark>,
}

impl EnergyLine {
    /// Remaining fraction of life, `0..=1`.
    pub fn progress(&self) -> f32 {
        if self.max_life > 0.0 {
            (self.life / self.max_life).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl Agent for EnergyLine {
    fn position(&self) -> Vec2 {
        self.start
    }
}

#[derive(Debug)]
pub struct EnergyField {
    config: EnergyFieldConfig,
    lines: Vec<EnergyLine>,
}

impl EnergyField {
    pub fn new(config: EnergyFieldConfig) -> Self {
        Self {
            config,
            lines: Vec::new(),
        }
    }

    pub fn lines(&self) -> &[EnergyLine] {
        &self.lines
    }

    fn spawn(&self, bounds: Vec2, pointer: Option<Vec2>, rng: &mut SmallRng) -> EnergyLine {
        let c = &self.config;
        let start = match pointer {
            Some(pointer) if rng.gen::<f32>() < c.near_pointer_chance => {
                pointer + random_direction(rng) * (rng.gen::<f32>() * c.pointer_radius)
            }
            _ => random_point(bounds, rng),
        };
        let end = start + random_direction(rng) * c.length.sample(rng);
        let max_life = c.life.sample(rng);
        let mut line = EnergyLine {
            start,
            end,
            life: max_life,
            max_life,
            width: c.width.sample(rng),
            sparks: Vec::with_capacity(c.sparks),
        };
        self.roll_sparks(&mut line, rng);
        line
    }

    fn roll_sparks(&self, line: &mut EnergyLine, rng: &mut SmallRng) {
        let along = line.end - line.start;
        let normal = along.perp().normalize_or_zero();
        line.sparks.clear();
        for _ in 0..self.config.sparks {
            let origin = line.start + along * rng.gen::<f32>();
            let tip = origin + normal * self.config.spark_length.sample(rng);
            line.sparks.push(Spark { origin, tip });
        }
    }
}

impl Variant for EnergyField {
    fn kind(&self) -> VariantKind {
        VariantKind::EnergyField
    }

    /// Lines start part-way through their lives so they do not all expire together.
    fn populate(&mut self, bounds: Vec2, rng: &mut SmallRng) {
        let mut lines = Vec::with_capacity(self.config.lines);
        for _ in 0..self.config.lines {
            let mut line = self.spawn(bounds, None, rng);
            line.life = (line.max_life * (1.0 - rng.gen::<f32>())).max(1.0);
            lines.push(line);
        }
        self.lines = lines;
    }

    fn step(&mut self, ctx: &StepContext, rng: &mut SmallRng) {
        let mut lines = std::mem::take(&mut self.lines);
        let mut near_pointer = 0;
        for line in &mut lines {
            line.life -= 1.0;
            if line.life <= 0.0 {
                let pointer = (near_pointer < self.config.spawn_rate).then_some(ctx.pointer.position);
                near_pointer += 1;
                *line = self.spawn(ctx.bounds, pointer, rng);
            } else {
                self.roll_sparks(line, rng);
            }
        }
        self.lines = lines;
    }

    fn render(&self, canvas: &mut Canvas, ctx: &PaintContext<'_>) {
        let palette = ctx.palette;
        canvas.clear();

        for line in &self.lines {
            let progress = line.progress();
            let alpha = progress * 0.8;
            let stops = [
                ColorStop::new(0.0, palette.primary, alpha),
                ColorStop::new(0.5, palette.secondary, alpha),
                ColorStop::new(1.0, palette.primary, alpha),
            ];
            canvas.stroke_line(line.start, line.end, line.width * progress, &stops);

            let spark = [ColorStop::new(0.0, palette.secondary, alpha * 0.5)];
            for s in &line.sparks {
                canvas.stroke_line(s.origin, s.tip, line.width * progress * 0.5, &spark);
            }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Span;
    use crate::input::PointerState;
    use rand::SeedableRng;

    fn ctx(bounds: Vec2, pointer: Vec2) -> StepContext {
        StepContext {
            bounds,
            pointer: PointerState { position: pointer, speed: 0.0 },
            now_ms: 0.0,
            dt_ms: 16.0,
        }
    }

    #[test]
    fn test_pool_size_is_constant() {
        let mut rng = SmallRng::seed_from_u64(1);
        let bounds = Vec2::new(640.0, 480.0);
        let mut field = EnergyField::new(EnergyFieldConfig::default());
        field.populate(bounds, &mut rng);
        assert_eq!(field.agent_count(), 50);
        for _ in 0..300 {
            field.step(&ctx(bounds, Vec2::new(320.0, 240.0)), &mut rng);
            assert_eq!(field.agent_count(), 50);
            for line in field.lines() {
                assert!(line.life > 0.0 && line.life <= line.max_life);
                assert_eq!(line.sparks.len(), 3);
            }
        }
    }

    #[test]
    fn test_expired_lines_respawn_near_pointer() {
        let config = EnergyFieldConfig {
            near_pointer_chance: 1.0,
            ..EnergyFieldConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(2);
        let bounds = Vec2::new(2000.0, 2000.0);
        let pointer = Vec2::new(1000.0, 1000.0);
        let mut field = EnergyField::new(config);
        field.populate(bounds, &mut rng);
        for line in &mut field.lines {
            line.life = 1.0;
        }
        field.step(&ctx(bounds, pointer), &mut rng);
        for line in &field.lines()[..2] {
            assert!(line.start.distance(pointer) <= 200.0 + 1e-3);
            assert_eq!(line.life, line.max_life);
        }
    }

    #[test]
    fn test_sparks_are_perpendicular() {
        let mut rng = SmallRng::seed_from_u64(3);
        let field = EnergyField::new(EnergyFieldConfig::default());
        let line = field.spawn(Vec2::splat(500.0), None, &mut rng);
        let along = (line.end - line.start).normalize();
        for s in &line.sparks {
            let spark = s.tip - s.origin;
            assert!(spark.dot(along).abs() < 1e-3);
            assert!(spark.length() >= 50.0 - 1e-2 && spark.length() <= 250.0 + 1e-2);
        }
    }

    #[test]
    fn test_zero_length_line_has_finite_sparks() {
        let config = EnergyFieldConfig {
            length: Span::new(0.0, 0.0),
            ..EnergyFieldConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(4);
        let field = EnergyField::new(config);
        let line = field.spawn(Vec2::splat(100.0), None, &mut rng);
        assert!(line.sparks.iter().all(|s| s.origin.is_finite() && s.tip.is_finite()));
    }

    #[test]
    fn test_progress() {
        let line = EnergyLine {
            start: Vec2::ZERO,
            end: Vec2::X,
            life: 15.0,
            max_life: 60.0,
            width: 2.0,
            sparks: Vec::new(),
        };
        assert_eq!(line.progress(), 0.25);
        assert_eq!(EnergyLine { max_life: 0.0, ..line }.progress(), 0.0);
    }
}
