//! Benchmarks for per-frame simulation and painting.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use backdrop::config::{BlackHoleConfig, StaticFieldConfig};
use backdrop::variants::{BlackHole, PaintContext, StaticField, StepContext};
use backdrop::{PointerState, Surface, Theme, Variant, Vec2};

const BOUNDS: Vec2 = Vec2::new(1920.0, 1080.0);

fn ctx(pointer: Vec2, now_ms: f64) -> StepContext {
    StepContext {
        bounds: BOUNDS,
        pointer: PointerState { position: pointer, speed: 0.5 },
        now_ms,
        dt_ms: 16.0,
    }
}

fn bench_static_field_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("static_field_step");
    group.sample_size(30);

    for count in [500usize, 2500] {
        for use_grid in [true, false] {
            let label = if use_grid { "grid" } else { "scan" };
            group.bench_with_input(BenchmarkId::new(label, count), &count, |b, &count| {
                let config = StaticFieldConfig {
                    count,
                    use_grid,
                    ..StaticFieldConfig::default()
                };
                let mut rng = SmallRng::seed_from_u64(1);
                let mut field = StaticField::new(config);
                field.populate(BOUNDS, &mut rng);
                let mut now = 0.0;
                b.iter(|| {
                    now += 16.0;
                    field.step(&ctx(BOUNDS * 0.5, now), &mut rng);
                    black_box(field.link_count())
                })
            });
        }
    }

    group.finish();
}

fn bench_black_hole_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("black_hole_step");

    group.bench_function("600", |b| {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut hole = BlackHole::new(BlackHoleConfig::default());
        hole.populate(BOUNDS, &mut rng);
        let mut now = 0.0;
        b.iter(|| {
            now += 16.0;
            hole.step(&ctx(BOUNDS * 0.5, now), &mut rng);
            black_box(hole.active_count())
        })
    });

    group.finish();
}

fn bench_static_field_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("static_field_render");
    group.sample_size(20);

    group.bench_function("1000", |b| {
        let config = StaticFieldConfig {
            count: 1000,
            ..StaticFieldConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(3);
        let mut field = StaticField::new(config);
        field.populate(BOUNDS, &mut rng);
        for i in 0..30 {
            field.step(&ctx(BOUNDS * 0.5, f64::from(i) * 16.0), &mut rng);
        }

        let mut surface = Surface::new();
        surface.configure(BOUNDS.x, BOUNDS.y, 1.0);
        let theme = Theme::Dark;
        let paint = PaintContext {
            palette: theme.palette(),
            theme,
            pointer: BOUNDS * 0.5,
            bounds: BOUNDS,
        };
        b.iter(|| {
            if let Some(canvas) = surface.canvas_mut() {
                field.render(canvas, &paint);
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_static_field_step, bench_black_hole_step, bench_static_field_render);
criterion_main!(benches);
