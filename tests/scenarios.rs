//! End-to-end behaviour through the public engine API.

use std::time::Duration;

use backdrop::config::{BlackHoleConfig, ProfileDefaults, Span, StaticFieldConfig};
use backdrop::variants::{BlackHole, BlackHoleParticle, FieldParticle, StaticField, StepContext};
use backdrop::{
    Engine, EngineConfig, ManualScheduler, PointerState, Profile, SnapshotError, Theme, Variant, VariantKind, Vec2,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;

const FRAME: Duration = Duration::from_micros(16_667);

fn ctx(bounds: Vec2, pointer: Vec2, now_ms: f64) -> StepContext {
    StepContext {
        bounds,
        pointer: PointerState { position: pointer, speed: 0.0 },
        now_ms,
        dt_ms: 16.0,
    }
}

fn small_config(seed: u64) -> EngineConfig {
    let mut config = EngineConfig {
        seed: Some(seed),
        ..EngineConfig::default()
    };
    config.static_field.desktop.count = 80;
    config.static_field.mobile.count = 40;
    config.black_hole.desktop.count = 60;
    config.black_hole.mobile.count = 30;
    config.noise_flow.count = 100;
    config
}

fn positions(variant: &dyn Variant) -> Vec<Vec2> {
    let mut out = Vec::with_capacity(variant.agent_count());
    variant.for_each_agent(&mut |agent| out.push(agent.position()));
    out
}

fn run_frames(engine: &mut Engine<ManualScheduler>, frames: u32) {
    let start = engine.time().frame() as u32;
    for i in 1..=frames {
        engine.pump(FRAME * (start + i));
    }
}

// ============================================================================
// Variant scenarios
// ============================================================================

#[test]
fn test_link_between_still_pair_converges() {
    let config = StaticFieldConfig {
        speed: Span::new(0.0, 0.0),
        jitter: 0.0,
        pointer_force: 0.0,
        ..StaticFieldConfig::default()
    };
    let particles = vec![
        FieldParticle::new(Vec2::new(90.0, 100.0), Vec2::ZERO, 2.0),
        FieldParticle::new(Vec2::new(110.0, 100.0), Vec2::ZERO, 2.0),
    ];
    let mut field = StaticField::from_particles(config, particles);
    let mut rng = SmallRng::seed_from_u64(1);
    let bounds = Vec2::new(200.0, 200.0);
    let pointer = Vec2::new(100.0, 100.0);

    field.step(&ctx(bounds, pointer, 0.0), &mut rng);
    let first = field.particles()[0].strength_to(1).unwrap();
    // Seed strength from the distance and pointer factors.
    let expected = 0.01 + 0.8 * (1.0 - 10.0 / 350.0) * 0.2;
    assert!((first - expected).abs() < 1e-4, "seeded at {first}");

    let mut last = first;
    for step in 1..100 {
        field.step(&ctx(bounds, pointer, step as f64 * 16.0), &mut rng);
        let s = field.particles()[0].strength_to(1).unwrap();
        assert!(s >= last - 1e-6 && s <= 1.0);
        assert_eq!(field.particles()[1].strength_to(0), Some(s));
        last = s;
    }
    // Target is (1 - 20/100) * (1 - 0/350).
    assert!((last - 0.8).abs() < 1e-3, "converged to {last}");
}

#[test]
fn test_pair_unlinks_after_pointer_leaves() {
    let config = StaticFieldConfig {
        speed: Span::new(0.0, 0.0),
        jitter: 0.0,
        pointer_force: 0.0,
        ..StaticFieldConfig::default()
    };
    let particles = vec![
        FieldParticle::new(Vec2::new(90.0, 100.0), Vec2::ZERO, 2.0),
        FieldParticle::new(Vec2::new(110.0, 100.0), Vec2::ZERO, 2.0),
    ];
    let mut field = StaticField::from_particles(config, particles);
    let mut rng = SmallRng::seed_from_u64(2);
    let bounds = Vec2::new(2000.0, 2000.0);

    for step in 0..30 {
        field.step(&ctx(bounds, Vec2::new(100.0, 100.0), step as f64 * 16.0), &mut rng);
    }
    assert_eq!(field.link_count(), 1);

    for step in 30..80 {
        field.step(&ctx(bounds, Vec2::new(1900.0, 1900.0), step as f64 * 16.0), &mut rng);
    }
    assert_eq!(field.link_count(), 0);
    assert!(field.particles().iter().all(|p| p.connections().is_empty()));
}

#[test]
fn test_small_mobile_field_keeps_links_consistent() {
    let config = StaticFieldConfig {
        count: 10,
        ..StaticFieldConfig::mobile()
    };
    let max_connections = config.max_connections;
    let bounds = Vec2::new(200.0, 200.0);
    let mut rng = SmallRng::seed_from_u64(4);
    let mut field = StaticField::new(config);
    field.populate(bounds, &mut rng);
    assert_eq!(field.particles().len(), 10);

    for step in 0..100 {
        field.step(&ctx(bounds, bounds * 0.5, step as f64 * 16.0), &mut rng);
        let particles = field.particles();
        for (i, p) in particles.iter().enumerate() {
            assert!(p.connections().len() <= max_connections, "{i} has {} links", p.connections().len());
            for (&j, &strength) in p.connections() {
                assert!(strength > 0.01 && strength <= 1.0, "link {i}-{j} at {strength}");
                assert_eq!(particles[j].strength_to(i), Some(strength), "asymmetric link {i}-{j}");
            }
        }
    }
}

#[test]
fn test_core_capture_never_produces_nan() {
    let pointer = Vec2::new(50.0, 50.0);
    let particles = vec![
        BlackHoleParticle::new(pointer, Vec2::ZERO, 1.0),
        BlackHoleParticle::new(pointer + Vec2::new(1e-9, 0.0), Vec2::ZERO, 1.0),
        BlackHoleParticle::new(pointer + Vec2::new(4.9, 0.0), Vec2::ZERO, 1.0),
        BlackHoleParticle::new(pointer + Vec2::new(40.0, 0.0), Vec2::ZERO, 1.0),
    ];
    let config = BlackHoleConfig {
        respawn_delay_ms: Span::new(10_000.0, 10_000.0),
        ..BlackHoleConfig::default()
    };
    let mut hole = BlackHole::from_particles(config, particles);
    let mut rng = SmallRng::seed_from_u64(3);

    hole.step(&ctx(Vec2::new(100.0, 100.0), pointer, 0.0), &mut rng);
    assert_eq!(hole.active_count(), 1);
    for p in hole.particles() {
        assert!(p.position.is_finite() && p.velocity.is_finite());
        assert!(p.alpha.is_finite());
    }
    let survivor = &hole.particles()[3];
    assert!(survivor.velocity.x < 0.0, "pulled toward the pointer");
    assert!(survivor.velocity.y.abs() > 0.0, "spiral component");
}

// ============================================================================
// Engine scenarios
// ============================================================================

#[test]
fn test_resize_repopulates_inside_new_bounds() {
    let mut engine = Engine::new(small_config(5), ManualScheduler::new());
    engine.mount(100.0, 100.0, 2.0);
    engine.pointer_moved(Vec2::new(50.0, 50.0));
    run_frames(&mut engine, 10);

    engine.resize(50.0, 50.0, 2.0);
    assert_eq!(engine.profile(), Profile::Mobile);
    assert_eq!(engine.variant().agent_count(), 40);
    let canvas = engine.surface().canvas().unwrap();
    assert_eq!((canvas.width(), canvas.height()), (100, 100));

    run_frames(&mut engine, 10);
    for p in positions(engine.variant()) {
        assert!(p.x >= 0.0 && p.x <= 50.0 && p.y >= 0.0 && p.y <= 50.0, "{p} escaped");
    }
    assert!(engine.is_running());
}

#[test]
fn test_frame_loop_lifecycle() {
    let mut engine = Engine::new(small_config(6), ManualScheduler::new());
    engine.mount(200.0, 150.0, 1.0);
    assert!(engine.is_running());
    assert_eq!(engine.scheduler().scheduled_count(), 1);

    // Starting twice keeps one pending frame.
    engine.start();
    assert_eq!(engine.scheduler().scheduled_count(), 1);

    run_frames(&mut engine, 3);
    assert_eq!(engine.time().frame(), 3);

    engine.stop();
    engine.stop();
    assert!(engine.pending_frame().is_none());
    assert_eq!(engine.scheduler().pending(), None);
    assert_eq!(engine.scheduler().cancelled_count(), 1);
    assert!(!engine.pump(FRAME * 10));

    engine.start();
    let handle = engine.pending_frame().unwrap();
    assert!(engine.fire(handle, FRAME * 11));
    assert_eq!(engine.time().frame(), 4);

    engine.dispose();
    assert!(!engine.is_running());
    assert!(!engine.surface().is_available());
}

#[test]
fn test_unavailable_surface_still_steps() {
    let mut engine = Engine::new(small_config(7), ManualScheduler::new());
    engine.mount(0.0, 0.0, 1.0);
    assert!(!engine.surface().is_available());
    assert!(engine.is_running());

    run_frames(&mut engine, 5);
    assert_eq!(engine.time().frame(), 5);
    assert!(matches!(engine.snapshot("never.png"), Err(SnapshotError::Unavailable)));
}

#[test]
fn test_every_variant_draws_something() {
    let mut engine = Engine::new(small_config(8), ManualScheduler::new());
    engine.mount(240.0, 160.0, 1.0);
    engine.pointer_moved(Vec2::new(120.0, 80.0));

    for kind in VariantKind::ALL {
        engine.select_variant(kind);
        assert_eq!(engine.variant().kind(), kind);
        assert!(engine.is_running());
        run_frames(&mut engine, 90);

        let canvas = engine.surface().canvas().unwrap();
        let painted = canvas.pixels().iter().filter(|p| p.w > 0.0).count();
        assert!(painted > 0, "{kind} left the canvas empty");
    }
}

#[test]
fn test_seeded_runs_are_identical() {
    let run = |kind: VariantKind| {
        let mut config = small_config(42);
        config.variant = kind;
        let mut engine = Engine::new(config, ManualScheduler::new());
        engine.mount(300.0, 200.0, 1.0);
        engine.pointer_moved(Vec2::new(150.0, 100.0));
        run_frames(&mut engine, 30);
        engine.pointer_moved(Vec2::new(40.0, 60.0));
        run_frames(&mut engine, 30);
        let canvas = engine.surface().canvas().unwrap().pixels().to_vec();
        (positions(engine.variant()), canvas)
    };

    for kind in VariantKind::ALL {
        let (a_positions, a_pixels) = run(kind);
        let (b_positions, b_pixels) = run(kind);
        assert_eq!(a_positions, b_positions, "{kind} positions diverged");
        assert!(a_pixels == b_pixels, "{kind} pixels diverged");
    }
}

#[test]
fn test_theme_changes_rendered_colours() {
    let mut config = small_config(9);
    config.variant = VariantKind::Waves;
    let mut engine = Engine::new(config, ManualScheduler::new());
    engine.mount(120.0, 80.0, 1.0);
    run_frames(&mut engine, 1);
    let dark = engine.surface().canvas().unwrap().pixels().to_vec();

    engine.set_theme(Theme::Light);
    engine.render();
    let light = engine.surface().canvas().unwrap().pixels().to_vec();
    assert!(dark != light);
}

#[test]
fn test_config_file_drives_the_engine() {
    let text = r#"
        variant = "black-hole"
        seed = 3

        [black_hole.desktop]
        count = 25
    "#;
    let config = EngineConfig::from_toml_str(text).unwrap();
    let mut engine = Engine::new(config, ManualScheduler::new());
    engine.mount(900.0, 600.0, 1.0);
    assert_eq!(engine.variant().kind(), VariantKind::BlackHole);
    assert_eq!(engine.variant().agent_count(), 25);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hole.png");
    run_frames(&mut engine, 10);
    engine.snapshot(&path).unwrap();
    let image = image::open(&path).unwrap();
    assert_eq!((image.width(), image.height()), (900, 600));
}
