use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use backdrop::viewer::{self, ViewerOptions};
use backdrop::{ConfigError, Engine, EngineConfig, ManualScheduler, Theme, VariantKind, Vec2};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// One frame at 60 Hz.
const FRAME: Duration = Duration::from_micros(16_667);

#[derive(Parser, Debug)]
#[command(name = "backdrop")]
#[command(about = "Interactive particle backgrounds in a window, or rendered headless to PNG", long_about = None)]
struct Args {
    /// Variant to show (static-field, black-hole, noise-flow, matrix, energy-field, starfield, waves).
    #[arg(long)]
    variant: Option<VariantKind>,

    /// Colour theme (dark or light).
    #[arg(long)]
    theme: Option<Theme>,

    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fixed RNG seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Logical width.
    #[arg(long, default_value_t = 1280.0)]
    width: f32,

    /// Logical height.
    #[arg(long, default_value_t = 720.0)]
    height: f32,

    /// Device pixel ratio for headless runs.
    #[arg(long, default_value_t = 1.0)]
    scale: f32,

    /// Render without a window and write the last frame to `--out`.
    #[arg(long, default_value_t = false)]
    headless: bool,

    /// Frames to simulate in headless mode.
    #[arg(long, default_value_t = 120)]
    frames: u32,

    /// Snapshot path.
    #[arg(long, default_value = "backdrop.png")]
    out: PathBuf,

    /// Pointer position for headless mode, as `X,Y` in logical pixels.
    #[arg(long, value_parser = parse_point)]
    pointer: Option<Vec2>,

    /// Print the effective configuration as TOML and exit.
    #[arg(long, default_value_t = false)]
    print_config: bool,
}

fn parse_point(s: &str) -> Result<Vec2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got `{s}`"))?;
    let x: f32 = x.trim().parse().map_err(|e| format!("bad x: {e}"))?;
    let y: f32 = y.trim().parse().map_err(|e| format!("bad y: {e}"))?;
    Ok(Vec2::new(x, y))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn build_config(args: &Args) -> Result<EngineConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(variant) = args.variant {
        config.variant = variant;
    }
    if let Some(theme) = args.theme {
        config.theme = theme;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate()?;
    Ok(config)
}

fn run_headless(config: EngineConfig, args: &Args) -> Result<(), backdrop::SnapshotError> {
    let mut engine = Engine::new(config, ManualScheduler::new());
    engine.mount(args.width, args.height, args.scale);
    let pointer = args
        .pointer
        .unwrap_or_else(|| engine.surface().viewport().center());
    engine.pointer_moved(pointer);

    for i in 1..=args.frames {
        engine.pump(FRAME * i);
    }
    info!(
        variant = %engine.variant().kind(),
        frames = engine.time().frame(),
        agents = engine.variant().agent_count(),
        "headless run finished"
    );
    engine.snapshot(&args.out)?;
    engine.dispose();
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "bad configuration");
            return ExitCode::FAILURE;
        }
    };

    if args.print_config {
        return match config.to_toml_string() {
            Ok(text) => {
                print!("{text}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                error!(%err, "could not print configuration");
                ExitCode::FAILURE
            }
        };
    }

    let result = if args.headless {
        run_headless(config, &args).map_err(|err| err.to_string())
    } else {
        let options = ViewerOptions {
            width: args.width,
            height: args.height,
            snapshot_path: args.out.clone(),
        };
        viewer::run(config, options).map_err(|err| err.to_string())
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "backdrop failed");
            ExitCode::FAILURE
        }
    }
}
