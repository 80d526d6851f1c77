use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use sdmarch::{
    demo,
    march::MarchConfig,
    render::{self, CancelToken, RenderSettings},
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scene {
    /// Three balls over a checkered floor.
    Spheres,
    /// A folded cube fractal.
    Fractal,
    /// An endless field of balls.
    Grid,
}

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Where to write the rendered PNG.
    #[arg(default_value = "out.png")]
    output: PathBuf,

    /// The demo scene to render.
    #[arg(short, long, value_enum, default_value_t = Scene::Spheres)]
    scene: Scene,

    #[arg(long, default_value_t = 1920)]
    width: u32,

    #[arg(long, default_value_t = 1080)]
    height: u32,

    /// Number of render threads. Defaults to the number of CPUs.
    #[arg(short, long)]
    threads: Option<usize>,

    /// Distance from a surface at which a ray counts as hitting it.
    #[arg(long, default_value_t = 0.01)]
    hit_distance: f64,

    /// Upper bound on the steps of a single march.
    #[arg(long, default_value_t = 1000)]
    max_steps: u32,

    /// Light added to every surface regardless of shadows.
    #[arg(long, default_value_t = 0.15)]
    ambient: f64,

    /// Folding depth of the fractal scene.
    #[arg(long, default_value_t = 4)]
    depth: usize,
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = Args::parse();

    if args.width == 0 || args.height == 0 {
        anyhow::bail!("image dimensions must be positive");
    }

    if args.hit_distance <= 0. {
        anyhow::bail!("--hit-distance must be positive");
    }

    let stage = match args.scene {
        Scene::Spheres => demo::spheres(),
        Scene::Fractal => demo::fractal(args.depth),
        Scene::Grid => demo::grid(),
    }
    .context("failed to build the scene")?;

    let settings = RenderSettings {
        width: args.width,
        height: args.height,
        threads: args.threads.unwrap_or_else(num_cpus::get),
        march: MarchConfig::default()
            .with_hit_distance(args.hit_distance)
            .with_max_steps(args.max_steps),
        ambient: args.ambient,
        ..RenderSettings::default()
    };

    let canvas = render::render(&settings, &stage, &CancelToken::new())?;
    canvas.save(&args.output)?;

    log::info!("wrote {}", args.output.display());

    Ok(())
}
