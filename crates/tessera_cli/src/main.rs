//! Tessera command line renderer.
//!
//! Renders one of the built-in scenes progressively until the sample budget
//! is reached and writes the result as a PNG.

mod scenes;

use anyhow::{Context, Result};
use clap::Parser;
use scenes::DemoScene;
use std::path::PathBuf;
use std::time::Instant;
use tessera_renderer::{RenderConfig, Renderer, SamplingStrategy};

#[derive(Parser, Debug)]
#[command(author, version, about = "Progressive CPU path tracer", long_about = None)]
struct Args {
    /// JSON render config. Fields it leaves out keep their defaults.
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Where to write the final image.
    #[arg(long, short = 'o', value_name = "FILE", default_value = "tessera.png")]
    output: PathBuf,

    /// Scene to render.
    #[arg(long, value_enum, default_value_t = DemoScene::Spheres)]
    scene: DemoScene,

    /// Samples per pixel; overrides the config.
    #[arg(long, short = 's', value_name = "NUM")]
    samples: Option<u32>,

    #[arg(long, value_name = "PIXELS")]
    width: Option<u32>,

    #[arg(long, value_name = "PIXELS")]
    height: Option<u32>,

    #[arg(long, value_name = "NUM")]
    seed: Option<u64>,

    /// Sample lights only, without indirect bounces.
    #[arg(long)]
    direct: bool,

    /// Smooth the output with the depth-aware filter.
    #[arg(long)]
    filter: bool,

    /// Open the lens by this much before rendering.
    #[arg(long, value_name = "RADIUS")]
    aperture: Option<f32>,

    /// Focus on whatever is at the center of the image.
    #[arg(long)]
    focus: bool,

    /// Render the BVH traversal cost instead of the image.
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn render_config(&self) -> Result<RenderConfig> {
        let mut config = match &self.config {
            Some(path) => RenderConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
            None => RenderConfig::default(),
        };

        if let Some(samples) = self.samples {
            config.max_samples = samples;
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if self.direct {
            config.sampling = SamplingStrategy::Direct;
        }
        if self.filter {
            config.depth_filter = true;
        }

        config.validate().context("invalid render settings")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    let config = args.render_config()?;

    log::info!("Building {:?} scene", args.scene);
    let (scene, camera) = args.scene.build();
    let mut renderer = Renderer::new(scene, camera, config)?;

    if let Some(aperture) = args.aperture {
        renderer.change_aperture(aperture);
    }
    if args.focus {
        renderer.focus_camera();
    }
    renderer.set_debug(args.debug);
    renderer.report();

    let start = Instant::now();
    let total = renderer.config().max_samples;
    while renderer.advance_frame() {
        let done = renderer.samples_taken();
        if done % 16 == 0 {
            log::info!("{done}/{total} samples ({:.1?})", start.elapsed());
        }
    }
    log::info!("Rendered {} samples per pixel in {:.2?}", renderer.samples_taken(), start.elapsed());

    renderer
        .read_output()
        .save_png(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    log::info!("Saved {}", args.output.display());

    Ok(())
}
