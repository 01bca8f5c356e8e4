//! `lumo`: evaluate a scene script, render its last scene and save the image.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use lumo_core::{Engine, ScriptError};
use lumo_renderer::{RenderConfig, RenderListener, RenderStrategy, Renderer};

#[derive(Parser, Debug)]
#[command(name = "lumo")]
#[command(version, about = "Render a Lumo scene script to an image", long_about = None)]
struct Cli {
    /// Scene script to evaluate
    script: PathBuf,

    /// Output image; the format follows the extension
    #[arg(long, short = 'o', value_name = "PATH", default_value = "output.png")]
    output: PathBuf,

    /// Image width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Image height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Split rows across N worker tasks plus the main thread
    #[arg(long, value_name = "N", conflicts_with_all = ["interlace", "sequential"])]
    workers: Option<u32>,

    /// Render in N interlaced passes on the main thread
    #[arg(long, value_name = "N", conflicts_with = "sequential")]
    interlace: Option<u32>,

    /// Render rows in order on the main thread
    #[arg(long)]
    sequential: bool,

    /// Load render settings from a JSON file; other flags override it
    #[arg(long, short = 'c', value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Cli {
    fn render_config(&self) -> Result<RenderConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => RenderConfig::default(),
        };

        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }

        if self.sequential {
            config.strategy = RenderStrategy::Sequential;
        } else if let Some(passes) = self.interlace {
            config.strategy = RenderStrategy::Interlaced { passes };
        } else if let Some(workers) = self.workers {
            config.strategy = RenderStrategy::Parallel { workers };
        }

        Ok(config)
    }
}

fn load_config(path: &Path) -> Result<RenderConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid render config {}", path.display()))
}

/// Logs render progress about every tenth of the image.
struct ProgressLog {
    height: u32,
    rows_done: AtomicU32,
}

impl ProgressLog {
    fn new(height: u32) -> Self {
        Self {
            height,
            rows_done: AtomicU32::new(0),
        }
    }
}

impl RenderListener for ProgressLog {
    fn on_render_start(&self) {
        self.rows_done.store(0, Ordering::Relaxed);
    }

    fn on_render_line(&self, _y: u32) {
        let done = self.rows_done.fetch_add(1, Ordering::Relaxed) + 1;
        let step = (self.height / 10).max(1);
        if done % step == 0 || done == self.height {
            log::info!("{:>3}% ({}/{} rows)", done * 100 / self.height, done, self.height);
        }
    }

    fn on_render_end(&self) {
        log::info!("All {} rows done", self.height);
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    let config = cli.render_config()?;

    let mut engine = Engine::new();
    engine
        .eval_file(&cli.script)
        .with_context(|| format!("Failed to evaluate {}", cli.script.display()))?;

    let scenes = engine.take_scenes();
    let scene = scenes
        .last()
        .ok_or(ScriptError::NoScene)
        .with_context(|| format!("Nothing to render in {}", cli.script.display()))?;
    log::info!(
        "Script defined {} scene(s), rendering the last one",
        scenes.len()
    );

    let mut renderer = Renderer::new(config.clone());
    renderer.set_listener(Arc::new(ProgressLog::new(config.height)));
    renderer.render(scene).context("Render failed")?;

    let image = renderer.image();
    image::save_buffer(
        &cli.output,
        &image.to_rgba8(),
        image.width,
        image.height,
        image::ColorType::Rgba8,
    )
    .with_context(|| format!("Failed to save {}", cli.output.display()))?;
    log::info!("Saved {}", cli.output.display());

    Ok(())
}
