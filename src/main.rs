use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use frameshow::cec::{self, TvControl};
use frameshow::config::{self, Configuration};
use frameshow::events::ShutdownFlag;
use frameshow::render::viewer;
use frameshow::{catalog, slides};

#[derive(Debug, Parser)]
#[command(name = "frameshow", version, about = "TV photo-frame slideshow")]
struct Args {
    /// Path to YAML config (default: ~/.frameshow/config.yaml)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,
    /// Print the composed slides without launching the UI
    #[arg(long = "slides-dry-run")]
    slides_dry_run: bool,
    /// Deterministic shuffle seed (overrides the config value)
    #[arg(long = "shuffle-seed", value_name = "SEED")]
    shuffle_seed: Option<u64>,
}

fn main() -> Result<()> {
    // init tracing (RUST_LOG controls level, default = info)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let config_path = args.config.unwrap_or_else(config::default_config_path);
    let cfg = Configuration::from_yaml_file(&config_path)
        .with_context(|| format!("failed to load configuration from {}", config_path.display()))?
        .validated()
        .context("invalid configuration values")?;
    info!(config = %config_path.display(), albums = cfg.albums.len(), "configuration loaded");

    let photos = catalog::load(&cfg, args.shuffle_seed).context("building photo catalog")?;
    let slides = slides::compose(&photos, cfg.pair_portraits);
    info!(photos = photos.len(), slides = slides.len(), "slides composed");

    if args.slides_dry_run {
        print_slides(&slides);
        return Ok(());
    }

    prepare_tv(&cfg);

    let (remote_tx, remote_rx) = crossbeam_channel::bounded(cec::EVENT_QUEUE_DEPTH);
    let shutdown = ShutdownFlag::new();
    if cfg.remote_enabled {
        cec::spawn_listener(remote_tx, shutdown.clone());
    }

    viewer::run(slides, &cfg, remote_rx, shutdown.clone())?;

    // Viewer returned: make sure the listener thread winds down too.
    shutdown.set();
    info!("slideshow stopped");
    Ok(())
}

/// Best-effort TV wake and input selection; failures never block the show.
fn prepare_tv(cfg: &Configuration) {
    let Some(input) = cfg.hdmi_input else { return };
    match TvControl::power_on() {
        Ok(()) => info!("TV power-on requested"),
        Err(err) => warn!(error = %err, "TV power-on failed"),
    }
    match TvControl::select_input(input) {
        Ok(()) => info!(input, "HDMI input claimed"),
        Err(err) => warn!(error = %err, input, "HDMI input selection failed"),
    }
}

fn print_slides(slides: &[slides::Slide]) {
    println!("# composed slides: {}", slides.len());
    for (idx, slide) in slides.iter().enumerate() {
        let kind = if slide.is_pair() { "pair  " } else { "single" };
        let paths: Vec<String> = slide
            .photos()
            .iter()
            .map(|p| p.path.display().to_string())
            .collect();
        println!("  {:>4} {} {}", idx, kind, paths.join("  +  "));
    }
}
