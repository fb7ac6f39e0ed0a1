//! Planet sculpting demo - headless driver
//!
//! Loads the startup assets, builds the planet scene, then runs the frame
//! loop against a headless renderer while a background thread replays
//! scripted pointer input.

use planet_config::ParamStore;
use sculpting::{load_scene_assets, AssetPaths, PlanetScene, SceneConfig};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

mod config;
mod fs_assets;
mod headless;
mod script;

use config::AppConfig;
use fs_assets::FsAssets;
use headless::HeadlessRenderer;

/// Target frame interval (~60fps)
const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run() {
        error!("Planet sculpt failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env();
    info!(?config, "Starting planet sculpt");

    let params = config.load_params()?;

    // The frame loop must not start until every asset has loaded
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let source = FsAssets::new(&config.asset_root);
    let assets = runtime.block_on(load_scene_assets(&source, &AssetPaths::default()))?;
    drop(runtime);

    let scene_config = SceneConfig {
        neighbor_search: config.neighbor_search,
        ..Default::default()
    };
    let display = scene_config.display.clone();
    let mut store = ParamStore::new(params);
    store.subscribe(|change| debug!(?change, "Sculpt parameter changed"));
    let mut scene = PlanetScene::new(scene_config, store, assets);
    let mut renderer = HeadlessRenderer::new(display.width, display.height);

    let producer = script::spawn_script(scene.input_sender(), script::demo_script(), FRAME_INTERVAL);

    let mut last = Instant::now();
    let mut modified = 0usize;
    let mut hidden = 0usize;
    for _ in 0..config.frames {
        let start = Instant::now();
        let dt = start.duration_since(last).as_secs_f32();
        last = start;

        let report = scene.frame(dt, &mut renderer);
        modified += report.vertices_modified;
        hidden += report.instances_hidden;

        if let Some(rest) = FRAME_INTERVAL.checked_sub(start.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    // Closing the queue stops the producer if it is still running
    drop(scene);
    let delivered = producer.join().unwrap_or_default();

    let stats = renderer.stats();
    info!(
        frames = stats.frames,
        vertex_updates = modified,
        instances_mowed = hidden,
        surface_uploads = stats.surface_uploads,
        decal_uploads = stats.decal_uploads,
        instance_uploads = stats.instance_uploads,
        uploaded_bytes = stats.bytes,
        input_events = delivered,
        "Planet sculpt finished"
    );
    Ok(())
}
