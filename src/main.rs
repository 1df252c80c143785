mod about;
mod animator;
mod app;
mod artwork;
mod cli;
mod config;
mod connector;
mod platform;

use crate::{
    app::{SaverApp, SaverMode},
    cli::LaunchMode,
    config::Config,
    connector::PlayerConnector,
};
use anyhow::anyhow;
use eframe::egui::ViewportBuilder;
use std::env;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let mode = cli::parse(&args)?;
    log::info!("starting in {mode:?} mode");

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            log::warn!("falling back to default config: {e:#}");
            Config::default()
        }
    };

    match mode {
        LaunchMode::Run => run_saver(config),
        LaunchMode::Preview(parent) => run_preview(parent, config),
        LaunchMode::Configure => about::run_dialog(),
    }
}

/// A failed connect is non-fatal: the saver still covers the screen, just
/// with a bare background and no motion.
fn connect_player() -> Option<PlayerConnector> {
    match PlayerConnector::connect() {
        Ok(connector) => Some(connector),
        Err(e) => {
            log::warn!("{e:#}");
            None
        }
    }
}

fn run_saver(config: Config) -> anyhow::Result<()> {
    let connector = connect_player();
    let app = SaverApp::new(SaverMode::FullScreen, config, connector);

    let options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_fullscreen(true)
            .with_always_on_top(),
        ..Default::default()
    };

    eframe::run_native(
        "album-art-saver",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow!("failed to run the saver window: {e}"))
}

#[cfg(target_os = "windows")]
fn run_preview(parent: isize, config: Config) -> anyhow::Result<()> {
    let (width, height) = platform::client_size(parent)?;
    let connector = connect_player();
    let app = SaverApp::new(
        SaverMode::Preview {
            parent,
            width,
            height,
        },
        config,
        connector,
    );

    let options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size([width as f32, height as f32])
            .with_decorations(false),
        ..Default::default()
    };

    eframe::run_native(
        "album-art-saver-preview",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow!("failed to run the preview window: {e}"))
}

#[cfg(not(target_os = "windows"))]
fn run_preview(_parent: isize, _config: Config) -> anyhow::Result<()> {
    anyhow::bail!("preview embedding is only supported on Windows")
}
