mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use anyhow::Context;
use app::BikeShareApp;
use config::DataSource;
use eframe::egui;
use state::AppState;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let source = DataSource::from_env();
    let data = data::loader::load(&source)
        .inspect_err(|e| log::error!("Startup load failed: {e:#}"))
        .context("cannot start without the bike-share tables")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Bike Sharing Analysis Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(BikeShareApp::new(AppState::new(source, data))))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
