#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod config;
mod engine;
mod io;
mod model;
mod ui;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> eframe::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "stream_timeline=info,warn".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 640.0])
            .with_min_inner_size([520.0, 360.0])
            .with_title("Stream Timeline"),
        ..Default::default()
    };

    eframe::run_native(
        "Stream Timeline",
        options,
        Box::new(|cc| Ok(Box::new(app::TimelineApp::new(cc)))),
    )
}
