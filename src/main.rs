mod app;
mod chart;
mod cli;
mod color;
mod config;
mod data;
mod state;
mod ui;

use app::RustyDashApp;
use clap::Parser;
use cli::Cli;
use config::DashboardConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let cli = Cli::parse();
    let config = DashboardConfig::load(cli.config.as_deref());
    let initial_file = cli.file;
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Dash – Data Analysis Dashboard",
        options,
        Box::new(|_cc| {
            let app = match initial_file {
                Some(path) => RustyDashApp::with_file(config, &path),
                None => RustyDashApp::new(config),
            };
            Ok(Box::new(app))
        }),
    )
}
