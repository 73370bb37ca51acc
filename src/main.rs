mod app;
mod color;
mod config;
mod context;
mod data;
mod map_view;
mod resources;
mod state;
mod ui;

use app::SeismoTrackApp;
use config::DashboardConfig;
use context::AppContext;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = DashboardConfig::load();
    let context = AppContext::bootstrap(config);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "SeismoTrack – Indonesian Earthquake Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(SeismoTrackApp::new(context)))),
    )
}
