#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod config;
mod error;
mod io;
mod logging;
mod model;
mod ui;

fn main() -> eframe::Result<()> {
    // Keep the handle alive, dropping it stops the logger.
    let _logger = match logging::init_logging() {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("logging disabled: {e}");
            None
        }
    };

    let config = config::PlannerConfig::load();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 400.0])
            .with_title("Timeline Planner"),
        ..Default::default()
    };

    eframe::run_native(
        "Timeline Planner",
        options,
        Box::new(|cc| Ok(Box::new(app::PlannerApp::new(cc, config)))),
    )
}
