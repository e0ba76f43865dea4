mod angle;
mod app;
mod behavior;
mod config;
mod ephemeris;
mod loader;
mod mesh;
mod renderer;
mod satellites;
mod scene;
mod shaders;
mod stars;
mod time;
mod uniforms;

use eframe::egui;

fn main() -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Orrery",
        options,
        Box::new(|cc| Ok(Box::new(app::OrreryApp::new(cc)))),
    )
}
