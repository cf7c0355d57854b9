#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use eframe::egui;
use image_cropper::{init_logging, AppConfig, ImageCropperApp};

fn main() -> anyhow::Result<()> {
    init_logging()?;

    let config = AppConfig::default();
    let title = config.title.clone();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(title.clone())
            .with_inner_size(config.initial_size)
            .with_min_inner_size(config.min_size),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(|cc| Ok(Box::new(ImageCropperApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to start UI: {e}"))
}
