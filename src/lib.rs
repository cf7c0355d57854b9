//! # Image Cropper
//!
//! Load an image, pick a region with the mouse and save it as a numbered PNG.
//!
//! Two selection modes are available:
//! - **click crop**: a fixed-size square (in image pixels) centered on the click
//! - **draw crop**: a freehand rectangle dragged out on the canvas
//!
//! ## Architecture
//!
//! 1. [`geometry`] - fitting the image into the canvas, canvas/image point mapping
//! 2. [`region`] - building clamped crop rectangles from pointer input
//! 3. [`session`] - selection state machine, crop and save
//! 4. [`app`] - the eframe/egui window that feeds events into the session

pub mod app;
pub mod config;
pub mod error;
pub mod geometry;
pub mod region;
pub mod session;

pub use app::ImageCropperApp;
pub use config::AppConfig;
pub use error::{CropError, Result};
pub use geometry::{CanvasPoint, CanvasRect, DisplayGeometry, ImagePoint, Projection};
pub use region::{fixed_size_click, freehand_drag, parse_crop_size, CropRectangle};
pub use session::{
    next_output_path, CropMode, CropSession, Overlay, OverlayStyle, PointerKind, OUTPUT_PREFIX,
};

/// Name of the log file written next to the executable in Windows GUI builds.
pub const LOG_FILE_NAME: &str = "image_cropper.log";

/// Where the Windows GUI build writes its log: next to the executable,
/// falling back to the working directory.
pub fn log_file_path() -> std::path::PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(LOG_FILE_NAME)
}

/// Initialize logging with the default configuration
///
/// Filtered by `RUST_LOG` with `info` as the baseline level. Release builds
/// on Windows have no console, so they append to [`log_file_path`] instead
/// of stdout.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    #[cfg(all(target_os = "windows", not(debug_assertions)))]
    {
        use std::fs::OpenOptions;

        // If the file cannot be opened, run without log output rather than fail
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file_path())
        {
            Ok(file) => {
                let fmt_layer = fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true)
                    .with_level(true)
                    .with_line_number(true);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .try_init()?;
            }
            Err(_) => {
                tracing_subscriber::registry().with(env_filter).try_init()?;
            }
        }
    }

    #[cfg(not(all(target_os = "windows", not(debug_assertions))))]
    {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(true)
            .with_level(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}
