//! eframe front end: toolbar, canvas painting and pointer forwarding.
//!
//! All selection logic lives in [`CropSession`]; this module only converts
//! egui input into canvas-relative [`PointerKind`] events and paints the
//! overlays the session hands back.

use std::path::{Path, PathBuf};

use eframe::egui;
use tracing::warn;

use crate::config::AppConfig;
use crate::error::CropError;
use crate::geometry::{CanvasPoint, CanvasRect};
use crate::session::{CropMode, CropSession, Overlay, OverlayStyle, PointerKind};

pub struct ImageCropperApp {
    config: AppConfig,
    session: CropSession,
    texture: Option<egui::TextureHandle>,
    crop_size_input: String,
    last_saved: Option<PathBuf>,
}

impl ImageCropperApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        Self {
            config,
            session: CropSession::new(),
            texture: None,
            crop_size_input: String::new(),
            last_saved: None,
        }
    }

    fn open_image(&mut self, ctx: &egui::Context, path: &Path) {
        match self.session.load_image(path) {
            Ok(()) => self.load_texture(ctx),
            Err(e) => report(&e),
        }
    }

    fn load_texture(&mut self, ctx: &egui::Context) {
        if let Some(image) = self.session.image() {
            let size = [image.width() as _, image.height() as _];
            let image_buffer = image.to_rgba8();
            let pixels = image_buffer.as_flat_samples();
            let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
            // Replacing the handle frees the previous texture
            self.texture =
                Some(ctx.load_texture("image", color_image, egui::TextureOptions::LINEAR));
        }
    }

    fn apply_crop_size(&mut self) {
        match self.session.set_crop_size(&self.crop_size_input) {
            Ok(size) => inform("Crop Size", &format!("Size set to {}", size)),
            Err(e) => report(&e),
        }
    }

    fn commit(&mut self) {
        match self.session.commit_crop() {
            Ok(path) => {
                inform(
                    "Success",
                    &format!("Cropped image saved as {}", path.display()),
                );
                self.last_saved = Some(path);
            }
            Err(e) => report(&e),
        }
    }

    /// Toolbar row. Returns true if Enter was used to submit the size field.
    fn toolbar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) -> bool {
        let mut size_submitted = false;

        ui.horizontal(|ui| {
            if ui.button("Load Image").clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Image files", self.config.image_extensions.as_slice())
                    .pick_file()
                {
                    self.open_image(ctx, &path);
                }
            }

            if ui.button("Save Path").clicked() {
                if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                    if let Err(e) = self.session.set_save_destination(dir) {
                        report(&e);
                    }
                }
            }

            ui.label("Crop Mode:");
            let mut mode = self.session.mode();
            egui::ComboBox::from_id_salt("crop_mode")
                .selected_text(mode.to_string())
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut mode, CropMode::FixedSizeClick, "click crop");
                    ui.selectable_value(&mut mode, CropMode::FreehandDrag, "draw crop");
                });
            if mode != self.session.mode() {
                if let Err(e) = self.session.set_crop_mode(mode) {
                    report(&e);
                }
            }

            if self.session.mode() == CropMode::FixedSizeClick {
                ui.label("Crop Size:");
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.crop_size_input).desired_width(60.0),
                );
                size_submitted =
                    response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("Set").clicked() || size_submitted {
                    self.apply_crop_size();
                }
            }
        });

        size_submitted
    }

    fn status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            match self.session.image() {
                Some(image) => ui.label(format!("{} x {}", image.width(), image.height())),
                None => ui.label("No image"),
            };
            ui.separator();
            match self.session.save_destination() {
                Some(dir) => ui.label(format!("Save to: {}", dir.display())),
                None => ui.label("No save path"),
            };
            if let Some(path) = &self.last_saved {
                ui.separator();
                ui.label(format!("Last saved: {}", path.display()));
            }
        });
    }

    fn canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let canvas = response.rect;
        self.session.set_canvas_size(canvas.width(), canvas.height());

        let (Some(projection), Some(geometry)) =
            (self.session.projection(), self.session.geometry())
        else {
            return;
        };

        if let Some(texture) = &self.texture {
            let image_rect = egui::Rect::from_min_size(
                canvas.min + egui::vec2(projection.offset_x as f32, projection.offset_y as f32),
                egui::vec2(
                    projection.scaled(geometry.image_width),
                    projection.scaled(geometry.image_height),
                ),
            );
            painter.image(
                texture.id(),
                image_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }

        self.forward_pointer(ui, &response, canvas.min);

        for overlay in self.session.overlays() {
            self.paint_overlay(&painter, canvas.min, &overlay);
        }
    }

    fn forward_pointer(&mut self, ui: &egui::Ui, response: &egui::Response, origin: egui::Pos2) {
        let to_canvas = |pos: egui::Pos2| CanvasPoint::new(pos.x - origin.x, pos.y - origin.y);

        let (pressed, down, released, pointer) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_down(),
                i.pointer.primary_released(),
                i.pointer.interact_pos(),
            )
        });

        let buttons = ButtonState {
            pressed,
            down,
            released,
        };
        let events = pointer_events(buttons, response.hovered(), response.hover_pos(), pointer);

        for (kind, pos) in events {
            if let Err(e) = self.session.handle_pointer_event(kind, to_canvas(pos)) {
                report(&e);
            }
        }
    }

    fn paint_overlay(&self, painter: &egui::Painter, origin: egui::Pos2, overlay: &Overlay) {
        let rect = to_screen_rect(origin, &overlay.rect);
        let selection = |color: egui::Color32| egui::Stroke::new(self.config.selection_stroke_width, color);

        match overlay.style {
            OverlayStyle::HoverPreview => {
                let stroke =
                    egui::Stroke::new(self.config.preview_stroke_width, egui::Color32::BLUE);
                let outline = [
                    rect.left_top(),
                    rect.right_top(),
                    rect.right_bottom(),
                    rect.left_bottom(),
                    rect.left_top(),
                ];
                painter.extend(egui::Shape::dashed_line(&outline, stroke, 6.0, 2.0));
            }
            OverlayStyle::DragPreview => {
                painter.rect_stroke(rect, 0.0, selection(egui::Color32::BLUE));
            }
            OverlayStyle::Pending => {
                painter.rect_stroke(rect, 0.0, selection(egui::Color32::RED));
            }
            OverlayStyle::Saved => {
                painter.rect_stroke(rect, 0.0, selection(egui::Color32::GREEN));
            }
        }
    }
}

/// Primary button transitions seen in one frame.
#[derive(Clone, Copy, Debug, Default)]
struct ButtonState {
    pressed: bool,
    down: bool,
    released: bool,
}

/// Turn one frame of egui pointer input into session events, in order.
///
/// A quick click can press and release within a single frame; both are
/// forwarded so a drag never stays open.
fn pointer_events(
    buttons: ButtonState,
    hovered: bool,
    hover_pos: Option<egui::Pos2>,
    pointer: Option<egui::Pos2>,
) -> Vec<(PointerKind, egui::Pos2)> {
    let mut events = Vec::with_capacity(2);
    if let Some(pos) = hover_pos {
        if !buttons.down && !buttons.pressed {
            events.push((PointerKind::Move, pos));
        }
    }
    if let Some(pos) = pointer {
        if buttons.pressed && hovered {
            events.push((PointerKind::Press, pos));
        }
        if buttons.released {
            events.push((PointerKind::Release, pos));
        } else if buttons.down && !buttons.pressed {
            events.push((PointerKind::Drag, pos));
        }
    }
    events
}

fn to_screen_rect(origin: egui::Pos2, rect: &CanvasRect) -> egui::Rect {
    egui::Rect::from_min_max(
        origin + egui::vec2(rect.min.x, rect.min.y),
        origin + egui::vec2(rect.max.x, rect.max.y),
    )
}

/// Show a recoverable error as a warning dialog.
fn report(err: &CropError) {
    warn!("{}", err);
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Warning)
        .set_title("Warning")
        .set_description(err.to_string())
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}

fn inform(title: &str, text: &str) {
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Info)
        .set_title(title)
        .set_description(text)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}

impl eframe::App for ImageCropperApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Handle dropped files
        if !ctx.input(|i| i.raw.dropped_files.is_empty()) {
            let dropped_files = ctx.input(|i| i.raw.dropped_files.clone());
            if let Some(path) = dropped_files.first().and_then(|file| file.path.clone()) {
                if self.config.accepts(&path) {
                    self.open_image(ctx, &path);
                } else {
                    warn!("Ignoring dropped file {}", path.display());
                }
            }
        }

        let size_submitted = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| self.toolbar(ctx, ui))
            .inner;

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| self.status_bar(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::WHITE))
            .show(ctx, |ui| self.canvas(ui));

        // Enter commits, unless it just confirmed the size field
        let commit_pressed = ctx.input(|i| i.key_pressed(egui::Key::Enter));
        if commit_pressed && !size_submitted && !ctx.wants_keyboard_input() {
            self.commit();
        }
    }
}
