//! Application state and the egui frame loop.

use std::path::Path;

use eframe::egui;
use image::DynamicImage;
use log::warn;

use crate::geometry::{self, PixelPoint};
use crate::io;
use crate::selection::DragTracker;

const PADDING: f32 = 20.0;

#[derive(Default)]
pub struct CropperApp {
    image: Option<DynamicImage>,
    texture: Option<egui::TextureHandle>,
    cropped: Option<DynamicImage>,
    preview_texture: Option<egui::TextureHandle>,
    tracker: DragTracker,
    error: Option<String>,
}

impl CropperApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self::default()
    }

    /// Discards everything derived from the current image: the pending drag,
    /// the feedback overlay, and the previous cropped result.
    fn reset_session(&mut self) {
        self.tracker.reset();
        self.cropped = None;
        self.preview_texture = None;
    }

    fn open_image(&mut self, ctx: &egui::Context, path: &Path) {
        self.reset_session();
        match io::load_image(path) {
            Ok(img) => {
                self.image = Some(img);
                self.load_texture(ctx);
            }
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    fn load_texture(&mut self, ctx: &egui::Context) {
        if let Some(image) = &self.image {
            self.texture = Some(upload_texture(ctx, "image", image));
        }
    }

    fn load_preview_texture(&mut self, ctx: &egui::Context) {
        if let Some(cropped) = &self.cropped {
            self.preview_texture = Some(upload_texture(ctx, "preview", cropped));
        }
    }

    /// Finalizes the drag at `end`. Returns true when a new cropped result
    /// replaced the previous one (the preview texture must then be refreshed).
    fn apply_crop(&mut self, end: PixelPoint) -> bool {
        let Some(rect) = self.tracker.finish(end) else {
            return false;
        };
        let Some(image) = &self.image else {
            return false;
        };
        match io::crop_region(image, rect) {
            Ok(cropped) => {
                self.cropped = Some(cropped);
                true
            }
            Err(e) => {
                // Silent in the UI: a drag outside the image just does nothing.
                warn!("selection ignored: {}", e);
                false
            }
        }
    }

    fn show_error_window(&mut self, ctx: &egui::Context) {
        let Some(message) = self.error.clone() else {
            return;
        };
        egui::Window::new("Error")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(message);
                if ui.button("OK").clicked() {
                    self.error = None;
                }
            });
    }

    fn show_toolbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Open Image").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Image", io::SUPPORTED_EXTENSIONS)
                        .pick_file()
                    {
                        self.open_image(ui.ctx(), &path);
                    }
                }

                let save = ui.add_enabled(self.cropped.is_some(), egui::Button::new("Save Crop"));
                if save.clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Image", io::SUPPORTED_EXTENSIONS)
                        .save_file()
                    {
                        let result = self.cropped.as_ref().map(|c| io::save_image(c, &path));
                        if let Some(Err(e)) = result {
                            self.error = Some(e.to_string());
                        }
                    }
                }
            });
        });
    }

    fn show_preview_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("crop_preview")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Preview");
                ui.separator();
                if let Some(texture) = &self.preview_texture {
                    let available = ui.available_size();
                    let size = texture.size_vec2();
                    let scale = (available.x / size.x).min(available.y / size.y).min(1.0);
                    if scale > 0.0 {
                        ui.image((texture.id(), size * scale));
                    }
                } else {
                    ui.label("Drag a rectangle over the image to crop it.");
                }
            });
    }

    fn show_image_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let Some((tex_id, image_size)) = self.texture.as_ref().map(|t| (t.id(), t.size_vec2()))
            else {
                ui.centered_and_justified(|ui| {
                    ui.label("Open an image (or drop one here) to begin.");
                });
                return;
            };
            let Some((pixel_w, pixel_h)) = self.image.as_ref().map(|i| (i.width(), i.height()))
            else {
                return;
            };

            // Scale the image to fit the panel, keeping its aspect ratio.
            let available = ui.available_size();
            let max_size = available - egui::vec2(PADDING * 2.0, PADDING * 2.0);
            let scale = (max_size.x / image_size.x).min(max_size.y / image_size.y);
            if scale <= 0.0 {
                return;
            }
            let display_size = image_size * scale;

            let total = display_size + egui::vec2(PADDING * 2.0, PADDING * 2.0);
            let x_offset = (available.x - total.x) / 2.0;
            let y_offset = (available.y - total.y) / 2.0;
            let start = ui.cursor().min + egui::vec2(x_offset.max(0.0), y_offset.max(0.0));
            let target_rect = egui::Rect::from_min_size(start, total);

            let response = ui.allocate_rect(target_rect, egui::Sense::click_and_drag());
            let painter = ui.painter_at(target_rect);
            let image_rect = egui::Rect::from_min_size(
                target_rect.min + egui::vec2(PADDING, PADDING),
                display_size,
            );

            painter.image(
                tex_id,
                image_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );

            // Positions are mapped relative to the rendered image, using the
            // metrics of this frame's layout.
            let to_pixel = |pos: egui::Pos2| {
                let rel = pos - image_rect.min;
                geometry::display_to_pixel(
                    rel.x,
                    rel.y,
                    display_size.x,
                    display_size.y,
                    pixel_w,
                    pixel_h,
                )
            };

            if response.secondary_clicked() {
                self.tracker.clear_feedback();
            }

            if response.drag_started_by(egui::PointerButton::Primary) {
                if let Some(pos) = response.interact_pointer_pos() {
                    if let Some(pixel) = to_pixel(pos) {
                        self.tracker.begin(pos, pixel);
                    }
                }
            }

            if response.dragged_by(egui::PointerButton::Primary) {
                if let Some(pos) = response.interact_pointer_pos() {
                    self.tracker.update(pos);
                }
            }

            if response.drag_stopped_by(egui::PointerButton::Primary) && self.tracker.is_active() {
                let pos = response.interact_pointer_pos().or(self.tracker.last_display());
                if let Some(end) = pos.and_then(to_pixel) {
                    if self.apply_crop(end) {
                        self.load_preview_texture(ui.ctx());
                    }
                } else {
                    self.tracker.reset();
                }
            }

            if let Some(rect) = self.tracker.feedback() {
                painter.rect_stroke(rect, 0.0, egui::Stroke::new(1.0, egui::Color32::RED));
            }
        });
    }
}

impl eframe::App for CropperApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Handle dropped files
        if !ctx.input(|i| i.raw.dropped_files.is_empty()) {
            let dropped_files = ctx.input(|i| i.raw.dropped_files.clone());
            if let Some(file) = dropped_files.first() {
                if let Some(path) = file.path.clone() {
                    self.open_image(ctx, &path);
                }
            }
        }

        self.show_error_window(ctx);
        self.show_toolbar(ctx);
        self.show_preview_panel(ctx);
        self.show_image_panel(ctx);
    }
}

fn upload_texture(ctx: &egui::Context, name: &str, image: &DynamicImage) -> egui::TextureHandle {
    let size = [image.width() as _, image.height() as _];
    let image_buffer = image.to_rgba8();
    let pixels = image_buffer.as_flat_samples();
    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
    ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR)
}
