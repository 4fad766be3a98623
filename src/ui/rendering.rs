//! Canvas rendering functionality for the image, grid, devices and tool overlays.
//!
//! Everything on the plan is stored in image-local pixels and mapped to the screen
//! here, so the grid, markers and overlays follow the image through pan, zoom, scale
//! and rotation.

use super::state::FloorplanApp;
use crate::calibration::TwoPointStep;
use crate::catalog;
use crate::constants::{
    CALIBRATION_POINT_RADIUS, DEVICE_RADIUS, MIN_SCREEN_GRID_SPACING, SELECTION_RING_RADIUS,
    UNCALIBRATED_GRID_SPACING,
};
use crate::geometry::{feet_to_image_pixels, grid_line_positions};
use crate::image_load::ImageLoad;
use crate::types::Device;
use eframe::egui;

const CALIBRATION_COLOR: egui::Color32 = egui::Color32::from_rgb(0xef, 0x44, 0x44);
const MEASURE_COLOR: egui::Color32 = egui::Color32::from_rgb(0x0e, 0xa5, 0xe9);

impl FloorplanApp {
    /// Renders the floor plan in layers: image, grid, devices, then tool overlays.
    ///
    /// # Arguments
    ///
    /// * `painter` - The egui painter for drawing operations
    /// * `canvas_rect` - The screen-space rectangle of the canvas area
    pub fn render_floorplan(&self, painter: &egui::Painter, canvas_rect: egui::Rect) {
        self.draw_image(painter);

        if self.settings.show_grid {
            self.draw_grid(painter, canvas_rect);
        }

        for device in &self.state.devices {
            self.draw_device(painter, device);
        }

        self.draw_two_points(painter, self.calibration.step(), CALIBRATION_COLOR, None);
        if self.state.is_measuring {
            let label = self
                .measure
                .distance_feet(self.state.scale_ratio)
                .map(|feet| format!("{feet:.1} ft"));
            self.draw_two_points(painter, self.measure.step(), MEASURE_COLOR, label);
        }

        self.draw_load_status(painter, canvas_rect);
    }

    /// Draws the image as a textured quad through its four mapped corners, so scale and
    /// rotation need no separate handling.
    fn draw_image(&self, painter: &egui::Painter) {
        let (Some(texture), Some([w, h])) = (&self.loader.texture, self.state.image_size()) else {
            return;
        };
        let (w, h) = (w as f32, h as f32);
        let corners = [
            (egui::pos2(0.0, 0.0), egui::pos2(0.0, 0.0)),
            (egui::pos2(w, 0.0), egui::pos2(1.0, 0.0)),
            (egui::pos2(w, h), egui::pos2(1.0, 1.0)),
            (egui::pos2(0.0, h), egui::pos2(0.0, 1.0)),
        ];

        let mut mesh = egui::Mesh::with_texture(texture.id());
        for (local, uv) in corners {
            mesh.vertices.push(egui::epaint::Vertex {
                pos: self.image_to_screen(local),
                uv,
                color: egui::Color32::WHITE,
            });
        }
        mesh.add_triangle(0, 1, 2);
        mesh.add_triangle(0, 2, 3);
        painter.add(egui::Shape::mesh(mesh));
    }

    /// Draws the background grid anchored to the image.
    ///
    /// Spacing is the selected grid size in feet converted through the scale ratio, or a
    /// fixed pixel spacing before calibration. Grids too dense to read are skipped.
    pub fn draw_grid(&self, painter: &egui::Painter, canvas_rect: egui::Rect) {
        let spacing = match self.state.scale_ratio {
            Some(ratio) => feet_to_image_pixels(self.settings.grid_size_feet(), ratio),
            None => UNCALIBRATED_GRID_SPACING,
        };
        let screen_spacing = spacing * self.state.transform.scale * self.ui.zoom;
        if !screen_spacing.is_finite() || screen_spacing < MIN_SCREEN_GRID_SPACING {
            return;
        }

        // Image-local bounding box of the visible canvas
        let corners = [
            canvas_rect.left_top(),
            canvas_rect.right_top(),
            canvas_rect.right_bottom(),
            canvas_rect.left_bottom(),
        ]
        .map(|p| self.screen_to_image(p));
        let bounds = egui::Rect::from_points(&corners);

        let stroke =
            egui::Stroke::new(1.0, egui::Color32::from_rgba_unmultiplied(128, 128, 128, 40));
        for x in grid_line_positions(bounds.min.x, bounds.max.x, spacing) {
            painter.line_segment(
                [
                    self.image_to_screen(egui::pos2(x, bounds.min.y)),
                    self.image_to_screen(egui::pos2(x, bounds.max.y)),
                ],
                stroke,
            );
        }
        for y in grid_line_positions(bounds.min.y, bounds.max.y, spacing) {
            painter.line_segment(
                [
                    self.image_to_screen(egui::pos2(bounds.min.x, y)),
                    self.image_to_screen(egui::pos2(bounds.max.x, y)),
                ],
                stroke,
            );
        }
    }

    /// Draws one device marker using its catalog style.
    fn draw_device(&self, painter: &egui::Painter, device: &Device) {
        let style = catalog::style(device.device_type);
        let center = self.image_to_screen(egui::pos2(device.position.0, device.position.1));

        if let (Some(range), Some(ratio)) = (style.range_feet, self.state.scale_ratio) {
            let radius =
                feet_to_image_pixels(range, ratio) * self.state.transform.scale * self.ui.zoom;
            if radius.is_finite() {
                painter.circle(
                    center,
                    radius,
                    style.fill.gamma_multiply(0.08),
                    egui::Stroke::new(1.0, style.fill.gamma_multiply(0.6)),
                );
            }
        }

        if self.state.selected.as_ref() == Some(&device.id) {
            painter.circle_stroke(
                center,
                SELECTION_RING_RADIUS,
                egui::Stroke::new(2.0, egui::Color32::from_rgb(100, 150, 255)),
            );
        }

        // Placeholders are drawn translucent until bound to a real device
        let fill = if device.is_placeholder() {
            style.fill.gamma_multiply(0.55)
        } else {
            style.fill
        };
        painter.circle(center, DEVICE_RADIUS, fill, egui::Stroke::new(1.5, style.stroke));
        painter.text(
            center,
            egui::Align2::CENTER_CENTER,
            style.short,
            egui::FontId::proportional(9.0),
            style.text,
        );

        if device.details().is_some_and(|d| !d.active) {
            painter.circle_filled(
                center + egui::vec2(DEVICE_RADIUS * 0.7, -DEVICE_RADIUS * 0.7),
                3.5,
                egui::Color32::from_rgb(0xdc, 0x26, 0x26),
            );
        }

        painter.text(
            center + egui::vec2(0.0, DEVICE_RADIUS + 3.0),
            egui::Align2::CENTER_TOP,
            &device.name,
            egui::FontId::proportional(11.0),
            egui::Color32::from_gray(60),
        );
    }

    /// Draws the points of a two-click tool, joined by a line once both exist.
    fn draw_two_points(
        &self,
        painter: &egui::Painter,
        step: &TwoPointStep,
        color: egui::Color32,
        label: Option<String>,
    ) {
        let (a, b) = match *step {
            TwoPointStep::Idle => return,
            TwoPointStep::FirstPoint(a) => (a, None),
            TwoPointStep::BothPoints { a, b, .. } => (a, Some(b)),
        };
        let a = self.image_to_screen(a);
        painter.circle_filled(a, CALIBRATION_POINT_RADIUS, color);
        let Some(b) = b else {
            return;
        };
        let b = self.image_to_screen(b);
        painter.line_segment([a, b], egui::Stroke::new(2.0, color));
        painter.circle_filled(b, CALIBRATION_POINT_RADIUS, color);
        if let Some(label) = label {
            painter.text(
                a.lerp(b, 0.5) + egui::vec2(0.0, -8.0),
                egui::Align2::CENTER_BOTTOM,
                label,
                egui::FontId::proportional(13.0),
                color,
            );
        }
    }

    /// Draws the loading overlay, the failed-load placeholder or the upload prompt.
    fn draw_load_status(&self, painter: &egui::Painter, canvas_rect: egui::Rect) {
        let center = canvas_rect.center();
        match &self.loader.load {
            ImageLoad::Loading { name } => {
                painter.rect_filled(canvas_rect, 0.0, egui::Color32::from_black_alpha(60));
                painter.text(
                    center,
                    egui::Align2::CENTER_CENTER,
                    format!("Loading {name}…"),
                    egui::FontId::proportional(18.0),
                    egui::Color32::WHITE,
                );
            }
            ImageLoad::Failed(reason) => {
                let rect = egui::Rect::from_center_size(center, egui::vec2(420.0, 90.0));
                painter.rect_filled(rect, 6.0, egui::Color32::from_rgb(0xfe, 0xe2, 0xe2));
                painter.text(
                    center,
                    egui::Align2::CENTER_CENTER,
                    format!(
                        "Could not load the floor plan\n{reason}\nUpload another image to continue."
                    ),
                    egui::FontId::proportional(13.0),
                    egui::Color32::from_rgb(0x99, 0x1b, 0x1b),
                );
            }
            ImageLoad::Idle if self.state.image.is_none() => {
                painter.text(
                    center,
                    egui::Align2::CENTER_CENTER,
                    "Upload a PNG or JPEG floor plan, or drop one here",
                    egui::FontId::proportional(16.0),
                    egui::Color32::GRAY,
                );
            }
            ImageLoad::Idle | ImageLoad::Loaded { .. } => {}
        }
    }
}
