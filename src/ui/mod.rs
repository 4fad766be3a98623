//! User interface components and rendering logic for the floor-plan editor.
//!
//! This module contains all the UI-related code including the main application struct,
//! the toolbar, side panels, calibration controls and the canvas.
//!
//! # Module Organization
//!
//! - `state` - Application state structures and the main FloorplanApp
//! - `file_ops` - Image upload, drag-and-drop and seeded image loading for native and WASM
//! - `canvas` - Canvas navigation, zooming, panning, and click dispatch
//! - `rendering` - Drawing the image, grid, devices and tool overlays

mod canvas;
mod file_ops;
mod rendering;
mod state;


pub use state::{EditorSettings, FloorplanApp};

use self::state::{DeviceEdit, SETTINGS_KEY};
use crate::actions::Action;
use crate::constants::{
    FALLBACK_SCALE_RATIO, GRID_SIZES_FEET, IMAGE_SCALE_STEP, ROTATION_STEP_DEGREES,
    SCALE_RATIO_NUDGE, ZOOM_BUTTON_STEP,
};
use crate::placement::PlacementBounds;
use crate::types::*;
use crate::{catalog, image_load::ImageLoad};
use eframe::egui;

impl eframe::App for FloorplanApp {
    /// Persist the editor settings between restarts. The floor plan itself is not saved.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        match serde_json::to_string(&self.settings) {
            Ok(json) => {
                storage.set_string(SETTINGS_KEY, json);
            }
            Err(err) => {
                log::error!("Failed to serialize editor settings: {err}");
            }
        }
    }

    /// Main update function called by egui for each frame.
    ///
    /// This method handles the overall UI layout: toolbar, side panels, calibration
    /// windows, view controls and the canvas.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let visuals = if self.settings.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        ctx.set_visuals(visuals);

        self.handle_pending_operations(ctx);
        self.handle_dropped_files(ctx);
        self.handle_escape_key(ctx);
        self.handle_delete_key(ctx);
        self.sync_selection();

        egui::TopBottomPanel::top("top_toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        let viewport_width = ctx.input(|i| i.screen_rect().width());
        let max_panel = (viewport_width * 0.4).max(180.0);

        if self.ui.show_left_panel {
            egui::SidePanel::left("device_panel")
                .resizable(true)
                .default_width(self.settings.left_panel_width.clamp(180.0, max_panel))
                .show(ctx, |ui| {
                    self.settings.left_panel_width = ui.available_width().clamp(180.0, max_panel);
                    self.draw_left_panel(ui);
                });
        }

        if self.ui.show_right_panel {
            egui::SidePanel::right("details_panel")
                .resizable(true)
                .default_width(self.settings.right_panel_width.clamp(180.0, max_panel))
                .show(ctx, |ui| {
                    self.settings.right_panel_width = ui.available_width().clamp(180.0, max_panel);
                    self.draw_right_panel(ui);
                });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_canvas(ui);
        });

        if self.state.is_calibrating && self.state.image.is_some() {
            self.draw_calibration_window(ctx);
        }
        if self.calibration.awaiting_length() {
            self.draw_length_prompt(ctx);
        }
        self.draw_view_controls(ctx);
    }
}

impl FloorplanApp {
    /// Applies an action to the floor plan, reporting rejected actions in the status line.
    ///
    /// # Returns
    ///
    /// `true` if the state changed.
    pub fn dispatch(&mut self, action: Action) -> bool {
        let name = action.name();
        match self.state.apply(action) {
            Ok(changed) => changed,
            Err(e) => {
                log::warn!("{name} rejected: {e}");
                self.ui.status = Some(e.to_string());
                false
            }
        }
    }

    /// Opens the right panel when a new device is selected and resets its edit buffers.
    fn sync_selection(&mut self) {
        if self.state.selected == self.ui.last_selected {
            return;
        }
        if self.state.selected.is_some() {
            self.ui.show_right_panel = true;
        }
        self.ui.device_edit = None;
        self.ui.last_selected = self.state.selected.clone();
    }

    /// Renders the toolbar with upload, mode, tool and display options.
    ///
    /// # Arguments
    ///
    /// * `ui` - The egui UI context
    fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            if ui.toggle_value(&mut self.ui.show_left_panel, "☰ Devices").changed() {
                log::debug!("left panel visible: {}", self.ui.show_left_panel);
            }

            let loading = self.loader.load.is_loading();
            if ui
                .add_enabled(!loading, egui::Button::new("Upload Floor Plan"))
                .clicked()
            {
                self.request_image_upload();
            }

            ui.separator();

            ui.label("Mode:");
            for mode in [Mode::Planning, Mode::View, Mode::Edit] {
                if ui
                    .selectable_label(self.state.mode == mode, mode.label())
                    .clicked()
                    && mode != self.state.mode
                {
                    self.change_mode(mode);
                }
            }
            if self.state.mode == Mode::Edit {
                if ui.button("Save Edits").clicked() {
                    self.dispatch(Action::SaveEdits);
                }
                if ui.button("Cancel Edits").clicked() {
                    self.dispatch(Action::CancelEdits);
                }
            }

            ui.separator();

            let has_image = self.state.image.is_some();
            if ui
                .add_enabled(
                    has_image && !self.state.is_calibrating,
                    egui::Button::new("Recalibrate"),
                )
                .clicked()
            {
                self.calibration.cancel();
                self.dispatch(Action::Recalibrate);
            }

            let mut measuring = self.state.is_measuring;
            if ui
                .add_enabled(
                    self.state.scale_ratio.is_some(),
                    egui::Button::new("📏 Measure").selected(measuring),
                )
                .clicked()
            {
                measuring = !measuring;
                self.measure.clear();
                self.dispatch(Action::SetMeasuring(measuring));
            }

            ui.separator();

            ui.checkbox(&mut self.settings.show_grid, "Grid");
            let grid_label = format!("{} ft", self.settings.grid_size_feet());
            let grid_index = &mut self.settings.grid_size_index;
            egui::ComboBox::from_id_salt("grid_size")
                .selected_text(grid_label)
                .show_ui(ui, |ui| {
                    for (index, feet) in GRID_SIZES_FEET.iter().enumerate() {
                        ui.selectable_value(grid_index, index, format!("{feet} ft"));
                    }
                });

            egui::ComboBox::from_id_salt("placement_bounds")
                .selected_text(match self.settings.placement_bounds {
                    PlacementBounds::ImageOnly => "Place on image",
                    PlacementBounds::Anywhere => "Place anywhere",
                })
                .show_ui(ui, |ui| {
                    ui.selectable_value(
                        &mut self.settings.placement_bounds,
                        PlacementBounds::ImageOnly,
                        "Place on image",
                    );
                    ui.selectable_value(
                        &mut self.settings.placement_bounds,
                        PlacementBounds::Anywhere,
                        "Place anywhere",
                    );
                });

            ui.separator();

            let theme_label = if self.settings.dark_mode {
                "☀ Light"
            } else {
                "🌙 Dark"
            };
            if ui.button(theme_label).clicked() {
                self.settings.dark_mode = !self.settings.dark_mode;
            }
            ui.toggle_value(&mut self.ui.show_right_panel, "Details ☰");

            if let Some(status) = &self.ui.status {
                ui.separator();
                ui.colored_label(egui::Color32::from_rgb(0xdc, 0x26, 0x26), status);
            }
        });
    }

    /// Switches mode and drops any tool that does not apply to the new mode.
    fn change_mode(&mut self, mode: Mode) {
        if self.dispatch(Action::SetMode(mode)) {
            log::info!("switched to {} mode", mode.label());
            if !mode.allows_changes() {
                self.interaction.dragging_device = None;
            }
        }
    }

    /// Renders the device palette, the unassigned pool and the searchable device list.
    ///
    /// # Arguments
    ///
    /// * `ui` - The egui UI context
    fn draw_left_panel(&mut self, ui: &mut egui::Ui) {
        egui::ScrollArea::vertical()
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                let editable = self.state.mode.allows_changes();

                ui.heading("Place Device");
                ui.add_enabled_ui(editable, |ui| {
                    for device_type in DeviceType::ALL {
                        let style = catalog::style(device_type);
                        let selected = self.state.current_type_to_place == Some(device_type);
                        let text =
                            egui::RichText::new(format!("● {}", style.name)).color(style.fill);
                        if ui.selectable_label(selected, text).clicked() {
                            self.dispatch(Action::SelectTypeToPlace(device_type));
                        }
                    }
                });
                if let Some(device_type) = self.state.current_type_to_place {
                    ui.small(format!(
                        "Click the plan to place a {}. Esc to stop.",
                        catalog::default_name(device_type)
                    ));
                }

                if !self.state.unassigned_devices.is_empty() {
                    ui.separator();
                    ui.heading("Unassigned");
                    let pool: Vec<(String, String)> = self
                        .state
                        .unassigned_devices
                        .iter()
                        .map(|d| {
                            let text = format!("{} · {}", d.name, d.details.label);
                            (d.details.uuid.clone(), text)
                        })
                        .collect();
                    ui.add_enabled_ui(editable, |ui| {
                        for (uuid, text) in pool {
                            let pending = self.state.current_unassigned_to_place.as_deref();
                            let selected = pending == Some(uuid.as_str());
                            if ui.selectable_label(selected, text).clicked() {
                                self.dispatch(Action::SelectUnassignedToPlace(uuid));
                            }
                        }
                    });
                }

                ui.separator();
                ui.heading("Devices");
                ui.add(
                    egui::TextEdit::singleline(&mut self.ui.search_query)
                        .hint_text("Search name or label"),
                );

                let matches: Vec<(DeviceId, String, bool)> = self
                    .state
                    .search_devices(&self.ui.search_query)
                    .map(|d| {
                        let text = match d.details() {
                            Some(details) => format!("{} ({})", d.name, details.label),
                            None => format!("{} (placeholder)", d.name),
                        };
                        (d.id.clone(), text, self.state.selected.as_ref() == Some(&d.id))
                    })
                    .collect();
                if matches.is_empty() {
                    ui.weak("No devices");
                }
                for (id, text, selected) in matches {
                    if ui.selectable_label(selected, text).clicked() {
                        self.dispatch(Action::SelectDevice(id));
                    }
                }
            });
    }

    /// Renders details and editors for the selected device.
    ///
    /// # Arguments
    ///
    /// * `ui` - The egui UI context
    fn draw_right_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Details");
        ui.separator();

        let Some(device) = self.state.selected_device().cloned() else {
            ui.label("Select a device on the plan or in the device list.");
            return;
        };
        let editable = self.state.mode.allows_changes();
        let style = catalog::style(device.device_type);

        if self.ui.device_edit.as_ref().map(|e| &e.id) != Some(&device.id) {
            self.ui.device_edit = Some(DeviceEdit {
                id: device.id.clone(),
                name: device.name.clone(),
                label: device.details().map(|d| d.label.clone()).unwrap_or_default(),
            });
        }

        let mut patch = DevicePatch::default();
        let mut assign: Option<String> = None;
        let mut delete = false;

        egui::Grid::new("device_details")
            .num_columns(2)
            .spacing([8.0, 6.0])
            .show(ui, |ui| {
                ui.label("Type");
                ui.colored_label(style.fill, style.name);
                ui.end_row();

                ui.label("Name");
                if let Some(edit) = self.ui.device_edit.as_mut() {
                    let response =
                        ui.add_enabled(editable, egui::TextEdit::singleline(&mut edit.name));
                    if response.lost_focus() && edit.name != device.name {
                        patch.name = Some(edit.name.clone());
                    }
                }
                ui.end_row();

                ui.label("Position");
                ui.label(format!("{:.0}, {:.0} px", device.position.0, device.position.1));
                ui.end_row();

                let Some(details) = device.details() else {
                    ui.label("Status");
                    ui.weak("Placeholder");
                    ui.end_row();
                    return;
                };

                ui.label("UUID");
                ui.monospace(&details.uuid);
                ui.end_row();

                ui.label("Label");
                if let Some(edit) = self.ui.device_edit.as_mut() {
                    let response =
                        ui.add_enabled(editable, egui::TextEdit::singleline(&mut edit.label));
                    if response.lost_focus() && edit.label != details.label {
                        patch.label = Some(edit.label.clone());
                    }
                }
                ui.end_row();

                ui.label("Status");
                let mut active = details.active;
                if ui
                    .add_enabled(editable, egui::Checkbox::new(&mut active, "Active"))
                    .changed()
                {
                    patch.active = Some(active);
                }
                ui.end_row();

                ui.label("Battery");
                let mut battery = i32::from(details.battery);
                if ui
                    .add_enabled(
                        editable,
                        egui::Slider::new(&mut battery, 0..=100).suffix("%"),
                    )
                    .changed()
                {
                    patch.battery = Some(battery);
                }
                ui.end_row();

                ui.label("Mounting height");
                let mut height = details.mounting_height;
                if ui
                    .add_enabled(
                        editable,
                        egui::DragValue::new(&mut height)
                            .range(0.0..=100.0)
                            .speed(0.5)
                            .suffix(" ft"),
                    )
                    .changed()
                {
                    patch.mounting_height = Some(height);
                }
                ui.end_row();

                ui.label("Mounting location");
                ui.add_enabled_ui(editable, |ui| {
                    ui.horizontal(|ui| {
                        let mut location = details.mounting_location;
                        ui.selectable_value(&mut location, MountingLocation::Inside, "Inside");
                        ui.selectable_value(&mut location, MountingLocation::Outside, "Outside");
                        if location != details.mounting_location {
                            patch.mounting_location = Some(location);
                        }
                    });
                });
                ui.end_row();

                ui.label("Capacity");
                let mut capacity = details.capacity;
                if ui
                    .add_enabled(editable, egui::DragValue::new(&mut capacity).range(0..=10_000))
                    .changed()
                {
                    patch.capacity = Some(capacity);
                }
                ui.end_row();

                ui.label("Power");
                ui.add_enabled_ui(editable, |ui| {
                    ui.horizontal(|ui| {
                        let mut power = details.power_type;
                        ui.selectable_value(&mut power, PowerType::Battery, "Battery");
                        ui.selectable_value(&mut power, PowerType::Wired, "Wired");
                        if power != details.power_type {
                            patch.power_type = Some(power);
                        }
                    });
                });
                ui.end_row();
            });

        if editable {
            ui.separator();
            let pool: Vec<(String, String)> = self
                .state
                .unassigned_devices
                .iter()
                .filter(|d| d.device_type == device.device_type)
                .map(|d| {
                    let text = format!("{} · {}", d.details.label, d.details.uuid);
                    (d.details.uuid.clone(), text)
                })
                .collect();
            if !pool.is_empty() {
                let title = if device.is_placeholder() {
                    "Assign device"
                } else {
                    "Swap device"
                };
                ui.menu_button(title, |ui| {
                    for (uuid, text) in pool {
                        if ui.button(text).clicked() {
                            assign = Some(uuid);
                            ui.close();
                        }
                    }
                });
            }
            if ui.button("🗑 Delete device").clicked() {
                delete = true;
            }
        }

        if patch != DevicePatch::default() {
            self.dispatch(Action::UpdateDevice {
                id: device.id.clone(),
                patch,
            });
        }
        if let Some(uuid) = assign {
            if self.dispatch(Action::AssignDevice {
                id: device.id.clone(),
                uuid,
            }) {
                self.ui.device_edit = None;
            }
        }
        if delete {
            self.dispatch(Action::DeleteDevice(device.id));
        }
    }

    /// Renders the calibration controls: image size, scale ratio, rotation and completion.
    fn draw_calibration_window(&mut self, ctx: &egui::Context) {
        egui::Window::new("Calibration")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-12.0, 12.0))
            .show(ctx, |ui| {
                let instructions = match self.calibration.points().len() {
                    0 => "Click the first end of a known distance on the plan.",
                    1 => "Click the second end of the distance.",
                    _ => "Enter the real-world length between the points.",
                };
                ui.label(instructions);
                ui.separator();

                let unlocked = !self.state.image_locked;
                ui.horizontal(|ui| {
                    ui.label("Image size");
                    if ui.add_enabled(unlocked, egui::Button::new("−")).clicked() {
                        self.dispatch(Action::ResizeImage(-IMAGE_SCALE_STEP));
                    }
                    ui.monospace(format!("{:.1}×", self.state.transform.scale));
                    if ui.add_enabled(unlocked, egui::Button::new("+")).clicked() {
                        self.dispatch(Action::ResizeImage(IMAGE_SCALE_STEP));
                    }
                });

                ui.horizontal(|ui| {
                    ui.label("Scale");
                    if ui.button("−10%").clicked() {
                        self.dispatch(Action::AdjustScaleRatio {
                            fraction: -SCALE_RATIO_NUDGE,
                            fallback: FALLBACK_SCALE_RATIO,
                        });
                    }
                    match self.state.scale_ratio {
                        Some(ratio) => {
                            ui.monospace(format!("{ratio:.4} ft/px ({:.1} px/ft)", 1.0 / ratio))
                        }
                        None => ui.weak("not calibrated"),
                    };
                    if ui.button("+10%").clicked() {
                        self.dispatch(Action::AdjustScaleRatio {
                            fraction: SCALE_RATIO_NUDGE,
                            fallback: FALLBACK_SCALE_RATIO,
                        });
                    }
                });

                ui.horizontal(|ui| {
                    ui.label("Rotation");
                    if ui.add_enabled(unlocked, egui::Button::new("⟲")).clicked() {
                        self.dispatch(Action::RotateImage(-ROTATION_STEP_DEGREES));
                    }
                    ui.monospace(format!("{}°", self.state.transform.rotation));
                    if ui.add_enabled(unlocked, egui::Button::new("⟳")).clicked() {
                        self.dispatch(Action::RotateImage(ROTATION_STEP_DEGREES));
                    }
                });

                ui.separator();
                if ui
                    .add_enabled(
                        self.state.scale_ratio.is_some(),
                        egui::Button::new("Complete Calibration"),
                    )
                    .clicked()
                {
                    self.calibration.cancel();
                    self.dispatch(Action::CompleteCalibration);
                }
            });
    }

    /// Prompts for the real-world length between the two calibration points.
    fn draw_length_prompt(&mut self, ctx: &egui::Context) {
        let mut submit = false;
        let mut cancel = false;
        egui::Window::new("Calibration length")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label("Real-world length between the two points (feet):");
                let response = ui.text_edit_singleline(&mut self.calibration.length_input);
                if !response.has_focus() && !response.lost_focus() {
                    response.request_focus();
                }
                if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    submit = true;
                }
                ui.horizontal(|ui| {
                    if ui.button("Apply").clicked() {
                        submit = true;
                    }
                    if ui.button("Cancel").clicked() {
                        cancel = true;
                    }
                });
            });

        if submit {
            let input = self.calibration.length_input.clone();
            match self.calibration.submit_length(&input) {
                Ok(ratio) => {
                    self.dispatch(Action::SetScaleRatio(ratio));
                }
                Err(e) => log::debug!("calibration abandoned: {e}"),
            }
        } else if cancel {
            self.calibration.cancel();
        }
    }

    /// Renders the floating zoom, reset and fullscreen controls.
    fn draw_view_controls(&mut self, ctx: &egui::Context) {
        egui::Area::new(egui::Id::new("view_controls"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-16.0, -16.0))
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        let anchor = self.ui.canvas_origin + self.ui.canvas_size / 2.0;
                        if ui.button("−").on_hover_text("Zoom out").clicked() {
                            self.zoom_to(self.ui.zoom - ZOOM_BUTTON_STEP, anchor);
                        }
                        ui.monospace(format!("{:.0}%", self.ui.zoom * 100.0));
                        if ui.button("+").on_hover_text("Zoom in").clicked() {
                            self.zoom_to(self.ui.zoom + ZOOM_BUTTON_STEP, anchor);
                        }
                        if ui.button("⟲").on_hover_text("Reset view").clicked() {
                            self.reset_view();
                        }
                        let label = if self.ui.fullscreen { "🗗" } else { "⛶" };
                        if ui.button(label).on_hover_text("Toggle fullscreen").clicked() {
                            self.ui.fullscreen = !self.ui.fullscreen;
                            ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(
                                self.ui.fullscreen,
                            ));
                        }
                    });
                });
            });
    }

    /// Draws the canvas and handles its pointer input.
    ///
    /// # Arguments
    ///
    /// * `ui` - The egui UI context
    pub fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        self.ui.canvas_origin = response.rect.min;
        self.ui.canvas_size = response.rect.size();

        self.handle_canvas_pointer(ui, &response);
        self.handle_canvas_panning(ui, &response);
        self.handle_canvas_zoom(ui, &response);

        let background = if self.settings.dark_mode {
            egui::Color32::from_gray(30)
        } else {
            egui::Color32::from_gray(245)
        };
        painter.rect_filled(response.rect, 0.0, background);
        self.render_floorplan(&painter, response.rect);

        let tool_active = (self.state.is_calibrating && self.state.image.is_some())
            || self.state.is_measuring
            || self.state.has_pending_placement();
        if tool_active && response.hovered() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Crosshair);
        } else if self.interaction.is_panning {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
        }

        if matches!(self.loader.load, ImageLoad::Loading { .. }) {
            ui.ctx().request_repaint();
        }
    }
}
