//! Canvas interaction and navigation functionality.
//!
//! This module handles canvas panning, zooming, device dragging, and the click
//! dispatch between calibration, measuring, selection and placement.

use super::state::FloorplanApp;
use crate::actions::Action;
use crate::calibration::CalibrationClick;
use crate::constants::{CLICK_THRESHOLD, MAX_ZOOM, MIN_ZOOM, ZOOM_SCROLL_STEP};
use crate::placement::{find_device_at, place_device, placement_point};
use eframe::egui;

impl FloorplanApp {
    /// Sets the zoom level, keeping the given screen position fixed on the stage.
    ///
    /// Zoom is clamped to [0.5, 2.5] and is independent of the image scale.
    pub fn zoom_to(&mut self, zoom: f32, anchor_screen: egui::Pos2) {
        let new_zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        if (new_zoom - self.ui.zoom).abs() <= f32::EPSILON {
            return;
        }
        let anchor = self.screen_to_stage(anchor_screen);
        let world = (anchor - self.ui.pan) / self.ui.zoom;
        self.ui.zoom = new_zoom;
        self.ui.pan = anchor.to_vec2() - world.to_vec2() * new_zoom;
    }

    /// Resets pan and zoom.
    pub fn reset_view(&mut self) {
        self.ui.zoom = 1.0;
        self.ui.pan = egui::Vec2::ZERO;
    }

    /// Handles middle-click or Cmd/Ctrl+left-click canvas panning functionality.
    ///
    /// Dragging the primary button over empty canvas also pans, unless a tool is active.
    pub fn handle_canvas_panning(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let (middle, primary, command) = ui.input(|i| {
            (
                i.pointer.middle_down(),
                i.pointer.primary_down(),
                i.modifiers.command,
            )
        });
        let primary_pans = primary
            && self.interaction.dragging_device.is_none()
            && self.primary_drag_pans(ui);
        let should_pan = middle || (primary && command) || primary_pans;

        if should_pan {
            if let Some(current_pos) = response.interact_pointer_pos() {
                if !self.interaction.is_panning {
                    self.interaction.is_panning = true;
                    self.interaction.last_pan_pos = Some(current_pos);
                } else if let Some(last_pos) = self.interaction.last_pan_pos {
                    self.ui.pan += current_pos - last_pos;
                    self.interaction.last_pan_pos = Some(current_pos);
                }
            }
        } else {
            self.interaction.is_panning = false;
            self.interaction.last_pan_pos = None;
        }
    }

    /// Primary drags pan once the pointer has travelled past the click threshold on
    /// empty canvas with no tool waiting for clicks.
    fn primary_drag_pans(&self, ui: &egui::Ui) -> bool {
        let Some(press) = self.interaction.press_pos else {
            return false;
        };
        let travelled = ui
            .input(|i| i.pointer.interact_pos())
            .is_some_and(|pos| (pos - press).length() >= CLICK_THRESHOLD);
        travelled
            && !self.state.is_calibrating
            && !self.state.is_measuring
            && !self.state.has_pending_placement()
    }

    /// Handles scroll wheel zooming functionality.
    ///
    /// Zooms in/out while keeping the mouse cursor position fixed. Only zooms if the
    /// cursor is over the canvas and not over a window above it.
    pub fn handle_canvas_zoom(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let scroll_delta = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll_delta == 0.0 {
            return;
        }
        // Scrolling over a window or the view controls belongs to them
        if !response.contains_pointer() {
            return;
        }
        let Some(mouse_pos) = ui.input(|i| i.pointer.hover_pos()) else {
            return;
        };
        let step = if scroll_delta > 0.0 {
            ZOOM_SCROLL_STEP
        } else {
            -ZOOM_SCROLL_STEP
        };
        self.zoom_to(self.ui.zoom + step, mouse_pos);
    }

    /// Tracks primary presses and releases on the canvas.
    ///
    /// Only presses the canvas itself receives are tracked. A press over a device
    /// starts a drag when changes are allowed. A release within the click threshold
    /// of its press is dispatched as a click.
    pub fn handle_canvas_pointer(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let (pressed, released, pointer_pos, command) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.interact_pos(),
                i.modifiers.command,
            )
        });

        // Presses over a window or area drawn above the canvas never reach it
        if pressed && response.contains_pointer() {
            if let Some(pos) = pointer_pos {
                self.interaction.press_pos = Some(pos);
                if !command {
                    self.start_device_drag(pos);
                }
            }
        }

        if let (Some((id, grab)), Some(pos)) =
            (self.interaction.dragging_device.clone(), pointer_pos)
        {
            let moved = self
                .interaction
                .press_pos
                .is_some_and(|press| (pos - press).length() >= CLICK_THRESHOLD);
            if moved && ui.input(|i| i.pointer.primary_down()) {
                let local = self.screen_to_image(pos) + grab;
                self.dispatch(Action::MoveDevice {
                    id,
                    position: (local.x, local.y),
                });
            }
        }

        if released {
            let press = self.interaction.press_pos.take();
            self.interaction.dragging_device = None;
            if let (Some(press), Some(pos)) = (press, pointer_pos) {
                if (pos - press).length() < CLICK_THRESHOLD && !command {
                    let stage = self.screen_to_stage(press);
                    self.handle_canvas_click(stage);
                }
            }
        }
    }

    /// Arms a device drag when the press lands on a movable device.
    fn start_device_drag(&mut self, screen_pos: egui::Pos2) {
        if !self.state.mode.allows_changes()
            || self.state.is_calibrating
            || self.state.is_measuring
            || self.state.has_pending_placement()
        {
            return;
        }
        let stage = self.screen_to_stage(screen_pos);
        let Some(id) = self.with_frame(|frame| find_device_at(&self.state.devices, stage, frame))
        else {
            return;
        };
        let Some(device) = self.state.device(&id) else {
            return;
        };
        let pointer_local = self.screen_to_image(screen_pos);
        let grab = egui::pos2(device.position.0, device.position.1) - pointer_local;
        self.interaction.dragging_device = Some((id, grab));
    }

    /// Dispatches a click at a stage position.
    ///
    /// Calibration and measuring consume clicks first. Otherwise a device under the
    /// pointer is selected, then a pending placement is made, and finally a click on
    /// empty canvas clears the selection.
    pub fn handle_canvas_click(&mut self, stage_pos: egui::Pos2) {
        let local = self.with_frame(|frame| frame.to_image_local(stage_pos));

        if self.state.is_calibrating && self.state.image.is_some() {
            match self.calibration.click(local) {
                CalibrationClick::FirstPoint => {
                    log::debug!("calibration point A at {local:?}");
                }
                CalibrationClick::AwaitingLength { pixel_distance } => {
                    log::debug!("calibration points {pixel_distance:.1} px apart");
                }
                CalibrationClick::Ignored => {}
            }
            return;
        }

        if self.state.is_measuring {
            self.measure.click(local);
            return;
        }

        let hit = self.with_frame(|frame| find_device_at(&self.state.devices, stage_pos, frame));
        if let Some(id) = hit {
            self.dispatch(Action::SelectDevice(id));
            return;
        }

        let bounds = self.settings.placement_bounds;
        if self.state.current_unassigned_to_place.is_some() {
            let point = self.with_frame(|frame| placement_point(stage_pos, frame, bounds));
            if let Some(point) = point {
                self.dispatch(Action::PlaceUnassigned((point.x, point.y)));
            }
            return;
        }

        if let Some(device_type) = self.state.current_type_to_place {
            let device = self.with_frame(|frame| {
                place_device(stage_pos, Some(device_type), frame, bounds)
            });
            if let Some(device) = device {
                self.dispatch(Action::AddDevice(device));
            }
            return;
        }

        self.dispatch(Action::ClearSelection);
    }

    /// Clears pending calibration points, the measurement and any placement tool.
    pub fn handle_escape_key(&mut self, ctx: &egui::Context) {
        if !ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            return;
        }
        self.calibration.cancel();
        self.measure.clear();
        self.interaction.dragging_device = None;
        self.dispatch(Action::ClearPlacementTool);
    }

    /// Deletes the selected device with Delete or Backspace, unless a text field has focus.
    pub fn handle_delete_key(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let pressed = ctx.input(|i| {
            i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace)
        });
        if !pressed || !self.state.mode.allows_changes() {
            return;
        }
        if let Some(id) = self.state.selected.clone() {
            self.dispatch(Action::DeleteDevice(id));
        }
    }
}
