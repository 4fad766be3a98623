//! Mutation messages for the floor-plan state.
//!
//! Every change the view layer wants to make is expressed as an [`Action`] and applied
//! through [`FloorplanState::apply`], so there is exactly one writer of the state.

use crate::constants::{MAX_IMAGE_SCALE, MIN_IMAGE_SCALE};
use crate::error::FloorplanError;
use crate::geometry::normalize_rotation;
use crate::state::{EditSnapshot, FloorplanState};
use crate::types::*;

/// A requested change to the floor-plan state.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A new image replaced the current one; resets the transform and calibration
    ImageUploaded(FloorplanImage),
    /// The image of an opened plan finished loading; keeps the plan's transform and ratio
    AttachImage(FloorplanImage),
    /// Change the image scale by a delta (clamped)
    ResizeImage(f32),
    /// Rotate the image by a delta in degrees (wrapped into [0, 360))
    RotateImage(i32),
    /// Store the ratio produced by the two-click calibration
    SetScaleRatio(f32),
    /// Nudge the ratio by a fraction, e.g. 0.1 for +10%
    AdjustScaleRatio {
        /// Fractional change
        fraction: f32,
        /// Ratio to start from when none is set yet
        fallback: f32,
    },
    /// Leave calibration and lock the image size
    CompleteCalibration,
    /// Re-enter calibration
    Recalibrate,
    /// Toggle the measure tool
    SetMeasuring(bool),
    /// Toggle the device type the next click places
    SelectTypeToPlace(DeviceType),
    /// Toggle the unassigned device (by uuid) the next click places
    SelectUnassignedToPlace(String),
    /// Cancel any pending placement tool
    ClearPlacementTool,
    /// Select a device
    SelectDevice(DeviceId),
    /// Clear the selection
    ClearSelection,
    /// Append a device produced by the placement engine
    AddDevice(Device),
    /// Place the pending unassigned device at an image-local position
    PlaceUnassigned((f32, f32)),
    /// Move a device to a new image-local position
    MoveDevice {
        /// Device to move
        id: DeviceId,
        /// New image-local position
        position: (f32, f32),
    },
    /// Edit a device's metadata
    UpdateDevice {
        /// Device to edit
        id: DeviceId,
        /// Fields to change
        patch: DevicePatch,
    },
    /// Bind a device on the plan to a record from the unassigned pool
    AssignDevice {
        /// Device on the plan
        id: DeviceId,
        /// Uuid of the pooled record
        uuid: String,
    },
    /// Remove a device from the plan
    DeleteDevice(DeviceId),
    /// Switch editing mode
    SetMode(Mode),
    /// Keep the changes made in edit mode and return to view mode
    SaveEdits,
    /// Discard the changes made in edit mode and return to view mode
    CancelEdits,
}

impl Action {
    /// Short name used in log and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Action::ImageUploaded(_) => "upload image",
            Action::AttachImage(_) => "attach image",
            Action::ResizeImage(_) => "resize image",
            Action::RotateImage(_) => "rotate image",
            Action::SetScaleRatio(_) => "set scale ratio",
            Action::AdjustScaleRatio { .. } => "adjust scale ratio",
            Action::CompleteCalibration => "complete calibration",
            Action::Recalibrate => "recalibrate",
            Action::SetMeasuring(_) => "measure",
            Action::SelectTypeToPlace(_) => "select device type",
            Action::SelectUnassignedToPlace(_) => "select unassigned device",
            Action::ClearPlacementTool => "clear placement tool",
            Action::SelectDevice(_) => "select device",
            Action::ClearSelection => "clear selection",
            Action::AddDevice(_) => "place device",
            Action::PlaceUnassigned(_) => "place unassigned device",
            Action::MoveDevice { .. } => "move device",
            Action::UpdateDevice { .. } => "edit device",
            Action::AssignDevice { .. } => "assign device",
            Action::DeleteDevice(_) => "delete device",
            Action::SetMode(_) => "change mode",
            Action::SaveEdits => "save edits",
            Action::CancelEdits => "cancel edits",
        }
    }

    /// Returns true for actions that change the devices on the plan.
    fn modifies_devices(&self) -> bool {
        matches!(
            self,
            Action::SelectTypeToPlace(_)
                | Action::SelectUnassignedToPlace(_)
                | Action::AddDevice(_)
                | Action::PlaceUnassigned(_)
                | Action::MoveDevice { .. }
                | Action::UpdateDevice { .. }
                | Action::AssignDevice { .. }
                | Action::DeleteDevice(_)
        )
    }
}

impl FloorplanState {
    /// Applies an action to the state.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if the state changed, `Ok(false)` for permitted no-ops (such as
    /// resizing a locked image), or an error if the action refers to a missing device
    /// or is not allowed in the current mode.
    pub fn apply(&mut self, action: Action) -> Result<bool, FloorplanError> {
        if action.modifies_devices() && !self.mode.allows_changes() {
            return Err(FloorplanError::ReadOnly(action.name()));
        }

        match action {
            Action::ImageUploaded(image) => {
                log::info!(
                    "loaded floor plan image {} ({}x{})",
                    image.name,
                    image.size[0],
                    image.size[1]
                );
                self.image = Some(image);
                self.transform = ImageTransform::default();
                self.scale_ratio = None;
                self.image_locked = false;
                self.is_calibrating = true;
                self.is_measuring = false;
                self.selected = None;
                self.clear_pending_tools();
                Ok(true)
            }
            Action::AttachImage(image) => {
                log::debug!("attached image {} to the opened plan", image.name);
                self.image = Some(image);
                Ok(true)
            }
            Action::ResizeImage(delta) => {
                // Image size is fixed once calibration completes.
                if self.image_locked {
                    return Ok(false);
                }
                let scale = (self.transform.scale + delta).clamp(MIN_IMAGE_SCALE, MAX_IMAGE_SCALE);
                let changed = scale != self.transform.scale;
                self.transform.scale = scale;
                Ok(changed)
            }
            Action::RotateImage(delta) => {
                if self.image_locked {
                    return Ok(false);
                }
                self.transform.rotation = normalize_rotation(self.transform.rotation + delta);
                Ok(delta % 360 != 0)
            }
            Action::SetScaleRatio(ratio) => {
                if !(ratio.is_finite() && ratio > 0.0) {
                    return Ok(false);
                }
                log::info!("scale ratio set to {ratio:.4} ft/px");
                self.scale_ratio = Some(ratio);
                Ok(true)
            }
            Action::AdjustScaleRatio { fraction, fallback } => {
                let current = self.scale_ratio.unwrap_or(fallback);
                let adjusted = round_to(current * (1.0 + fraction), 4);
                if !(adjusted.is_finite() && adjusted > 0.0) {
                    return Ok(false);
                }
                self.scale_ratio = Some(adjusted);
                Ok(true)
            }
            Action::CompleteCalibration => {
                self.is_calibrating = false;
                self.image_locked = true;
                Ok(true)
            }
            Action::Recalibrate => {
                self.is_calibrating = true;
                self.image_locked = false;
                self.is_measuring = false;
                self.clear_pending_tools();
                Ok(true)
            }
            Action::SetMeasuring(on) => {
                self.is_measuring = on;
                if on {
                    self.clear_pending_tools();
                }
                Ok(true)
            }
            Action::SelectTypeToPlace(device_type) => {
                self.current_type_to_place = if self.current_type_to_place == Some(device_type) {
                    None
                } else {
                    Some(device_type)
                };
                self.current_unassigned_to_place = None;
                self.selected = None;
                self.is_measuring = false;
                Ok(true)
            }
            Action::SelectUnassignedToPlace(uuid) => {
                if !self.unassigned_devices.iter().any(|d| d.details.uuid == uuid) {
                    return Err(FloorplanError::UnassignedNotFound(uuid));
                }
                self.current_unassigned_to_place =
                    if self.current_unassigned_to_place.as_deref() == Some(uuid.as_str()) {
                        None
                    } else {
                        Some(uuid)
                    };
                self.current_type_to_place = None;
                self.selected = None;
                self.is_measuring = false;
                Ok(true)
            }
            Action::ClearPlacementTool => {
                let had_tool = self.has_pending_placement();
                self.clear_pending_tools();
                Ok(had_tool)
            }
            Action::SelectDevice(id) => {
                if self.device(&id).is_none() {
                    return Err(FloorplanError::DeviceNotFound(id));
                }
                self.selected = Some(id);
                Ok(true)
            }
            Action::ClearSelection => Ok(self.selected.take().is_some()),
            Action::AddDevice(device) => {
                log::debug!("placed {} at {:?}", device.id, device.position);
                self.devices.push(device);
                Ok(true)
            }
            Action::PlaceUnassigned(position) => {
                let Some(uuid) = self.current_unassigned_to_place.take() else {
                    return Ok(false);
                };
                let index = self
                    .unassigned_devices
                    .iter()
                    .position(|d| d.details.uuid == uuid)
                    .ok_or(FloorplanError::UnassignedNotFound(uuid))?;
                let pooled = self.unassigned_devices.remove(index);
                let id = DeviceId::generate(pooled.device_type);
                self.devices.push(pooled.into_device(id, position));
                Ok(true)
            }
            Action::MoveDevice { id, position } => {
                let device = self
                    .device_mut(&id)
                    .ok_or(FloorplanError::DeviceNotFound(id))?;
                device.position = position;
                Ok(true)
            }
            Action::UpdateDevice { id, patch } => {
                let device = self
                    .device_mut(&id)
                    .ok_or(FloorplanError::DeviceNotFound(id))?;
                let before = device.clone();
                patch.apply_to(device);
                Ok(*device != before)
            }
            Action::AssignDevice { id, uuid } => {
                let device_index = self
                    .devices
                    .iter()
                    .position(|d| d.id == id)
                    .ok_or_else(|| FloorplanError::DeviceNotFound(id.clone()))?;
                let pool_index = self
                    .unassigned_devices
                    .iter()
                    .position(|d| d.details.uuid == uuid)
                    .ok_or(FloorplanError::UnassignedNotFound(uuid))?;
                let pooled = self.unassigned_devices.remove(pool_index);
                let previous = std::mem::replace(
                    &mut self.devices[device_index],
                    pooled.into_device(id, (0.0, 0.0)),
                );
                self.devices[device_index].position = previous.position;
                // A full device that gets replaced goes back to the pool.
                if let DeviceKind::Full(mut details) = previous.kind {
                    details.assigned = false;
                    self.unassigned_devices.push(UnassignedDevice {
                        device_type: previous.device_type,
                        name: previous.name,
                        details,
                    });
                }
                Ok(true)
            }
            Action::DeleteDevice(id) => {
                let before = self.devices.len();
                self.devices.retain(|d| d.id != id);
                if self.devices.len() == before {
                    return Err(FloorplanError::DeviceNotFound(id));
                }
                if self.selected.as_ref() == Some(&id) {
                    self.selected = None;
                }
                Ok(true)
            }
            Action::SetMode(mode) => {
                if mode == self.mode {
                    return Ok(false);
                }
                if mode == Mode::Edit {
                    self.edit_snapshot = Some(EditSnapshot {
                        devices: self.devices.clone(),
                        unassigned_devices: self.unassigned_devices.clone(),
                    });
                } else {
                    self.edit_snapshot = None;
                }
                if !mode.allows_changes() {
                    self.clear_pending_tools();
                }
                self.mode = mode;
                Ok(true)
            }
            Action::SaveEdits => {
                if self.mode != Mode::Edit {
                    return Ok(false);
                }
                self.edit_snapshot = None;
                self.mode = Mode::View;
                self.clear_pending_tools();
                Ok(true)
            }
            Action::CancelEdits => {
                if self.mode != Mode::Edit {
                    return Ok(false);
                }
                if let Some(snapshot) = self.edit_snapshot.take() {
                    self.devices = snapshot.devices;
                    self.unassigned_devices = snapshot.unassigned_devices;
                }
                if self
                    .selected
                    .as_ref()
                    .is_some_and(|id| self.device(id).is_none())
                {
                    self.selected = None;
                }
                self.mode = Mode::View;
                self.clear_pending_tools();
                Ok(true)
            }
        }
    }
}

fn round_to(value: f32, decimals: i32) -> f32 {
    let factor = 10f32.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(name: &str) -> FloorplanImage {
        FloorplanImage {
            name: name.into(),
            size: [1000, 800],
        }
    }

    fn full_pool_device(uuid: &str) -> UnassignedDevice {
        UnassignedDevice {
            device_type: DeviceType::Eec,
            name: "Exit/Entry Counter".into(),
            details: DeviceDetails {
                uuid: uuid.into(),
                label: "300240".into(),
                active: false,
                battery: 55,
                mounting_height: 8.0,
                mounting_location: MountingLocation::Outside,
                capacity: 1,
                power_type: PowerType::Battery,
                assigned: false,
            },
        }
    }

    fn state_with_device() -> (FloorplanState, DeviceId) {
        let mut state = FloorplanState::new();
        let device = Device::placeholder(DeviceType::Hub, "Hub".into(), (300.0, 400.0));
        let id = device.id.clone();
        state.apply(Action::AddDevice(device)).unwrap();
        (state, id)
    }

    #[test]
    fn upload_resets_transform_and_enters_calibration() {
        let mut state = FloorplanState::new();
        state.apply(Action::ImageUploaded(image("a.png"))).unwrap();
        state.apply(Action::ResizeImage(0.5)).unwrap();
        state.apply(Action::RotateImage(90)).unwrap();
        state.apply(Action::SetScaleRatio(0.2)).unwrap();

        // Second upload before completing calibration of the first
        state.apply(Action::ImageUploaded(image("b.png"))).unwrap();
        assert_eq!(state.image.as_ref().unwrap().name, "b.png");
        assert_eq!(state.scale_ratio, None);
        assert_eq!(state.transform.scale, 1.0);
        assert_eq!(state.transform.rotation, 0);
        assert!(state.is_calibrating);
        assert!(!state.image_locked);
    }

    #[test]
    fn attach_image_keeps_calibration() {
        let mut state = FloorplanState::new();
        state.apply(Action::SetScaleRatio(0.08)).unwrap();
        state.apply(Action::CompleteCalibration).unwrap();
        state.apply(Action::AttachImage(image("seed.png"))).unwrap();
        assert_eq!(state.scale_ratio, Some(0.08));
        assert!(state.image_locked);
        assert_eq!(state.image_size(), Some([1000, 800]));
    }

    #[test]
    fn resize_stays_within_bounds() {
        let mut state = FloorplanState::new();
        for _ in 0..50 {
            state.apply(Action::ResizeImage(0.2)).unwrap();
        }
        assert_eq!(state.transform.scale, MAX_IMAGE_SCALE);
        for _ in 0..50 {
            state.apply(Action::ResizeImage(-0.3)).unwrap();
        }
        assert_eq!(state.transform.scale, MIN_IMAGE_SCALE);
    }

    #[test]
    fn resize_and_rotate_are_noops_when_locked() {
        let mut state = FloorplanState::new();
        state.apply(Action::CompleteCalibration).unwrap();
        assert_eq!(state.apply(Action::ResizeImage(0.1)).unwrap(), false);
        assert_eq!(state.apply(Action::RotateImage(90)).unwrap(), false);
        assert_eq!(state.transform, ImageTransform::default());

        state.apply(Action::Recalibrate).unwrap();
        assert!(state.is_calibrating);
        assert!(state.apply(Action::ResizeImage(0.1)).unwrap());
    }

    #[test]
    fn rotation_always_quarter_turns() {
        let mut state = FloorplanState::new();
        let deltas = [90, 90, -90, 90, 90, 90, -90, -90, -90, -90, -90];
        for delta in deltas {
            state.apply(Action::RotateImage(delta)).unwrap();
            assert!([0, 90, 180, 270].contains(&state.transform.rotation));
        }
        assert_eq!(state.transform.rotation, 270);
    }

    #[test]
    fn set_scale_ratio_ignores_invalid_values() {
        let mut state = FloorplanState::new();
        state.apply(Action::SetScaleRatio(0.5)).unwrap();
        assert!(!state.apply(Action::SetScaleRatio(-1.0)).unwrap());
        assert!(!state.apply(Action::SetScaleRatio(f32::NAN)).unwrap());
        assert_eq!(state.scale_ratio, Some(0.5));
    }

    #[test]
    fn adjust_scale_ratio_uses_fallback_then_current() {
        let mut state = FloorplanState::new();
        state
            .apply(Action::AdjustScaleRatio {
                fraction: 0.1,
                fallback: 0.5,
            })
            .unwrap();
        assert_eq!(state.scale_ratio, Some(0.55));
        state
            .apply(Action::AdjustScaleRatio {
                fraction: -0.1,
                fallback: 0.5,
            })
            .unwrap();
        assert_eq!(state.scale_ratio, Some(0.495));
    }

    #[test]
    fn complete_calibration_locks_image() {
        let mut state = FloorplanState::new();
        state.apply(Action::ImageUploaded(image("a.png"))).unwrap();
        state.apply(Action::CompleteCalibration).unwrap();
        assert!(!state.is_calibrating);
        assert!(state.image_locked);
    }

    #[test]
    fn recalibrate_allowed_in_view_mode() {
        let mut state = FloorplanState::new();
        state.apply(Action::SetMode(Mode::View)).unwrap();
        assert!(state.apply(Action::Recalibrate).unwrap());
        assert!(state.is_calibrating);
    }

    #[test]
    fn selecting_same_type_twice_clears_it() {
        let (mut state, id) = state_with_device();
        state.apply(Action::SelectDevice(id)).unwrap();

        state.apply(Action::SelectTypeToPlace(DeviceType::Hub)).unwrap();
        assert_eq!(state.current_type_to_place, Some(DeviceType::Hub));
        assert_eq!(state.selected, None);

        state.apply(Action::SelectTypeToPlace(DeviceType::Hub)).unwrap();
        assert_eq!(state.current_type_to_place, None);
    }

    #[test]
    fn selecting_other_type_switches() {
        let mut state = FloorplanState::new();
        state.apply(Action::SelectTypeToPlace(DeviceType::Hub)).unwrap();
        state.apply(Action::SelectTypeToPlace(DeviceType::Iaq)).unwrap();
        assert_eq!(state.current_type_to_place, Some(DeviceType::Iaq));
    }

    #[test]
    fn delete_selected_device_clears_selection() {
        let (mut state, id) = state_with_device();
        state
            .apply(Action::AddDevice(Device::placeholder(
                DeviceType::Iaq,
                "IAQ Sensor".into(),
                (1.0, 1.0),
            )))
            .unwrap();
        state.apply(Action::SelectDevice(id.clone())).unwrap();

        let before = state.devices.len();
        state.apply(Action::DeleteDevice(id.clone())).unwrap();
        assert_eq!(state.devices.len(), before - 1);
        assert_eq!(state.selected, None);
        assert!(state.device(&id).is_none());
    }

    #[test]
    fn delete_unknown_device_errors() {
        let (mut state, _) = state_with_device();
        let result = state.apply(Action::DeleteDevice(DeviceId::from("nope")));
        assert!(matches!(result, Err(FloorplanError::DeviceNotFound(_))));
        assert_eq!(state.devices.len(), 1);
    }

    #[test]
    fn select_missing_device_errors() {
        let mut state = FloorplanState::new();
        assert!(state.apply(Action::SelectDevice(DeviceId::from("x"))).is_err());
        assert_eq!(state.selected, None);
    }

    #[test]
    fn view_mode_rejects_changes() {
        let (mut state, id) = state_with_device();
        state.apply(Action::SetMode(Mode::View)).unwrap();
        assert!(matches!(
            state.apply(Action::DeleteDevice(id.clone())),
            Err(FloorplanError::ReadOnly(_))
        ));
        assert!(state.apply(Action::SelectTypeToPlace(DeviceType::Hub)).is_err());
        // Selection is still allowed
        assert!(state.apply(Action::SelectDevice(id)).unwrap());
    }

    #[test]
    fn cancel_edits_restores_snapshot() {
        let (mut state, id) = state_with_device();
        state.apply(Action::SetMode(Mode::Edit)).unwrap();
        state
            .apply(Action::MoveDevice {
                id: id.clone(),
                position: (10.0, 10.0),
            })
            .unwrap();
        state.apply(Action::DeleteDevice(id.clone())).unwrap();
        assert!(state.devices.is_empty());

        state.apply(Action::CancelEdits).unwrap();
        assert_eq!(state.mode, Mode::View);
        assert_eq!(state.device(&id).unwrap().position, (300.0, 400.0));
        assert!(state.edit_snapshot.is_none());
    }

    #[test]
    fn save_edits_keeps_changes() {
        let (mut state, id) = state_with_device();
        state.apply(Action::SetMode(Mode::Edit)).unwrap();
        state
            .apply(Action::UpdateDevice {
                id: id.clone(),
                patch: DevicePatch {
                    name: Some("Lobby hub".into()),
                    ..Default::default()
                },
            })
            .unwrap();
        state.apply(Action::SaveEdits).unwrap();
        assert_eq!(state.mode, Mode::View);
        assert_eq!(state.device(&id).unwrap().name, "Lobby hub");
    }

    #[test]
    fn place_unassigned_moves_record_from_pool() {
        let mut state = FloorplanState::new();
        state.unassigned_devices.push(full_pool_device("EEC-0002"));
        state
            .apply(Action::SelectUnassignedToPlace("EEC-0002".into()))
            .unwrap();
        assert!(state.has_pending_placement());

        state.apply(Action::PlaceUnassigned((50.0, 60.0))).unwrap();
        assert!(state.unassigned_devices.is_empty());
        assert_eq!(state.current_unassigned_to_place, None);
        let device = &state.devices[0];
        assert_eq!(device.position, (50.0, 60.0));
        assert_eq!(device.details().unwrap().uuid, "EEC-0002");
        assert!(device.details().unwrap().assigned);
    }

    #[test]
    fn place_unassigned_without_pending_is_noop() {
        let mut state = FloorplanState::new();
        assert!(!state.apply(Action::PlaceUnassigned((1.0, 1.0))).unwrap());
        assert!(state.devices.is_empty());
    }

    #[test]
    fn assign_device_binds_placeholder_in_place() {
        let (mut state, id) = state_with_device();
        state.unassigned_devices.push(full_pool_device("EEC-0002"));
        state
            .apply(Action::AssignDevice {
                id: id.clone(),
                uuid: "EEC-0002".into(),
            })
            .unwrap();

        let device = state.device(&id).unwrap();
        assert!(!device.is_placeholder());
        assert_eq!(device.position, (300.0, 400.0));
        assert!(state.unassigned_devices.is_empty());
    }

    #[test]
    fn reassigning_full_device_returns_old_record_to_pool() {
        let (mut state, id) = state_with_device();
        state.unassigned_devices.push(full_pool_device("A"));
        state.unassigned_devices.push(full_pool_device("B"));
        state
            .apply(Action::AssignDevice {
                id: id.clone(),
                uuid: "A".into(),
            })
            .unwrap();
        state
            .apply(Action::AssignDevice {
                id: id.clone(),
                uuid: "B".into(),
            })
            .unwrap();

        assert_eq!(state.device(&id).unwrap().details().unwrap().uuid, "B");
        assert_eq!(state.unassigned_devices.len(), 1);
        assert_eq!(state.unassigned_devices[0].details.uuid, "A");
        assert!(!state.unassigned_devices[0].details.assigned);
    }

    #[test]
    fn measuring_clears_placement_tool() {
        let mut state = FloorplanState::new();
        state.apply(Action::SelectTypeToPlace(DeviceType::Hub)).unwrap();
        state.apply(Action::SetMeasuring(true)).unwrap();
        assert!(state.is_measuring);
        assert_eq!(state.current_type_to_place, None);
    }
}
