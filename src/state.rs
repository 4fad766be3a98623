//! The floor-plan application state.
//!
//! [`FloorplanState`] is the single record the editor works on. The view layer reads it
//! directly but only changes it through [`crate::actions::Action`] messages.

use crate::types::*;
use serde::{Deserialize, Serialize};

/// Devices saved when entering edit mode so the edit can be cancelled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EditSnapshot {
    /// Devices on the plan when editing started
    pub devices: Vec<Device>,
    /// Unassigned pool when editing started
    pub unassigned_devices: Vec<UnassignedDevice>,
}

/// Everything known about the floor plan being edited.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FloorplanState {
    /// Current editing mode
    pub mode: Mode,
    /// Floor-plan image handle, if one has been loaded
    pub image: Option<FloorplanImage>,
    /// Image offset, scale and rotation on the stage
    pub transform: ImageTransform,
    /// Feet per image pixel; `None` until calibration produces a ratio
    pub scale_ratio: Option<f32>,
    /// Devices on the plan, in drawing order
    pub devices: Vec<Device>,
    /// Real device records not yet placed on the plan
    pub unassigned_devices: Vec<UnassignedDevice>,
    /// Currently selected device
    #[serde(skip)]
    pub selected: Option<DeviceId>,
    /// Device type the next canvas click will place
    #[serde(skip)]
    pub current_type_to_place: Option<DeviceType>,
    /// Unassigned device (by uuid) the next canvas click will place
    #[serde(skip)]
    pub current_unassigned_to_place: Option<String>,
    /// Whether the calibration tools are active
    pub is_calibrating: bool,
    /// Whether the measure tool is active
    #[serde(skip)]
    pub is_measuring: bool,
    /// Whether image size and rotation are fixed (set once calibration completes)
    pub image_locked: bool,
    /// Saved devices while in edit mode
    #[serde(skip)]
    pub edit_snapshot: Option<EditSnapshot>,
}

impl Default for FloorplanState {
    /// Creates the empty planning state used before any image is loaded.
    fn default() -> Self {
        Self {
            mode: Mode::Planning,
            image: None,
            transform: ImageTransform::default(),
            scale_ratio: None,
            devices: Vec::new(),
            unassigned_devices: Vec::new(),
            selected: None,
            current_type_to_place: None,
            current_unassigned_to_place: None,
            is_calibrating: false,
            is_measuring: false,
            image_locked: false,
            edit_snapshot: None,
        }
    }
}

impl FloorplanState {
    /// Creates an empty floor-plan state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a device by id.
    pub fn device(&self, id: &DeviceId) -> Option<&Device> {
        self.devices.iter().find(|d| &d.id == id)
    }

    /// Mutable lookup of a device by id.
    pub fn device_mut(&mut self, id: &DeviceId) -> Option<&mut Device> {
        self.devices.iter_mut().find(|d| &d.id == id)
    }

    /// The currently selected device, if it still exists.
    pub fn selected_device(&self) -> Option<&Device> {
        self.selected.as_ref().and_then(|id| self.device(id))
    }

    /// Pixel size of the loaded image.
    pub fn image_size(&self) -> Option<[usize; 2]> {
        self.image.as_ref().map(|image| image.size)
    }

    /// Returns true if a canvas click would place something.
    pub fn has_pending_placement(&self) -> bool {
        self.current_type_to_place.is_some() || self.current_unassigned_to_place.is_some()
    }

    /// Devices whose name (or label) matches a search query.
    pub fn search_devices<'a>(&'a self, query: &'a str) -> impl Iterator<Item = &'a Device> + 'a {
        self.devices.iter().filter(move |d| d.matches_query(query))
    }

    /// Clears the pending placement tools.
    pub(crate) fn clear_pending_tools(&mut self) {
        self.current_type_to_place = None;
        self.current_unassigned_to_place = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = FloorplanState::default();
        assert_eq!(state.mode, Mode::Planning);
        assert!(state.image.is_none());
        assert!(state.scale_ratio.is_none());
        assert!(state.devices.is_empty());
        assert_eq!(state.transform.scale, 1.0);
        assert_eq!(state.transform.rotation, 0);
        assert!(!state.has_pending_placement());
    }

    #[test]
    fn test_device_lookup_and_selection() {
        let mut state = FloorplanState::new();
        let device = Device::placeholder(DeviceType::Hub, "Hub".into(), (1.0, 2.0));
        let id = device.id.clone();
        state.devices.push(device);

        assert!(state.device(&id).is_some());
        assert!(state.selected_device().is_none());
        state.selected = Some(id.clone());
        assert_eq!(state.selected_device().map(|d| &d.id), Some(&id));

        state.device_mut(&id).unwrap().name = "Lobby".into();
        assert_eq!(state.device(&id).unwrap().name, "Lobby");
    }

    #[test]
    fn test_search_devices() {
        let mut state = FloorplanState::new();
        state
            .devices
            .push(Device::placeholder(DeviceType::Hub, "Hub".into(), (0.0, 0.0)));
        state.devices.push(Device::placeholder(
            DeviceType::DeskOccupancy,
            "Desk Occupancy".into(),
            (0.0, 0.0),
        ));
        assert_eq!(state.search_devices("desk").count(), 1);
        assert_eq!(state.search_devices("").count(), 2);
    }
}
