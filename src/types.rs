//! Core data types for the floor-plan editor.
//!
//! This module defines the devices placed on a floor plan, the image handle and
//! transform, and the editing mode. Device positions are always image-local pixels.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for devices placed on the plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub String);

impl DeviceId {
    /// Generates a fresh id for a device of the given type.
    ///
    /// Ids are `<type tag>-<uuid>`, so rapid repeated placements never collide.
    pub fn generate(device_type: DeviceType) -> Self {
        Self(format!("{}-{}", device_type.tag(), Uuid::new_v4().simple()))
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Editing mode of the floor plan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Laying out the plan: calibrate, place and delete devices
    #[default]
    Planning,
    /// Read-only inspection
    View,
    /// Editing an existing plan; changes can be saved or cancelled
    Edit,
}

impl Mode {
    /// Returns true when devices may be placed, moved, edited or deleted.
    pub fn allows_changes(self) -> bool {
        !matches!(self, Mode::View)
    }

    /// Human-readable label for toolbars.
    pub fn label(self) -> &'static str {
        match self {
            Mode::Planning => "Planning",
            Mode::View => "View",
            Mode::Edit => "Edit",
        }
    }
}

/// The kinds of IoT device that can be placed on a plan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    /// Gateway hub that the other sensors report to
    Hub,
    /// Exit/entry counter mounted at doorways
    Eec,
    /// Area people counter
    Counter,
    /// Desk occupancy sensor
    DeskOccupancy,
    /// Room occupancy sensor
    RoomOccupancy,
    /// Indoor air quality sensor
    Iaq,
    /// A type tag this build does not know; drawn with the generic style
    #[serde(other)]
    Unknown,
}

impl DeviceType {
    /// Every placeable device type, in palette order.
    pub const ALL: [DeviceType; 6] = [
        DeviceType::Hub,
        DeviceType::Eec,
        DeviceType::Counter,
        DeviceType::DeskOccupancy,
        DeviceType::RoomOccupancy,
        DeviceType::Iaq,
    ];

    /// Stable lowercase tag, matching the serialized form.
    pub fn tag(self) -> &'static str {
        match self {
            DeviceType::Hub => "hub",
            DeviceType::Eec => "eec",
            DeviceType::Counter => "counter",
            DeviceType::DeskOccupancy => "desk_occupancy",
            DeviceType::RoomOccupancy => "room_occupancy",
            DeviceType::Iaq => "iaq",
            DeviceType::Unknown => "unknown",
        }
    }

    /// Parses a tag produced by [`DeviceType::tag`]. Unknown tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.tag() == tag)
    }
}

/// Where a device is mounted relative to the space it monitors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MountingLocation {
    /// Inside the monitored space
    Inside,
    /// Outside the monitored space
    Outside,
}

/// How a device is powered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PowerType {
    /// Runs on batteries
    Battery,
    /// Hard-wired to mains power
    Wired,
}

/// Metadata carried by a real device record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceDetails {
    /// Hardware identifier
    pub uuid: String,
    /// Printed label on the unit
    pub label: String,
    /// Whether the device is currently reporting
    pub active: bool,
    /// Battery charge percentage in [0, 100]
    pub battery: u8,
    /// Mounting height in feet
    pub mounting_height: f32,
    /// Mounting side relative to the monitored space
    pub mounting_location: MountingLocation,
    /// Number of people/desks the device covers
    pub capacity: u32,
    /// Power source
    pub power_type: PowerType,
    /// Whether the record has been bound to a plan position
    pub assigned: bool,
}

/// Distinguishes placeholders from devices bound to real hardware records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DeviceKind {
    /// A marker placed before it is bound to a real device
    Placeholder,
    /// A device with telemetry and mounting metadata
    Full(DeviceDetails),
}

/// A device marker on the floor plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Device {
    /// Unique identifier for this device
    pub id: DeviceId,
    /// Catalog type of the device
    pub device_type: DeviceType,
    /// Display name, e.g. "Hub"
    pub name: String,
    /// Position in image-local pixels
    pub position: (f32, f32),
    /// Placeholder or full device
    pub kind: DeviceKind,
}

impl Device {
    /// Creates a placeholder device with a freshly generated id.
    pub fn placeholder(device_type: DeviceType, name: String, position: (f32, f32)) -> Self {
        Self {
            id: DeviceId::generate(device_type),
            device_type,
            name,
            position,
            kind: DeviceKind::Placeholder,
        }
    }

    /// Returns true if this device has not been bound to a real record yet.
    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, DeviceKind::Placeholder)
    }

    /// Returns the device metadata for full devices.
    pub fn details(&self) -> Option<&DeviceDetails> {
        match &self.kind {
            DeviceKind::Full(details) => Some(details),
            DeviceKind::Placeholder => None,
        }
    }

    /// Mutable access to the device metadata for full devices.
    pub fn details_mut(&mut self) -> Option<&mut DeviceDetails> {
        match &mut self.kind {
            DeviceKind::Full(details) => Some(details),
            DeviceKind::Placeholder => None,
        }
    }

    /// Case-insensitive search over the name, and the label of full devices.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&query)
            || self
                .details()
                .is_some_and(|d| d.label.to_lowercase().contains(&query))
    }
}

/// A real device record that has not been placed on the plan yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnassignedDevice {
    /// Catalog type of the device
    pub device_type: DeviceType,
    /// Display name
    pub name: String,
    /// Hardware metadata
    pub details: DeviceDetails,
}

impl UnassignedDevice {
    /// Turns the record into a full device at the given image-local position.
    pub fn into_device(self, id: DeviceId, position: (f32, f32)) -> Device {
        let mut details = self.details;
        details.assigned = true;
        Device {
            id,
            device_type: self.device_type,
            name: self.name,
            position,
            kind: DeviceKind::Full(details),
        }
    }
}

/// Partial update of a device's editable fields. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DevicePatch {
    /// New display name
    pub name: Option<String>,
    /// New label (full devices only)
    pub label: Option<String>,
    /// New active flag (full devices only)
    pub active: Option<bool>,
    /// New battery percentage, clamped to [0, 100] (full devices only)
    pub battery: Option<i32>,
    /// New mounting height in feet (full devices only)
    pub mounting_height: Option<f32>,
    /// New mounting location (full devices only)
    pub mounting_location: Option<MountingLocation>,
    /// New capacity (full devices only)
    pub capacity: Option<u32>,
    /// New power type (full devices only)
    pub power_type: Option<PowerType>,
}

impl DevicePatch {
    /// Applies the patch to a device. Metadata fields are ignored for placeholders.
    pub fn apply_to(&self, device: &mut Device) {
        if let Some(name) = &self.name {
            let trimmed = name.trim();
            if !trimmed.is_empty() {
                device.name = trimmed.to_string();
            }
        }
        let Some(details) = device.details_mut() else {
            return;
        };
        if let Some(label) = &self.label {
            details.label = label.clone();
        }
        if let Some(active) = self.active {
            details.active = active;
        }
        if let Some(battery) = self.battery {
            details.battery = battery.clamp(0, 100) as u8;
        }
        if let Some(height) = self.mounting_height {
            if height.is_finite() && height >= 0.0 {
                details.mounting_height = height;
            }
        }
        if let Some(location) = self.mounting_location {
            details.mounting_location = location;
        }
        if let Some(capacity) = self.capacity {
            details.capacity = capacity;
        }
        if let Some(power) = self.power_type {
            details.power_type = power;
        }
    }
}

/// Handle to the floor-plan image currently shown on the stage.
///
/// The decoded pixels live in the view layer's texture; the state only needs
/// the name and the pixel dimensions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FloorplanImage {
    /// File name or asset path the image came from
    pub name: String,
    /// Width and height in image pixels
    pub size: [usize; 2],
}

/// Placement of the image on the stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ImageTransform {
    /// Top-left corner of the unrotated image in stage units
    pub offset: (f32, f32),
    /// Uniform image scale factor in [0.1, 3]
    pub scale: f32,
    /// Rotation about the image centre, in degrees, one of {0, 90, 180, 270}
    pub rotation: i32,
}

impl Default for ImageTransform {
    fn default() -> Self {
        Self {
            offset: (0.0, 0.0),
            scale: 1.0,
            rotation: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_details() -> DeviceDetails {
        DeviceDetails {
            uuid: "HUB-0001".into(),
            label: "300239".into(),
            active: true,
            battery: 92,
            mounting_height: 12.0,
            mounting_location: MountingLocation::Inside,
            capacity: 1,
            power_type: PowerType::Battery,
            assigned: true,
        }
    }

    #[test]
    fn test_device_type_tags_roundtrip() {
        for t in DeviceType::ALL {
            assert_eq!(DeviceType::from_tag(t.tag()), Some(t));
        }
        assert_eq!(DeviceType::from_tag("thermostat"), None);
        assert!(!DeviceType::ALL.contains(&DeviceType::Unknown));
    }

    #[test]
    fn test_unrecognised_type_tag_deserializes_as_unknown() {
        let parsed: DeviceType = serde_json::from_str("\"thermostat\"").unwrap();
        assert_eq!(parsed, DeviceType::Unknown);
    }

    #[test]
    fn test_device_type_serializes_as_tag() {
        let json = serde_json::to_string(&DeviceType::DeskOccupancy).unwrap();
        assert_eq!(json, "\"desk_occupancy\"");
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = DeviceId::generate(DeviceType::Hub);
        let b = DeviceId::generate(DeviceType::Hub);
        assert_ne!(a, b);
        assert!(a.0.starts_with("hub-"));
    }

    #[test]
    fn test_placeholder_creation() {
        let device = Device::placeholder(DeviceType::Iaq, "IAQ Sensor".into(), (10.0, 20.0));
        assert!(device.is_placeholder());
        assert!(device.details().is_none());
        assert_eq!(device.position, (10.0, 20.0));
    }

    #[test]
    fn test_matches_query_checks_name_and_label() {
        let mut device = Device::placeholder(DeviceType::Hub, "Hub".into(), (0.0, 0.0));
        assert!(device.matches_query("hU"));
        assert!(!device.matches_query("3002"));

        device.kind = DeviceKind::Full(sample_details());
        assert!(device.matches_query("3002"));
        assert!(device.matches_query("   "));
    }

    #[test]
    fn test_patch_clamps_battery_and_skips_placeholders() {
        let mut full = Device::placeholder(DeviceType::Hub, "Hub".into(), (0.0, 0.0));
        full.kind = DeviceKind::Full(sample_details());
        let patch = DevicePatch {
            battery: Some(140),
            name: Some("  Lobby hub ".into()),
            ..Default::default()
        };
        patch.apply_to(&mut full);
        assert_eq!(full.name, "Lobby hub");
        assert_eq!(full.details().unwrap().battery, 100);

        let mut placeholder = Device::placeholder(DeviceType::Eec, "EEC".into(), (0.0, 0.0));
        DevicePatch {
            label: Some("ignored".into()),
            ..Default::default()
        }
        .apply_to(&mut placeholder);
        assert!(placeholder.is_placeholder());
    }

    #[test]
    fn test_unassigned_into_device_marks_assigned() {
        let mut details = sample_details();
        details.assigned = false;
        let pooled = UnassignedDevice {
            device_type: DeviceType::Hub,
            name: "Hub".into(),
            details,
        };
        let device = pooled.into_device(DeviceId::from("device-9"), (5.0, 6.0));
        assert_eq!(device.id, DeviceId::from("device-9"));
        assert!(device.details().unwrap().assigned);
    }

    #[test]
    fn test_mode_allows_changes() {
        assert!(Mode::Planning.allows_changes());
        assert!(Mode::Edit.allows_changes());
        assert!(!Mode::View.allows_changes());
    }
}
