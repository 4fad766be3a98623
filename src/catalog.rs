//! Static device-type catalog.
//!
//! Every device type maps to one [`DeviceStyle`] entry; rendering looks the style up
//! instead of dispatching through per-type code.

use crate::types::DeviceType;
use eframe::egui::Color32;

/// Visual and naming information for a device type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceStyle {
    /// Default display name for newly placed devices
    pub name: &'static str,
    /// Abbreviation drawn inside the marker
    pub short: &'static str,
    /// Marker fill colour
    pub fill: Color32,
    /// Marker outline colour
    pub stroke: Color32,
    /// Label text colour drawn over the marker
    pub text: Color32,
    /// Detection range in feet drawn as a ring, if the device has one
    pub range_feet: Option<f32>,
}

/// Style used for devices whose type is unknown to this build.
pub static BASE_STYLE: DeviceStyle = DeviceStyle {
    name: "Device",
    short: "?",
    fill: Color32::GRAY,
    stroke: Color32::TRANSPARENT,
    text: Color32::WHITE,
    range_feet: None,
};

static HUB: DeviceStyle = DeviceStyle {
    name: "Hub",
    short: "H",
    fill: Color32::from_rgb(0x3b, 0x82, 0xf6),
    stroke: Color32::from_rgb(0x1d, 0x4e, 0xd8),
    text: Color32::WHITE,
    range_feet: Some(100.0),
};

static EEC: DeviceStyle = DeviceStyle {
    name: "Exit/Entry Counter",
    short: "EEC",
    fill: Color32::from_rgb(0xf5, 0x9e, 0x0b),
    stroke: Color32::from_rgb(0xd9, 0x77, 0x06),
    text: Color32::WHITE,
    range_feet: None,
};

static COUNTER: DeviceStyle = DeviceStyle {
    name: "Area Counter",
    short: "AC",
    fill: Color32::from_rgb(0x10, 0xb9, 0x81),
    stroke: Color32::from_rgb(0x05, 0x96, 0x69),
    text: Color32::WHITE,
    range_feet: None,
};

static DESK_OCCUPANCY: DeviceStyle = DeviceStyle {
    name: "Desk Occupancy",
    short: "D",
    fill: Color32::from_rgb(0x8b, 0x5c, 0xf6),
    stroke: Color32::from_rgb(0x7c, 0x3a, 0xed),
    text: Color32::WHITE,
    range_feet: None,
};

static ROOM_OCCUPANCY: DeviceStyle = DeviceStyle {
    name: "Room Occupancy",
    short: "R",
    fill: Color32::from_rgb(0xec, 0x48, 0x99),
    stroke: Color32::from_rgb(0xdb, 0x27, 0x77),
    text: Color32::WHITE,
    range_feet: None,
};

static IAQ: DeviceStyle = DeviceStyle {
    name: "IAQ Sensor",
    short: "IAQ",
    fill: Color32::from_rgb(0x06, 0xb6, 0xd4),
    stroke: Color32::from_rgb(0x08, 0x91, 0xb2),
    text: Color32::WHITE,
    range_feet: None,
};

/// Looks up the catalog entry for a device type.
pub fn style(device_type: DeviceType) -> &'static DeviceStyle {
    match device_type {
        DeviceType::Hub => &HUB,
        DeviceType::Eec => &EEC,
        DeviceType::Counter => &COUNTER,
        DeviceType::DeskOccupancy => &DESK_OCCUPANCY,
        DeviceType::RoomOccupancy => &ROOM_OCCUPANCY,
        DeviceType::Iaq => &IAQ,
        DeviceType::Unknown => &BASE_STYLE,
    }
}

/// Default display name for a newly placed device of this type.
pub fn default_name(device_type: DeviceType) -> &'static str {
    style(device_type).name
}
