//! Click-to-place device construction.

use crate::catalog;
use crate::constants::{DEVICE_HIT_SLOP, DEVICE_RADIUS};
use crate::geometry::{image_contains, image_local_to_stage, stage_to_image_local, StageView};
use crate::types::*;
use eframe::egui;
use serde::{Deserialize, Serialize};

/// Where a click may place a device.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PlacementBounds {
    /// Only inside the rendered image
    #[default]
    ImageOnly,
    /// Anywhere on the stage
    Anywhere,
}

/// Everything needed to map a stage click into image-local pixels.
#[derive(Debug, Clone, Copy)]
pub struct PlacementFrame<'a> {
    /// Current stage pan/zoom
    pub view: &'a StageView,
    /// Image offset, scale and rotation
    pub transform: &'a ImageTransform,
    /// Pixel size of the loaded image, if any
    pub image_size: Option<[usize; 2]>,
}

impl PlacementFrame<'_> {
    /// Maps a stage position to image-local pixels.
    pub fn to_image_local(&self, stage_pos: egui::Pos2) -> egui::Pos2 {
        stage_to_image_local(stage_pos, self.view, self.transform, self.image_size)
    }

    /// Maps an image-local position to the stage.
    pub fn to_stage(&self, local: egui::Pos2) -> egui::Pos2 {
        image_local_to_stage(local, self.view, self.transform, self.image_size)
    }
}

/// Builds a new placeholder device for a click on the stage.
///
/// Returns `None` when no type is pending, or when the bounds policy requires the
/// click to land on the image and it does not.
pub fn place_device(
    pointer_stage_pos: egui::Pos2,
    current_type_to_place: Option<DeviceType>,
    frame: &PlacementFrame<'_>,
    bounds: PlacementBounds,
) -> Option<Device> {
    let device_type = current_type_to_place?;
    let local = placement_point(pointer_stage_pos, frame, bounds)?;
    Some(Device::placeholder(
        device_type,
        catalog::default_name(device_type).to_string(),
        (local.x, local.y),
    ))
}

/// Maps a click to the image-local point a device would occupy, applying the bounds policy.
pub fn placement_point(
    pointer_stage_pos: egui::Pos2,
    frame: &PlacementFrame<'_>,
    bounds: PlacementBounds,
) -> Option<egui::Pos2> {
    let local = frame.to_image_local(pointer_stage_pos);
    match (bounds, frame.image_size) {
        (PlacementBounds::Anywhere, _) => Some(local),
        (PlacementBounds::ImageOnly, Some(size)) => image_contains(local, size).then_some(local),
        (PlacementBounds::ImageOnly, None) => None,
    }
}

/// Finds the topmost device under a stage position.
///
/// Markers keep a constant on-screen radius, so the test happens in stage space.
/// Later devices are drawn on top and therefore win.
pub fn find_device_at(
    devices: &[Device],
    pointer_stage_pos: egui::Pos2,
    frame: &PlacementFrame<'_>,
) -> Option<DeviceId> {
    let radius = DEVICE_RADIUS + DEVICE_HIT_SLOP;
    devices
        .iter()
        .rev()
        .find(|device| {
            let center = frame.to_stage(egui::pos2(device.position.0, device.position.1));
            (center - pointer_stage_pos).length() <= radius
        })
        .map(|device| device.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame<'a>(view: &'a StageView, transform: &'a ImageTransform) -> PlacementFrame<'a> {
        PlacementFrame {
            view,
            transform,
            image_size: Some([1000, 800]),
        }
    }

    #[test]
    fn test_place_device_uses_image_local_coordinates() {
        let view = StageView {
            pan: egui::vec2(50.0, 20.0),
            zoom: 2.0,
        };
        let transform = ImageTransform::default();
        let device = place_device(
            egui::pos2(250.0, 220.0),
            Some(DeviceType::Hub),
            &frame(&view, &transform),
            PlacementBounds::ImageOnly,
        )
        .expect("click inside image should place");

        assert_eq!(device.device_type, DeviceType::Hub);
        assert_eq!(device.name, "Hub");
        assert_eq!(device.position, (100.0, 100.0));
        assert!(device.is_placeholder());
    }

    #[test]
    fn test_no_pending_type_places_nothing() {
        let view = StageView::default();
        let transform = ImageTransform::default();
        assert!(place_device(
            egui::pos2(10.0, 10.0),
            None,
            &frame(&view, &transform),
            PlacementBounds::Anywhere
        )
        .is_none());
    }

    #[test]
    fn test_bounds_policy() {
        let view = StageView::default();
        let transform = ImageTransform::default();
        let f = frame(&view, &transform);
        let outside = egui::pos2(1200.0, 10.0);
        assert!(placement_point(outside, &f, PlacementBounds::ImageOnly).is_none());
        assert_eq!(
            placement_point(outside, &f, PlacementBounds::Anywhere),
            Some(outside)
        );

        let no_image = PlacementFrame {
            image_size: None,
            ..f
        };
        let point = placement_point(egui::pos2(5.0, 5.0), &no_image, PlacementBounds::ImageOnly);
        assert!(point.is_none());
    }

    #[test]
    fn test_find_device_prefers_topmost() {
        let view = StageView::default();
        let transform = ImageTransform::default();
        let f = frame(&view, &transform);
        let below = Device::placeholder(DeviceType::Hub, "Hub".into(), (100.0, 100.0));
        let above = Device::placeholder(DeviceType::Iaq, "IAQ".into(), (105.0, 100.0));
        let devices = vec![below, above.clone()];

        assert_eq!(find_device_at(&devices, egui::pos2(103.0, 100.0), &f), Some(above.id));
        assert_eq!(find_device_at(&devices, egui::pos2(300.0, 300.0), &f), None);
    }

    #[test]
    fn test_rapid_placements_get_distinct_ids() {
        let view = StageView::default();
        let transform = ImageTransform::default();
        let f = frame(&view, &transform);
        let ids: std::collections::HashSet<DeviceId> = (0..100)
            .filter_map(|_| {
                place_device(
                    egui::pos2(1.0, 1.0),
                    Some(DeviceType::Counter),
                    &f,
                    PlacementBounds::ImageOnly,
                )
            })
            .map(|d| d.id)
            .collect();
        assert_eq!(ids.len(), 100);
    }
}
