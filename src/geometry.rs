//! Coordinate geometry for calibration, placement and rendering.
//!
//! Three frames are involved:
//! - **stage** positions are pointer positions relative to the canvas origin;
//! - **world** positions remove the stage pan and zoom;
//! - **image-local** positions additionally remove the image offset, rotation and scale,
//!   so they stay attached to the floor-plan image whatever the view does.
//!
//! Scale ratios are expressed in feet per image pixel throughout.

use crate::types::ImageTransform;
use eframe::egui;

/// Pan and zoom of the stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageView {
    /// Translation applied after zooming, in stage pixels
    pub pan: egui::Vec2,
    /// Uniform zoom factor
    pub zoom: f32,
}

impl Default for StageView {
    fn default() -> Self {
        Self {
            pan: egui::Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

/// Euclidean distance between two points.
pub fn pixel_distance(a: egui::Pos2, b: egui::Pos2) -> f32 {
    ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt()
}

/// Computes the scale ratio in feet per pixel from a measured pixel distance
/// and the real-world length it represents.
///
/// Returns `None` unless both inputs are positive and finite.
pub fn compute_scale_ratio(pixel_dist: f32, real_feet: f32) -> Option<f32> {
    if !(pixel_dist.is_finite() && real_feet.is_finite()) || pixel_dist <= 0.0 || real_feet <= 0.0
    {
        return None;
    }
    let ratio = real_feet / pixel_dist;
    (ratio.is_finite() && ratio > 0.0).then_some(ratio)
}

/// Converts a real-world length to image pixels.
pub fn feet_to_image_pixels(feet: f32, feet_per_pixel: f32) -> f32 {
    feet / feet_per_pixel
}

/// Converts an image-pixel length to feet.
pub fn image_pixels_to_feet(pixels: f32, feet_per_pixel: f32) -> f32 {
    pixels * feet_per_pixel
}

/// Wraps any rotation in degrees into `[0, 360)`.
pub fn normalize_rotation(degrees: i32) -> i32 {
    degrees.rem_euclid(360)
}

/// Rotates `v` clockwise on screen (y axis pointing down) by `degrees`.
///
/// Quarter turns are computed exactly so repeated mapping does not drift.
pub fn rotate_vec(v: egui::Vec2, degrees: i32) -> egui::Vec2 {
    match normalize_rotation(degrees) {
        0 => v,
        90 => egui::vec2(-v.y, v.x),
        180 => egui::vec2(-v.x, -v.y),
        270 => egui::vec2(v.y, -v.x),
        other => {
            let (sin, cos) = (other as f32).to_radians().sin_cos();
            egui::vec2(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
        }
    }
}

/// Centre of the scaled image, relative to its top-left corner.
fn scaled_center(transform: &ImageTransform, image_size: Option<[usize; 2]>) -> egui::Vec2 {
    match image_size {
        Some([w, h]) => egui::vec2(w as f32, h as f32) * transform.scale * 0.5,
        None => egui::Vec2::ZERO,
    }
}

/// Maps a stage position into world space by removing pan and zoom.
pub fn stage_to_world(stage_pos: egui::Pos2, view: &StageView) -> egui::Pos2 {
    (stage_pos - view.pan) / view.zoom
}

/// Maps a world position back into stage space.
pub fn world_to_stage(world_pos: egui::Pos2, view: &StageView) -> egui::Pos2 {
    world_pos * view.zoom + view.pan
}

/// Maps a pointer position on the stage into image-local pixels.
///
/// `imageLocal = unrotate((pointer - pan) / zoom - offset) / scale`, where the
/// rotation is undone about the image centre. With no rotation and scale 1 this
/// reduces to `(pointer - pan) / zoom - offset`.
pub fn stage_to_image_local(
    stage_pos: egui::Pos2,
    view: &StageView,
    transform: &ImageTransform,
    image_size: Option<[usize; 2]>,
) -> egui::Pos2 {
    let world = stage_to_world(stage_pos, view);
    let offset = egui::vec2(transform.offset.0, transform.offset.1);
    let center = scaled_center(transform, image_size);
    let relative = world.to_vec2() - offset - center;
    let unrotated = rotate_vec(relative, -transform.rotation) + center;
    (unrotated / transform.scale).to_pos2()
}

/// Maps an image-local position onto the stage; the inverse of [`stage_to_image_local`].
pub fn image_local_to_stage(
    local: egui::Pos2,
    view: &StageView,
    transform: &ImageTransform,
    image_size: Option<[usize; 2]>,
) -> egui::Pos2 {
    let offset = egui::vec2(transform.offset.0, transform.offset.1);
    let center = scaled_center(transform, image_size);
    let scaled = local.to_vec2() * transform.scale;
    let rotated = rotate_vec(scaled - center, transform.rotation) + center;
    world_to_stage((rotated + offset).to_pos2(), view)
}

/// Returns true if an image-local point lies within an image of the given size.
pub fn image_contains(local: egui::Pos2, image_size: [usize; 2]) -> bool {
    local.x >= 0.0
        && local.y >= 0.0
        && local.x <= image_size[0] as f32
        && local.y <= image_size[1] as f32
}

/// Positions of grid lines with the given spacing covering `[start, end]`.
///
/// Lines sit on multiples of `spacing`, so the grid stays anchored at the origin.
/// A non-positive spacing or an inverted range produces no lines.
pub fn grid_line_positions(start: f32, end: f32, spacing: f32) -> Vec<f32> {
    let valid_spacing = spacing.is_finite() && spacing > 0.0;
    let valid_range = start.is_finite() && end.is_finite() && end >= start;
    if !valid_spacing || !valid_range {
        return Vec::new();
    }
    let first = (start / spacing).floor() as i64;
    let last = (end / spacing).ceil() as i64;
    (first..=last).map(|i| i as f32 * spacing).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    fn approx_pos(a: egui::Pos2, b: egui::Pos2) -> bool {
        approx(a.x, b.x) && approx(a.y, b.y)
    }

    #[test]
    fn test_pixel_distance_is_symmetric_and_zero_on_same_point() {
        let a = egui::pos2(3.0, 4.0);
        let b = egui::pos2(-2.0, 10.5);
        assert_eq!(pixel_distance(a, b), pixel_distance(b, a));
        assert!(pixel_distance(a, b) >= 0.0);
        assert_eq!(pixel_distance(a, a), 0.0);
        assert_eq!(pixel_distance(egui::pos2(0.0, 0.0), egui::pos2(3.0, 4.0)), 5.0);
    }

    #[test]
    fn test_scale_ratio_is_feet_per_pixel() {
        let ratio = compute_scale_ratio(300.0, 25.0).unwrap();
        assert!(approx(ratio, 25.0 / 300.0));
        assert!(ratio.is_finite() && ratio > 0.0);
    }

    #[test]
    fn test_scale_ratio_rejects_non_positive_inputs() {
        assert_eq!(compute_scale_ratio(0.0, 10.0), None);
        assert_eq!(compute_scale_ratio(100.0, 0.0), None);
        assert_eq!(compute_scale_ratio(100.0, -3.0), None);
        assert_eq!(compute_scale_ratio(f32::NAN, 3.0), None);
        assert_eq!(compute_scale_ratio(100.0, f32::INFINITY), None);
    }

    #[test]
    fn test_feet_pixel_conversions_agree() {
        let ratio = 0.5;
        assert!(approx(feet_to_image_pixels(100.0, ratio), 200.0));
        assert!(approx(image_pixels_to_feet(200.0, ratio), 100.0));
    }

    #[test]
    fn test_identity_mapping_matches_plain_formula() {
        let view = StageView {
            pan: egui::vec2(20.0, -10.0),
            zoom: 2.0,
        };
        let transform = ImageTransform {
            offset: (5.0, 5.0),
            ..Default::default()
        };
        let local =
            stage_to_image_local(egui::pos2(120.0, 90.0), &view, &transform, Some([800, 600]));
        // (pointer - pan) / zoom - offset
        assert!(approx_pos(local, egui::pos2(45.0, 45.0)));
    }

    #[test]
    fn test_mapping_roundtrips_under_scale_and_rotation() {
        let view = StageView {
            pan: egui::vec2(-40.0, 25.0),
            zoom: 1.6,
        };
        for rotation in [0, 90, 180, 270] {
            let transform = ImageTransform {
                offset: (12.0, -7.0),
                scale: 0.7,
                rotation,
            };
            let local = egui::pos2(150.0, 60.0);
            let stage = image_local_to_stage(local, &view, &transform, Some([400, 300]));
            let back = stage_to_image_local(stage, &view, &transform, Some([400, 300]));
            assert!(approx_pos(local, back), "rotation {rotation}: {back:?}");
        }
    }

    #[test]
    fn test_rotation_keeps_image_centre_fixed() {
        let view = StageView::default();
        let transform = ImageTransform {
            rotation: 90,
            ..Default::default()
        };
        let centre = egui::pos2(200.0, 100.0);
        let stage = image_local_to_stage(centre, &view, &transform, Some([400, 200]));
        assert!(approx_pos(stage, centre));
    }

    #[test]
    fn test_quarter_turn_is_clockwise_on_screen() {
        let v = rotate_vec(egui::vec2(1.0, 0.0), 90);
        assert!(approx(v.x, 0.0) && approx(v.y, 1.0));
        let w = rotate_vec(egui::vec2(1.0, 0.0), -90);
        assert!(approx(w.x, 0.0) && approx(w.y, -1.0));
    }

    #[test]
    fn test_image_contains() {
        assert!(image_contains(egui::pos2(0.0, 0.0), [100, 50]));
        assert!(image_contains(egui::pos2(100.0, 50.0), [100, 50]));
        assert!(!image_contains(egui::pos2(-0.1, 10.0), [100, 50]));
        assert!(!image_contains(egui::pos2(10.0, 50.5), [100, 50]));
    }

    #[test]
    fn test_grid_line_positions_cover_range_on_multiples() {
        let lines = grid_line_positions(-15.0, 35.0, 10.0);
        assert_eq!(lines, vec![-20.0, -10.0, 0.0, 10.0, 20.0, 30.0, 40.0]);
        assert!(grid_line_positions(0.0, 10.0, 0.0).is_empty());
        assert!(grid_line_positions(10.0, 0.0, 1.0).is_empty());
    }

    #[test]
    fn test_normalize_rotation() {
        assert_eq!(normalize_rotation(-90), 270);
        assert_eq!(normalize_rotation(450), 90);
        assert_eq!(normalize_rotation(360), 0);
    }
}
