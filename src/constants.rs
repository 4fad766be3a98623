//! Shared application-wide constants.
//! Centralizes tweakable values used across state transitions, rendering and interactions.

// Image transform
/// Smallest allowed image scale factor.
pub const MIN_IMAGE_SCALE: f32 = 0.1;
/// Largest allowed image scale factor.
pub const MAX_IMAGE_SCALE: f32 = 3.0;
/// Step applied by the calibration panel's image size buttons.
pub const IMAGE_SCALE_STEP: f32 = 0.1;
/// Rotation step in degrees for the rotate buttons.
pub const ROTATION_STEP_DEGREES: i32 = 90;

// View zoom
/// Smallest allowed stage zoom level.
pub const MIN_ZOOM: f32 = 0.5;
/// Largest allowed stage zoom level.
pub const MAX_ZOOM: f32 = 2.5;
/// Step applied by the zoom buttons in the view controls.
pub const ZOOM_BUTTON_STEP: f32 = 0.2;
/// Step applied per scroll wheel notch.
pub const ZOOM_SCROLL_STEP: f32 = 0.025;

// Scale ratio
/// Fractional nudge applied by the scale ratio buttons in the calibration panel.
pub const SCALE_RATIO_NUDGE: f32 = 0.1;
/// Ratio (feet per pixel) assumed by the nudge buttons when nothing has been calibrated yet.
pub const FALLBACK_SCALE_RATIO: f32 = 0.02;

// Grid
/// Selectable real-world grid spacings in feet, smallest first.
pub const GRID_SIZES_FEET: [f32; 5] = [0.5, 1.0, 2.0, 5.0, 10.0];
/// Default index into [`GRID_SIZES_FEET`].
pub const DEFAULT_GRID_SIZE_INDEX: usize = 1;
/// Grid spacing (image pixels) used before a scale ratio exists.
pub const UNCALIBRATED_GRID_SPACING: f32 = 50.0;
/// Grid lines closer than this on screen are skipped.
pub const MIN_SCREEN_GRID_SPACING: f32 = 4.0;

// Devices
/// Radius of a device marker in screen pixels at zoom 1.
pub const DEVICE_RADIUS: f32 = 12.0;
/// Radius of the selection ring around a selected device.
pub const SELECTION_RING_RADIUS: f32 = 18.0;
/// Extra slack (screen pixels) added to the marker radius when hit-testing.
pub const DEVICE_HIT_SLOP: f32 = 2.0;

// Calibration overlay
/// Radius of the calibration point markers.
pub const CALIBRATION_POINT_RADIUS: f32 = 5.0;

// Canvas interactions
/// Pointer travel (screen pixels) below which a press-release is still a click.
pub const CLICK_THRESHOLD: f32 = 4.0;
