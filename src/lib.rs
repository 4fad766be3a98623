//! # Floorplan Editor
//!
//! An interactive floor-plan editor for laying out IoT devices on building plans.
//! A plan starts from an uploaded PNG or JPEG image, which is calibrated to real-world
//! feet with two clicks and a known length. Devices are then placed, moved, edited and
//! bound to real hardware records.
//!
//! ## Features
//! - Image upload by file picker or drag-and-drop, decoded off the UI thread
//! - Two-click calibration with image scale, rotation and scale-ratio tuning
//! - Click-to-place devices from a typed palette or an unassigned pool
//! - Planning, view and edit modes, with edits that can be saved or cancelled
//! - Searchable device list and a details panel for device metadata
//! - Feet-based grid, hub range rings and a measure tool
//! - Seeded demo plans selected by id

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod actions;
pub mod calibration;
pub mod catalog;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod image_load;
pub mod placement;
pub mod seed;
pub mod state;
pub mod types;
mod ui;

// Re-export public types and functions
pub use actions::Action;
pub use error::FloorplanError;
pub use state::FloorplanState;
pub use types::*;
pub use ui::{EditorSettings, FloorplanApp};

/// Runs the floor-plan editor as a native window.
///
/// # Arguments
///
/// * `floorplan_id` - Optional id of a seeded plan to open
///
/// # Returns
///
/// Returns `Ok(())` if the application runs successfully, or an `eframe::Error` if
/// initialization fails.
///
/// # Example
///
/// ```no_run
/// use floorplan_editor::run_app;
///
/// fn main() -> Result<(), eframe::Error> {
///     run_app(None)
/// }
/// ```
#[cfg(not(target_arch = "wasm32"))]
pub fn run_app(floorplan_id: Option<String>) -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };
    log::info!("starting floor-plan editor (plan: {floorplan_id:?})");
    eframe::run_native(
        "Floorplan Editor",
        options,
        Box::new(move |cc| Ok(Box::new(FloorplanApp::new(cc, floorplan_id.as_deref())))),
    )
}

/// Starts the editor in the browser on the canvas with id `floorplan_canvas`.
///
/// The plan id is taken from the URL fragment or the last path segment.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    use wasm_bindgen::JsCast;

    eframe::WebLogger::init(log::LevelFilter::Info).ok();

    wasm_bindgen_futures::spawn_local(async {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("no document to attach the editor to");
            return;
        };
        let Some(canvas) = document
            .get_element_by_id("floorplan_canvas")
            .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok())
        else {
            log::error!("canvas #floorplan_canvas not found");
            return;
        };

        let location = document.location();
        let path = location
            .as_ref()
            .and_then(|l| l.pathname().ok())
            .unwrap_or_default();
        let hash = location
            .as_ref()
            .and_then(|l| l.hash().ok())
            .unwrap_or_default();
        let floorplan_id = seed::floorplan_id_from_url(&path, &hash);

        let result = eframe::WebRunner::new()
            .start(
                canvas,
                eframe::WebOptions::default(),
                Box::new(move |cc| Ok(Box::new(FloorplanApp::new(cc, floorplan_id.as_deref())))),
            )
            .await;
        if let Err(e) = result {
            log::error!("failed to start the editor: {e:?}");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_default() {
        let state = FloorplanState::default();
        assert!(state.devices.is_empty());
        assert!(state.image.is_none());
        assert_eq!(state.mode, Mode::Planning);
        assert_eq!(state.scale_ratio, None);
    }
}
