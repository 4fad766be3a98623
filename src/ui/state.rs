//! Application state management structures.
//!
//! This module contains the view-side state: canvas navigation, pointer interactions,
//! persisted editor settings and the asynchronous image loader. The floor plan itself
//! lives in [`FloorplanState`] and is only changed through actions.

use crate::calibration::{CalibrationSession, MeasureSession};
use crate::constants::{DEFAULT_GRID_SIZE_INDEX, GRID_SIZES_FEET};
use crate::error::FloorplanError;
use crate::geometry::StageView;
use crate::image_load::{DecodedImage, ImageLoad, LoadOrigin};
use crate::placement::{PlacementBounds, PlacementFrame};
use crate::seed;
use crate::state::FloorplanState;
use crate::types::DeviceId;
use eframe::egui;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{channel, Receiver, Sender};

/// Storage key for the persisted editor settings.
pub const SETTINGS_KEY: &str = "editor_settings";

/// User preferences kept between sessions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditorSettings {
    /// Index into the grid size list
    pub grid_size_index: usize,
    /// Whether the grid is drawn
    pub show_grid: bool,
    /// Where clicks may place devices
    pub placement_bounds: PlacementBounds,
    /// Whether dark mode visuals are enabled
    pub dark_mode: bool,
    /// Remembered width of the left panel
    pub left_panel_width: f32,
    /// Remembered width of the right panel
    pub right_panel_width: f32,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            grid_size_index: DEFAULT_GRID_SIZE_INDEX,
            show_grid: true,
            placement_bounds: PlacementBounds::ImageOnly,
            dark_mode: false,
            left_panel_width: 240.0,
            right_panel_width: 280.0,
        }
    }
}

impl EditorSettings {
    /// Grid spacing in feet for the selected grid size.
    pub fn grid_size_feet(&self) -> f32 {
        GRID_SIZES_FEET[self.grid_size_index.min(GRID_SIZES_FEET.len() - 1)]
    }
}

/// Text buffers for the device fields being edited in the right panel.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceEdit {
    /// Device the buffers belong to
    pub id: DeviceId,
    /// Display name being typed
    pub name: String,
    /// Label being typed (full devices only)
    pub label: String,
}

/// State related to canvas navigation and panel layout.
pub struct UiState {
    /// Whether the left panel (palette and device list) is shown
    pub show_left_panel: bool,
    /// Whether the right panel (device details) is shown
    pub show_right_panel: bool,
    /// Stage zoom level in [0.5, 2.5]
    pub zoom: f32,
    /// Stage pan in screen pixels
    pub pan: egui::Vec2,
    /// Whether the window is fullscreen
    pub fullscreen: bool,
    /// Text typed into the device search box
    pub search_query: String,
    /// Screen position of the canvas origin during the last frame
    pub canvas_origin: egui::Pos2,
    /// Size of the canvas during the last frame
    pub canvas_size: egui::Vec2,
    /// Last status or error message shown in the toolbar
    pub status: Option<String>,
    /// Buffers for the device being edited
    pub device_edit: Option<DeviceEdit>,
    /// Selection seen during the previous frame, used to open the right panel
    pub(crate) last_selected: Option<DeviceId>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            show_left_panel: true,
            show_right_panel: false,
            zoom: 1.0,
            pan: egui::Vec2::ZERO,
            fullscreen: false,
            search_query: String::new(),
            canvas_origin: egui::Pos2::ZERO,
            canvas_size: egui::Vec2::ZERO,
            status: None,
            device_edit: None,
            last_selected: None,
        }
    }
}

/// State of the pointer on the canvas.
#[derive(Default)]
pub struct InteractionState {
    /// Screen position where the primary button went down
    pub press_pos: Option<egui::Pos2>,
    /// Device being dragged and the grab offset in image-local pixels
    pub dragging_device: Option<(DeviceId, egui::Vec2)>,
    /// Whether the user is currently panning the canvas
    pub is_panning: bool,
    /// Last mouse position during panning operation
    pub last_pan_pos: Option<egui::Pos2>,
}

/// Progress reported by an async image load.
#[derive(Debug)]
pub enum LoadEvent {
    /// A file was chosen and decoding has begun
    Started(String),
    /// Decoding finished
    Finished(Result<DecodedImage, FloorplanError>),
}

/// Messages sent from async image loads back to the app.
#[derive(Debug)]
pub struct LoadMessage {
    /// Request number; only the latest request is applied
    pub request: u64,
    /// Upload or seeded plan image
    pub origin: LoadOrigin,
    /// What happened
    pub event: LoadEvent,
}

/// State of the asynchronous image loader.
pub struct LoaderState {
    /// Progress of the latest load
    pub load: ImageLoad,
    /// Texture of the loaded floor-plan image
    pub texture: Option<egui::TextureHandle>,
    /// Number of the latest request
    pub request: u64,
    /// Whether the file picker should be opened this frame
    pub pick_requested: bool,
    /// Context used by background tasks to request a repaint
    pub repaint: Option<egui::Context>,
    /// Channel for receiving load results from async contexts
    pub sender: Sender<LoadMessage>,
    pub receiver: Receiver<LoadMessage>,
}

impl Default for LoaderState {
    fn default() -> Self {
        let (sender, receiver) = channel();
        Self {
            load: ImageLoad::Idle,
            texture: None,
            request: 0,
            pick_requested: false,
            repaint: None,
            sender,
            receiver,
        }
    }
}

/// The main application structure containing UI state and the floor plan.
///
/// This struct implements the `eframe::App` trait and handles all user interface
/// rendering and interaction logic.
#[derive(Default)]
pub struct FloorplanApp {
    /// The floor plan being edited
    pub state: FloorplanState,
    /// Canvas navigation and panel state
    pub ui: UiState,
    /// Pointer interaction state
    pub interaction: InteractionState,
    /// Persisted user preferences
    pub settings: EditorSettings,
    /// Two-click calibration in progress
    pub calibration: CalibrationSession,
    /// Measure tool in progress
    pub measure: MeasureSession,
    /// Image loading state
    pub loader: LoaderState,
}

impl FloorplanApp {
    /// Creates the app for an optional seeded plan.
    ///
    /// The plan's image, if any, starts loading immediately; `repaint` is woken when
    /// it is ready.
    pub fn with_floorplan(
        id: Option<&str>,
        settings: EditorSettings,
        repaint: Option<egui::Context>,
    ) -> Self {
        let (state, image) = seed::initial_state(id);
        let mut app = Self {
            state,
            settings,
            ..Default::default()
        };
        app.loader.repaint = repaint;
        if let Some(asset) = image {
            app.load_seed_image(asset);
        }
        app
    }

    /// Creates the app from the eframe creation context, restoring persisted settings.
    pub fn new(cc: &eframe::CreationContext<'_>, id: Option<&str>) -> Self {
        let settings = cc
            .storage
            .and_then(|storage| storage.get_string(SETTINGS_KEY))
            .and_then(|json| match serde_json::from_str(&json) {
                Ok(settings) => Some(settings),
                Err(e) => {
                    log::warn!("ignoring stored editor settings: {e}");
                    None
                }
            })
            .unwrap_or_default();
        Self::with_floorplan(id, settings, Some(cc.egui_ctx.clone()))
    }

    /// Current stage pan and zoom.
    pub fn stage_view(&self) -> StageView {
        StageView {
            pan: self.ui.pan,
            zoom: self.ui.zoom,
        }
    }

    /// Converts a screen position to a stage position (relative to the canvas origin).
    pub fn screen_to_stage(&self, screen_pos: egui::Pos2) -> egui::Pos2 {
        (screen_pos - self.ui.canvas_origin).to_pos2()
    }

    /// Converts a stage position to a screen position.
    pub fn stage_to_screen(&self, stage_pos: egui::Pos2) -> egui::Pos2 {
        self.ui.canvas_origin + stage_pos.to_vec2()
    }

    /// Runs a closure with the frame mapping stage positions to image-local pixels.
    pub fn with_frame<R>(&self, f: impl FnOnce(&PlacementFrame<'_>) -> R) -> R {
        let view = self.stage_view();
        let frame = PlacementFrame {
            view: &view,
            transform: &self.state.transform,
            image_size: self.state.image_size(),
        };
        f(&frame)
    }

    /// Maps a screen position to image-local pixels.
    pub fn screen_to_image(&self, screen_pos: egui::Pos2) -> egui::Pos2 {
        let stage = self.screen_to_stage(screen_pos);
        self.with_frame(|frame| frame.to_image_local(stage))
    }

    /// Maps image-local pixels to a screen position.
    pub fn image_to_screen(&self, local: egui::Pos2) -> egui::Pos2 {
        let stage = self.with_frame(|frame| frame.to_stage(local));
        self.stage_to_screen(stage)
    }
}
