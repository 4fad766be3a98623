//! Error type shared by the editor's fallible operations.

use crate::types::DeviceId;

/// Errors raised while loading floor plans or editing their devices.
///
/// None of these are fatal: the UI reports them and the user retries.
#[derive(Debug, thiserror::Error)]
pub enum FloorplanError {
    /// The selected file does not have a supported image extension.
    #[error("unsupported image format: {0} (expected PNG, JPG or JPEG)")]
    UnsupportedFormat(String),
    /// The selected file contained no bytes.
    #[error("image file {0} is empty")]
    EmptyImage(String),
    /// Reading the image from disk or the browser failed.
    #[error("failed to read {name}: {reason}")]
    Read {
        /// Display name of the file being read
        name: String,
        /// Underlying failure description
        reason: String,
    },
    /// The image bytes could not be decoded.
    #[error("failed to decode {name}")]
    Decode {
        /// Display name of the image
        name: String,
        /// Decoder error
        #[source]
        source: image::ImageError,
    },
    /// No seeded floor plan exists with the given identifier.
    #[error("no floor plan with id {0:?}")]
    UnknownFloorplan(String),
    /// An entered calibration length was not a positive number.
    #[error("invalid calibration length {0:?}")]
    InvalidLength(String),
    /// An action referenced a device that is not on the plan.
    #[error("device {0} not found")]
    DeviceNotFound(DeviceId),
    /// An action referenced an unassigned device uuid that is not in the pool.
    #[error("unassigned device {0} not found")]
    UnassignedNotFound(String),
    /// The action is not allowed in the current mode.
    #[error("{0} is not allowed in view mode")]
    ReadOnly(&'static str),
}
