//! Two-click calibration and measuring sessions.
//!
//! A session collects two image-local points. Calibration then waits for the user to
//! enter the real-world length between them and turns the answer into a scale ratio;
//! measuring just reports the distance in feet using the current ratio.

use crate::error::FloorplanError;
use crate::geometry::{compute_scale_ratio, image_pixels_to_feet, pixel_distance};
use eframe::egui;

/// Progress of a two-click session.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TwoPointStep {
    /// No point picked yet
    #[default]
    Idle,
    /// First point picked
    FirstPoint(egui::Pos2),
    /// Both points picked
    BothPoints {
        /// First picked point (image-local)
        a: egui::Pos2,
        /// Second picked point (image-local)
        b: egui::Pos2,
        /// Distance between them in image pixels
        pixel_distance: f32,
    },
}

/// Result of feeding a click into a calibration session.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationClick {
    /// The first point was recorded
    FirstPoint,
    /// Both points are recorded; the user must now enter a length
    AwaitingLength {
        /// Distance between the points in image pixels
        pixel_distance: f32,
    },
    /// The click was ignored because a length prompt is open
    Ignored,
}

/// The two-click-plus-prompt calibration protocol.
#[derive(Debug, Clone, Default)]
pub struct CalibrationSession {
    step: TwoPointStep,
    /// Text typed into the length prompt
    pub length_input: String,
}

impl CalibrationSession {
    /// Creates an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current step of the session.
    pub fn step(&self) -> &TwoPointStep {
        &self.step
    }

    /// Points picked so far, in image-local pixels.
    pub fn points(&self) -> Vec<egui::Pos2> {
        match self.step {
            TwoPointStep::Idle => Vec::new(),
            TwoPointStep::FirstPoint(a) => vec![a],
            TwoPointStep::BothPoints { a, b, .. } => vec![a, b],
        }
    }

    /// Returns true while the length prompt should be shown.
    pub fn awaiting_length(&self) -> bool {
        matches!(self.step, TwoPointStep::BothPoints { .. })
    }

    /// Records a click at an image-local point.
    pub fn click(&mut self, point: egui::Pos2) -> CalibrationClick {
        match self.step {
            TwoPointStep::Idle => {
                self.step = TwoPointStep::FirstPoint(point);
                CalibrationClick::FirstPoint
            }
            TwoPointStep::FirstPoint(a) => {
                let distance = pixel_distance(a, point);
                self.step = TwoPointStep::BothPoints {
                    a,
                    b: point,
                    pixel_distance: distance,
                };
                self.length_input.clear();
                CalibrationClick::AwaitingLength {
                    pixel_distance: distance,
                }
            }
            TwoPointStep::BothPoints { .. } => CalibrationClick::Ignored,
        }
    }

    /// Submits the entered length in feet and returns the resulting scale ratio.
    ///
    /// The pending points are cleared whatever the outcome. Anything other than a
    /// positive number (or a zero pixel distance) yields an error and no ratio.
    pub fn submit_length(&mut self, input: &str) -> Result<f32, FloorplanError> {
        let step = std::mem::take(&mut self.step);
        self.length_input.clear();
        let TwoPointStep::BothPoints { pixel_distance, .. } = step else {
            return Err(FloorplanError::InvalidLength(input.to_string()));
        };
        let feet: f32 = input
            .trim()
            .parse()
            .map_err(|_| FloorplanError::InvalidLength(input.to_string()))?;
        compute_scale_ratio(pixel_distance, feet)
            .ok_or_else(|| FloorplanError::InvalidLength(input.to_string()))
    }

    /// Aborts the session and clears any pending points.
    pub fn cancel(&mut self) {
        self.step = TwoPointStep::Idle;
        self.length_input.clear();
    }
}

/// The measure tool: two clicks, distance reported in feet.
#[derive(Debug, Clone, Default)]
pub struct MeasureSession {
    step: TwoPointStep,
}

impl MeasureSession {
    /// Current step of the session.
    pub fn step(&self) -> &TwoPointStep {
        &self.step
    }

    /// Records a click. A third click starts a new measurement from that point.
    pub fn click(&mut self, point: egui::Pos2) {
        self.step = match self.step {
            TwoPointStep::FirstPoint(a) => TwoPointStep::BothPoints {
                a,
                b: point,
                pixel_distance: pixel_distance(a, point),
            },
            TwoPointStep::Idle | TwoPointStep::BothPoints { .. } => TwoPointStep::FirstPoint(point),
        };
    }

    /// Distance of the completed measurement in feet, if both points exist and a
    /// scale ratio is known.
    pub fn distance_feet(&self, scale_ratio: Option<f32>) -> Option<f32> {
        match (&self.step, scale_ratio) {
            (TwoPointStep::BothPoints { pixel_distance, .. }, Some(ratio)) => {
                Some(image_pixels_to_feet(*pixel_distance, ratio))
            }
            _ => None,
        }
    }

    /// Clears the measurement.
    pub fn clear(&mut self) {
        self.step = TwoPointStep::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_clicks_then_length_produce_ratio() {
        let mut session = CalibrationSession::new();
        assert_eq!(session.click(egui::pos2(100.0, 100.0)), CalibrationClick::FirstPoint);
        assert_eq!(
            session.click(egui::pos2(400.0, 100.0)),
            CalibrationClick::AwaitingLength {
                pixel_distance: 300.0
            }
        );
        assert!(session.awaiting_length());

        let ratio = session.submit_length("25").unwrap();
        assert!((ratio - 25.0 / 300.0).abs() < 1e-6);
        assert!(session.points().is_empty());
    }

    #[test]
    fn test_invalid_lengths_are_rejected_and_clear_points() {
        for input in ["", "abc", "0", "-4", "NaN", "inf"] {
            let mut session = CalibrationSession::new();
            session.click(egui::pos2(0.0, 0.0));
            session.click(egui::pos2(10.0, 0.0));
            assert!(session.submit_length(input).is_err(), "input {input:?}");
            assert_eq!(session.step(), &TwoPointStep::Idle);
        }
    }

    #[test]
    fn test_same_point_twice_cannot_calibrate() {
        let mut session = CalibrationSession::new();
        session.click(egui::pos2(5.0, 5.0));
        session.click(egui::pos2(5.0, 5.0));
        assert!(session.submit_length("10").is_err());
    }

    #[test]
    fn test_clicks_ignored_while_prompt_open() {
        let mut session = CalibrationSession::new();
        session.click(egui::pos2(0.0, 0.0));
        session.click(egui::pos2(3.0, 4.0));
        assert_eq!(session.click(egui::pos2(9.0, 9.0)), CalibrationClick::Ignored);
        assert_eq!(session.points().len(), 2);
    }

    #[test]
    fn test_cancel_clears_pending_points() {
        let mut session = CalibrationSession::new();
        session.click(egui::pos2(1.0, 1.0));
        session.cancel();
        assert!(session.points().is_empty());
        assert_eq!(session.click(egui::pos2(2.0, 2.0)), CalibrationClick::FirstPoint);
    }

    #[test]
    fn test_repeated_calibration_is_idempotent() {
        let run = || {
            let mut session = CalibrationSession::new();
            session.click(egui::pos2(100.0, 100.0));
            session.click(egui::pos2(400.0, 100.0));
            session.submit_length("25").unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_measure_reports_feet() {
        let mut measure = MeasureSession::default();
        measure.click(egui::pos2(0.0, 0.0));
        assert_eq!(measure.distance_feet(Some(0.5)), None);
        measure.click(egui::pos2(0.0, 40.0));
        assert_eq!(measure.distance_feet(Some(0.5)), Some(20.0));
        assert_eq!(measure.distance_feet(None), None);

        measure.click(egui::pos2(7.0, 7.0));
        assert_eq!(measure.step(), &TwoPointStep::FirstPoint(egui::pos2(7.0, 7.0)));
    }
}
