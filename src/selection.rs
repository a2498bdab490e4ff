//! Drag gesture tracking for the selection rectangle.
//!
//! The tracker owns the one feedback rectangle it draws, so clearing or
//! replacing the overlay never involves searching painted shapes.

use eframe::egui;

use crate::geometry::{CropRect, PixelPoint};

struct DragStart {
    display: egui::Pos2,
    pixel: PixelPoint,
    current: egui::Pos2,
}

/// Two-state gesture tracker: idle, or following an active primary-button drag.
#[derive(Default)]
pub struct DragTracker {
    start: Option<DragStart>,
    feedback: Option<egui::Rect>,
}

impl DragTracker {
    /// Primary button pressed: record the anchor in both coordinate spaces.
    pub fn begin(&mut self, display: egui::Pos2, pixel: PixelPoint) {
        self.start = Some(DragStart {
            display,
            pixel,
            current: display,
        });
    }

    /// Pointer moved with the button held: replace the feedback rectangle.
    pub fn update(&mut self, current: egui::Pos2) {
        if let Some(start) = &mut self.start {
            start.current = current;
            self.feedback = Some(egui::Rect::from_two_pos(start.display, current));
        }
    }

    /// Drag ended at `end_pixel`: return the normalized selection and go idle.
    ///
    /// Returns `None` when no drag was active or the selection is degenerate
    /// (a click with no movement), in which case nothing should change.
    pub fn finish(&mut self, end_pixel: PixelPoint) -> Option<CropRect> {
        let start = self.start.take()?;
        self.feedback = None;
        let rect = CropRect::from_points(start.pixel, end_pixel);
        (!rect.is_empty()).then_some(rect)
    }

    /// Secondary-button affordance: hide the overlay without cancelling the
    /// gesture itself.
    pub fn clear_feedback(&mut self) {
        self.feedback = None;
    }

    /// Discard the gesture and overlay, e.g. when a new image is loaded.
    pub fn reset(&mut self) {
        self.start = None;
        self.feedback = None;
    }

    pub fn is_active(&self) -> bool {
        self.start.is_some()
    }

    pub fn feedback(&self) -> Option<egui::Rect> {
        self.feedback
    }

    /// Last pointer position seen during the drag, if one is active.
    pub fn last_display(&self) -> Option<egui::Pos2> {
        self.start.as_ref().map(|s| s.current)
    }
}
