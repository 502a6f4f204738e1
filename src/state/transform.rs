use crate::state::gesture::Point;

/// Committed zoom + pan of the stage, applied with transform-origin at the
/// visual center. Zoom always stays inside the configured clamp range, and a
/// transform sitting at minimum zoom always has a centered pan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    pub zoom: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl ViewportTransform {
    pub fn new(min_zoom: f64) -> Self {
        Self {
            zoom: min_zoom,
            translate_x: 0.0,
            translate_y: 0.0,
        }
    }

    /// Additive zoom step (wheel input). Landing at or below the minimum
    /// recenters the pan; panning is meaningless at rest zoom.
    pub fn apply_zoom_delta(&mut self, delta: f64, min_zoom: f64, max_zoom: f64) {
        let new_zoom = (self.zoom + delta).clamp(min_zoom, max_zoom);
        if new_zoom <= min_zoom {
            self.translate_x = 0.0;
            self.translate_y = 0.0;
        }
        self.zoom = new_zoom;
    }

    /// Multiplicative zoom commit with focal-point compensation: the pan is
    /// shifted so the content under the fingers stays put. The compensation
    /// term is proportional to the zoom delta (not the zoom ratio).
    pub fn apply_pinch(&mut self, new_zoom: f64, focal: Point, center: Point, base: Point) {
        let dz = new_zoom - self.zoom;
        self.translate_x = base.x - (focal.x - center.x) * dz;
        self.translate_y = base.y - (focal.y - center.y) * dz;
        self.zoom = new_zoom;
    }

    pub fn reset(&mut self, min_zoom: f64) {
        self.zoom = min_zoom;
        self.translate_x = 0.0;
        self.translate_y = 0.0;
    }
}
