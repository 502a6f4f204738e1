/// A viewport-relative point (origin at the stage's top-left).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// The transient gesture in flight. Exactly one variant is active at a time;
/// a new gesture start discards whatever was in progress. The committed pan
/// base lives on the session rather than in the variants, because wheel zoom
/// restores it even when no gesture is active.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureSession {
    #[default]
    Idle,
    Dragging {
        start: Point,
    },
    Pinching {
        /// Distance between the two contacts at the last committed frame.
        /// Rolled forward on every accepted pinch move.
        initial_distance: f64,
        /// Midpoint of the contacts at pinch start, viewport-relative.
        focal: Point,
    },
}

pub fn touch_distance(a: Point, b: Point) -> f64 {
    ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt()
}

pub fn touch_midpoint(a: Point, b: Point) -> Point {
    Point {
        x: (a.x + b.x) / 2.0,
        y: (a.y + b.y) / 2.0,
    }
}
