//! The session-scoped state container: one `ViewerSession` owns the
//! transform, the gesture in flight, the reveal memory, the object rotation,
//! and the transition state machine, and every input handler funnels through
//! it. Handlers run to completion on the single-threaded event loop, so each
//! call is atomic as far as the render side can observe.

use thiserror::Error;

use crate::config::ViewerConfig;
use crate::state::gesture::{GestureSession, Point, touch_distance, touch_midpoint};
use crate::state::reveal::{self, LayerVisibility, RevealState};
use crate::state::rotation::ObjectRotation;
use crate::state::transform::ViewportTransform;
use crate::state::transition::{TimerKind, TimerPort, TransitionState};

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("at least one visual object is required")]
    NoObjects,
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

/// Everything the render side needs after one handler turn.
pub struct ViewSnapshot<'a> {
    pub transform: ViewportTransform,
    pub active_index: usize,
    /// Per-object layer stacks, indexed like the object rotation.
    pub layers: &'a [LayerVisibility],
    pub glitch_active: bool,
}

#[derive(Debug)]
pub struct ViewerSession {
    cfg: ViewerConfig,
    transform: ViewportTransform,
    /// Last committed pan; wheel zoom restores it, gestures roll it forward.
    base_translate: Point,
    gesture: GestureSession,
    rotation: ObjectRotation,
    reveal: RevealState,
    layers: Vec<LayerVisibility>,
    transition: TransitionState,
}

impl ViewerSession {
    pub fn new(cfg: ViewerConfig, object_count: usize) -> Result<Self, SessionError> {
        cfg.validate()?;
        if object_count == 0 {
            return Err(SessionError::NoObjects);
        }
        let mut layers = vec![LayerVisibility::hidden(); object_count];
        layers[0] = LayerVisibility::clean_only();
        Ok(Self {
            transform: ViewportTransform::new(cfg.min_zoom),
            base_translate: Point::default(),
            gesture: GestureSession::Idle,
            rotation: ObjectRotation::new(object_count),
            reveal: RevealState::default(),
            layers,
            transition: TransitionState::Idle,
            cfg,
        })
    }

    pub fn snapshot(&self) -> ViewSnapshot<'_> {
        ViewSnapshot {
            transform: self.transform,
            active_index: self.rotation.active(),
            layers: &self.layers,
            glitch_active: self.glitch_active(),
        }
    }

    pub fn transform(&self) -> ViewportTransform {
        self.transform
    }

    pub fn active_index(&self) -> usize {
        self.rotation.active()
    }

    pub fn glitch_active(&self) -> bool {
        self.transition.is_glitch_playing()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, GestureSession::Dragging { .. })
    }

    pub fn gesture_active(&self) -> bool {
        !matches!(self.gesture, GestureSession::Idle)
    }

    // --- wheel ---

    /// Wheel zoom: pan is held at the last committed base (the wheel never
    /// moves the pivot), then the delta goes through the zoom pipeline.
    pub fn on_wheel(&mut self, delta_y: f64, timers: &mut dyn TimerPort) {
        self.transform.translate_x = self.base_translate.x;
        self.transform.translate_y = self.base_translate.y;
        let delta = -delta_y * self.cfg.wheel_zoom_scale;
        self.zoom_by(delta, timers);
    }

    fn zoom_by(&mut self, delta: f64, timers: &mut dyn TimerPort) {
        match self.transition {
            TransitionState::HoldPending { handle } => {
                // A zoom change before the dwell elapses just cancels the hold.
                timers.cancel(handle);
                self.transition = TransitionState::Idle;
            }
            TransitionState::GlitchPlaying { handle } => {
                // Input mid-glitch fast-forwards the transition and consumes
                // the event; the zoom itself is not applied.
                timers.cancel(handle);
                self.fast_forward();
                return;
            }
            TransitionState::Idle => {}
        }

        self.transform
            .apply_zoom_delta(delta, self.cfg.min_zoom, self.cfg.max_zoom);
        if self.transform.zoom <= self.cfg.min_zoom {
            self.base_translate = Point::default();
        }
        self.update_reveal();

        if self.transform.zoom <= self.cfg.min_zoom && delta < 0.0 {
            self.begin_hold(timers);
        }
    }

    // --- pointer (mouse) ---

    pub fn on_pointer_down(&mut self, point: Point, primary: bool, timers: &mut dyn TimerPort) {
        if !primary || matches!(self.gesture, GestureSession::Pinching { .. }) {
            return;
        }
        self.interrupt_transition(timers);
        if self.transform.zoom > self.cfg.pan_min_zoom {
            self.commit_base();
            self.gesture = GestureSession::Dragging { start: point };
        }
    }

    pub fn on_pointer_move(&mut self, point: Point) {
        if let GestureSession::Dragging { start } = self.gesture {
            if self.transform.zoom > self.cfg.pan_min_zoom {
                self.transform.translate_x = self.base_translate.x + (point.x - start.x);
                self.transform.translate_y = self.base_translate.y + (point.y - start.y);
            }
        }
    }

    pub fn on_pointer_up(&mut self, timers: &mut dyn TimerPort) {
        if !self.is_dragging() {
            return;
        }
        self.commit_base();
        self.gesture = GestureSession::Idle;
        self.maybe_begin_hold(timers);
    }

    // --- touch ---

    pub fn on_touch_start(&mut self, points: &[Point], timers: &mut dyn TimerPort) {
        self.interrupt_transition(timers);
        self.gesture = GestureSession::Idle;
        match *points {
            [a, b] => {
                self.commit_base();
                self.gesture = GestureSession::Pinching {
                    initial_distance: touch_distance(a, b),
                    focal: touch_midpoint(a, b),
                };
            }
            [p] if self.transform.zoom > self.cfg.pan_min_zoom => {
                self.commit_base();
                self.gesture = GestureSession::Dragging { start: p };
            }
            _ => {}
        }
    }

    pub fn on_touch_move(
        &mut self,
        points: &[Point],
        viewport_center: Point,
        timers: &mut dyn TimerPort,
    ) {
        if self.glitch_active() {
            return;
        }
        match self.gesture {
            GestureSession::Pinching {
                initial_distance,
                focal,
            } if points.len() == 2 => {
                // Contacts registering simultaneously can produce a zero
                // starting distance; skip the frame instead of dividing.
                if initial_distance == 0.0 {
                    return;
                }
                let new_distance = touch_distance(points[0], points[1]);
                let scale = new_distance / initial_distance;
                let old_zoom = self.transform.zoom;
                let new_zoom = (old_zoom * scale).clamp(self.cfg.min_zoom, self.cfg.max_zoom);
                if new_zoom == old_zoom {
                    return;
                }

                self.transform
                    .apply_pinch(new_zoom, focal, viewport_center, self.base_translate);
                if self.transform.zoom <= self.cfg.min_zoom {
                    self.transform.translate_x = 0.0;
                    self.transform.translate_y = 0.0;
                }
                self.update_reveal();

                if self.transform.zoom <= self.cfg.min_zoom {
                    self.begin_hold(timers);
                } else {
                    self.cancel_hold(timers);
                }

                // Continuous re-basing: the next frame scales from here, not
                // from the gesture start.
                self.commit_base();
                if let GestureSession::Pinching {
                    initial_distance, ..
                } = &mut self.gesture
                {
                    *initial_distance = new_distance;
                }
            }
            GestureSession::Dragging { start } if points.len() == 1 => {
                self.transform.translate_x = self.base_translate.x + (points[0].x - start.x);
                self.transform.translate_y = self.base_translate.y + (points[0].y - start.y);
            }
            _ => {}
        }
    }

    pub fn on_touch_end(&mut self, timers: &mut dyn TimerPort) {
        if self.gesture_active() {
            self.commit_base();
            self.gesture = GestureSession::Idle;
        }
        self.maybe_begin_hold(timers);
    }

    // --- timer callbacks ---

    pub fn on_hold_elapsed(&mut self, timers: &mut dyn TimerPort) {
        if !self.transition.is_hold_pending() {
            return;
        }
        let handle = timers.schedule(self.cfg.glitch_duration_ms, TimerKind::Glitch);
        self.transition = TransitionState::GlitchPlaying { handle };
    }

    pub fn on_glitch_elapsed(&mut self, _timers: &mut dyn TimerPort) {
        if !self.transition.is_glitch_playing() {
            return;
        }
        self.fast_forward();
    }

    // --- internals ---

    fn commit_base(&mut self) {
        self.base_translate = Point {
            x: self.transform.translate_x,
            y: self.transform.translate_y,
        };
    }

    fn update_reveal(&mut self) {
        // Frozen while a hold or glitch is in flight: the terminal corrosion
        // cue must not be overridden by threshold recomputation.
        if !self.transition.is_idle() {
            return;
        }
        let active = self.rotation.active();
        reveal::update(
            self.transform.zoom,
            &self.cfg.corrosion_thresholds,
            &mut self.reveal,
            &mut self.layers[active],
        );
    }

    /// Start the dwell countdown at minimum zoom, force-displaying the
    /// deepest corrosion layer as the terminal cue. No-op unless idle.
    fn begin_hold(&mut self, timers: &mut dyn TimerPort) {
        if !self.transition.is_idle() {
            return;
        }
        self.layers[self.rotation.active()] = LayerVisibility::deepest_only();
        let handle = timers.schedule(self.cfg.hold_delay_ms, TimerKind::Hold);
        self.transition = TransitionState::HoldPending { handle };
    }

    fn maybe_begin_hold(&mut self, timers: &mut dyn TimerPort) {
        if self.transform.zoom <= self.cfg.min_zoom {
            self.begin_hold(timers);
        }
    }

    fn cancel_hold(&mut self, timers: &mut dyn TimerPort) {
        if let TransitionState::HoldPending { handle } = self.transition {
            timers.cancel(handle);
            self.transition = TransitionState::Idle;
        }
    }

    /// Gesture starts arriving mid-transition don't queue behind it: the
    /// pending timer is cancelled and the terminal action runs immediately,
    /// after which the new gesture proceeds from the reset transform.
    fn interrupt_transition(&mut self, timers: &mut dyn TimerPort) {
        if let Some(handle) = self.transition.pending_handle() {
            timers.cancel(handle);
            self.fast_forward();
        }
    }

    /// The terminal action shared by natural glitch completion and every
    /// interrupt path: reset the transform, advance the rotation, clear the
    /// reveal memory, show the incoming object clean.
    fn fast_forward(&mut self) {
        self.transition = TransitionState::Idle;
        self.transform.reset(self.cfg.min_zoom);
        self.base_translate = Point::default();
        let outgoing = self.rotation.active();
        self.layers[outgoing] = LayerVisibility::hidden();
        let incoming = self.rotation.advance();
        self.reveal.reset_for_new_object();
        self.layers[incoming] = LayerVisibility::clean_only();
    }

    #[cfg(test)]
    fn corrosion_memory(&self) -> usize {
        self.reveal.max_corrosion_level
    }

    #[cfg(test)]
    fn active_layers(&self) -> LayerVisibility {
        self.layers[self.rotation.active()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::transition::TimerHandle;

    /// Recording fake for the timer port; `fire` drives the single pending
    /// callback like a deterministic clock.
    struct FakeTimers {
        next: TimerHandle,
        pending: Vec<(TimerHandle, u32, TimerKind)>,
        cancelled: Vec<TimerHandle>,
    }

    impl FakeTimers {
        fn new() -> Self {
            Self {
                next: 1,
                pending: Vec::new(),
                cancelled: Vec::new(),
            }
        }

        fn pending_kind(&self) -> Option<(u32, TimerKind)> {
            assert!(self.pending.len() <= 1, "more than one timer outstanding");
            self.pending.last().map(|&(_, delay, kind)| (delay, kind))
        }

        fn fire(&mut self, session: &mut ViewerSession) {
            let (_, _, kind) = self.pending.pop().expect("no timer to fire");
            match kind {
                TimerKind::Hold => session.on_hold_elapsed(self),
                TimerKind::Glitch => session.on_glitch_elapsed(self),
            }
        }
    }

    impl TimerPort for FakeTimers {
        fn schedule(&mut self, delay_ms: u32, kind: TimerKind) -> TimerHandle {
            let handle = self.next;
            self.next += 1;
            self.pending.push((handle, delay_ms, kind));
            handle
        }

        fn cancel(&mut self, handle: TimerHandle) {
            self.pending.retain(|&(h, _, _)| h != handle);
            self.cancelled.push(handle);
        }
    }

    fn session() -> (ViewerSession, FakeTimers) {
        let s = ViewerSession::new(ViewerConfig::default(), 4).unwrap();
        (s, FakeTimers::new())
    }

    fn pt(x: f64, y: f64) -> Point {
        Point { x, y }
    }

    const CENTER: Point = Point { x: 400.0, y: 300.0 };

    fn assert_near(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    /// Wheel by the delta-y that produces the given zoom delta.
    fn wheel(s: &mut ViewerSession, t: &mut FakeTimers, zoom_delta: f64) {
        s.on_wheel(-zoom_delta / 0.005, t);
    }

    #[test]
    fn rejects_empty_object_list() {
        assert_eq!(
            ViewerSession::new(ViewerConfig::default(), 0).unwrap_err(),
            SessionError::NoObjects
        );
    }

    #[test]
    fn starts_clean_at_min_zoom_without_hold() {
        let (s, t) = session();
        assert_eq!(s.transform().zoom, 0.8);
        assert_eq!(s.active_index(), 0);
        assert_eq!(s.active_layers(), LayerVisibility::clean_only());
        assert_eq!(t.pending_kind(), None);
    }

    #[test]
    fn zoom_in_reveals_first_corrosion_layer() {
        let (mut s, mut t) = session();
        wheel(&mut s, &mut t, 0.4);
        assert_near(s.transform().zoom, 1.2);
        assert_eq!(s.corrosion_memory(), 1);
        let layers = s.active_layers();
        assert_eq!(layers.corrosion, [true, false, false]);
        assert!(!layers.clean);
    }

    #[test]
    fn zoom_out_suppresses_but_remembers() {
        let (mut s, mut t) = session();
        wheel(&mut s, &mut t, 0.4);
        wheel(&mut s, &mut t, -0.3);
        assert_near(s.transform().zoom, 0.9);
        // Below the lowest threshold the clean layer shows again...
        let layers = s.active_layers();
        assert!(layers.clean);
        assert_eq!(layers.corrosion, [false, false, false]);
        // ...but the memory survives and re-applies on re-crossing.
        assert_eq!(s.corrosion_memory(), 1);
        wheel(&mut s, &mut t, 0.3);
        assert_eq!(s.active_layers().corrosion, [true, false, false]);
    }

    #[test]
    fn deep_memory_reapplies_in_full_at_shallow_zoom() {
        let (mut s, mut t) = session();
        wheel(&mut s, &mut t, 3.0); // 3.8: all three thresholds crossed
        assert_eq!(s.corrosion_memory(), 3);
        wheel(&mut s, &mut t, -2.6); // back to 1.2
        let layers = s.active_layers();
        assert_eq!(layers.corrosion, [true, true, true]);
        assert!(!layers.clean);
    }

    #[test]
    fn zoom_stays_clamped_after_any_sequence() {
        let (mut s, mut t) = session();
        wheel(&mut s, &mut t, 50.0);
        assert_eq!(s.transform().zoom, 10.0);
        wheel(&mut s, &mut t, 0.5);
        assert_eq!(s.transform().zoom, 10.0);
        wheel(&mut s, &mut t, -50.0);
        assert_eq!(s.transform().zoom, 0.8);
    }

    #[test]
    fn min_zoom_always_means_centered_pan() {
        let (mut s, mut t) = session();
        wheel(&mut s, &mut t, 2.0);
        s.on_pointer_down(pt(10.0, 10.0), true, &mut t);
        s.on_pointer_move(pt(60.0, 40.0));
        s.on_pointer_up(&mut t);
        assert_eq!(s.transform().translate_x, 50.0);
        wheel(&mut s, &mut t, -5.0);
        assert_eq!(s.transform().zoom, 0.8);
        assert_eq!(s.transform().translate_x, 0.0);
        assert_eq!(s.transform().translate_y, 0.0);
    }

    #[test]
    fn hold_then_glitch_cycles_to_next_object() {
        let (mut s, mut t) = session();
        // Outward wheel at the floor arms the dwell and forces the cue.
        wheel(&mut s, &mut t, -0.1);
        assert_eq!(t.pending_kind(), Some((2000, TimerKind::Hold)));
        assert_eq!(s.active_layers(), LayerVisibility::deepest_only());
        assert!(!s.glitch_active());

        t.fire(&mut s);
        assert!(s.glitch_active());
        assert_eq!(t.pending_kind(), Some((500, TimerKind::Glitch)));

        t.fire(&mut s);
        assert!(!s.glitch_active());
        assert_eq!(s.active_index(), 1);
        assert_eq!(s.transform().zoom, 0.8);
        assert_eq!(s.transform().translate_x, 0.0);
        assert_eq!(s.corrosion_memory(), 0);
        let snap = s.snapshot();
        assert_eq!(snap.layers[0], LayerVisibility::hidden());
        assert_eq!(snap.layers[1], LayerVisibility::clean_only());
        assert_eq!(t.pending_kind(), None);
    }

    #[test]
    fn reveal_is_frozen_while_hold_pending() {
        let (mut s, mut t) = session();
        // Pinch out to the floor: hold armed mid-gesture, cue forced.
        wheel(&mut s, &mut t, 0.4);
        s.on_touch_start(&[pt(300.0, 300.0), pt(500.0, 300.0)], &mut t);
        s.on_touch_move(&[pt(360.0, 300.0), pt(440.0, 300.0)], CENTER, &mut t);
        assert_eq!(s.transform().zoom, 0.8);
        assert!(t.pending_kind().is_some());
        assert_eq!(s.active_layers(), LayerVisibility::deepest_only());

        // Pinching back in: this frame's reveal is still frozen (the cancel
        // lands after the recomputation), the next one recomputes normally.
        s.on_touch_move(&[pt(250.0, 300.0), pt(550.0, 300.0)], CENTER, &mut t);
        assert!(s.transform().zoom > 0.8);
        assert_eq!(t.pending_kind(), None);
        assert_eq!(s.active_layers(), LayerVisibility::deepest_only());
        s.on_touch_move(&[pt(200.0, 300.0), pt(600.0, 300.0)], CENTER, &mut t);
        assert_ne!(s.active_layers(), LayerVisibility::deepest_only());
    }

    #[test]
    fn wheel_zoom_cancels_pending_hold() {
        let (mut s, mut t) = session();
        wheel(&mut s, &mut t, -0.1);
        assert!(t.pending_kind().is_some());
        wheel(&mut s, &mut t, 0.4);
        assert_eq!(t.pending_kind(), None);
        assert!(!s.glitch_active());
        assert_eq!(s.active_index(), 0);
        assert_near(s.transform().zoom, 1.2);
    }

    #[test]
    fn touch_start_fast_forwards_pending_hold() {
        let (mut s, mut t) = session();
        wheel(&mut s, &mut t, -0.1);
        assert!(t.pending_kind().is_some());

        // New contacts mid-hold: timer cancelled, terminal action runs, and
        // the pinch proceeds from the reset transform.
        s.on_touch_start(&[pt(350.0, 300.0), pt(450.0, 300.0)], &mut t);
        assert_eq!(t.pending_kind(), None);
        assert!(!s.glitch_active());
        assert_eq!(s.active_index(), 1);
        assert_eq!(s.transform().zoom, 0.8);
        assert!(matches!(
            s.snapshot(),
            ViewSnapshot { active_index: 1, .. }
        ));
        assert!(s.gesture_active());
    }

    #[test]
    fn wheel_during_glitch_fast_forwards_and_consumes() {
        let (mut s, mut t) = session();
        wheel(&mut s, &mut t, -0.1);
        t.fire(&mut s);
        assert!(s.glitch_active());

        wheel(&mut s, &mut t, 0.4);
        assert!(!s.glitch_active());
        assert_eq!(t.pending_kind(), None);
        assert_eq!(s.active_index(), 1);
        // The zoom itself was consumed, not applied.
        assert_eq!(s.transform().zoom, 0.8);
        assert_eq!(s.active_layers(), LayerVisibility::clean_only());
    }

    #[test]
    fn pointer_down_fast_forwards_playing_glitch() {
        let (mut s, mut t) = session();
        wheel(&mut s, &mut t, -0.1);
        t.fire(&mut s);
        s.on_pointer_down(pt(100.0, 100.0), true, &mut t);
        assert!(!s.glitch_active());
        assert_eq!(s.active_index(), 1);
        // At the reset zoom dragging stays gated off.
        assert!(!s.is_dragging());
    }

    #[test]
    fn glitch_completion_is_idempotent() {
        let (mut s, mut t) = session();
        wheel(&mut s, &mut t, -0.1);
        t.fire(&mut s);
        t.fire(&mut s);
        assert_eq!(s.active_index(), 1);
        // A duplicate fire must not double-advance.
        s.on_glitch_elapsed(&mut t);
        assert_eq!(s.active_index(), 1);
        assert_eq!(s.transform().zoom, 0.8);
    }

    #[test]
    fn hold_cancel_is_a_no_op_when_idle() {
        let (mut s, mut t) = session();
        s.cancel_hold(&mut t);
        assert!(s.transition.is_idle());
        assert!(t.cancelled.is_empty());
        assert_eq!(s.active_layers(), LayerVisibility::clean_only());
    }

    #[test]
    fn stale_hold_fire_after_cancel_is_ignored() {
        let (mut s, mut t) = session();
        wheel(&mut s, &mut t, -0.1);
        wheel(&mut s, &mut t, 0.4);
        // Simulate a duplicate delivery of the already-cancelled callback.
        s.on_hold_elapsed(&mut t);
        assert!(!s.glitch_active());
        assert_eq!(t.pending_kind(), None);
    }

    #[test]
    fn pinch_about_viewport_center_keeps_pan_fixed() {
        let (mut s, mut t) = session();
        s.on_touch_start(&[pt(350.0, 300.0), pt(450.0, 300.0)], &mut t);
        s.on_touch_move(&[pt(325.0, 300.0), pt(475.0, 300.0)], CENTER, &mut t);
        // distance 100 -> 150: scale 1.5
        assert_near(s.transform().zoom, 1.2);
        assert_near(s.transform().translate_x, 0.0);
        assert_near(s.transform().translate_y, 0.0);
    }

    #[test]
    fn pinch_compensation_matches_formula() {
        let (mut s, mut t) = session();
        s.on_touch_start(&[pt(100.0, 100.0), pt(200.0, 100.0)], &mut t);
        s.on_touch_move(&[pt(75.0, 100.0), pt(225.0, 100.0)], CENTER, &mut t);
        let dz = s.transform().zoom - 0.8;
        assert_near(s.transform().zoom, 1.2);
        // focal (150,100), offset from center (-250,-200)
        assert_near(s.transform().translate_x, 250.0 * dz);
        assert_near(s.transform().translate_y, 200.0 * dz);
    }

    #[test]
    fn pinch_rebases_between_frames() {
        let (mut s, mut t) = session();
        s.on_touch_start(&[pt(350.0, 300.0), pt(450.0, 300.0)], &mut t);
        s.on_touch_move(&[pt(325.0, 300.0), pt(475.0, 300.0)], CENTER, &mut t);
        let zoom_after_first = s.transform().zoom;
        // Same contact spread again: the rolled-forward distance makes the
        // second frame a no-op instead of re-applying scale 1.5.
        s.on_touch_move(&[pt(325.0, 300.0), pt(475.0, 300.0)], CENTER, &mut t);
        assert_eq!(s.transform().zoom, zoom_after_first);
    }

    #[test]
    fn zero_initial_distance_skips_pinch_frames() {
        let (mut s, mut t) = session();
        let p = pt(400.0, 300.0);
        s.on_touch_start(&[p, p], &mut t);
        s.on_touch_move(&[pt(350.0, 300.0), pt(450.0, 300.0)], CENTER, &mut t);
        assert_eq!(s.transform().zoom, 0.8);
        assert_eq!(s.transform().translate_x, 0.0);
    }

    #[test]
    fn pinch_to_min_zoom_recenters() {
        let (mut s, mut t) = session();
        wheel(&mut s, &mut t, 2.0);
        s.on_pointer_down(pt(0.0, 0.0), true, &mut t);
        s.on_pointer_move(pt(40.0, 30.0));
        s.on_pointer_up(&mut t);
        assert_eq!(s.transform().translate_x, 40.0);

        // Off-center pinch inward far enough to clamp at the floor; even the
        // focal compensation ends up recentered.
        s.on_touch_start(&[pt(50.0, 100.0), pt(250.0, 100.0)], &mut t);
        s.on_touch_move(&[pt(140.0, 100.0), pt(160.0, 100.0)], CENTER, &mut t);
        assert_eq!(s.transform().zoom, 0.8);
        assert_eq!(s.transform().translate_x, 0.0);
        assert_eq!(s.transform().translate_y, 0.0);
        assert_eq!(t.pending_kind(), Some((2000, TimerKind::Hold)));
    }

    #[test]
    fn drag_blocked_below_pan_threshold() {
        let (mut s, mut t) = session();
        wheel(&mut s, &mut t, 0.2); // zoom 1.0
        s.on_pointer_down(pt(10.0, 10.0), true, &mut t);
        assert!(!s.is_dragging());
        s.on_pointer_move(pt(80.0, 80.0));
        assert_eq!(s.transform().translate_x, 0.0);
        assert_eq!(s.transform().translate_y, 0.0);

        s.on_touch_start(&[pt(10.0, 10.0)], &mut t);
        assert!(!s.gesture_active());
        s.on_touch_move(&[pt(80.0, 80.0)], CENTER, &mut t);
        assert_eq!(s.transform().translate_x, 0.0);
    }

    #[test]
    fn drag_blocked_at_exact_pan_threshold() {
        let (mut s, mut t) = session();
        wheel(&mut s, &mut t, 0.25);
        assert_eq!(s.transform().zoom, 1.05);
        s.on_pointer_down(pt(10.0, 10.0), true, &mut t);
        assert!(!s.is_dragging());
    }

    #[test]
    fn drag_pans_and_commits_base() {
        let (mut s, mut t) = session();
        wheel(&mut s, &mut t, 2.0);
        s.on_pointer_down(pt(10.0, 10.0), true, &mut t);
        s.on_pointer_move(pt(30.0, 25.0));
        assert_eq!(s.transform().translate_x, 20.0);
        assert_eq!(s.transform().translate_y, 15.0);
        s.on_pointer_up(&mut t);
        assert!(!s.is_dragging());

        // A second drag continues from the committed base.
        s.on_pointer_down(pt(0.0, 0.0), true, &mut t);
        s.on_pointer_move(pt(5.0, 0.0));
        assert_eq!(s.transform().translate_x, 25.0);
    }

    #[test]
    fn touch_drag_pans_when_zoomed() {
        let (mut s, mut t) = session();
        wheel(&mut s, &mut t, 2.0);
        s.on_touch_start(&[pt(100.0, 100.0)], &mut t);
        s.on_touch_move(&[pt(130.0, 90.0)], CENTER, &mut t);
        assert_eq!(s.transform().translate_x, 30.0);
        assert_eq!(s.transform().translate_y, -10.0);
        s.on_touch_end(&mut t);
        assert!(!s.gesture_active());
        assert_eq!(t.pending_kind(), None);
    }

    #[test]
    fn drag_released_outside_viewport_still_commits() {
        let (mut s, mut t) = session();
        wheel(&mut s, &mut t, 2.0);
        s.on_pointer_down(pt(20.0, 20.0), true, &mut t);
        // Window-level move/up delivery: coordinates past the stage bounds
        // still pan, and the release clears the drag and commits the base.
        s.on_pointer_move(pt(-50.0, 950.0));
        assert_eq!(s.transform().translate_x, -70.0);
        assert_eq!(s.transform().translate_y, 930.0);
        s.on_pointer_up(&mut t);
        assert!(!s.is_dragging());
        s.on_pointer_down(pt(0.0, 0.0), true, &mut t);
        s.on_pointer_move(pt(10.0, 0.0));
        assert_eq!(s.transform().translate_x, -60.0);
    }

    #[test]
    fn secondary_button_never_starts_a_drag() {
        let (mut s, mut t) = session();
        wheel(&mut s, &mut t, 2.0);
        s.on_pointer_down(pt(10.0, 10.0), false, &mut t);
        assert!(!s.is_dragging());
    }

    #[test]
    fn touch_end_at_min_zoom_arms_the_hold() {
        let (mut s, mut t) = session();
        s.on_touch_start(&[pt(400.0, 300.0)], &mut t);
        s.on_touch_end(&mut t);
        assert_eq!(t.pending_kind(), Some((2000, TimerKind::Hold)));
        assert_eq!(s.active_layers(), LayerVisibility::deepest_only());
    }

    #[test]
    fn rotation_wraps_after_full_cycle() {
        let (mut s, mut t) = session();
        for expected in [1, 2, 3, 0] {
            wheel(&mut s, &mut t, -0.1);
            t.fire(&mut s);
            t.fire(&mut s);
            assert_eq!(s.active_index(), expected);
            let snap = s.snapshot();
            for (i, layers) in snap.layers.iter().enumerate() {
                if i == expected {
                    assert_eq!(*layers, LayerVisibility::clean_only());
                } else {
                    assert_eq!(*layers, LayerVisibility::hidden());
                }
            }
        }
    }
}
