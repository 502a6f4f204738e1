//! Corrosion reveal rules: which overlay layers show at the current zoom,
//! remembering the deepest level ever exposed for the active object.

/// Number of corrosion overlays stacked on each object's clean layer.
pub const CORROSION_LAYERS: usize = 3;

/// Opacity state of one object's layer stack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerVisibility {
    pub clean: bool,
    pub corrosion: [bool; CORROSION_LAYERS],
}

impl LayerVisibility {
    pub fn clean_only() -> Self {
        Self {
            clean: true,
            corrosion: [false; CORROSION_LAYERS],
        }
    }

    pub fn hidden() -> Self {
        Self {
            clean: false,
            corrosion: [false; CORROSION_LAYERS],
        }
    }

    /// The terminal "full corrosion" cue shown during the hold countdown.
    pub fn deepest_only() -> Self {
        let mut corrosion = [false; CORROSION_LAYERS];
        corrosion[CORROSION_LAYERS - 1] = true;
        Self {
            clean: false,
            corrosion,
        }
    }
}

/// Monotonic reveal memory for the active object. Never decreases while the
/// same object stays active; reset to zero exactly when the object changes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RevealState {
    pub max_corrosion_level: usize,
}

impl RevealState {
    pub fn reset_for_new_object(&mut self) {
        self.max_corrosion_level = 0;
    }
}

/// Count of thresholds the zoom meets or exceeds (0..=3).
pub fn visible_level(zoom: f64, thresholds: &[f64; CORROSION_LAYERS]) -> usize {
    thresholds.iter().filter(|t| zoom >= **t).count()
}

/// Recompute the active object's layer stack for the given zoom. Below the
/// lowest threshold only the clean layer shows; the reveal memory is left
/// untouched so previously exposed corrosion returns as soon as the zoom
/// re-crosses the threshold.
pub fn update(
    zoom: f64,
    thresholds: &[f64; CORROSION_LAYERS],
    reveal: &mut RevealState,
    layers: &mut LayerVisibility,
) {
    reveal.max_corrosion_level = reveal.max_corrosion_level.max(visible_level(zoom, thresholds));

    if zoom < thresholds[0] {
        *layers = LayerVisibility::clean_only();
        return;
    }
    let mut any_corrosion = false;
    for (level, slot) in layers.corrosion.iter_mut().enumerate() {
        *slot = level < reveal.max_corrosion_level;
        any_corrosion |= *slot;
    }
    layers.clean = !any_corrosion;
}
