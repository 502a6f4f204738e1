//! Viewer tuning constants. All values are fixed at initialization; nothing
//! here is runtime-mutable.

use thiserror::Error;

use crate::state::CORROSION_LAYERS;

#[derive(Clone, Debug, PartialEq)]
pub struct ViewerConfig {
    /// Upper zoom clamp.
    pub max_zoom: f64,
    /// Lower zoom clamp; also the rest state the viewer returns to.
    pub min_zoom: f64,
    /// Ascending zoom levels at which corrosion layers 1..=3 appear.
    pub corrosion_thresholds: [f64; CORROSION_LAYERS],
    /// Dwell time at minimum zoom before the glitch transition starts.
    pub hold_delay_ms: u32,
    /// Length of the glitch transition itself.
    pub glitch_duration_ms: u32,
    /// Dragging is permitted only strictly above this zoom level.
    pub pan_min_zoom: f64,
    /// Wheel delta-y to zoom-delta factor.
    pub wheel_zoom_scale: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            max_zoom: 10.0,
            min_zoom: 0.8,
            corrosion_thresholds: [1.05, 2.0, 3.5],
            hold_delay_ms: 2000,
            glitch_duration_ms: 500,
            pan_min_zoom: 1.05,
            wheel_zoom_scale: 0.005,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("corrosion thresholds must be strictly ascending, got {0:?}")]
    ThresholdsNotAscending([f64; CORROSION_LAYERS]),
    #[error("min zoom {min} must be below max zoom {max}")]
    ZoomRangeInverted { min: f64, max: f64 },
}

impl ViewerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_zoom >= self.max_zoom {
            return Err(ConfigError::ZoomRangeInverted {
                min: self.min_zoom,
                max: self.max_zoom,
            });
        }
        if self
            .corrosion_thresholds
            .windows(2)
            .any(|pair| pair[0] >= pair[1])
        {
            return Err(ConfigError::ThresholdsNotAscending(
                self.corrosion_thresholds,
            ));
        }
        Ok(())
    }
}
