//! Drop resolution tuning.

use serde::{Deserialize, Serialize};

/// Screen-space constants for drop resolution. Pixel values are divided by
/// the current zoom before they are compared with canvas distances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DropConfig {
    /// Cursor travel needed before the insertion index may change, and the
    /// slack around the origin parent for stickiness
    pub hysteresis_px: f64,

    /// Thickness of the insertion indicator
    pub indicator_thickness: f64,

    /// Shortest indicator that is still drawn
    pub min_indicator_length: f64,
}

impl Default for DropConfig {
    fn default() -> Self {
        Self {
            hysteresis_px: 6.0,
            indicator_thickness: 2.0,
            min_indicator_length: 12.0,
        }
    }
}

impl DropConfig {
    /// Converts a screen distance to canvas units at `zoom`
    pub fn to_canvas(&self, px: f64, zoom: f64) -> f64 {
        if zoom > 0.0 && zoom.is_finite() {
            px / zoom
        } else {
            px
        }
    }
}
