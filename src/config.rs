use serde::{Deserialize, Serialize};

use crate::brush::{MAX_STROKE_WIDTH, MIN_STROKE_WIDTH};
use crate::input::DEFAULT_EXPAND_MARGIN;
use crate::path_sampler::DEFAULT_SAMPLE_STEP;
use crate::view::{DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM};

/// Tunables of the canvas engine. Missing fields take their defaults when
/// deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Arc length between stored samples of a stroke
    pub sample_step: f32,
    /// Distance from the bottom edge that grows the canvas
    pub expand_margin: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub min_stroke_width: f32,
    pub max_stroke_width: f32,
    /// Side length of the drawing bitmap when the canvas has no size yet
    pub fallback_export_size: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            sample_step: DEFAULT_SAMPLE_STEP,
            expand_margin: DEFAULT_EXPAND_MARGIN,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            min_stroke_width: MIN_STROKE_WIDTH,
            max_stroke_width: MAX_STROKE_WIDTH,
            fallback_export_size: 100,
        }
    }
}

impl CanvasConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::validated)
    }

    /// Replace unusable values with defaults and order the min/max pairs
    pub fn validated(self) -> Self {
        let defaults = Self::default();
        let positive = |value: f32, fallback: f32| {
            if value.is_finite() && value > 0.0 { value } else { fallback }
        };

        let mut min_zoom = positive(self.min_zoom, defaults.min_zoom);
        let mut max_zoom = positive(self.max_zoom, defaults.max_zoom);
        if min_zoom > max_zoom {
            std::mem::swap(&mut min_zoom, &mut max_zoom);
        }

        let mut min_width = positive(self.min_stroke_width, defaults.min_stroke_width);
        let mut max_width = positive(self.max_stroke_width, defaults.max_stroke_width);
        if min_width > max_width {
            std::mem::swap(&mut min_width, &mut max_width);
        }

        Self {
            sample_step: positive(self.sample_step, defaults.sample_step),
            expand_margin: if self.expand_margin.is_finite() && self.expand_margin >= 0.0 {
                self.expand_margin
            } else {
                defaults.expand_margin
            },
            min_zoom,
            max_zoom,
            min_stroke_width: min_width,
            max_stroke_width: max_width,
            fallback_export_size: self.fallback_export_size.max(1),
        }
    }
}
