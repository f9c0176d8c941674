use egui::{Pos2, Rect, Vec2};

pub const DEFAULT_MIN_ZOOM: f32 = 0.5;
pub const DEFAULT_MAX_ZOOM: f32 = 5.0;

/// Presentation-only zoom and pan. Strokes are always recorded and replayed
/// in untransformed canvas space; this only changes where the frame is shown.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewTransform {
    scale: f32,
    translation: Vec2,
    min_scale: f32,
    max_scale: f32,
    last_pan_pos: Option<Pos2>,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_ZOOM, DEFAULT_MAX_ZOOM)
    }
}

impl ViewTransform {
    pub fn new(min_scale: f32, max_scale: f32) -> Self {
        Self {
            scale: 1.0,
            translation: Vec2::ZERO,
            min_scale,
            max_scale,
            last_pan_pos: None,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn translation(&self) -> Vec2 {
        self.translation
    }

    pub fn is_identity(&self) -> bool {
        self.scale == 1.0 && self.translation == Vec2::ZERO
    }

    /// Multiply the scale by a pinch step, keeping it within limits
    pub fn pinch(&mut self, scale_factor: f32) {
        if !scale_factor.is_finite() || scale_factor <= 0.0 {
            return;
        }
        self.scale = (self.scale * scale_factor).clamp(self.min_scale, self.max_scale);
    }

    pub fn begin_pan(&mut self, pos: Pos2) {
        self.last_pan_pos = Some(pos);
    }

    /// Move the view by the distance travelled since the last pan position
    pub fn pan_to(&mut self, pos: Pos2) {
        if let Some(last) = self.last_pan_pos {
            self.translation += pos - last;
        }
        self.last_pan_pos = Some(pos);
    }

    pub fn end_pan(&mut self) {
        self.last_pan_pos = None;
    }

    pub fn reset(&mut self) {
        self.scale = 1.0;
        self.translation = Vec2::ZERO;
        self.last_pan_pos = None;
    }

    /// Map a canvas point to the screen. Scaling pivots on the canvas centre,
    /// then the pan offset is applied.
    pub fn to_screen(&self, canvas_pos: Pos2, canvas_rect: Rect) -> Pos2 {
        let center = canvas_rect.center();
        center + (canvas_pos - center) * self.scale + self.translation
    }

    /// Inverse of [`Self::to_screen`]
    pub fn to_canvas(&self, screen_pos: Pos2, canvas_rect: Rect) -> Pos2 {
        let center = canvas_rect.center();
        center + (screen_pos - self.translation - center) / self.scale
    }

    /// Screen rectangle the whole canvas occupies
    pub fn screen_rect(&self, canvas_rect: Rect) -> Rect {
        Rect::from_min_max(
            self.to_screen(canvas_rect.min, canvas_rect),
            self.to_screen(canvas_rect.max, canvas_rect),
        )
    }
}
