use egui::{Pos2, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::brush::{self, Brush, BrushKind, PaintSpec};
use crate::path_sampler::{self, PathSampler, Polyline};

/// One committed drawing action.
///
/// Serializes as a flat record:
/// `{id, geometry, brushKind, colorHex, strokeWidth, opacity,
/// rectLeft, rectTop, rectRight, rectBottom}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    id: String,
    geometry: String,
    brush_kind: BrushKind,
    color_hex: String,
    stroke_width: f32,
    opacity: f32,
    rect_left: f32,
    rect_top: f32,
    rect_right: f32,
    rect_bottom: f32,
}

// Strokes are identified by id only
impl PartialEq for Stroke {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Stroke {}

impl Stroke {
    /// Build a stroke from a finished path and the brush it was drawn with.
    /// A fresh id is assigned and the bounding box is computed once here,
    /// padded by half the stroke width.
    pub fn from_path(path: &Polyline, brush: &Brush, sampler: &PathSampler) -> Self {
        let stroke_width = brush::clamp_stroke_width(brush.stroke_width);
        let bounds = path.bounds(stroke_width / 2.0);
        let bounds = if bounds == Rect::NOTHING { Rect::ZERO } else { bounds };

        Self {
            id: Uuid::new_v4().to_string(),
            geometry: sampler.encode(path),
            brush_kind: brush.kind,
            color_hex: brush.color_hex.clone(),
            stroke_width,
            opacity: brush::clamp_opacity(brush.opacity),
            rect_left: bounds.min.x,
            rect_top: bounds.min.y,
            rect_right: bounds.max.x,
            rect_bottom: bounds.max.y,
        }
    }

    /// Rebuild a stroke from persisted fields
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: impl Into<String>,
        geometry: impl Into<String>,
        brush_kind: BrushKind,
        color_hex: impl Into<String>,
        stroke_width: f32,
        opacity: f32,
        bounds: Rect,
    ) -> Self {
        Self {
            id: id.into(),
            geometry: geometry.into(),
            brush_kind,
            color_hex: color_hex.into(),
            stroke_width,
            opacity,
            rect_left: bounds.min.x,
            rect_top: bounds.min.y,
            rect_right: bounds.max.x,
            rect_bottom: bounds.max.y,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn geometry(&self) -> &str {
        &self.geometry
    }

    pub fn brush_kind(&self) -> BrushKind {
        self.brush_kind
    }

    pub fn color_hex(&self) -> &str {
        &self.color_hex
    }

    pub fn stroke_width(&self) -> f32 {
        self.stroke_width
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn is_eraser(&self) -> bool {
        self.brush_kind.is_eraser()
    }

    /// Bounding box hint recorded at commit time
    pub fn bounds(&self) -> Rect {
        Rect::from_min_max(
            Pos2::new(self.rect_left, self.rect_top),
            Pos2::new(self.rect_right, self.rect_bottom),
        )
    }

    /// Decoded geometry, always a polyline
    pub fn path(&self) -> Polyline {
        string_to_path(&self.geometry)
    }

    /// Paint used when this stroke is replayed onto the committed layer.
    /// Eraser kinds always erase at full strength here.
    pub fn to_paint(&self) -> PaintSpec {
        let color = brush::parse_color_or_black(&self.color_hex);
        let mut paint = brush::resolve_paint_attributes(
            self.brush_kind,
            color,
            self.stroke_width,
            self.opacity,
        );
        if self.is_eraser() {
            paint.alpha = u8::MAX;
        }
        paint
    }
}

/// Encode a path with the default sampling step
pub fn path_to_string(path: &Polyline) -> String {
    PathSampler::default().encode(path)
}

pub fn string_to_path(encoded: &str) -> Polyline {
    path_sampler::decode(encoded)
}
