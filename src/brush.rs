use egui::Color32;
use serde::{Deserialize, Serialize};

pub const MIN_STROKE_WIDTH: f32 = 1.0;
pub const MAX_STROKE_WIDTH: f32 = 100.0;

/// The brush variants the drawing tool picker can hand to the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BrushKind {
    Pen,
    Pencil,
    Calligraphy,
    FountainPen,
    Marker,
    AirBrush,
    DashLine,
    NeonLine,
    HardEraser,
    SoftEraser,
}

impl BrushKind {
    pub const ALL: [BrushKind; 10] = [
        BrushKind::Pen,
        BrushKind::Pencil,
        BrushKind::Calligraphy,
        BrushKind::FountainPen,
        BrushKind::Marker,
        BrushKind::AirBrush,
        BrushKind::DashLine,
        BrushKind::NeonLine,
        BrushKind::HardEraser,
        BrushKind::SoftEraser,
    ];

    pub fn is_eraser(self) -> bool {
        matches!(self, BrushKind::HardEraser | BrushKind::SoftEraser)
    }

    pub fn name(self) -> &'static str {
        match self {
            BrushKind::Pen => "Pen",
            BrushKind::Pencil => "Pencil",
            BrushKind::Calligraphy => "Calligraphy",
            BrushKind::FountainPen => "Fountain Pen",
            BrushKind::Marker => "Marker",
            BrushKind::AirBrush => "Air Brush",
            BrushKind::DashLine => "Dash Line",
            BrushKind::NeonLine => "Neon Line",
            BrushKind::HardEraser => "Hard Eraser",
            BrushKind::SoftEraser => "Soft Eraser",
        }
    }
}

/// Brush descriptor supplied by the brush picker. Read-only from the canvas'
/// point of view; values are clamped, never rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brush {
    pub kind: BrushKind,
    /// `#RRGGBB`
    pub color_hex: String,
    pub stroke_width: f32,
    pub opacity: f32,
}

impl Brush {
    pub fn new(
        kind: BrushKind,
        color_hex: impl Into<String>,
        stroke_width: f32,
        opacity: f32,
    ) -> Self {
        Self {
            kind,
            color_hex: color_hex.into(),
            stroke_width: clamp_stroke_width(stroke_width),
            opacity: clamp_opacity(opacity),
        }
    }

    pub fn is_eraser(&self) -> bool {
        self.kind.is_eraser()
    }

    /// Paint used while the pointer is still down
    pub fn live_paint(&self) -> PaintSpec {
        resolve_paint_attributes(
            self.kind,
            parse_color_or_black(&self.color_hex),
            self.stroke_width,
            self.opacity,
        )
    }
}

impl Default for Brush {
    fn default() -> Self {
        Self::new(BrushKind::Pen, "#000000", 5.0, 1.0)
    }
}

/// How a paint combines with what is already in the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blend {
    /// Normal painting
    SourceOver,
    /// Source shape removes alpha from the destination
    DestinationOut,
}

/// Fully resolved paint attributes for one stroke
#[derive(Debug, Clone, PartialEq)]
pub struct PaintSpec {
    pub color: Color32,
    pub alpha: u8,
    pub width: f32,
    pub blend: Blend,
    /// On/off lengths of a dash pattern, `None` for a solid line
    pub dash: Option<[f32; 2]>,
}

impl PaintSpec {
    pub fn is_erasing(&self) -> bool {
        self.blend == Blend::DestinationOut
    }
}

/// Map a brush kind plus raw attributes to the paint the rasterizer uses.
///
/// Every kind strokes with round caps and joins. Erasers ignore the colour and
/// subtract alpha; the hard eraser always removes fully, the soft eraser
/// removes in proportion to its opacity.
pub fn resolve_paint_attributes(
    kind: BrushKind,
    color: Color32,
    width: f32,
    opacity: f32,
) -> PaintSpec {
    let width = clamp_stroke_width(width);
    let alpha = opacity_to_alpha(opacity);

    match kind {
        BrushKind::HardEraser => PaintSpec {
            color: Color32::BLACK,
            alpha: u8::MAX,
            width,
            blend: Blend::DestinationOut,
            dash: None,
        },
        BrushKind::SoftEraser => PaintSpec {
            color: Color32::BLACK,
            alpha,
            width,
            blend: Blend::DestinationOut,
            dash: None,
        },
        BrushKind::DashLine => PaintSpec {
            color,
            alpha,
            width,
            blend: Blend::SourceOver,
            dash: Some([width * 2.0, width * 1.5]),
        },
        BrushKind::Pen
        | BrushKind::Pencil
        | BrushKind::Calligraphy
        | BrushKind::FountainPen
        | BrushKind::Marker
        | BrushKind::AirBrush
        | BrushKind::NeonLine => PaintSpec {
            color,
            alpha,
            width,
            blend: Blend::SourceOver,
            dash: None,
        },
    }
}

/// Parse `#RRGGBB` or `#AARRGGBB` (the leading `#` is optional)
pub fn parse_color_hex(hex: &str) -> Option<Color32> {
    let digits = hex.trim();
    let digits = digits.strip_prefix('#').unwrap_or(digits);
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let value = u32::from_str_radix(digits, 16).ok()?;
    let [a, r, g, b] = value.to_be_bytes();
    match digits.len() {
        6 => Some(Color32::from_rgb(r, g, b)),
        8 => Some(Color32::from_rgba_unmultiplied(r, g, b, a)),
        _ => None,
    }
}

pub fn parse_color_or_black(hex: &str) -> Color32 {
    parse_color_hex(hex).unwrap_or_else(|| {
        log::warn!("Unparseable colour {hex:?}, falling back to black");
        Color32::BLACK
    })
}

/// Format as `#RRGGBB`, dropping alpha
pub fn color_to_hex(color: Color32) -> String {
    format!("#{:02X}{:02X}{:02X}", color.r(), color.g(), color.b())
}

pub fn clamp_stroke_width(width: f32) -> f32 {
    if width.is_nan() {
        return MIN_STROKE_WIDTH;
    }
    width.clamp(MIN_STROKE_WIDTH, MAX_STROKE_WIDTH)
}

pub fn clamp_opacity(opacity: f32) -> f32 {
    if opacity.is_nan() {
        return 1.0;
    }
    opacity.clamp(0.0, 1.0)
}

fn opacity_to_alpha(opacity: f32) -> u8 {
    (clamp_opacity(opacity) * 255.0) as u8
}
