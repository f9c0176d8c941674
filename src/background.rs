use egui::Color32;
use tiny_skia::{
    ColorU8, FilterQuality, Paint, Pattern, Pixmap, PremultipliedColorU8, Rect, SpreadMode,
    Transform,
};

use crate::error::{CanvasError, CanvasResult};

/// Base painted under every stroke of the committed layer
#[derive(Clone)]
pub enum Background {
    Color(Color32),
    /// Repeated from the top-left corner
    Tiled(Pixmap),
}

impl Default for Background {
    fn default() -> Self {
        Background::Color(Color32::WHITE)
    }
}

impl std::fmt::Debug for Background {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Background::Color(color) => f.debug_tuple("Color").field(color).finish(),
            Background::Tiled(tile) => f
                .debug_struct("Tiled")
                .field("width", &tile.width())
                .field("height", &tile.height())
                .finish(),
        }
    }
}

impl Background {
    /// Decode an encoded image (PNG, JPEG, ...) into a tiled background
    pub fn tiled_from_bytes(bytes: &[u8]) -> CanvasResult<Self> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        Self::tiled_from_rgba(rgba.width(), rgba.height(), rgba.as_raw())
    }

    /// Build a tiled background from unpremultiplied RGBA8 pixels
    pub fn tiled_from_rgba(width: u32, height: u32, rgba: &[u8]) -> CanvasResult<Self> {
        let mut tile = Pixmap::new(width, height)
            .ok_or(CanvasError::InvalidDimensions { width, height })?;
        if rgba.len() != tile.pixels().len() * 4 {
            return Err(CanvasError::InvalidDimensions { width, height });
        }

        for (dst, src) in tile.pixels_mut().iter_mut().zip(rgba.chunks_exact(4)) {
            *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
        }
        Ok(Background::Tiled(tile))
    }

    /// Colour a pixel at `(x, y)` would have with nothing drawn over it
    pub fn color_at(&self, x: u32, y: u32) -> Color32 {
        match self {
            Background::Color(color) => *color,
            Background::Tiled(tile) => {
                let pixel = tile
                    .pixel(x % tile.width(), y % tile.height())
                    .unwrap_or(PremultipliedColorU8::TRANSPARENT)
                    .demultiply();
                Color32::from_rgba_unmultiplied(
                    pixel.red(),
                    pixel.green(),
                    pixel.blue(),
                    pixel.alpha(),
                )
            }
        }
    }

    /// Replace the whole pixmap with the background
    pub(crate) fn paint_onto(&self, pixmap: &mut Pixmap) {
        match self {
            Background::Color(color) => {
                let [r, g, b, a] = color.to_srgba_unmultiplied();
                pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, a));
            }
            Background::Tiled(tile) => {
                pixmap.fill(tiny_skia::Color::TRANSPARENT);
                let (width, height) = (pixmap.width() as f32, pixmap.height() as f32);
                let Some(area) = Rect::from_xywh(0.0, 0.0, width, height) else {
                    return;
                };
                let paint = Paint {
                    shader: Pattern::new(
                        tile.as_ref(),
                        SpreadMode::Repeat,
                        FilterQuality::Nearest,
                        1.0,
                        Transform::identity(),
                    ),
                    ..Paint::default()
                };
                pixmap.fill_rect(area, &paint, Transform::identity(), None);
            }
        }
    }
}
