use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, RgbaImage};
use tiny_skia::PixmapRef;

use crate::error::{CanvasError, CanvasResult};

/// Demultiply a frame into a plain RGBA image
pub fn to_rgba_image(frame: PixmapRef<'_>) -> CanvasResult<RgbaImage> {
    let (width, height) = (frame.width(), frame.height());
    let data: Vec<u8> = frame
        .pixels()
        .iter()
        .flat_map(|pixel| {
            let color = pixel.demultiply();
            [color.red(), color.green(), color.blue(), color.alpha()]
        })
        .collect();
    RgbaImage::from_raw(width, height, data).ok_or(CanvasError::InvalidDimensions { width, height })
}

/// Encode a frame as PNG bytes
pub fn encode_png(frame: PixmapRef<'_>) -> CanvasResult<Vec<u8>> {
    let image = to_rgba_image(frame)?;
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}

pub fn save_png(frame: PixmapRef<'_>, path: impl AsRef<Path>) -> CanvasResult<()> {
    let path = path.as_ref();
    std::fs::write(path, encode_png(frame)?)?;
    log::info!("Exported {}x{} drawing to {}", frame.width(), frame.height(), path.display());
    Ok(())
}
