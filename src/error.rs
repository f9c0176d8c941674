use thiserror::Error;

/// Errors from the fallible edges of the canvas: decoding background images
/// and producing exported bitmaps. Drawing itself never fails, it degrades.
#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("Invalid canvas dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Canvas has nothing to export")]
    EmptyCanvas,
}

pub type CanvasResult<T> = Result<T, CanvasError>;
