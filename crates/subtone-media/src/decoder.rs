use std::path::Path;

use image::{DynamicImage, ImageReader};
use subtone_core::PixelBuffer;
use tracing::debug;

use crate::error::{MediaError, Result};

/// Decode an image file of any supported format into an RGBA buffer.
pub fn load_image(path: &Path) -> Result<PixelBuffer> {
    let reader = ImageReader::open(path)
        .map_err(|e| MediaError::OpenFailed(format!("{}: {e}", path.display())))?
        .with_guessed_format()?;
    if reader.format().is_none() {
        return Err(MediaError::UnknownFormat(path.display().to_string()));
    }
    let image = reader.decode()?;
    debug!(path = %path.display(), width = image.width(), height = image.height(), "decoded image");
    to_pixel_buffer(image)
}

/// Decode an in-memory encoded image.
pub fn decode_image(bytes: &[u8]) -> Result<PixelBuffer> {
    to_pixel_buffer(image::load_from_memory(bytes)?)
}

fn to_pixel_buffer(image: DynamicImage) -> Result<PixelBuffer> {
    let rgba = image.into_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(PixelBuffer::from_rgba(width, height, rgba.into_raw())?)
}
