use std::path::Path;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use subtone_core::PixelBuffer;
use tracing::debug;

use crate::error::Result;

/// Encode a buffer as an RGBA PNG.
pub fn encode_png(buffer: &PixelBuffer) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes).write_image(
        &buffer.data,
        buffer.width,
        buffer.height,
        ExtendedColorType::Rgba8,
    )?;
    Ok(bytes)
}

/// Encode a buffer as PNG and write it to `path`, replacing any existing file.
pub fn save_png(buffer: &PixelBuffer, path: &Path) -> Result<()> {
    let bytes = encode_png(buffer)?;
    std::fs::write(path, &bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), "wrote PNG");
    Ok(())
}
