use std::path::Path;

use image::{ImageFormat, ImageReader};

use crate::error::{MediaError, Result};

/// Header-level facts about an image file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

/// Read the format and dimensions of an image without decoding its pixels.
pub fn probe(path: &Path) -> Result<ImageInfo> {
    let reader = ImageReader::open(path)
        .map_err(|e| MediaError::OpenFailed(format!("{}: {e}", path.display())))?
        .with_guessed_format()?;
    let format = reader
        .format()
        .ok_or_else(|| MediaError::UnknownFormat(path.display().to_string()))?;
    let (width, height) = reader.into_dimensions()?;
    Ok(ImageInfo { width, height, format })
}
