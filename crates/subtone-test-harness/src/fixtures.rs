use std::path::{Path, PathBuf};

use subtone_core::PixelBuffer;

use crate::builders::PixelBufferBuilder;

/// 2x2 image used by the dithering scenarios: black, white, red, blue.
pub fn primaries_2x2() -> PixelBuffer {
    PixelBufferBuilder::new(2, 2)
        .pixel(0, 0, [0, 0, 0, 255])
        .pixel(1, 0, [255, 255, 255, 255])
        .pixel(0, 1, [255, 0, 0, 255])
        .pixel(1, 1, [0, 0, 255, 255])
        .build()
}

/// Horizontal gray ramp, black to white.
pub fn gray_ramp(width: u32, height: u32) -> PixelBuffer {
    PixelBufferBuilder::new(width, height).gradient().build()
}

/// Deterministic colorful image with distinct values in every channel.
pub fn color_noise(width: u32, height: u32) -> PixelBuffer {
    let mut buffer = PixelBuffer::new(width, height);
    let mut state: u32 = 0x9e37_79b9;
    for px in buffer.data.chunks_exact_mut(4) {
        for c in &mut px[..3] {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            *c = (state >> 24) as u8;
        }
        px[3] = 255;
    }
    buffer
}

/// Write `buffer` as a PNG under `dir` and return its path.
pub fn write_png_fixture(dir: &Path, name: &str, buffer: &PixelBuffer) -> PathBuf {
    let path = dir.join(format!("{name}.png"));
    image::save_buffer(
        &path,
        &buffer.data,
        buffer.width,
        buffer.height,
        image::ExtendedColorType::Rgba8,
    )
    .expect("failed to write PNG fixture");
    path
}

/// Write `state` as JSON under `dir` and return its path.
pub fn write_state_fixture(dir: &Path, name: &str, state: &subtone_core::AppState) -> PathBuf {
    let path = dir.join(format!("{name}.json"));
    let json = serde_json::to_string_pretty(state).expect("state must serialize");
    std::fs::write(&path, json).expect("failed to write state fixture");
    path
}

/// Get a temporary directory for test fixtures that persists for the test run.
pub fn fixture_dir() -> tempfile::TempDir {
    tempfile::TempDir::new().expect("failed to create temp dir for fixtures")
}
