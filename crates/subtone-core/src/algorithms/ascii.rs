use rayon::prelude::*;

use super::glyphs::{AsciiFont, GlyphAtlas, RAMP};
use crate::buffer::PixelBuffer;
use crate::color::{luma_bt709, to_u8};
use crate::effects::{ParameterSet, float_param, int_param};

pub const BACKGROUND: [u8; 4] = [0x1a, 0x1a, 0x1a, 255];
/// Phosphor green used when colour is disabled.
pub const MONOCHROME: [u8; 4] = [0x00, 0xff, 0x41, 255];

#[derive(Debug, Clone, PartialEq)]
pub struct AsciiParams {
    pub cell_size: u32,
    pub invert: bool,
    pub is_color: bool,
    pub color_boost: f32,
    pub font: AsciiFont,
}

impl Default for AsciiParams {
    fn default() -> Self {
        Self {
            cell_size: 8,
            invert: false,
            is_color: true,
            color_boost: 1.5,
            font: AsciiFont::Mono,
        }
    }
}

impl AsciiParams {
    pub fn from_params(params: &ParameterSet) -> Self {
        Self {
            cell_size: int_param(params, "cellSize", 8, 4, 32),
            invert: params.bool("invert").unwrap_or(false),
            is_color: params.bool("isColor").unwrap_or(true),
            color_boost: float_param(params, "colorBoost", 1.5, 0.5, 5.0),
            font: params
                .text("font")
                .and_then(|f| f.parse().ok())
                .unwrap_or_default(),
        }
    }
}

/// Ramp position for an average luma in [0, 255].
pub fn ramp_index(luma: f32, invert: bool) -> usize {
    let luma = if invert { 255.0 - luma } else { luma };
    let index = (luma / 255.0 * (RAMP.len() - 1) as f32).floor();
    (index.max(0.0) as usize).min(RAMP.len() - 1)
}

/// BT.709 luma of a cell average from integer channel sums. The weights are
/// applied as integers so a uniform cell gives its exact luma (white is 255,
/// not 254.99998).
pub fn cell_luma(sum: [u64; 3], count: u64) -> f32 {
    let weighted = 2126 * sum[0] + 7152 * sum[1] + 722 * sum[2];
    (weighted as f64 / (10_000 * count.max(1)) as f64) as f32
}

/// Push each channel away from the colour's own luma by `boost`.
pub fn boost_color(rgb: [f32; 3], boost: f32) -> [u8; 4] {
    let luma = luma_bt709(rgb[0], rgb[1], rgb[2]);
    let ch = |c: f32| to_u8((luma + (c - luma) * boost).clamp(0.0, 255.0));
    [ch(rgb[0]), ch(rgb[1]), ch(rgb[2]), 255]
}

/// Render `source` as a grid of glyphs over a dark background.
pub fn ascii(source: &PixelBuffer, params: &AsciiParams) -> PixelBuffer {
    let mut output = PixelBuffer::filled(source.width, source.height, BACKGROUND);
    if source.is_empty() {
        return output;
    }

    let atlas = GlyphAtlas::new(params.font);
    let cell = params.cell_size.max(1);
    let width = source.width as usize;
    output
        .data
        .par_chunks_mut(source.stride() * cell as usize)
        .enumerate()
        .for_each(|(band, rows)| {
            let y0 = band as u32 * cell;
            let band_height = (rows.len() / source.stride()) as u32;
            for x0 in (0..source.width).step_by(cell as usize) {
                let cell_w = cell.min(source.width - x0);

                let mut sum = [0u64; 3];
                for y in y0..y0 + band_height {
                    for x in x0..x0 + cell_w {
                        let p = source.pixel(x, y);
                        sum[0] += p[0] as u64;
                        sum[1] += p[1] as u64;
                        sum[2] += p[2] as u64;
                    }
                }
                let count = (cell_w * band_height) as u64;
                let index = ramp_index(cell_luma(sum, count), params.invert);
                let colour = if params.is_color {
                    boost_color(sum.map(|s| s as f32 / count as f32), params.color_boost)
                } else {
                    MONOCHROME
                };

                for dy in 0..band_height {
                    for dx in 0..cell_w {
                        if atlas.sample_scaled(index, dx, dy, cell) {
                            let i = (dy as usize * width + (x0 + dx) as usize) * 4;
                            rows[i..i + 4].copy_from_slice(&colour);
                        }
                    }
                }
            }
        });

    output
}
