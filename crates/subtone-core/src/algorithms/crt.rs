//! CRT tube simulation: barrel distortion, red/blue misconvergence, an RGB
//! subpixel mask and a dot-pitch grid.

use std::str::FromStr;

use rayon::prelude::*;

use crate::buffer::PixelBuffer;
use crate::color::{round_coord, to_u8};
use crate::effects::{ParameterSet, float_param, int_param};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskPattern {
    /// Horizontal RGB stripes every three rows.
    #[default]
    Monitor,
    /// Monitor stripes with alternate three-column bands shifted by 1.5 rows.
    Tv,
    /// Vertical RGB stripes every three columns.
    Lcd,
}

impl FromStr for MaskPattern {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "Monitor" => Ok(Self::Monitor),
            "TV" => Ok(Self::Tv),
            "LCD" => Ok(Self::Lcd),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrtParams {
    pub distortion: f32,
    pub dot_pitch: u32,
    pub dot_scale: f32,
    pub pattern: MaskPattern,
    pub convergence: f32,
}

impl Default for CrtParams {
    fn default() -> Self {
        Self {
            distortion: 0.03,
            dot_pitch: 4,
            dot_scale: 1.0,
            pattern: MaskPattern::Monitor,
            convergence: 1.0,
        }
    }
}

impl CrtParams {
    pub fn from_params(params: &ParameterSet) -> Self {
        Self {
            distortion: float_param(params, "distortion", 0.03, 0.0, 0.1),
            dot_pitch: int_param(params, "dotPitch", 4, 1, 10),
            dot_scale: float_param(params, "dotScale", 1.0, 0.5, 1.5),
            pattern: params
                .text("pattern")
                .and_then(|p| p.parse().ok())
                .unwrap_or_default(),
            convergence: float_param(params, "convergence", 1.0, 0.0, 5.0),
        }
    }
}

/// Per-channel multipliers of the subpixel mask at (x, y).
pub fn subpixel_mask(pattern: MaskPattern, x: u32, y: u32) -> [f32; 3] {
    let lane = match pattern {
        MaskPattern::Lcd => x % 3,
        MaskPattern::Monitor => y % 3,
        MaskPattern::Tv => {
            let y_offset = if (x / 3) % 2 != 0 { 1.5 } else { 0.0 };
            (y as f32 + y_offset).floor() as u32 % 3
        }
    };
    let mut mask = [0.0; 3];
    mask[lane as usize] = 1.0;
    mask
}

/// True when (x, y) falls inside the lit area of its dot-pitch tile.
pub fn dot_lit(x: u32, y: u32, pitch: u32, scale: f32) -> bool {
    let pitch = pitch.max(1);
    let half = pitch as f32 / 2.0;
    let lit = half * scale;
    let dx = ((x % pitch) as f32 - half).abs();
    let dy = ((y % pitch) as f32 - half).abs();
    dx <= lit && dy <= lit
}

/// Render the CRT look from `source` into a new buffer of the same size.
pub fn crt(source: &PixelBuffer, params: &CrtParams) -> PixelBuffer {
    let mut output = PixelBuffer::new(source.width, source.height);
    if source.is_empty() {
        return output;
    }

    let width = source.width as i64;
    let height = source.height as i64;
    let half_w = source.width as f32 / 2.0;
    let half_h = source.height as f32 / 2.0;

    let sample = |sx: f32, sy: f32, channel: usize| -> f32 {
        let x = round_coord(sx);
        let y = round_coord(sy);
        if x < 0 || x >= width || y < 0 || y >= height {
            return 0.0;
        }
        source.data[((y * width + x) * 4) as usize + channel] as f32
    };

    let row_bytes = output.stride();
    output
        .data
        .par_chunks_exact_mut(row_bytes)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as u32;
            let ny = (y as f32 - half_h) / half_h;
            for (x, pixel) in row.chunks_exact_mut(4).enumerate() {
                let x = x as u32;
                let nx = (x as f32 - half_w) / half_w;
                let r2 = nx * nx + ny * ny;
                let factor = 1.0 + params.distortion * r2;
                let src_x = half_w + nx * factor * half_w;
                let src_y = half_h + ny * factor * half_h;

                let r = sample(src_x - params.convergence, src_y, 0);
                let g = sample(src_x, src_y, 1);
                let b = sample(src_x + params.convergence, src_y, 2);

                let mask = if dot_lit(x, y, params.dot_pitch, params.dot_scale) {
                    subpixel_mask(params.pattern, x, y)
                } else {
                    [0.0; 3]
                };

                pixel[0] = to_u8(r * mask[0]);
                pixel[1] = to_u8(g * mask[1]);
                pixel[2] = to_u8(b * mask[2]);
                pixel[3] = 255;
            }
        });

    output
}
