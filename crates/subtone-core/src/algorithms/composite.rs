//! Analog composite video emulation in YIQ space: chroma bleed, phase wobble,
//! chroma fringing, scanlines and luma noise.

use rand::Rng;
use rayon::prelude::*;

use crate::buffer::PixelBuffer;
use crate::color::{Yiq, round_coord, to_u8};
use crate::effects::{ParameterSet, float_param, int_param};

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeParams {
    pub bleed: u32,
    pub scanline_intensity: f32,
    pub scanline_gap: u32,
    pub noise: f32,
    pub fringing: f32,
    pub saturation: f32,
    pub phase_shift: f32,
}

impl Default for CompositeParams {
    fn default() -> Self {
        Self {
            bleed: 8,
            scanline_intensity: 0.3,
            scanline_gap: 2,
            noise: 0.15,
            fringing: 2.0,
            saturation: 1.0,
            phase_shift: 2.0,
        }
    }
}

impl CompositeParams {
    pub fn from_params(params: &ParameterSet) -> Self {
        Self {
            bleed: int_param(params, "bleed", 8, 0, 40),
            scanline_intensity: float_param(params, "scanlineIntensity", 0.3, 0.0, 1.0),
            scanline_gap: int_param(params, "scanlineGap", 2, 2, 16),
            noise: float_param(params, "noise", 0.15, 0.0, 1.0),
            fringing: float_param(params, "fringing", 2.0, 0.0, 20.0),
            saturation: float_param(params, "saturation", 1.0, 0.0, 3.0),
            phase_shift: float_param(params, "phaseShift", 2.0, 0.0, 10.0),
        }
    }

    /// The neutral settings under which the effect reduces to a YIQ round trip.
    pub fn neutral() -> Self {
        Self {
            bleed: 0,
            scanline_intensity: 0.0,
            scanline_gap: 2,
            noise: 0.0,
            fringing: 0.0,
            saturation: 1.0,
            phase_shift: 0.0,
        }
    }
}

/// Horizontal box blur of I and Q only. Reads from `src` so earlier
/// results never feed later samples in the same row.
fn bleed_chroma(src: &[Yiq], width: usize, radius: usize) -> Vec<Yiq> {
    let mut out = src.to_vec();
    out.par_chunks_exact_mut(width)
        .zip(src.par_chunks_exact(width))
        .for_each(|(dst_row, src_row)| {
            // prefix sums turn each window into two lookups
            let mut sum_i = vec![0.0f32; width + 1];
            let mut sum_q = vec![0.0f32; width + 1];
            for (x, px) in src_row.iter().enumerate() {
                sum_i[x + 1] = sum_i[x] + px.i;
                sum_q[x + 1] = sum_q[x] + px.q;
            }
            for (x, px) in dst_row.iter_mut().enumerate() {
                let lo = x.saturating_sub(radius);
                let hi = (x + radius).min(width - 1) + 1;
                let count = (hi - lo) as f32;
                px.i = (sum_i[hi] - sum_i[lo]) / count;
                px.q = (sum_q[hi] - sum_q[lo]) / count;
            }
        });
    out
}

/// Apply the composite look in place. Pixels whose phase-shifted sample
/// falls outside the row keep their source value. Alpha is preserved.
pub fn composite<R: Rng + ?Sized>(buffer: &mut PixelBuffer, params: &CompositeParams, rng: &mut R) {
    if buffer.is_empty() {
        return;
    }
    let width = buffer.width as usize;
    let height = buffer.height as usize;

    let yiq: Vec<Yiq> = buffer
        .data
        .par_chunks_exact(4)
        .map(|p| Yiq::from_rgb(p[0] as f32, p[1] as f32, p[2] as f32))
        .collect();
    let yiq = if params.bleed > 0 {
        bleed_chroma(&yiq, width, params.bleed as usize)
    } else {
        yiq
    };

    // Noise is drawn up front in raster order so the row pass can run in parallel.
    let noise: Option<Vec<f32>> = (params.noise > 0.0).then(|| {
        let amplitude = params.noise * 255.0;
        (0..width * height)
            .map(|_| (rng.gen_range(0.0f32..1.0) - 0.5) * amplitude)
            .collect()
    });

    let fringe = round_coord(params.fringing);
    let gap = params.scanline_gap.max(1) as usize;
    let row_bytes = buffer.stride();
    buffer
        .data
        .par_chunks_exact_mut(row_bytes)
        .enumerate()
        .for_each(|(y, row)| {
            let line = &yiq[y * width..(y + 1) * width];
            let offset = (y as f32 * 0.2 + params.phase_shift).sin() * params.phase_shift;
            for (x, pixel) in row.chunks_exact_mut(4).enumerate() {
                let phase_x = round_coord(x as f32 + offset);
                if phase_x < 0 || phase_x >= width as i64 {
                    continue;
                }
                let fringe_x = (phase_x - fringe).max(0) as usize;
                let chroma = line[fringe_x];

                let mut luma = line[phase_x as usize].y;
                if y % gap != 0 {
                    luma *= 1.0 - params.scanline_intensity;
                }
                if let Some(noise) = &noise {
                    luma += noise[y * width + x];
                }

                let rgb = Yiq {
                    y: luma,
                    i: chroma.i * params.saturation,
                    q: chroma.q * params.saturation,
                }
                .to_rgb();
                pixel[0] = to_u8(rgb[0]);
                pixel[1] = to_u8(rgb[1]);
                pixel[2] = to_u8(rgb[2]);
            }
        });
}
