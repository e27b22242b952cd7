//! Block dithering: the image is averaged down to a grid of
//! `pixelSize × pixelSize` cells, each cell is quantized to black/white or to
//! a small RGB palette, and the result is painted back at full size.

use std::str::FromStr;

use rand::Rng;
use rayon::prelude::*;

use crate::buffer::PixelBuffer;
use crate::color::luma_ntsc;
use crate::effects::{ParameterSet, float_param, int_param};

/// Floyd-Steinberg error distribution as `(dx, dy, weight)`:
///
/// ```text
///        X   7
///    3   5   1
/// ```
const FLOYD_STEINBERG: [(i64, i64, f32); 4] = [
    (1, 0, 7.0 / 16.0),
    (-1, 1, 3.0 / 16.0),
    (0, 1, 5.0 / 16.0),
    (1, 1, 1.0 / 16.0),
];

/// 4×4 ordered-dither threshold matrix, indexed `[y % 4][x % 4]`.
pub const BAYER_4X4: [[u8; 4]; 4] = [[0, 8, 2, 10], [12, 4, 14, 6], [3, 11, 1, 9], [15, 7, 13, 5]];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DitherPattern {
    #[default]
    FloydSteinberg,
    Bayer,
    Random,
}

impl FromStr for DitherPattern {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "FloydSteinberg" | "F-S" => Ok(Self::FloydSteinberg),
            "Bayer" => Ok(Self::Bayer),
            "Random" => Ok(Self::Random),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DitherParams {
    pub pixel_size: u32,
    pub color_mode: bool,
    pub pattern: DitherPattern,
    pub threshold: f32,
    pub color_count: u32,
}

impl Default for DitherParams {
    fn default() -> Self {
        Self {
            pixel_size: 1,
            color_mode: false,
            pattern: DitherPattern::FloydSteinberg,
            threshold: 128.0,
            color_count: 8,
        }
    }
}

impl DitherParams {
    pub fn from_params(params: &ParameterSet) -> Self {
        Self {
            pixel_size: int_param(params, "pixelSize", 1, 1, 20),
            color_mode: params.bool("isColorMode").unwrap_or(false),
            pattern: params
                .text("pattern")
                .and_then(|p| p.parse().ok())
                .unwrap_or_default(),
            threshold: float_param(params, "threshold", 128.0, 0.0, 255.0),
            color_count: int_param(params, "colorCount", 8, 2, 32),
        }
    }

    /// Ordered/random perturbation amplitude: one quantization step, so it
    /// shrinks as the palette grows.
    fn spread(&self) -> f32 {
        let levels = if self.color_mode { self.color_count } else { 2 };
        255.0 / (levels.max(2) - 1) as f32
    }
}

/// Black, white, then up to `count - 2` colours sampled from an N×N×N cube of
/// RGB space (red outermost), skipping duplicates.
pub fn generate_palette(count: u32) -> Vec<[u8; 3]> {
    let count = count.max(2) as usize;
    let mut palette = vec![[0, 0, 0], [255, 255, 255]];
    if count <= 2 {
        return palette;
    }

    let points = ((count - 2) as f64).cbrt().ceil().max(1.0) as u32;
    let step = 255.0 / (if points > 1 { points - 1 } else { 1 }) as f64;
    for r in 0..points {
        for g in 0..points {
            for b in 0..points {
                if palette.len() >= count {
                    return palette;
                }
                let color = [
                    (r as f64 * step).round() as u8,
                    (g as f64 * step).round() as u8,
                    (b as f64 * step).round() as u8,
                ];
                if !palette.contains(&color) {
                    palette.push(color);
                }
            }
        }
    }
    palette
}

/// Palette entry closest to `color` by luma-weighted squared distance. Ties go
/// to the earliest entry.
pub fn nearest_color(color: [f32; 3], palette: &[[u8; 3]]) -> [u8; 3] {
    let mut nearest = palette[0];
    let mut min_dist = f32::INFINITY;
    for candidate in palette {
        let dr = (color[0] - candidate[0] as f32) * 0.299;
        let dg = (color[1] - candidate[1] as f32) * 0.587;
        let db = (color[2] - candidate[2] as f32) * 0.114;
        let dist = dr * dr + dg * dg + db * db;
        if dist < min_dist {
            min_dist = dist;
            nearest = *candidate;
        }
    }
    nearest
}

/// Dither `buffer` in place.
pub fn dither<R: Rng + ?Sized>(buffer: &mut PixelBuffer, params: &DitherParams, rng: &mut R) {
    if buffer.is_empty() {
        return;
    }

    let width = buffer.width as usize;
    let height = buffer.height as usize;
    let cell = params.pixel_size.max(1) as usize;
    let grid_w = width.div_ceil(cell);
    let grid_h = height.div_ceil(cell);

    let mut grid = downsample(buffer, cell, grid_w, grid_h, params.color_mode);
    let palette = if params.color_mode {
        generate_palette(params.color_count)
    } else {
        Vec::new()
    };
    let quantize = |v: [f32; 3]| -> [f32; 3] {
        if params.color_mode {
            let c = nearest_color(v, &palette);
            [c[0] as f32, c[1] as f32, c[2] as f32]
        } else {
            let out = if v[0] < params.threshold { 0.0 } else { 255.0 };
            [out; 3]
        }
    };

    match params.pattern {
        DitherPattern::FloydSteinberg => {
            for gy in 0..grid_h {
                for gx in 0..grid_w {
                    let i = gy * grid_w + gx;
                    let old = grid[i];
                    let new = quantize(old);
                    grid[i] = new;
                    let err = [old[0] - new[0], old[1] - new[1], old[2] - new[2]];
                    for &(dx, dy, weight) in &FLOYD_STEINBERG {
                        let nx = gx as i64 + dx;
                        let ny = gy as i64 + dy;
                        if nx < 0 || nx >= grid_w as i64 || ny >= grid_h as i64 {
                            continue;
                        }
                        let n = &mut grid[ny as usize * grid_w + nx as usize];
                        for c in 0..3 {
                            n[c] += err[c] * weight;
                        }
                    }
                }
            }
        }
        DitherPattern::Bayer | DitherPattern::Random => {
            let spread = params.spread();
            for gy in 0..grid_h {
                for gx in 0..grid_w {
                    let t = match params.pattern {
                        DitherPattern::Bayer => BAYER_4X4[gy % 4][gx % 4] as f32 / 16.0,
                        _ => rng.gen_range(0.0f32..1.0),
                    };
                    let offset = (t - 0.5) * spread;
                    let v = &mut grid[gy * grid_w + gx];
                    *v = quantize([v[0] + offset, v[1] + offset, v[2] + offset]);
                }
            }
        }
    }

    paint(buffer, &grid, cell, grid_w);
}

/// Average each cell, counting only pixels inside the image. Mono mode stores
/// the NTSC luma in all three slots.
fn downsample(buffer: &PixelBuffer, cell: usize, grid_w: usize, grid_h: usize, color: bool) -> Vec<[f32; 3]> {
    let width = buffer.width as usize;
    let height = buffer.height as usize;
    let data = &buffer.data;

    (0..grid_h)
        .into_par_iter()
        .flat_map_iter(|gy| {
            (0..grid_w).map(move |gx| {
                let mut sum = [0.0f32; 3];
                let mut count = 0u32;
                for y in gy * cell..((gy + 1) * cell).min(height) {
                    for x in gx * cell..((gx + 1) * cell).min(width) {
                        let i = (y * width + x) * 4;
                        sum[0] += data[i] as f32;
                        sum[1] += data[i + 1] as f32;
                        sum[2] += data[i + 2] as f32;
                        count += 1;
                    }
                }
                let n = count.max(1) as f32;
                let avg = [sum[0] / n, sum[1] / n, sum[2] / n];
                if color {
                    avg
                } else {
                    [luma_ntsc(avg[0], avg[1], avg[2]); 3]
                }
            })
        })
        .collect()
}

fn paint(buffer: &mut PixelBuffer, grid: &[[f32; 3]], cell: usize, grid_w: usize) {
    let row_bytes = buffer.stride();
    buffer
        .data
        .par_chunks_exact_mut(row_bytes)
        .enumerate()
        .for_each(|(y, row)| {
            let gy = y / cell;
            for (x, pixel) in row.chunks_exact_mut(4).enumerate() {
                let v = grid[gy * grid_w + x / cell];
                pixel[0] = v[0] as u8;
                pixel[1] = v[1] as u8;
                pixel[2] = v[2] as u8;
                pixel[3] = 255;
            }
        });
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn gradient(w: u32, h: u32) -> PixelBuffer {
        let mut buf = PixelBuffer::new(w, h);
        for y in 0..h {
            for x in 0..w {
                let v = ((x + y) * 255 / (w + h - 2).max(1)) as u8;
                buf.pixel_mut(x, y).copy_from_slice(&[v, v / 2, 255 - v, 255]);
            }
        }
        buf
    }

    #[test]
    fn test_palette_for_eight_colors() {
        let palette = generate_palette(8);
        assert_eq!(
            palette,
            vec![
                [0, 0, 0],
                [255, 255, 255],
                [0, 0, 255],
                [0, 255, 0],
                [0, 255, 255],
                [255, 0, 0],
                [255, 0, 255],
                [255, 255, 0],
            ]
        );
    }

    #[test]
    fn test_palette_never_exceeds_count_and_has_no_duplicates() {
        for count in 2..=32 {
            let palette = generate_palette(count);
            assert!(palette.len() <= count as usize);
            assert_eq!(&palette[..2], &[[0, 0, 0], [255, 255, 255]]);
            for (i, a) in palette.iter().enumerate() {
                assert!(!palette[i + 1..].contains(a), "duplicate {a:?} for count {count}");
            }
        }
        assert_eq!(generate_palette(29).len(), 29);
    }

    #[test]
    fn test_nearest_color_prefers_first_on_tie() {
        let palette = [[10, 0, 0], [0, 0, 0], [20, 0, 0]];
        assert_eq!(nearest_color([10.0, 0.0, 0.0], &palette), [10, 0, 0]);
        let palette = [[0, 0, 0], [20, 0, 0]];
        assert_eq!(nearest_color([10.0, 0.0, 0.0], &palette), [0, 0, 0]);
    }

    #[test]
    fn test_extremes_pass_through_floyd_steinberg() {
        let mut buf = PixelBuffer::from_rgba(2, 2, vec![
            0, 0, 0, 255, 255, 255, 255, 255, //
            0, 0, 0, 255, 255, 255, 255, 255,
        ])
        .unwrap();
        let expected = buf.clone();
        dither(&mut buf, &DitherParams::default(), &mut StdRng::seed_from_u64(0));
        assert_eq!(buf, expected);
    }

    #[test]
    fn test_mono_output_is_binary_for_every_pattern() {
        for pattern in [DitherPattern::FloydSteinberg, DitherPattern::Bayer, DitherPattern::Random] {
            let mut buf = gradient(23, 17);
            let params = DitherParams {
                pattern,
                pixel_size: 3,
                ..Default::default()
            };
            dither(&mut buf, &params, &mut StdRng::seed_from_u64(3));
            for p in buf.data.chunks_exact(4) {
                assert!(p[0] == 0 || p[0] == 255, "{pattern:?} produced {}", p[0]);
                assert_eq!(p[0], p[1]);
                assert_eq!(p[1], p[2]);
                assert_eq!(p[3], 255);
            }
        }
    }

    #[test]
    fn test_color_output_stays_in_palette() {
        let palette = generate_palette(12);
        for pattern in [DitherPattern::FloydSteinberg, DitherPattern::Bayer] {
            let mut buf = gradient(20, 20);
            let params = DitherParams {
                pattern,
                color_mode: true,
                color_count: 12,
                ..Default::default()
            };
            dither(&mut buf, &params, &mut StdRng::seed_from_u64(0));
            for p in buf.data.chunks_exact(4) {
                assert!(palette.contains(&[p[0], p[1], p[2]]), "{:?} not in palette", p);
            }
        }
    }

    #[test]
    fn test_deterministic_patterns_repeat_exactly() {
        for pattern in [DitherPattern::FloydSteinberg, DitherPattern::Bayer] {
            let params = DitherParams {
                pattern,
                color_mode: true,
                ..Default::default()
            };
            let mut a = gradient(31, 9);
            let mut b = gradient(31, 9);
            dither(&mut a, &params, &mut StdRng::seed_from_u64(1));
            dither(&mut b, &params, &mut StdRng::seed_from_u64(2));
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_partial_cells_are_painted() {
        // 5x5 with 2x2 cells leaves a partial last row and column
        let mut buf = PixelBuffer::filled(5, 5, [250, 250, 250, 255]);
        let params = DitherParams {
            pixel_size: 2,
            ..Default::default()
        };
        dither(&mut buf, &params, &mut StdRng::seed_from_u64(0));
        assert_eq!(buf.pixel(4, 4), &[255, 255, 255, 255]);
        assert_eq!(buf.pixel(4, 0), &[255, 255, 255, 255]);
    }

    #[test]
    fn test_cells_are_uniform() {
        let mut buf = gradient(12, 12);
        let params = DitherParams {
            pixel_size: 4,
            pattern: DitherPattern::Bayer,
            ..Default::default()
        };
        dither(&mut buf, &params, &mut StdRng::seed_from_u64(0));
        for cy in 0..3 {
            for cx in 0..3 {
                let first = buf.pixel(cx * 4, cy * 4).to_vec();
                for y in 0..4 {
                    for x in 0..4 {
                        assert_eq!(buf.pixel(cx * 4 + x, cy * 4 + y), &first[..]);
                    }
                }
            }
        }
    }

    #[test]
    fn test_bayer_mid_gray_produces_pattern() {
        let mut buf = PixelBuffer::filled(4, 4, [100, 100, 100, 255]);
        let params = DitherParams {
            pattern: DitherPattern::Bayer,
            ..Default::default()
        };
        dither(&mut buf, &params, &mut StdRng::seed_from_u64(0));
        // 100 + (m/16 - 0.5) * 255 reaches 128 for matrix entries 10..=15
        let whites = buf.data.chunks_exact(4).filter(|p| p[0] == 255).count();
        assert_eq!(whites, 6);
        assert_eq!(buf.pixel(0, 0)[0], 0);
        assert_eq!(buf.pixel(2, 1)[0], 255);
    }

    #[test]
    fn test_from_params_clamps() {
        let set = ParameterSet::defaults(crate::effects::EffectId::Dithering)
            .with("pixelSize", crate::effects::ParameterValue::Int(0))
            .with("colorCount", crate::effects::ParameterValue::Int(99))
            .with("pattern", crate::effects::ParameterValue::Text("Bayer".into()));
        let params = DitherParams::from_params(&set);
        assert_eq!(params.pixel_size, 1);
        assert_eq!(params.color_count, 32);
        assert_eq!(params.pattern, DitherPattern::Bayer);
    }
}
