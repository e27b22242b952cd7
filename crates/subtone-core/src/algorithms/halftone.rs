use rayon::prelude::*;

use crate::buffer::PixelBuffer;
use crate::color::{luma_ntsc, to_u8};
use crate::effects::{ParameterSet, float_param, int_param};

#[derive(Debug, Clone, PartialEq)]
pub struct HalftoneParams {
    pub grid_size: u32,
    pub dot_scale: f32,
    pub grayscale: bool,
    pub black_background: bool,
}

impl Default for HalftoneParams {
    fn default() -> Self {
        Self {
            grid_size: 10,
            dot_scale: 1.0,
            grayscale: false,
            black_background: true,
        }
    }
}

impl HalftoneParams {
    pub fn from_params(params: &ParameterSet) -> Self {
        Self {
            grid_size: int_param(params, "gridSize", 10, 2, 50),
            dot_scale: float_param(params, "dotScale", 1.0, 0.1, 2.0),
            grayscale: params.bool("grayscale").unwrap_or(false),
            black_background: params.bool("blackBackground").unwrap_or(true),
        }
    }

    pub fn background(&self) -> [u8; 4] {
        let v = if self.black_background { 0 } else { 255 };
        [v, v, v, 255]
    }

    pub fn radius(&self) -> f32 {
        self.grid_size as f32 / 2.0 * self.dot_scale
    }

    /// Disc membership for a pixel at cell-local offset (dx, dy).
    pub fn in_dot(&self, dx: u32, dy: u32) -> bool {
        let center = self.grid_size as f32 / 2.0;
        let r = self.radius();
        let fx = dx as f32 - center;
        let fy = dy as f32 - center;
        fx * fx + fy * fy <= r * r
    }
}

/// Replace the buffer with one disc per grid cell, coloured by the cell average.
pub fn halftone(source: &PixelBuffer, params: &HalftoneParams) -> PixelBuffer {
    let mut output = PixelBuffer::filled(source.width, source.height, params.background());
    if source.is_empty() {
        return output;
    }

    let grid = params.grid_size.max(1);
    let band_bytes = output.stride() * grid as usize;
    output
        .data
        .par_chunks_mut(band_bytes)
        .enumerate()
        .for_each(|(band, rows)| {
            let y0 = band as u32 * grid;
            let band_height = (rows.len() / source.stride()) as u32;
            for x0 in (0..source.width).step_by(grid as usize) {
                let cell_w = grid.min(source.width - x0);

                let mut sum = [0u64; 3];
                for y in y0..y0 + band_height {
                    for x in x0..x0 + cell_w {
                        let p = source.pixel(x, y);
                        sum[0] += p[0] as u64;
                        sum[1] += p[1] as u64;
                        sum[2] += p[2] as u64;
                    }
                }
                let count = (cell_w * band_height) as f32;
                let mut avg = sum.map(|s| s as f32 / count);
                if params.grayscale {
                    let gray = luma_ntsc(avg[0], avg[1], avg[2]);
                    avg = [gray; 3];
                }
                let colour = [to_u8(avg[0]), to_u8(avg[1]), to_u8(avg[2]), 255];

                for dy in 0..band_height {
                    for dx in 0..cell_w {
                        if params.in_dot(dx, dy) {
                            let i = (dy as usize * source.width as usize + (x0 + dx) as usize) * 4;
                            rows[i..i + 4].copy_from_slice(&colour);
                        }
                    }
                }
            }
        });

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_white_square_produces_centered_disc() {
        let source = PixelBuffer::filled(4, 4, [255, 255, 255, 255]);
        let params = HalftoneParams {
            grid_size: 4,
            dot_scale: 1.0,
            grayscale: false,
            black_background: true,
        };
        let out = halftone(&source, &params);
        assert_eq!(out.pixel(0, 0), &[0, 0, 0, 255]);
        assert_eq!(out.pixel(2, 2), &[255, 255, 255, 255]);
        // distance 2 from (2, 2) is on the rim and included
        assert_eq!(out.pixel(0, 2), &[255, 255, 255, 255]);
    }

    #[test]
    fn test_pixels_outside_every_disc_are_background() {
        let mut source = PixelBuffer::new(23, 17);
        for (i, b) in source.data.iter_mut().enumerate() {
            *b = (i * 7 % 251) as u8;
        }
        let params = HalftoneParams {
            grid_size: 6,
            dot_scale: 0.7,
            grayscale: false,
            black_background: false,
        };
        let out = halftone(&source, &params);
        for y in 0..out.height {
            for x in 0..out.width {
                if !params.in_dot(x % 6, y % 6) {
                    assert_eq!(out.pixel(x, y), &[255, 255, 255, 255], "({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn test_partial_cells_average_only_valid_pixels() {
        // 5 wide with grid 4: the last column forms its own one-pixel-wide cell
        let mut source = PixelBuffer::filled(5, 4, [0, 0, 0, 255]);
        for y in 0..4 {
            source.pixel_mut(4, y).copy_from_slice(&[200, 100, 50, 255]);
        }
        let params = HalftoneParams {
            grid_size: 4,
            dot_scale: 2.0,
            grayscale: false,
            black_background: true,
        };
        let out = halftone(&source, &params);
        assert_eq!(out.pixel(4, 2), &[200, 100, 50, 255]);
    }

    #[test]
    fn test_grayscale_collapses_to_ntsc_luma() {
        let source = PixelBuffer::filled(4, 4, [255, 0, 0, 255]);
        let params = HalftoneParams {
            grid_size: 4,
            dot_scale: 1.0,
            grayscale: true,
            black_background: true,
        };
        let out = halftone(&source, &params);
        // 0.299 * 255 = 76.2
        assert_eq!(out.pixel(2, 2), &[76, 76, 76, 255]);
    }

    #[test]
    fn test_from_params_reads_background_choice() {
        let params = HalftoneParams::from_params(
            &ParameterSet::new().with("blackBackground", false.into()),
        );
        assert_eq!(params.background(), [255, 255, 255, 255]);
        assert_eq!(params.grid_size, 10);
    }
}
