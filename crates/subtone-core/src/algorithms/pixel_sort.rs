//! Threshold-gated pixel sorting along rows or columns of a rotated canvas.

use std::str::FromStr;

use rayon::prelude::*;

use crate::buffer::PixelBuffer;
use crate::color::luma_bt709;
use crate::effects::{ParameterSet, float_param};

type Rgba = [u8; 4];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Horizontal,
    Vertical,
}

impl FromStr for SortDirection {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "Horizontal" => Ok(Self::Horizontal),
            "Vertical" => Ok(Self::Vertical),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PixelSortParams {
    pub angle_deg: f32,
    pub direction: SortDirection,
    pub threshold: f32,
}

impl Default for PixelSortParams {
    fn default() -> Self {
        Self {
            angle_deg: 0.0,
            direction: SortDirection::Horizontal,
            threshold: 100.0,
        }
    }
}

impl PixelSortParams {
    pub fn from_params(params: &ParameterSet) -> Self {
        Self {
            angle_deg: float_param(params, "angleDeg", 0.0, -45.0, 45.0),
            direction: params
                .text("direction")
                .and_then(|d| d.parse().ok())
                .unwrap_or_default(),
            threshold: float_param(params, "threshold", 100.0, 0.0, 255.0),
        }
    }
}

fn brightness(p: &Rgba) -> f32 {
    luma_bt709(p[0] as f32, p[1] as f32, p[2] as f32)
}

/// A pixel grid used as the rotation working canvas.
struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<Rgba>,
}

impl Canvas {
    fn from_buffer(buffer: &PixelBuffer) -> Self {
        Self {
            width: buffer.width as usize,
            height: buffer.height as usize,
            pixels: buffer
                .data
                .chunks_exact(4)
                .map(|p| [p[0], p[1], p[2], p[3]])
                .collect(),
        }
    }

    /// Nearest-neighbour rotation by `theta` radians about the centre into a
    /// `width × height` canvas. Uncovered pixels are transparent black.
    fn rotated(&self, theta: f32, width: usize, height: usize) -> Self {
        let (sin, cos) = theta.sin_cos();
        let (dst_cx, dst_cy) = (width as f32 / 2.0, height as f32 / 2.0);
        let (src_cx, src_cy) = (self.width as f32 / 2.0, self.height as f32 / 2.0);

        let mut pixels = vec![[0u8; 4]; width * height];
        pixels
            .par_chunks_exact_mut(width.max(1))
            .enumerate()
            .for_each(|(y, row)| {
                let dy = y as f32 + 0.5 - dst_cy;
                for (x, px) in row.iter_mut().enumerate() {
                    let dx = x as f32 + 0.5 - dst_cx;
                    let sx = (dx * cos + dy * sin + src_cx).floor();
                    let sy = (-dx * sin + dy * cos + src_cy).floor();
                    if sx >= 0.0 && sy >= 0.0 && (sx as usize) < self.width && (sy as usize) < self.height {
                        *px = self.pixels[sy as usize * self.width + sx as usize];
                    }
                }
            });
        Self { width, height, pixels }
    }

    fn transposed(&self) -> Self {
        let mut pixels = Vec::with_capacity(self.pixels.len());
        for x in 0..self.width {
            for y in 0..self.height {
                pixels.push(self.pixels[y * self.width + x]);
            }
        }
        Self {
            width: self.height,
            height: self.width,
            pixels,
        }
    }

    fn sort_rows(&mut self, threshold: f32) {
        if self.width == 0 {
            return;
        }
        self.pixels
            .par_chunks_exact_mut(self.width)
            .for_each(|line| sort_runs(line, threshold));
    }
}

/// Sort every run of pixels brighter than `threshold` by ascending
/// brightness. Pixels at or below the threshold stay where they are.
pub fn sort_runs(line: &mut [Rgba], threshold: f32) {
    let mut start = None;
    for i in 0..=line.len() {
        let in_run = i < line.len() && brightness(&line[i]) > threshold;
        match (in_run, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                line[s..i].sort_by(|a, b| brightness(a).total_cmp(&brightness(b)));
                start = None;
            }
            _ => {}
        }
    }
}

/// Size of the canvas that holds a `width × height` image rotated by `theta`.
pub fn rotated_extent(width: u32, height: u32, theta: f32) -> (usize, usize) {
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
    let (w, h) = (width as f32, height as f32);
    ((w * cos + h * sin).floor() as usize, (w * sin + h * cos).floor() as usize)
}

/// Rotate, sort along the chosen axis, rotate back. Output has the source
/// dimensions and opaque alpha.
pub fn pixel_sort(source: &PixelBuffer, params: &PixelSortParams) -> PixelBuffer {
    if source.is_empty() {
        return PixelBuffer::new(source.width, source.height);
    }

    let theta = params.angle_deg.to_radians();
    let original = Canvas::from_buffer(source);
    let (rot_w, rot_h) = rotated_extent(source.width, source.height, theta);
    let mut working = if theta == 0.0 {
        original
    } else {
        original.rotated(theta, rot_w, rot_h)
    };

    match params.direction {
        SortDirection::Horizontal => working.sort_rows(params.threshold),
        SortDirection::Vertical => {
            let mut columns = working.transposed();
            columns.sort_rows(params.threshold);
            working = columns.transposed();
        }
    }

    let restored = if theta == 0.0 {
        working
    } else {
        working.rotated(-theta, source.width as usize, source.height as usize)
    };

    let mut output = PixelBuffer::new(source.width, source.height);
    for (dst, px) in output.data.chunks_exact_mut(4).zip(&restored.pixels) {
        dst[..3].copy_from_slice(&px[..3]);
        dst[3] = 255;
    }
    output
}
