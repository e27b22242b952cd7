//! Early-2000s digital camera look: bloom on highlights, lateral chromatic
//! aberration, saturation, vignette and a date stamp label.

use chrono::{DateTime, TimeZone};
use rayon::prelude::*;

use crate::buffer::PixelBuffer;
use crate::color::{luma_bt709, to_u8};
use crate::effects::{ParameterSet, float_param, int_param};

/// Normalized luma below which a pixel contributes nothing to bloom.
pub const BLOOM_CUTOFF: f32 = 0.7;
pub const BLOOM_RADIUS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct CameraBloomParams {
    pub bloom: f32,
    pub aberration: u32,
    pub saturation: f32,
    pub vignette: f32,
    pub show_timestamp: bool,
    pub custom_timestamp: String,
}

impl Default for CameraBloomParams {
    fn default() -> Self {
        Self {
            bloom: 0.4,
            aberration: 3,
            saturation: 1.2,
            vignette: 0.3,
            show_timestamp: true,
            custom_timestamp: String::new(),
        }
    }
}

impl CameraBloomParams {
    pub fn from_params(params: &ParameterSet) -> Self {
        Self {
            bloom: float_param(params, "bloom", 0.4, 0.0, 1.0),
            aberration: int_param(params, "aberration", 3, 0, 20),
            saturation: float_param(params, "saturation", 1.2, 0.0, 2.5),
            vignette: float_param(params, "vignette", 0.3, 0.0, 1.0),
            show_timestamp: params.bool("showTimestamp").unwrap_or(true),
            custom_timestamp: params.text("customTimestamp").unwrap_or_default().to_string(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.bloom <= 0.0 && self.aberration == 0 && self.saturation == 1.0 && self.vignette <= 0.0
    }

    /// Date stamp text, or `None` when the stamp is switched off.
    pub fn timestamp_label<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<String>
    where
        Tz::Offset: std::fmt::Display,
    {
        if !self.show_timestamp {
            return None;
        }
        let custom = self.custom_timestamp.trim();
        if custom.is_empty() {
            Some(now.format("%d.%m.'%y").to_string())
        } else {
            Some(custom.to_string())
        }
    }
}

/// Mask free-form input into the `DD.MM.'YY` shape: non-digits are dropped
/// and at most six digits are kept.
pub fn format_timestamp_input(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).take(6).collect();
    let mut out = String::with_capacity(9);
    for (i, d) in digits.chars().enumerate() {
        match i {
            2 => out.push('.'),
            4 => out.push_str(".'"),
            _ => {}
        }
        out.push(d);
    }
    out
}

/// Bright-pass then box blur, as RGB floats per pixel.
fn bloom_source(source: &PixelBuffer) -> Vec<[f32; 3]> {
    let width = source.width as usize;
    let height = source.height as usize;

    let bright: Vec<[f32; 3]> = source
        .data
        .par_chunks_exact(4)
        .map(|p| {
            let (r, g, b) = (p[0] as f32, p[1] as f32, p[2] as f32);
            if luma_bt709(r, g, b) / 255.0 < BLOOM_CUTOFF {
                [0.0; 3]
            } else {
                [r, g, b]
            }
        })
        .collect();

    // The clipped square window is a product of clipped ranges, so two 1-D
    // passes give the same average as the 2-D box.
    let mut horizontal = vec![[0.0f32; 3]; width * height];
    horizontal
        .par_chunks_exact_mut(width)
        .zip(bright.par_chunks_exact(width))
        .for_each(|(dst, src)| box_1d(src, dst));

    let columns: Vec<Vec<[f32; 3]>> = (0..width)
        .into_par_iter()
        .map(|x| {
            let column: Vec<[f32; 3]> = (0..height).map(|y| horizontal[y * width + x]).collect();
            let mut out = vec![[0.0f32; 3]; height];
            box_1d(&column, &mut out);
            out
        })
        .collect();

    let mut blurred = vec![[0.0f32; 3]; width * height];
    for (x, column) in columns.into_iter().enumerate() {
        for (y, px) in column.into_iter().enumerate() {
            blurred[y * width + x] = px;
        }
    }
    blurred
}

fn box_1d(src: &[[f32; 3]], dst: &mut [[f32; 3]]) {
    let last = src.len() - 1;
    for (i, out) in dst.iter_mut().enumerate() {
        let lo = i.saturating_sub(BLOOM_RADIUS);
        let hi = (i + BLOOM_RADIUS).min(last);
        let mut acc = [0.0f32; 3];
        for px in &src[lo..=hi] {
            acc[0] += px[0];
            acc[1] += px[1];
            acc[2] += px[2];
        }
        let count = (hi - lo + 1) as f32;
        *out = acc.map(|a| a / count);
    }
}

/// Render the camera look into a new buffer. Alpha is carried over from
/// `source`.
pub fn camera_bloom(source: &PixelBuffer, params: &CameraBloomParams) -> PixelBuffer {
    let mut output = source.clone();
    if source.is_empty() {
        return output;
    }

    let width = source.width as usize;
    let bloom = (params.bloom > 0.0).then(|| bloom_source(source));
    let shift = params.aberration as usize;
    let half_w = source.width as f32 / 2.0;
    let half_h = source.height as f32 / 2.0;
    let max_dist = (half_w * half_w + half_h * half_h).sqrt();

    let row_bytes = output.stride();
    output
        .data
        .par_chunks_exact_mut(row_bytes)
        .enumerate()
        .for_each(|(y, row)| {
            let src_row = &source.data[y * row_bytes..(y + 1) * row_bytes];
            for (x, pixel) in row.chunks_exact_mut(4).enumerate() {
                let red_x = x.saturating_sub(shift);
                let blue_x = (x + shift).min(width - 1);
                let mut r = src_row[red_x * 4] as f32;
                let mut g = src_row[x * 4 + 1] as f32;
                let mut b = src_row[blue_x * 4 + 2] as f32;

                if params.saturation != 1.0 {
                    let gray = luma_bt709(r, g, b);
                    let s = params.saturation;
                    r = (gray + (r - gray) * s).clamp(0.0, 255.0);
                    g = (gray + (g - gray) * s).clamp(0.0, 255.0);
                    b = (gray + (b - gray) * s).clamp(0.0, 255.0);
                }

                if let Some(bloom) = &bloom {
                    let glow = bloom[y * width + x];
                    r = (r + glow[0] * params.bloom).min(255.0);
                    g = (g + glow[1] * params.bloom).min(255.0);
                    b = (b + glow[2] * params.bloom).min(255.0);
                }

                let factor = if params.vignette > 0.0 && max_dist > 0.0 {
                    let dx = x as f32 - half_w;
                    let dy = y as f32 - half_h;
                    1.0 - (dx * dx + dy * dy).sqrt() / max_dist * params.vignette
                } else {
                    1.0
                };

                pixel[0] = to_u8(r * factor);
                pixel[1] = to_u8(g * factor);
                pixel[2] = to_u8(b * factor);
            }
        });

    output
}
