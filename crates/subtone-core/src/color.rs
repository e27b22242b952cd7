//! Shared colour math. Two luma conventions coexist on purpose: NTSC weights
//! for dithering, halftone and composite video; BT.709 weights for ASCII,
//! pixel sorting and the camera effect.

/// NTSC / BT.601 luma.
#[inline]
pub fn luma_ntsc(r: f32, g: f32, b: f32) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}

/// ITU-R BT.709 luma.
#[inline]
pub fn luma_bt709(r: f32, g: f32, b: f32) -> f32 {
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

/// Round to the nearest byte value, saturating at 0 and 255.
#[inline]
pub fn to_u8(v: f32) -> u8 {
    // `as` saturates and maps NaN to 0
    v.round() as u8
}

/// Round-half-up to an integer coordinate.
#[inline]
pub fn round_coord(v: f32) -> i64 {
    (v + 0.5).floor() as i64
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Yiq {
    pub y: f32,
    pub i: f32,
    pub q: f32,
}

impl Yiq {
    pub fn from_rgb(r: f32, g: f32, b: f32) -> Self {
        Self {
            y: r * 0.299 + g * 0.587 + b * 0.114,
            i: r * 0.596 - g * 0.274 - b * 0.322,
            q: r * 0.211 - g * 0.523 + b * 0.312,
        }
    }

    /// Convert back to RGB, clamped to [0, 255].
    pub fn to_rgb(self) -> [f32; 3] {
        let r = self.y + self.i * 0.956 + self.q * 0.621;
        let g = self.y - self.i * 0.272 - self.q * 0.647;
        let b = self.y - self.i * 1.106 + self.q * 1.703;
        [r.clamp(0.0, 255.0), g.clamp(0.0, 255.0), b.clamp(0.0, 255.0)]
    }
}
