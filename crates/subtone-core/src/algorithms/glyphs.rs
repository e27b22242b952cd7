//! 8×8 bitmap glyphs for the ASCII character ramp. Rows are stored top to
//! bottom with the most significant bit as the leftmost pixel.

use std::str::FromStr;

pub const GLYPH_SIZE: u32 = 8;

/// Character ramp from lightest to heaviest.
pub const RAMP: [char; 9] = ['.', ':', 'c', 'o', 'P', 'O', '?', '@', '▉'];

pub type GlyphRows = [u8; GLYPH_SIZE as usize];

const MONO: [GlyphRows; 9] = [
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x18, 0x18, 0x00], // .
    [0x00, 0x18, 0x18, 0x00, 0x00, 0x18, 0x18, 0x00], // :
    [0x00, 0x00, 0x3C, 0x60, 0x60, 0x60, 0x3C, 0x00], // c
    [0x00, 0x00, 0x3C, 0x66, 0x66, 0x66, 0x3C, 0x00], // o
    [0x7C, 0x66, 0x66, 0x7C, 0x60, 0x60, 0x60, 0x00], // P
    [0x3C, 0x66, 0x66, 0x66, 0x66, 0x66, 0x3C, 0x00], // O
    [0x3C, 0x66, 0x06, 0x0C, 0x18, 0x00, 0x18, 0x00], // ?
    [0x3C, 0x66, 0x6E, 0x6E, 0x60, 0x62, 0x3C, 0x00], // @
    [0xFE, 0xFE, 0xFE, 0xFE, 0xFE, 0xFE, 0xFE, 0xFE], // ▉
];

const RETRO: [GlyphRows; 9] = [
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00],
    [0x00, 0x00, 0x10, 0x00, 0x00, 0x10, 0x00, 0x00],
    [0x00, 0x00, 0x38, 0x40, 0x40, 0x40, 0x38, 0x00],
    [0x00, 0x00, 0x38, 0x44, 0x44, 0x44, 0x38, 0x00],
    [0x78, 0x44, 0x44, 0x78, 0x40, 0x40, 0x40, 0x00],
    [0x38, 0x44, 0x44, 0x44, 0x44, 0x44, 0x38, 0x00],
    [0x38, 0x44, 0x04, 0x08, 0x10, 0x00, 0x10, 0x00],
    [0x38, 0x44, 0x5C, 0x54, 0x5C, 0x40, 0x38, 0x00],
    [0xFC, 0xFC, 0xFC, 0xFC, 0xFC, 0xFC, 0xFC, 0xFC],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AsciiFont {
    #[default]
    Mono,
    Retro,
}

impl FromStr for AsciiFont {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "mono" => Ok(Self::Mono),
            "retro" => Ok(Self::Retro),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GlyphAtlas {
    glyphs: &'static [GlyphRows; 9],
}

impl GlyphAtlas {
    pub fn new(font: AsciiFont) -> Self {
        let glyphs = match font {
            AsciiFont::Mono => &MONO,
            AsciiFont::Retro => &RETRO,
        };
        Self { glyphs }
    }

    /// Whether pixel (x, y) of the ramp glyph at `index` is set.
    pub fn sample(&self, index: usize, x: u32, y: u32) -> bool {
        if index >= RAMP.len() || x >= GLYPH_SIZE || y >= GLYPH_SIZE {
            return false;
        }
        let row = self.glyphs[index][y as usize];
        (row >> (GLYPH_SIZE - 1 - x)) & 1 == 1
    }

    /// Sample the glyph stretched over a `cell × cell` square.
    pub fn sample_scaled(&self, index: usize, dx: u32, dy: u32, cell: u32) -> bool {
        let cell = cell.max(1);
        self.sample(index, dx * GLYPH_SIZE / cell, dy * GLYPH_SIZE / cell)
    }

    pub fn coverage(&self, index: usize) -> u32 {
        self.glyphs
            .get(index)
            .map(|rows| rows.iter().map(|r| r.count_ones()).sum())
            .unwrap_or(0)
    }
}
