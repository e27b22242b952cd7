//! Pixel algorithms, one module per effect. Each exposes a typed parameter
//! struct built from a [`ParameterSet`](crate::effects::ParameterSet) and a
//! free function that does the work.

pub mod ascii;
pub mod camera_bloom;
pub mod composite;
pub mod crt;
pub mod dithering;
pub mod glyphs;
pub mod halftone;
pub mod pixel_sort;

pub use ascii::{AsciiParams, ascii};
pub use camera_bloom::{CameraBloomParams, camera_bloom, format_timestamp_input};
pub use composite::{CompositeParams, composite};
pub use crt::{CrtParams, MaskPattern, crt};
pub use dithering::{DitherParams, DitherPattern, dither};
pub use glyphs::AsciiFont;
pub use halftone::{HalftoneParams, halftone};
pub use pixel_sort::{PixelSortParams, SortDirection, pixel_sort};
