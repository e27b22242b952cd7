use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::buffer::PixelBuffer;
use crate::color::to_u8;
use crate::effects::{ParameterDefinition, ParameterType, ParameterValue};
use crate::error::{CoreError, Result};

/// Global adjustments applied before any effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreprocessingParameters {
    pub black_point: f64,
    pub white_point: f64,
    pub gamma: f64,
    pub grain: f64,
}

impl Default for PreprocessingParameters {
    fn default() -> Self {
        Self {
            black_point: 0.0,
            white_point: 255.0,
            gamma: 1.0,
            grain: 0.0,
        }
    }
}

impl PreprocessingParameters {
    /// Control-panel descriptors for the preprocessing section.
    pub fn parameter_definitions() -> Vec<ParameterDefinition> {
        use ParameterType::Float;
        vec![
            ParameterDefinition::new(
                "blackPoint",
                "Black Point",
                Float { default: 0.0, min: 0.0, max: 255.0, step: 1.0 },
            ),
            ParameterDefinition::new(
                "whitePoint",
                "White Point",
                Float { default: 255.0, min: 0.0, max: 255.0, step: 1.0 },
            ),
            ParameterDefinition::new(
                "gamma",
                "Gamma",
                Float { default: 1.0, min: 0.1, max: 5.0, step: 0.05 },
            ),
            ParameterDefinition::new(
                "grain",
                "Grain",
                Float { default: 0.0, min: 0.0, max: 255.0, step: 1.0 },
            ),
        ]
    }

    pub fn parameter_definition(name: &str) -> Option<ParameterDefinition> {
        Self::parameter_definitions()
            .into_iter()
            .find(|def| def.name == name)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            "blackPoint" => Some(self.black_point),
            "whitePoint" => Some(self.white_point),
            "gamma" => Some(self.gamma),
            "grain" => Some(self.grain),
            _ => None,
        }
    }

    /// Set a field by its camelCase name after normalizing the value.
    /// Returns true if the stored value changed.
    pub fn set(&mut self, name: &str, value: ParameterValue) -> Result<bool> {
        let def = Self::parameter_definition(name).ok_or_else(|| CoreError::UnknownParameter {
            effect: "preprocessing".into(),
            name: name.into(),
        })?;
        // every preprocessing parameter is a Float definition
        let v = def.normalize(value)?.as_f64().unwrap_or_default();
        let slot = match name {
            "blackPoint" => &mut self.black_point,
            "whitePoint" => &mut self.white_point,
            "gamma" => &mut self.gamma,
            _ => &mut self.grain,
        };
        let changed = *slot != v;
        *slot = v;
        Ok(changed)
    }

    /// True when levels, gamma and grain all leave pixels untouched.
    pub fn is_identity(&self) -> bool {
        self.black_point <= 0.0 && self.white_point >= 255.0 && self.gamma == 1.0 && self.grain <= 0.0
    }

    /// Per-value transfer table for the deterministic part (levels + gamma).
    fn tone_lut(&self) -> [u8; 256] {
        let black = self.black_point.clamp(0.0, 255.0) as f32;
        let mut white = self.white_point.clamp(0.0, 255.0) as f32;
        if white <= black {
            white = black + 1.0;
        }
        let range = white - black;
        let gamma = if self.gamma > 0.0 && self.gamma.is_finite() {
            self.gamma as f32
        } else {
            1.0
        };

        let mut lut = [0u8; 256];
        for (v, out) in lut.iter_mut().enumerate() {
            let v = v as f32;
            let stretched = if range > 0.0 {
                ((v - black) / range * 255.0).clamp(0.0, 255.0)
            } else if v < black {
                0.0
            } else {
                255.0
            };
            let stretched = to_u8(stretched) as f32;
            *out = to_u8(255.0 * (stretched / 255.0).powf(gamma));
        }
        lut
    }
}

/// Apply levels, gamma and grain to RGB in place. Alpha is untouched.
pub fn preprocess<R: Rng + ?Sized>(buffer: &mut PixelBuffer, params: &PreprocessingParameters, rng: &mut R) {
    if buffer.is_empty() {
        return;
    }

    let lut = params.tone_lut();
    let row_bytes = buffer.stride();
    buffer
        .data
        .par_chunks_exact_mut(row_bytes)
        .for_each(|row| {
            for pixel in row.chunks_exact_mut(4) {
                pixel[0] = lut[pixel[0] as usize];
                pixel[1] = lut[pixel[1] as usize];
                pixel[2] = lut[pixel[2] as usize];
            }
        });

    // Grain draws from the shared random source, so it stays sequential.
    if params.grain > 0.0 {
        let grain = params.grain as f32;
        for pixel in buffer.data.chunks_exact_mut(4) {
            let noise = (rng.gen_range(0.0f32..1.0) - 0.5) * grain;
            for c in &mut pixel[..3] {
                *c = to_u8((*c as f32 + noise).clamp(0.0, 255.0));
            }
        }
    }
}
