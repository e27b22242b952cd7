use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// The closed set of effects the pipeline knows how to apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EffectId {
    #[default]
    #[serde(rename = "dithering")]
    Dithering,
    #[serde(rename = "crt")]
    Crt,
    #[serde(rename = "pal-m")]
    CompositeArtifact,
    #[serde(rename = "halftone")]
    Halftone,
    #[serde(rename = "ascii")]
    AsciiArt,
    #[serde(rename = "pixel-sort")]
    PixelSort,
    #[serde(rename = "y2k-cam")]
    CameraBloom,
}

impl EffectId {
    /// Stable identifier used in state files and on the command line.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Dithering => "dithering",
            Self::Crt => "crt",
            Self::CompositeArtifact => "pal-m",
            Self::Halftone => "halftone",
            Self::AsciiArt => "ascii",
            Self::PixelSort => "pixel-sort",
            Self::CameraBloom => "y2k-cam",
        }
    }

    /// Human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Dithering => "DITHERING",
            Self::Crt => "CRT",
            Self::CompositeArtifact => "PAL-M",
            Self::Halftone => "HALFTONE",
            Self::AsciiArt => "ASCII",
            Self::PixelSort => "PIXEL SORT",
            Self::CameraBloom => "Y2K CAM",
        }
    }

    /// All built-in effects, in menu order.
    pub fn all() -> [EffectId; 7] {
        [
            Self::Dithering,
            Self::Crt,
            Self::CompositeArtifact,
            Self::Halftone,
            Self::AsciiArt,
            Self::PixelSort,
            Self::CameraBloom,
        ]
    }

    /// Parameter definitions for this effect.
    pub fn parameter_definitions(&self) -> Vec<ParameterDefinition> {
        use ParameterType::*;
        match self {
            Self::Dithering => vec![
                ParameterDefinition::new("pixelSize", "Pixel Size", Int { default: 1, min: 1, max: 20 }),
                ParameterDefinition::new("isColorMode", "Color Mode", Bool { default: false }),
                ParameterDefinition::new(
                    "pattern",
                    "Pattern",
                    Choice {
                        default: "FloydSteinberg",
                        options: &["FloydSteinberg", "Bayer", "Random"],
                    },
                ),
                ParameterDefinition::new(
                    "threshold",
                    "Threshold",
                    Float { default: 128.0, min: 0.0, max: 255.0, step: 1.0 },
                ),
                ParameterDefinition::new("colorCount", "Color Count", Int { default: 8, min: 2, max: 32 }),
            ],
            Self::Crt => vec![
                ParameterDefinition::new(
                    "distortion",
                    "Distortion",
                    Float { default: 0.03, min: 0.0, max: 0.1, step: 0.005 },
                ),
                ParameterDefinition::new("dotPitch", "Dot Pitch", Int { default: 4, min: 1, max: 10 }),
                ParameterDefinition::new(
                    "dotScale",
                    "Dot Scale",
                    Float { default: 1.0, min: 0.5, max: 1.5, step: 0.05 },
                ),
                ParameterDefinition::new(
                    "pattern",
                    "Pattern",
                    Choice { default: "Monitor", options: &["Monitor", "TV", "LCD"] },
                ),
                ParameterDefinition::new(
                    "convergence",
                    "Convergence",
                    Float { default: 1.0, min: 0.0, max: 5.0, step: 0.1 },
                ),
            ],
            Self::CompositeArtifact => vec![
                ParameterDefinition::new("bleed", "Color Bleed", Int { default: 8, min: 0, max: 40 }),
                ParameterDefinition::new(
                    "scanlineIntensity",
                    "Scanline Intensity",
                    Float { default: 0.3, min: 0.0, max: 1.0, step: 0.05 },
                ),
                ParameterDefinition::new("scanlineGap", "Scanline Gap", Int { default: 2, min: 2, max: 16 }),
                ParameterDefinition::new(
                    "noise",
                    "Signal Noise",
                    Float { default: 0.15, min: 0.0, max: 1.0, step: 0.01 },
                ),
                ParameterDefinition::new(
                    "fringing",
                    "Fringing",
                    Float { default: 2.0, min: 0.0, max: 20.0, step: 0.1 },
                ),
                ParameterDefinition::new(
                    "saturation",
                    "Saturation",
                    Float { default: 1.0, min: 0.0, max: 3.0, step: 0.1 },
                ),
                ParameterDefinition::new(
                    "phaseShift",
                    "Phase Shift",
                    Float { default: 2.0, min: 0.0, max: 10.0, step: 0.1 },
                ),
            ],
            Self::Halftone => vec![
                ParameterDefinition::new("gridSize", "Grid Size", Int { default: 10, min: 2, max: 50 }),
                ParameterDefinition::new(
                    "dotScale",
                    "Dot Scale",
                    Float { default: 1.0, min: 0.1, max: 2.0, step: 0.05 },
                ),
                ParameterDefinition::new("grayscale", "Grayscale", Bool { default: false }),
                ParameterDefinition::new("blackBackground", "Black Background", Bool { default: true }),
            ],
            Self::AsciiArt => vec![
                ParameterDefinition::new("cellSize", "Resolution", Int { default: 8, min: 4, max: 32 }),
                ParameterDefinition::new("invert", "Invert Image", Bool { default: false }),
                ParameterDefinition::new("isColor", "Enable Color", Bool { default: true }),
                ParameterDefinition::new(
                    "colorBoost",
                    "Color Boost",
                    Float { default: 1.5, min: 0.5, max: 5.0, step: 0.1 },
                ),
                ParameterDefinition::new(
                    "font",
                    "Font Style",
                    Choice { default: "mono", options: &["mono", "retro"] },
                ),
            ],
            Self::PixelSort => vec![
                ParameterDefinition::new(
                    "angleDeg",
                    "Angle",
                    Float { default: 0.0, min: -45.0, max: 45.0, step: 1.0 },
                ),
                ParameterDefinition::new(
                    "direction",
                    "Direction",
                    Choice { default: "Horizontal", options: &["Horizontal", "Vertical"] },
                ),
                ParameterDefinition::new(
                    "threshold",
                    "Sort Threshold",
                    Float { default: 100.0, min: 0.0, max: 255.0, step: 1.0 },
                ),
            ],
            Self::CameraBloom => vec![
                ParameterDefinition::new(
                    "bloom",
                    "Bloom",
                    Float { default: 0.4, min: 0.0, max: 1.0, step: 0.05 },
                ),
                ParameterDefinition::new("aberration", "Aberration", Int { default: 3, min: 0, max: 20 }),
                ParameterDefinition::new(
                    "saturation",
                    "Saturation",
                    Float { default: 1.2, min: 0.0, max: 2.5, step: 0.05 },
                ),
                ParameterDefinition::new(
                    "vignette",
                    "Vignette",
                    Float { default: 0.3, min: 0.0, max: 1.0, step: 0.05 },
                ),
                ParameterDefinition::new("showTimestamp", "Show Timestamp", Bool { default: true }),
                ParameterDefinition::new(
                    "customTimestamp",
                    "Timestamp Text",
                    Text { default: "", max_len: 9 },
                ),
            ],
        }
    }

    /// Look up a single parameter definition by name.
    pub fn parameter_definition(&self, name: &str) -> Option<ParameterDefinition> {
        self.parameter_definitions()
            .into_iter()
            .find(|def| def.name == name)
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for EffectId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .into_iter()
            .find(|e| e.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownEffect(s.to_string()))
    }
}

/// The type of a parameter, with its default and accepted domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ParameterType {
    Float { default: f64, min: f64, max: f64, step: f64 },
    Int { default: i64, min: i64, max: i64 },
    Bool { default: bool },
    Choice { default: &'static str, options: &'static [&'static str] },
    Text { default: &'static str, max_len: usize },
}

impl ParameterType {
    fn kind(&self) -> &'static str {
        match self {
            Self::Float { .. } => "float",
            Self::Int { .. } => "integer",
            Self::Bool { .. } => "boolean",
            Self::Choice { .. } => "choice",
            Self::Text { .. } => "text",
        }
    }
}

/// Definition of a parameter on an effect. Doubles as the control-panel
/// descriptor for callers that build a UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDefinition {
    pub name: &'static str,
    pub label: &'static str,
    pub param_type: ParameterType,
}

impl ParameterDefinition {
    pub fn new(name: &'static str, label: &'static str, param_type: ParameterType) -> Self {
        Self {
            name,
            label,
            param_type,
        }
    }

    pub fn default_value(&self) -> ParameterValue {
        match &self.param_type {
            ParameterType::Float { default, .. } => ParameterValue::Float(*default),
            ParameterType::Int { default, .. } => ParameterValue::Int(*default),
            ParameterType::Bool { default } => ParameterValue::Bool(*default),
            ParameterType::Choice { default, .. } => ParameterValue::Text((*default).to_string()),
            ParameterType::Text { default, .. } => ParameterValue::Text((*default).to_string()),
        }
    }

    /// Coerce a value into this parameter's domain. Numbers are clamped rather
    /// than rejected; only type mismatches and unknown choices fail.
    pub fn normalize(&self, value: ParameterValue) -> Result<ParameterValue> {
        let mismatch = || CoreError::ParameterTypeMismatch {
            name: self.name.to_string(),
            expected: self.param_type.kind(),
        };
        match (&self.param_type, value) {
            (ParameterType::Float { default, min, max, .. }, v) => {
                let f = v.as_f64().ok_or_else(mismatch)?;
                let f = if f.is_finite() { f } else { *default };
                Ok(ParameterValue::Float(f.clamp(*min, *max)))
            }
            (ParameterType::Int { default, min, max }, v) => {
                let i = match v {
                    ParameterValue::Int(i) => i,
                    ParameterValue::Float(f) if f.is_finite() => f.round() as i64,
                    ParameterValue::Float(_) => *default,
                    _ => return Err(mismatch()),
                };
                Ok(ParameterValue::Int(i.clamp(*min, *max)))
            }
            (ParameterType::Bool { .. }, ParameterValue::Bool(b)) => Ok(ParameterValue::Bool(b)),
            (ParameterType::Choice { options, .. }, ParameterValue::Text(s)) => options
                .iter()
                .find(|o| o.eq_ignore_ascii_case(s.trim()))
                .map(|o| ParameterValue::Text((*o).to_string()))
                .ok_or_else(|| CoreError::InvalidChoice {
                    name: self.name.to_string(),
                    value: s,
                }),
            (ParameterType::Text { max_len, .. }, ParameterValue::Text(s)) => {
                Ok(ParameterValue::Text(s.chars().take(*max_len).collect()))
            }
            _ => Err(mismatch()),
        }
    }

    /// Parse a command-line style `value` string for this parameter, then
    /// normalize it.
    pub fn parse(&self, raw: &str) -> Result<ParameterValue> {
        let raw = raw.trim();
        let mismatch = || CoreError::ParameterTypeMismatch {
            name: self.name.to_string(),
            expected: self.param_type.kind(),
        };
        let value = match &self.param_type {
            ParameterType::Float { .. } | ParameterType::Int { .. } => {
                ParameterValue::Float(raw.parse::<f64>().map_err(|_| mismatch())?)
            }
            ParameterType::Bool { .. } => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "on" | "yes" => ParameterValue::Bool(true),
                "false" | "0" | "off" | "no" => ParameterValue::Bool(false),
                _ => return Err(mismatch()),
            },
            ParameterType::Choice { .. } | ParameterType::Text { .. } => {
                ParameterValue::Text(raw.to_string())
            }
        };
        self.normalize(value)
    }
}

/// A concrete parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParameterValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl From<bool> for ParameterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for ParameterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ParameterValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for ParameterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ParameterValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// The flat name → value mapping of one effect's parameters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    values: BTreeMap<String, ParameterValue>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default values for every parameter of `effect`.
    pub fn defaults(effect: EffectId) -> Self {
        let values = effect
            .parameter_definitions()
            .into_iter()
            .map(|def| (def.name.to_string(), def.default_value()))
            .collect();
        Self { values }
    }

    /// Insert a value as-is. Callers that need range checking go through
    /// `AppState::update`.
    pub fn with(mut self, name: &str, value: ParameterValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: ParameterValue) -> Option<ParameterValue> {
        self.values.insert(name.to_string(), value)
    }

    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.values.get(name)
    }

    /// Numeric value; integers widen to float.
    pub fn float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ParameterValue::as_f64)
    }

    /// Integer value; floats round to nearest.
    pub fn int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            ParameterValue::Int(i) => Some(*i),
            ParameterValue::Float(f) if f.is_finite() => Some(f.round() as i64),
            _ => None,
        }
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            ParameterValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            ParameterValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Numeric parameter lookup with a fallback and a clamp, used by the typed
/// parameter structs of each algorithm.
pub(crate) fn float_param(params: &ParameterSet, name: &str, default: f64, min: f64, max: f64) -> f32 {
    let v = params.float(name).filter(|v| v.is_finite()).unwrap_or(default);
    v.clamp(min, max) as f32
}

pub(crate) fn int_param(params: &ParameterSet, name: &str, default: i64, min: i64, max: i64) -> u32 {
    params.int(name).unwrap_or(default).clamp(min, max) as u32
}
