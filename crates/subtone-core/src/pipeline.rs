use std::collections::HashMap;

use chrono::{DateTime, Local};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use crate::algorithms::{
    AsciiParams, CameraBloomParams, CompositeParams, CrtParams, DitherParams, HalftoneParams,
    PixelSortParams, ascii, camera_bloom, composite, crt, dither, halftone, pixel_sort,
};
use crate::buffer::PixelBuffer;
use crate::effects::{EffectId, ParameterSet};
use crate::preprocess::preprocess;
use crate::state::AppState;

// =============================================================================
// PixelEffect trait and EffectContext
// =============================================================================

/// Per-run inputs that are not parameters: the random source and the clock.
pub struct EffectContext {
    pub rng: StdRng,
    pub now: DateTime<Local>,
}

impl EffectContext {
    /// A context seeded from `seed`, or from OS entropy when `None`.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            now: Local::now(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(Some(seed))
    }
}

/// Trait for pixel effects. Implementations receive the preprocessed buffer
/// and return a buffer of the same dimensions.
pub trait PixelEffect: Send + Sync {
    /// Process a frame, returning the modified frame. Takes ownership of the
    /// input buffer so in-place effects can avoid allocating a new buffer.
    fn process(&self, input: PixelBuffer, params: &ParameterSet, ctx: &mut EffectContext) -> PixelBuffer;

    /// Returns true if the given parameters produce an identity transform
    /// (output == input). Used to skip processing.
    fn is_identity(&self, params: &ParameterSet) -> bool {
        let _ = params;
        false
    }

    /// Text the caller should draw over the result, if any.
    fn overlay_label(&self, params: &ParameterSet, ctx: &EffectContext) -> Option<String> {
        let _ = (params, ctx);
        None
    }
}

// =============================================================================
// Built-in effects
// =============================================================================

pub struct DitheringEffect;

impl PixelEffect for DitheringEffect {
    fn process(&self, mut input: PixelBuffer, params: &ParameterSet, ctx: &mut EffectContext) -> PixelBuffer {
        dither(&mut input, &DitherParams::from_params(params), &mut ctx.rng);
        input
    }
}

pub struct CrtEffect;

impl PixelEffect for CrtEffect {
    fn process(&self, input: PixelBuffer, params: &ParameterSet, _ctx: &mut EffectContext) -> PixelBuffer {
        crt(&input, &CrtParams::from_params(params))
    }
}

/// YIQ composite-video artifacts ("PAL-M").
pub struct CompositeEffect;

impl PixelEffect for CompositeEffect {
    fn process(&self, mut input: PixelBuffer, params: &ParameterSet, ctx: &mut EffectContext) -> PixelBuffer {
        composite(&mut input, &CompositeParams::from_params(params), &mut ctx.rng);
        input
    }
}

pub struct HalftoneEffect;

impl PixelEffect for HalftoneEffect {
    fn process(&self, input: PixelBuffer, params: &ParameterSet, _ctx: &mut EffectContext) -> PixelBuffer {
        halftone(&input, &HalftoneParams::from_params(params))
    }
}

pub struct AsciiEffect;

impl PixelEffect for AsciiEffect {
    fn process(&self, input: PixelBuffer, params: &ParameterSet, _ctx: &mut EffectContext) -> PixelBuffer {
        ascii(&input, &AsciiParams::from_params(params))
    }
}

pub struct PixelSortEffect;

impl PixelEffect for PixelSortEffect {
    fn process(&self, input: PixelBuffer, params: &ParameterSet, _ctx: &mut EffectContext) -> PixelBuffer {
        pixel_sort(&input, &PixelSortParams::from_params(params))
    }
}

/// Bloom, aberration, saturation and vignette, plus the date stamp label.
pub struct CameraBloomEffect;

impl PixelEffect for CameraBloomEffect {
    fn process(&self, input: PixelBuffer, params: &ParameterSet, _ctx: &mut EffectContext) -> PixelBuffer {
        camera_bloom(&input, &CameraBloomParams::from_params(params))
    }

    fn is_identity(&self, params: &ParameterSet) -> bool {
        CameraBloomParams::from_params(params).is_identity()
    }

    fn overlay_label(&self, params: &ParameterSet, ctx: &EffectContext) -> Option<String> {
        CameraBloomParams::from_params(params).timestamp_label(&ctx.now)
    }
}

// =============================================================================
// Effect Registry
// =============================================================================

/// Maps EffectId to its PixelEffect implementation.
pub struct EffectRegistry {
    effects: HashMap<EffectId, Box<dyn PixelEffect>>,
}

impl EffectRegistry {
    /// An empty registry. Every lookup misses.
    pub fn empty() -> Self {
        Self {
            effects: HashMap::new(),
        }
    }

    /// Create a registry with all built-in effects registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        for effect in EffectId::all() {
            registry.register(effect, builtin(effect));
        }
        registry
    }

    /// Look up the pixel effect implementation for a given id.
    pub fn get(&self, effect: EffectId) -> Option<&dyn PixelEffect> {
        self.effects.get(&effect).map(|e| e.as_ref())
    }

    /// Register or replace an effect implementation.
    pub fn register(&mut self, effect: EffectId, implementation: Box<dyn PixelEffect>) {
        self.effects.insert(effect, implementation);
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn builtin(effect: EffectId) -> Box<dyn PixelEffect> {
    match effect {
        EffectId::Dithering => Box::new(DitheringEffect),
        EffectId::Crt => Box::new(CrtEffect),
        EffectId::CompositeArtifact => Box::new(CompositeEffect),
        EffectId::Halftone => Box::new(HalftoneEffect),
        EffectId::AsciiArt => Box::new(AsciiEffect),
        EffectId::PixelSort => Box::new(PixelSortEffect),
        EffectId::CameraBloom => Box::new(CameraBloomEffect),
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResult {
    pub frame: PixelBuffer,
    /// The effect that was looked up, or `None` when the registry had no
    /// implementation for the active effect.
    pub effect: Option<EffectId>,
    /// False when the effect was skipped as an identity or missing.
    pub applied: bool,
    /// Overlay text for the caller to draw (CameraBloom timestamp).
    pub label: Option<String>,
}

/// Run preprocessing and the active effect on a copy of `source`.
///
/// The source is never mutated. A registry miss is not an error: the result
/// is the preprocessed image with `effect == None`.
pub fn run_pipeline(
    source: &PixelBuffer,
    state: &AppState,
    registry: &EffectRegistry,
    ctx: &mut EffectContext,
) -> PipelineResult {
    let mut frame = source.clone();
    if state.preprocessing.is_identity() {
        debug!("preprocessing is identity, skipped");
    } else {
        preprocess(&mut frame, &state.preprocessing, &mut ctx.rng);
    }

    let effect_id = state.active_effect;
    let params = state.active_parameters();
    let Some(effect) = registry.get(effect_id) else {
        debug!(effect = %effect_id, "no implementation registered, effect skipped");
        return PipelineResult {
            frame,
            effect: None,
            applied: false,
            label: None,
        };
    };

    let label = effect.overlay_label(params, ctx);
    let applied = if effect.is_identity(params) {
        debug!(effect = %effect_id, "identity parameters, effect skipped");
        false
    } else {
        frame = effect.process(frame, params, ctx);
        true
    };

    PipelineResult {
        frame,
        effect: Some(effect_id),
        applied,
        label,
    }
}
