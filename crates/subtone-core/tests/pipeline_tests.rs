use subtone_core::color::luma_bt709;
use subtone_core::*;
use subtone_test_harness::assertions::*;
use subtone_test_harness::builders::{AppStateBuilder, PixelBufferBuilder};
use subtone_test_harness::fixtures;

fn run(source: &PixelBuffer, state: &AppState, seed: u64) -> PipelineResult {
    let registry = EffectRegistry::with_builtins();
    run_pipeline(source, state, &registry, &mut EffectContext::seeded(seed))
}

#[test]
fn test_default_preprocessing_is_identity() {
    let source = fixtures::color_noise(9, 7);
    let result = run_pipeline(
        &source,
        &AppState::default(),
        &EffectRegistry::empty(),
        &mut EffectContext::seeded(3),
    );
    assert_eq!(result.effect, None);
    assert_eq!(result.frame, source);
}

#[test]
fn test_floyd_steinberg_keeps_extremes() {
    let source = PixelBufferBuilder::new(2, 2)
        .checkerboard(1, [0, 0, 0, 255], [255, 255, 255, 255])
        .build();
    let state = AppStateBuilder::new(EffectId::Dithering)
        .param("pattern", "FloydSteinberg")
        .param("isColorMode", false)
        .param("threshold", 128.0)
        .param("pixelSize", 1)
        .build();

    let result = run(&source, &state, 1);
    assert!(result.applied);
    assert_eq!(result.frame, source);
}

#[test]
fn test_mono_dithering_of_primaries_is_black_and_white() {
    let state = AppStateBuilder::new(EffectId::Dithering)
        .param("pattern", "FloydSteinberg")
        .param("isColorMode", false)
        .param("pixelSize", 1)
        .build();

    let result = run(&fixtures::primaries_2x2(), &state, 1);
    assert_binary(&result.frame);
    assert_alpha(&result.frame, 255);
    assert_pixel(&result.frame, 0, 0, [0, 0, 0, 255]);
    assert_pixel(&result.frame, 1, 0, [255, 255, 255, 255]);
}

#[test]
fn test_mono_dithering_is_binary_for_every_pattern() {
    let source = fixtures::color_noise(16, 12);
    for pattern in ["FloydSteinberg", "Bayer", "Random"] {
        for pixel_size in [1, 3] {
            let state = AppStateBuilder::new(EffectId::Dithering)
                .param("pattern", pattern)
                .param("pixelSize", pixel_size)
                .build();
            let result = run(&source, &state, 11);
            assert_binary(&result.frame);
            assert_dimensions(&result.frame, 16, 12);
        }
    }
}

#[test]
fn test_deterministic_dithering_ignores_seed() {
    let source = fixtures::gray_ramp(20, 6);
    for pattern in ["FloydSteinberg", "Bayer"] {
        let state = AppStateBuilder::new(EffectId::Dithering)
            .param("pattern", pattern)
            .param("isColorMode", true)
            .param("colorCount", 4)
            .build();
        let a = run(&source, &state, 1);
        let b = run(&source, &state, 999);
        assert_eq!(a.frame, b.frame, "{pattern} should not depend on the seed");
    }
}

#[test]
fn test_halftone_single_cell() {
    let source = PixelBuffer::filled(4, 4, [255, 255, 255, 255]);
    let state = AppStateBuilder::new(EffectId::Halftone)
        .param("gridSize", 4)
        .param("dotScale", 1.0)
        .param("blackBackground", true)
        .build();

    let result = run(&source, &state, 0);
    assert_pixel(&result.frame, 0, 0, [0, 0, 0, 255]);
    assert_pixel(&result.frame, 2, 2, [255, 255, 255, 255]);
}

#[test]
fn test_halftone_background_outside_dots() {
    let source = fixtures::color_noise(23, 17);
    let grid = 6u32;
    let state = AppStateBuilder::new(EffectId::Halftone)
        .param("gridSize", grid as i64)
        .param("dotScale", 0.5)
        .param("blackBackground", false)
        .build();

    let result = run(&source, &state, 0);
    let radius = grid as f32 / 2.0 * 0.5;
    for y in 0..source.height {
        for x in 0..source.width {
            let cx = (x / grid * grid) as f32 + grid as f32 / 2.0;
            let cy = (y / grid * grid) as f32 + grid as f32 / 2.0;
            let (dx, dy) = (x as f32 - cx, y as f32 - cy);
            if dx * dx + dy * dy > radius * radius {
                assert_pixel(&result.frame, x, y, [255, 255, 255, 255]);
            }
        }
    }
}

#[test]
fn test_camera_bloom_neutral_is_exact_identity() {
    let source = fixtures::color_noise(12, 9);
    let state = AppStateBuilder::new(EffectId::CameraBloom)
        .param("bloom", 0.0)
        .param("aberration", 0)
        .param("saturation", 1.0)
        .param("vignette", 0.0)
        .build();

    let result = run(&source, &state, 0);
    assert!(!result.applied);
    assert_eq!(result.frame, source);
}

#[test]
fn test_composite_neutral_round_trips_within_one() {
    let source = fixtures::color_noise(14, 10);
    let state = AppStateBuilder::new(EffectId::CompositeArtifact)
        .param("bleed", 0)
        .param("scanlineIntensity", 0.0)
        .param("noise", 0.0)
        .param("fringing", 0.0)
        .param("phaseShift", 0.0)
        .param("saturation", 1.0)
        .build();

    let result = run(&source, &state, 0);
    assert_buffers_close(&result.frame, &source, 1);
}

#[test]
fn test_pixel_sort_runs_are_monotonic() {
    let source = fixtures::color_noise(32, 8);
    let threshold = 90.0;
    let state = AppStateBuilder::new(EffectId::PixelSort)
        .param("threshold", threshold)
        .build();

    let result = run(&source, &state, 0);
    for y in 0..result.frame.height {
        let mut run: Vec<f32> = Vec::new();
        for x in 0..=result.frame.width {
            let b = (x < result.frame.width).then(|| {
                let px = result.frame.pixel(x, y);
                luma_bt709(px[0] as f32, px[1] as f32, px[2] as f32)
            });
            match b {
                Some(b) if b > threshold as f32 => run.push(b),
                _ => {
                    assert_non_decreasing(&run, "sorted run");
                    run.clear();
                }
            }
        }
    }
}

#[test]
fn test_every_effect_preserves_dimensions() {
    let source = fixtures::color_noise(13, 11);
    for effect in EffectId::all() {
        let result = run(&source, &AppState::new(effect), 5);
        assert_eq!(result.effect, Some(effect));
        assert_dimensions(&result.frame, 13, 11);
    }
}

#[test]
fn test_same_seed_reproduces_random_effects() {
    let source = fixtures::color_noise(10, 10);
    let state = AppStateBuilder::new(EffectId::CompositeArtifact)
        .param("noise", 0.8)
        .preprocessing("grain", 40.0)
        .build();
    assert_eq!(run(&source, &state, 42), run(&source, &state, 42));
}

fn translucent_noise(width: u32, height: u32, alpha: u8) -> PixelBuffer {
    let mut buffer = fixtures::color_noise(width, height);
    for px in buffer.data.chunks_exact_mut(4) {
        px[3] = alpha;
    }
    buffer
}

#[test]
fn test_preprocessing_leaves_alpha_alone() {
    let source = translucent_noise(9, 9, 128);
    let state = AppStateBuilder::new(EffectId::Dithering)
        .preprocessing("blackPoint", 20.0)
        .preprocessing("gamma", 1.8)
        .preprocessing("grain", 30.0)
        .build();
    let result = run_pipeline(&source, &state, &EffectRegistry::empty(), &mut EffectContext::seeded(8));
    assert_ne!(result.frame, source);
    assert_alpha(&result.frame, 128);
}

#[test]
fn test_alpha_is_opaque_unless_the_effect_carries_it() {
    let source = translucent_noise(12, 12, 128);
    for effect in EffectId::all() {
        let result = run(&source, &AppState::new(effect), 2);
        let expected = match effect {
            EffectId::CompositeArtifact | EffectId::CameraBloom => 128,
            _ => 255,
        };
        assert_alpha(&result.frame, expected);
    }
}
