use subtone_core::*;
use subtone_test_harness::builders::AppStateBuilder;
use subtone_test_harness::fixtures;

#[test]
fn test_state_round_trips_through_a_file() {
    let dir = fixtures::fixture_dir();
    let state = AppStateBuilder::new(EffectId::AsciiArt)
        .param("font", "retro")
        .param("cellSize", 12)
        .preprocessing("blackPoint", 30.0)
        .build();
    let path = fixtures::write_state_fixture(dir.path(), "ascii", &state);

    let loaded = AppState::load(&path).unwrap();
    assert_eq!(loaded, state);
}

#[test]
fn test_partial_json_fills_defaults_and_clamps() {
    let json = r#"{
        "activeEffect": "halftone",
        "preprocessing": { "gamma": 9.0 },
        "effects": { "halftone": { "gridSize": 500, "bogus": 1 } }
    }"#;
    let state = AppState::from_json(json).unwrap();
    assert_eq!(state.active_effect, EffectId::Halftone);
    assert_eq!(state.preprocessing.gamma, 5.0);
    assert_eq!(state.active_parameters().int("gridSize"), Some(50));
    assert!(state.active_parameters().get("bogus").is_none());
    assert_eq!(state.parameters(EffectId::Crt), &ParameterSet::defaults(EffectId::Crt));
}

#[test]
fn test_invalid_choice_in_file_is_rejected() {
    let json = r#"{ "effects": { "crt": { "pattern": "Plasma" } } }"#;
    let err = AppState::from_json(json).unwrap_err();
    assert!(err.to_string().contains("Plasma"), "unexpected error: {err}");
}

#[test]
fn test_state_file_with_removed_effect_still_loads() {
    let dir = fixtures::fixture_dir();
    let path = dir.path().join("legacy.json");
    std::fs::write(
        &path,
        r#"{ "activeEffect": "sepia", "effects": { "sepia": {}, "ascii": { "cellSize": 16 } } }"#,
    )
    .unwrap();

    let state = AppState::load(&path).unwrap();
    assert_eq!(state.active_effect, EffectId::default());
    assert_eq!(state.parameters(EffectId::AsciiArt).int("cellSize"), Some(16));
    assert_eq!(state.parameters(EffectId::Dithering), &ParameterSet::defaults(EffectId::Dithering));
}

#[test]
fn test_switching_effects_keeps_earlier_settings() {
    let mut state = AppStateBuilder::new(EffectId::PixelSort)
        .param("threshold", 10.0)
        .build();
    state.update(StateMessage::SelectEffect(EffectId::Crt)).unwrap();
    state.update(StateMessage::SelectEffect(EffectId::PixelSort)).unwrap();
    assert_eq!(state.active_parameters().float("threshold"), Some(10.0));
}

#[test]
fn test_patches_route_to_preprocessing_or_active_effect() {
    let mut state = AppState::new(EffectId::CameraBloom);

    let msg = state.parse_patch("grain=12").unwrap();
    assert!(matches!(msg, StateMessage::SetPreprocessing { .. }));
    assert!(state.update(msg).unwrap());
    assert_eq!(state.preprocessing.grain, 12.0);

    let msg = state.parse_patch("customTimestamp=20030704").unwrap();
    assert!(state.update(msg).unwrap());
    assert_eq!(state.active_parameters().text("customTimestamp"), Some("20.03.'07"));

    assert!(state.parse_patch("dotPitch=3").is_err());
    assert!(state.parse_patch("no-equals-sign").is_err());
}

#[test]
fn test_unchanged_update_reports_false() {
    let mut state = AppState::default();
    let msg = StateMessage::SetActiveParameter {
        name: "threshold".into(),
        value: ParameterValue::Float(128.0),
    };
    assert!(!state.update(msg).unwrap());
    assert!(!state.update(StateMessage::ResetPreprocessing).unwrap());
}
