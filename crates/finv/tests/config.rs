//! Configuration documents change what a location tracks.

use std::sync::Arc;

use finv::{
    InferError, InferenceConfig, InvKindTag, Location, RepType, Value, ValueTuple, VarId, VarInfo,
};

fn linear_location(config: InferenceConfig) -> Location {
    let vars = vec![
        VarInfo::new(0, "x", RepType::Int),
        VarInfo::new(1, "y", RepType::Int),
    ];
    let mut loc = Location::new("Cfg", vars, Arc::new(config)).unwrap();
    for i in 0..10 {
        let sample = ValueTuple::from_values([Value::Int(i), Value::Int(2 * i + 1)]);
        loc.route_sample(&sample).unwrap();
    }
    loc
}

fn has_linear(loc: &Location) -> bool {
    loc.invariants_over(&[VarId(0), VarId(1)])
        .iter()
        .any(|i| i.kind() == InvKindTag::LinearBinary)
}

#[test]
fn toml_toggle_disables_a_kind() {
    assert!(has_linear(&linear_location(InferenceConfig::default())));

    let config: InferenceConfig = toml::from_str(
        r"
        [invariants]
        LinearBinary = false
        ",
    )
    .unwrap();
    assert!(!has_linear(&linear_location(config)));
}

#[test]
fn unknown_kind_names_are_rejected() {
    let err = InferenceConfig::default().with("Bogus", true).unwrap_err();
    assert_eq!(err, InferError::UnknownConfigKey("Bogus".to_owned()));
    assert!(!err.is_fatal());

    assert!(toml::from_str::<InferenceConfig>("[invariants]\nBogus = true\n").is_err());
    let err = InferenceConfig::from_json(r#"{"invariants": {"Bogus": true}}"#).unwrap_err();
    assert!(matches!(err, InferError::ConfigParse(_)), "{err}");
}

#[test]
fn invalid_limits_fail_location_setup() {
    let config = InferenceConfig {
        confidence_limit: 0.0,
        ..InferenceConfig::default()
    };
    let vars = vec![VarInfo::new(0, "x", RepType::Int)];
    let err = Location::new("Cfg", vars, Arc::new(config)).unwrap_err();
    assert!(matches!(err, InferError::InvalidConfig { .. }), "{err}");
}

#[test]
fn flat_view_survives_a_json_round_trip() {
    let config = InferenceConfig::default()
        .with("LinearBinary", false)
        .and_then(|c| c.with("SequencesConcat", true))
        .unwrap();
    let json = config.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["invariants"]["LinearBinary"], serde_json::Value::Bool(false));

    let back = InferenceConfig::from_json(&json).unwrap();
    assert_eq!(back.flat(), config.flat());
    assert_eq!(back.flat().get("LinearBinary"), Some(&false));
}
