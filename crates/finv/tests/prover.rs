//! An external prover can mark reported facts redundant.

use std::sync::Arc;

use finv::{
    InferError, InferenceConfig, InvariantDescription, Location, RepType, Reportability, Value,
    ValueTuple, VarInfo,
};

fn fed() -> Location {
    let vars = vec![
        VarInfo::new(0, "x", RepType::Int),
        VarInfo::new(1, "y", RepType::Int),
    ];
    let mut loc = Location::new("Prove", vars, Arc::new(InferenceConfig::default())).unwrap();
    for i in 1..40 {
        let sample = ValueTuple::from_values([Value::Int(i), Value::Int(i + 100 + i % 4)]);
        loc.route_sample(&sample).unwrap();
    }
    loc
}

#[test]
fn prover_removes_facts_implied_by_the_rest() {
    let mut loc = fed();
    let mut report = loc.filter();
    assert!(report.find("x < y").unwrap().reportability.is_reportable());
    let before = report.reportable().count();

    // Pretend "x < y" follows from the other facts.
    let mut asked = 0;
    let mut bridge = |background: &[InvariantDescription], candidates: &[InvariantDescription]| {
        asked += 1;
        assert!(background.iter().all(|b| b.formula != candidates[0].formula));
        candidates.iter().map(|c| c.formula == "x < y").collect()
    };
    let marked = loc.apply_prover_verdicts(&mut report, &mut bridge).unwrap();
    assert_eq!(marked, 1);
    assert_eq!(asked, before);
    assert_eq!(report.find("x < y").unwrap().reportability, Reportability::Redundant);
    assert_eq!(report.reportable().count(), before - 1);
}

#[test]
fn malformed_verdicts_poison_the_location() {
    let mut loc = fed();
    let mut report = loc.filter();
    let mut bridge = |_: &[InvariantDescription], _: &[InvariantDescription]| Vec::<bool>::new();
    let err = loc.apply_prover_verdicts(&mut report, &mut bridge).unwrap_err();
    assert!(matches!(err, InferError::ProverVerdictMismatch { .. }), "{err}");
    assert!(loc.is_poisoned());

    let sample = ValueTuple::from_values([Value::Int(1), Value::Int(2)]);
    assert!(matches!(loc.route_sample(&sample), Err(InferError::LocationPoisoned(_))));
}
