//! Falsification is terminal for every kind the factory produces.

use finv_inv::{Invariant, Justification, UpdateOutcome, factory};
use finv_types::{InferenceConfig, ModBit, RepType, Value, VarAux, VarInfo};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

fn candidates() -> Vec<(Invariant, usize)> {
    let config = InferenceConfig::default();
    let x = VarInfo::new(0, "x", RepType::Int);
    let y = VarInfo::new(1, "y", RepType::Int);
    let z = VarInfo::new(2, "z", RepType::Int);
    let mut out: Vec<(Invariant, usize)> = factory::unary(&x, &config)
        .into_iter()
        .map(|i| (i, 1))
        .collect();
    out.extend(factory::binary(&x, &y, &config).into_iter().map(|i| (i, 2)));
    out.extend(
        factory::ternary([&x, &y, &z], &config)
            .unwrap()
            .into_iter()
            .map(|i| (i, 3)),
    );
    out
}

proptest! {
    #[test]
    fn falsified_invariants_stay_falsified(
        samples in prop::collection::vec(prop::array::uniform3(-20_i64..20), 1..40),
    ) {
        for (mut inv, arity) in candidates() {
            let mut dead_at: Option<usize> = None;
            for (i, s) in samples.iter().enumerate() {
                let values: Vec<Value> = s[..arity].iter().map(|v| Value::Int(*v)).collect();
                let refs: Vec<&Value> = values.iter().collect();
                let mods = vec![ModBit::Modified; arity];
                let before = inv.clone();
                let outcome = inv.update(&refs, &mods).map_err(|e| TestCaseError::fail(e.to_string()))?;
                if dead_at.is_some() {
                    if outcome != UpdateOutcome::Falsified || inv != before {
                        return Err(TestCaseError::fail(format!("{} revived at sample {i}", inv.kind())));
                    }
                } else if outcome == UpdateOutcome::Falsified {
                    dead_at = Some(i);
                }
            }
            prop_assert_eq!(dead_at.is_some(), inv.is_falsified());
            if inv.is_falsified() {
                prop_assert_eq!(inv.justification(0.0), Justification::Never);
            }
        }
    }

    #[test]
    fn sorted_sequences_never_falsify_sortedness(
        mut seqs in prop::collection::vec(prop::collection::vec(-50_i64..50, 0..8), 1..20),
    ) {
        let config = InferenceConfig::default();
        let a = VarInfo::new(0, "a", RepType::IntSeq).with_aux(VarAux::default());
        let mut invs = factory::unary(&a, &config);
        let sorted = invs
            .iter()
            .position(|i| i.kind() == finv_types::InvKindTag::EltwiseComparison)
            .ok_or_else(|| TestCaseError::fail("no sortedness candidate"))?;
        let mut inv = invs.swap_remove(sorted);
        for s in &mut seqs {
            s.sort_unstable();
            let v = Value::int_seq(s.clone());
            let outcome = inv.update(&[&v], &[ModBit::Modified]).map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(outcome, UpdateOutcome::Continue);
        }
    }
}
