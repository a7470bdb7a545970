//! The derivation catalogue: which derivations apply to which variables,
//! what the derived variable looks like, and how its value is computed.

use std::collections::BTreeSet;
use std::sync::Arc;

use finv_types::{
    DerivationKind, DerivationTag, Derived, InferenceConfig, RepType, Value, VarAux, VarInfo,
};

/// Element positions read by `SequenceInitial`.
pub const INITIAL_INDICES: [i8; 4] = [0, 1, -1, -2];

// ---------------------------------------------------------------------------
// Setup-time applicability
// ---------------------------------------------------------------------------

/// Unary derivations applicable to `var`, filtered by `config`.
#[must_use]
pub fn unary_candidates(var: &VarInfo, config: &InferenceConfig) -> Vec<DerivationKind> {
    let mut out = Vec::new();
    if !var.rep_type.is_sequence() {
        return out;
    }
    if config.derivation_enabled(DerivationTag::SequenceLength) && var.aux.contains(VarAux::HAS_SIZE)
    {
        out.push(DerivationKind::SequenceLength { shift: 0 });
        if var.aux.contains(VarAux::NULL_TERMINATING) {
            out.push(DerivationKind::SequenceLength { shift: -1 });
        }
    }
    if config.derivation_enabled(DerivationTag::SequenceInitial)
        && var.aux.contains(VarAux::HAS_ORDER)
        && !var.is_derived()
    {
        out.extend(
            INITIAL_INDICES
                .iter()
                .map(|&index| DerivationKind::SequenceInitial { index }),
        );
    }
    if var.rep_type == RepType::IntSeq {
        for (tag, kind) in [
            (DerivationTag::SequenceMin, DerivationKind::SequenceMin),
            (DerivationTag::SequenceMax, DerivationKind::SequenceMax),
            (DerivationTag::SequenceSum, DerivationKind::SequenceSum),
        ] {
            if config.derivation_enabled(tag) {
                out.push(kind);
            }
        }
    }
    out
}

/// Binary derivations applicable to the pair, each with its ordered input
/// indices (sequence first for subscripts and subsequences).
#[must_use]
pub fn binary_candidates(
    a: &VarInfo,
    b: &VarInfo,
    config: &InferenceConfig,
) -> Vec<(DerivationKind, [usize; 2])> {
    let mut out = Vec::new();
    if a.is_derived() || b.is_derived() {
        return out;
    }
    let (ia, ib) = (a.id.index(), b.id.index());

    // Sequence indexed by a scalar.
    let indexed = match (a.rep_type.is_sequence(), b.rep_type.is_sequence()) {
        (true, false) => Some((a, b, [ia, ib])),
        (false, true) => Some((b, a, [ib, ia])),
        _ => None,
    };
    if let Some((seq, scl, bases)) = indexed {
        let usable = scl.rep_type == RepType::Int
            && !scl.is_length_of(seq.id)
            && seq
                .comparability
                .index_type(0)
                .comparable(&seq.name, &scl.comparability, &scl.name);
        if usable {
            if config.derivation_enabled(DerivationTag::SequenceSubscript) {
                for shift in [0, -1] {
                    out.push((DerivationKind::SequenceSubscript { shift }, bases));
                }
            }
            if config.derivation_enabled(DerivationTag::SequenceSubsequence)
                && seq.aux.contains(VarAux::HAS_ORDER)
            {
                for (from_start, shift) in [(true, 0), (true, -1), (false, 0), (false, 1)] {
                    out.push((DerivationKind::SequenceSubsequence { from_start, shift }, bases));
                }
            }
        }
        return out;
    }

    // Two sequences.
    if !a.rep_type.is_sequence() || a.rep_type != b.rep_type {
        return out;
    }
    if config.derivation_enabled(DerivationTag::SequencesConcat) {
        out.push((DerivationKind::SequencesConcat, [ia, ib]));
    }
    if a.rep_type == RepType::IntSeq && a.decl_type == b.decl_type {
        if config.derivation_enabled(DerivationTag::SequencesUnion) {
            out.push((DerivationKind::SequencesUnion, [ia, ib]));
        }
        if config.derivation_enabled(DerivationTag::SequencesIntersection) {
            out.push((DerivationKind::SequencesIntersection, [ia, ib]));
        }
    }
    out
}

/// Descriptor of the variable produced by `kind` over `bases`.
#[must_use]
pub fn output_info(id: u32, kind: DerivationKind, bases: &[&VarInfo]) -> Option<VarInfo> {
    let seq = *bases.first()?;
    let names: Vec<&str> = bases.iter().map(|v| v.name.as_str()).collect();
    let name = kind.derived_name(&names);
    let ids: Vec<_> = bases.iter().map(|v| v.id).collect();
    let element = seq.rep_type.element_type();

    let (rep_type, comparability, aux, decl_type) = match kind {
        DerivationKind::SequenceLength { .. } => (
            RepType::Int,
            seq.comparability.index_type(0),
            VarAux::default(),
            "int".to_owned(),
        ),
        DerivationKind::SequenceMin | DerivationKind::SequenceMax | DerivationKind::SequenceSum => {
            (
                RepType::Int,
                seq.comparability.element_type(),
                VarAux::default(),
                element_decl(&seq.decl_type),
            )
        }
        DerivationKind::SequenceInitial { .. } | DerivationKind::SequenceSubscript { .. } => (
            element?,
            seq.comparability.element_type(),
            VarAux::default(),
            element_decl(&seq.decl_type),
        ),
        DerivationKind::SequenceSubsequence { .. }
        | DerivationKind::SequencesConcat
        | DerivationKind::SequencesUnion
        | DerivationKind::SequencesIntersection => (
            seq.rep_type,
            seq.comparability.clone(),
            seq.aux,
            seq.decl_type.clone(),
        ),
    };

    let mut info = VarInfo::new(id, name, rep_type)
        .with_decl_type(decl_type)
        .with_comparability(comparability)
        .with_aux(aux)
        .with_derived(Derived::new(kind, &ids));
    info.is_prestate = bases.iter().all(|v| v.is_prestate);
    Some(info)
}

fn element_decl(decl: &str) -> String {
    decl.strip_suffix("[]").unwrap_or(decl).to_owned()
}

// ---------------------------------------------------------------------------
// Per-sample computation
// ---------------------------------------------------------------------------

/// Compute the derived value from present inputs. `None` means the result
/// is nonsensical for this sample (index out of range, empty sequence).
#[must_use]
pub fn compute(kind: DerivationKind, inputs: &[&Value]) -> Option<Value> {
    let seq = *inputs.first()?;
    let len = seq.seq_len()? as i64;
    match kind {
        DerivationKind::SequenceLength { shift } => Some(Value::Int(len + i64::from(shift))),
        DerivationKind::SequenceInitial { index } => {
            let idx = if index >= 0 {
                i64::from(index)
            } else {
                len + i64::from(index)
            };
            element_at(seq, idx, len)
        }
        DerivationKind::SequenceMin => seq.as_int_seq()?.iter().min().map(|v| Value::Int(*v)),
        DerivationKind::SequenceMax => seq.as_int_seq()?.iter().max().map(|v| Value::Int(*v)),
        DerivationKind::SequenceSum => {
            let items = seq.as_int_seq()?;
            if items.is_empty() {
                return None;
            }
            items
                .iter()
                .try_fold(0_i64, |acc, v| acc.checked_add(*v))
                .map(Value::Int)
        }
        DerivationKind::SequenceSubscript { shift } => {
            let idx = inputs.get(1)?.as_int()?.checked_add(i64::from(shift))?;
            element_at(seq, idx, len)
        }
        DerivationKind::SequenceSubsequence { from_start, shift } => {
            let idx = inputs.get(1)?.as_int()?.checked_add(i64::from(shift))?;
            if from_start {
                // a[0..=idx]; idx == -1 is the empty prefix.
                if idx < -1 || idx >= len {
                    return None;
                }
                slice(seq, 0, (idx + 1) as usize)
            } else {
                // a[idx..]; idx == len is the empty suffix.
                if idx < 0 || idx > len {
                    return None;
                }
                slice(seq, idx as usize, len as usize)
            }
        }
        DerivationKind::SequencesConcat => concat(seq, inputs.get(1)?),
        DerivationKind::SequencesUnion => {
            let (a, b) = (seq.as_int_seq()?, inputs.get(1)?.as_int_seq()?);
            let set: BTreeSet<i64> = a.iter().chain(b.iter()).copied().collect();
            Some(Value::int_seq(set.into_iter().collect::<Vec<_>>()))
        }
        DerivationKind::SequencesIntersection => {
            let (a, b) = (seq.as_int_seq()?, inputs.get(1)?.as_int_seq()?);
            let right: BTreeSet<i64> = b.iter().copied().collect();
            let set: BTreeSet<i64> = a.iter().copied().filter(|v| right.contains(v)).collect();
            Some(Value::int_seq(set.into_iter().collect::<Vec<_>>()))
        }
    }
}

fn element_at(seq: &Value, idx: i64, len: i64) -> Option<Value> {
    if idx < 0 || idx >= len {
        return None;
    }
    seq.element(idx as usize)
}

fn slice(seq: &Value, start: usize, end: usize) -> Option<Value> {
    match seq {
        Value::IntSeq(v) => Some(Value::IntSeq(Arc::from(v.get(start..end)?))),
        Value::FloatSeq(v) => Some(Value::FloatSeq(Arc::from(v.get(start..end)?))),
        Value::StrSeq(v) => Some(Value::StrSeq(Arc::from(v.get(start..end)?))),
        Value::Int(_) | Value::Float(_) | Value::Str(_) => None,
    }
}

fn concat(a: &Value, b: &Value) -> Option<Value> {
    match (a, b) {
        (Value::IntSeq(x), Value::IntSeq(y)) => Some(Value::int_seq([&x[..], &y[..]].concat())),
        (Value::FloatSeq(x), Value::FloatSeq(y)) => {
            Some(Value::float_seq([&x[..], &y[..]].concat()))
        }
        (Value::StrSeq(x), Value::StrSeq(y)) => {
            Some(Value::StrSeq(Arc::from([&x[..], &y[..]].concat())))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(items: &[i64]) -> Value {
        Value::int_seq(items.to_vec())
    }

    #[test]
    fn test_length_and_initial() {
        let a = seq(&[4, 5, 6]);
        assert_eq!(
            compute(DerivationKind::SequenceLength { shift: -1 }, &[&a]),
            Some(Value::Int(2))
        );
        assert_eq!(
            compute(DerivationKind::SequenceInitial { index: -2 }, &[&a]),
            Some(Value::Int(5))
        );
        let short = seq(&[1]);
        assert_eq!(compute(DerivationKind::SequenceInitial { index: 1 }, &[&short]), None);
        assert_eq!(compute(DerivationKind::SequenceInitial { index: -2 }, &[&short]), None);
    }

    #[test]
    fn test_min_max_sum_empty_is_missing() {
        let empty = seq(&[]);
        assert_eq!(compute(DerivationKind::SequenceMin, &[&empty]), None);
        assert_eq!(compute(DerivationKind::SequenceSum, &[&empty]), None);
        let a = seq(&[3, -1, 9]);
        assert_eq!(compute(DerivationKind::SequenceMax, &[&a]), Some(Value::Int(9)));
        assert_eq!(compute(DerivationKind::SequenceSum, &[&a]), Some(Value::Int(11)));
        let overflow = seq(&[i64::MAX, 1]);
        assert_eq!(compute(DerivationKind::SequenceSum, &[&overflow]), None);
    }

    #[test]
    fn test_subscript_bounds() {
        let a = seq(&[10, 20, 30]);
        let sub = DerivationKind::SequenceSubscript { shift: -1 };
        assert_eq!(compute(sub, &[&a, &Value::Int(1)]), Some(Value::Int(10)));
        assert_eq!(compute(sub, &[&a, &Value::Int(0)]), None);
        assert_eq!(
            compute(DerivationKind::SequenceSubscript { shift: 0 }, &[&a, &Value::Int(3)]),
            None
        );
    }

    #[test]
    fn test_subsequence_bounds() {
        let a = seq(&[10, 20, 30]);
        let prefix = DerivationKind::SequenceSubsequence {
            from_start: true,
            shift: 0,
        };
        let prefix_excl = DerivationKind::SequenceSubsequence {
            from_start: true,
            shift: -1,
        };
        let suffix_excl = DerivationKind::SequenceSubsequence {
            from_start: false,
            shift: 1,
        };
        assert_eq!(compute(prefix, &[&a, &Value::Int(1)]), Some(seq(&[10, 20])));
        assert_eq!(compute(prefix_excl, &[&a, &Value::Int(0)]), Some(seq(&[])));
        assert_eq!(compute(prefix, &[&a, &Value::Int(3)]), None);
        assert_eq!(compute(suffix_excl, &[&a, &Value::Int(2)]), Some(seq(&[])));
        assert_eq!(compute(suffix_excl, &[&a, &Value::Int(3)]), None);
    }

    #[test]
    fn test_set_operations() {
        let a = seq(&[3, 1, 3]);
        let b = seq(&[2, 3]);
        assert_eq!(
            compute(DerivationKind::SequencesUnion, &[&a, &b]),
            Some(seq(&[1, 2, 3]))
        );
        assert_eq!(
            compute(DerivationKind::SequencesIntersection, &[&a, &b]),
            Some(seq(&[3]))
        );
        assert_eq!(
            compute(DerivationKind::SequencesConcat, &[&a, &b]),
            Some(seq(&[3, 1, 3, 2, 3]))
        );
    }

    #[test]
    fn test_unary_candidates_respect_aux() {
        let config = InferenceConfig::default();
        let a = VarInfo::new(0, "a", RepType::IntSeq);
        let kinds = unary_candidates(&a, &config);
        assert!(kinds.contains(&DerivationKind::SequenceLength { shift: -1 }));
        assert!(kinds.contains(&DerivationKind::SequenceSum));

        let b = VarInfo::new(1, "b", RepType::StrSeq)
            .with_aux(VarAux::HAS_SIZE | VarAux::HAS_DUPLICATES);
        let kinds = unary_candidates(&b, &config);
        assert_eq!(kinds, vec![DerivationKind::SequenceLength { shift: 0 }]);

        assert!(unary_candidates(&VarInfo::new(2, "x", RepType::Int), &config).is_empty());
    }

    #[test]
    fn test_binary_candidates_need_int_index() {
        let config = InferenceConfig::default();
        let a = VarInfo::new(0, "a", RepType::IntSeq);
        let i = VarInfo::new(1, "i", RepType::Int);
        let s = VarInfo::new(2, "s", RepType::Str);
        let kinds = binary_candidates(&i, &a, &config);
        assert_eq!(kinds.len(), 6);
        assert!(kinds.iter().all(|(_, bases)| *bases == [0, 1]), "sequence comes first");
        assert!(binary_candidates(&a, &s, &config).is_empty());
    }
}
