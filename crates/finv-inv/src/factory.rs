//! Candidate instantiation: which kinds a variable tuple starts out with.
//!
//! Consulted once per slice at setup. Comparability and the configuration's
//! kind toggles gate every candidate; nothing here looks at sample data.

use finv_error::Result;
use finv_types::{InferenceConfig, InvKindTag, RepType, VarAux, VarInfo};

use crate::binary::{
    Comparison, LinearBinary, Member, PairwiseComparison, Reverse, SeqScalarComparison, SubSequence,
    SubSet,
};
use crate::invariant::{InvState, Invariant};
use crate::scalar::{Bound, Modulus, NonModulus, NonZero, OneOf};
use crate::sequence::{EltwiseComparison, NoDuplicates};
use crate::ternary::{BinaryFunction, FunctionBinary};

struct Candidates<'a> {
    config: &'a InferenceConfig,
    out: Vec<Invariant>,
}

impl<'a> Candidates<'a> {
    const fn new(config: &'a InferenceConfig) -> Self {
        Self {
            config,
            out: Vec::new(),
        }
    }

    fn push(&mut self, kind: InvKindTag, make: impl FnOnce() -> InvState) {
        if self.config.is_enabled(kind) {
            let state = make();
            debug_assert_eq!(state.kind(), kind);
            self.out.push(Invariant::new(state));
        }
    }
}

/// Single-variable candidates.
#[must_use]
pub fn unary(var: &VarInfo, config: &InferenceConfig) -> Vec<Invariant> {
    let mut c = Candidates::new(config);
    let range_max = config.nonzero_range_max;
    let size = config.one_of_size;
    match var.rep_type {
        RepType::Int | RepType::Float => {
            c.push(InvKindTag::NonZero, || {
                InvState::NonZero(NonZero::new(false, range_max))
            });
            c.push(InvKindTag::LowerBound, || {
                InvState::LowerBound(Bound::new(range_max))
            });
            c.push(InvKindTag::UpperBound, || {
                InvState::UpperBound(Bound::new(range_max))
            });
            c.push(InvKindTag::OneOf, || InvState::OneOf(OneOf::new(size)));
            if var.rep_type == RepType::Int {
                c.push(InvKindTag::Modulus, || InvState::Modulus(Modulus::new()));
                c.push(InvKindTag::NonModulus, || {
                    InvState::NonModulus(NonModulus::new())
                });
            }
        }
        RepType::Hashcode => {
            c.push(InvKindTag::NonZero, || {
                InvState::NonZero(NonZero::new(true, range_max))
            });
            c.push(InvKindTag::OneOf, || InvState::OneOf(OneOf::new(size)));
        }
        RepType::Str => {
            c.push(InvKindTag::OneOf, || InvState::OneOf(OneOf::new(size)));
        }
        RepType::IntSeq | RepType::FloatSeq | RepType::StrSeq => {
            c.push(InvKindTag::OneOf, || InvState::OneOf(OneOf::new(size)));
            if var.rep_type != RepType::StrSeq {
                c.push(InvKindTag::EltNonZero, || {
                    InvState::EltNonZero(NonZero::new(false, range_max))
                });
                c.push(InvKindTag::EltLowerBound, || {
                    InvState::EltLowerBound(Bound::new(range_max))
                });
                c.push(InvKindTag::EltUpperBound, || {
                    InvState::EltUpperBound(Bound::new(range_max))
                });
            }
            c.push(InvKindTag::EltOneOf, || InvState::EltOneOf(OneOf::new(size)));
            if var.aux.contains(VarAux::HAS_ORDER) {
                c.push(InvKindTag::EltwiseComparison, || {
                    InvState::EltwiseComparison(EltwiseComparison::new())
                });
            }
            if var.aux.contains(VarAux::HAS_DUPLICATES) {
                c.push(InvKindTag::NoDuplicates, || {
                    InvState::NoDuplicates(NoDuplicates::new())
                });
            }
        }
    }
    c.out
}

/// `a` and `b` may be related: sequence elements are compared against a
/// scalar, anything else directly.
#[must_use]
pub fn pair_comparable(a: &VarInfo, b: &VarInfo) -> bool {
    match (a.rep_type.is_scalar(), b.rep_type.is_scalar()) {
        (false, true) => a.elements_comparable(b),
        (true, false) => b.elements_comparable(a),
        _ => a.comparable(b),
    }
}

/// Two-variable candidates over `(a, b)` in slice order.
///
/// Incomparable pairs get nothing.
#[must_use]
pub fn binary(a: &VarInfo, b: &VarInfo, config: &InferenceConfig) -> Vec<Invariant> {
    let mut c = Candidates::new(config);
    match (a.rep_type.is_scalar(), b.rep_type.is_scalar()) {
        (true, true) => {
            if a.rep_type != b.rep_type || !a.comparable(b) {
                return c.out;
            }
            let only_eq = a.rep_type == RepType::Hashcode;
            c.push(InvKindTag::Comparison, || {
                InvState::Comparison(Comparison::new(only_eq))
            });
            if a.rep_type == RepType::Int {
                c.push(InvKindTag::LinearBinary, || {
                    InvState::LinearBinary(LinearBinary::new())
                });
            }
        }
        (false, true) | (true, false) => {
            let seq_first = a.rep_type.is_sequence();
            let (seq, scalar) = if seq_first { (a, b) } else { (b, a) };
            if seq.rep_type.element_type() != Some(scalar.rep_type)
                || !seq.elements_comparable(scalar)
            {
                return c.out;
            }
            c.push(InvKindTag::Member, || InvState::Member(Member::new(seq_first)));
            c.push(InvKindTag::SeqScalarComparison, || {
                InvState::SeqScalarComparison(SeqScalarComparison::new(seq_first))
            });
        }
        (false, false) => {
            if a.rep_type != b.rep_type || !a.comparable(b) {
                return c.out;
            }
            let ordered = a.aux.contains(VarAux::HAS_ORDER) && b.aux.contains(VarAux::HAS_ORDER);
            c.push(InvKindTag::Comparison, || {
                InvState::Comparison(Comparison::new(!ordered))
            });
            c.push(InvKindTag::SubSet, || InvState::SubSet(SubSet::new()));
            if ordered {
                c.push(InvKindTag::SubSequence, || {
                    InvState::SubSequence(SubSequence::new())
                });
                c.push(InvKindTag::PairwiseComparison, || {
                    InvState::PairwiseComparison(PairwiseComparison::new())
                });
                c.push(InvKindTag::Reverse, || InvState::Reverse(Reverse::new()));
            }
        }
    }
    c.out
}

/// Three-variable candidates: `v[r] = f(others)` for integer scalars that
/// are pairwise comparable.
pub fn ternary(vars: [&VarInfo; 3], config: &InferenceConfig) -> Result<Vec<Invariant>> {
    let mut out = Vec::new();
    if !config.is_enabled(InvKindTag::FunctionBinary) {
        return Ok(out);
    }
    let ints = vars.iter().all(|v| v.rep_type == RepType::Int);
    let comparable = vars[0].comparable(vars[1])
        && vars[0].comparable(vars[2])
        && vars[1].comparable(vars[2]);
    if !ints || !comparable {
        return Ok(out);
    }
    for result in 0..3 {
        for func in BinaryFunction::ALL {
            out.push(Invariant::new(InvState::FunctionBinary(FunctionBinary::new(
                func, result,
            )?)));
        }
    }
    Ok(out)
}
