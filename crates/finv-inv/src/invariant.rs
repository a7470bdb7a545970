//! The closed sum of invariant kinds behind one dispatch surface.

use finv_error::{InferError, Result};
use finv_types::{InvKindTag, ModBit, Value};

use crate::binary::{
    Comparison, LinearBinary, Member, PairwiseComparison, Reverse, SeqScalarComparison, SubSequence,
    SubSet,
};
use crate::description::{InvariantDescription, braced};
use crate::implication::Implication;
use crate::relation::Relation;
use crate::scalar::{Bound, Modulus, NonModulus, NonZero, OneOf};
use crate::sequence::{EltwiseComparison, NoDuplicates};
use crate::ternary::FunctionBinary;
use crate::{Justification, UpdateOutcome};

/// Kind-specific sufficient statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvState {
    NonZero(NonZero),
    LowerBound(Bound),
    UpperBound(Bound),
    OneOf(OneOf),
    Modulus(Modulus),
    NonModulus(NonModulus),
    EltNonZero(NonZero),
    EltOneOf(OneOf),
    EltLowerBound(Bound),
    EltUpperBound(Bound),
    EltwiseComparison(EltwiseComparison),
    NoDuplicates(NoDuplicates),
    Comparison(Comparison),
    LinearBinary(LinearBinary),
    Member(Member),
    SeqScalarComparison(SeqScalarComparison),
    SubSequence(SubSequence),
    SubSet(SubSet),
    PairwiseComparison(PairwiseComparison),
    Reverse(Reverse),
    FunctionBinary(FunctionBinary),
    Implication(Box<Implication>),
}

impl InvState {
    #[must_use]
    pub const fn kind(&self) -> InvKindTag {
        match self {
            Self::NonZero(_) => InvKindTag::NonZero,
            Self::LowerBound(_) => InvKindTag::LowerBound,
            Self::UpperBound(_) => InvKindTag::UpperBound,
            Self::OneOf(_) => InvKindTag::OneOf,
            Self::Modulus(_) => InvKindTag::Modulus,
            Self::NonModulus(_) => InvKindTag::NonModulus,
            Self::EltNonZero(_) => InvKindTag::EltNonZero,
            Self::EltOneOf(_) => InvKindTag::EltOneOf,
            Self::EltLowerBound(_) => InvKindTag::EltLowerBound,
            Self::EltUpperBound(_) => InvKindTag::EltUpperBound,
            Self::EltwiseComparison(_) => InvKindTag::EltwiseComparison,
            Self::NoDuplicates(_) => InvKindTag::NoDuplicates,
            Self::Comparison(_) => InvKindTag::Comparison,
            Self::LinearBinary(_) => InvKindTag::LinearBinary,
            Self::Member(_) => InvKindTag::Member,
            Self::SeqScalarComparison(_) => InvKindTag::SeqScalarComparison,
            Self::SubSequence(_) => InvKindTag::SubSequence,
            Self::SubSet(_) => InvKindTag::SubSet,
            Self::PairwiseComparison(_) => InvKindTag::PairwiseComparison,
            Self::Reverse(_) => InvKindTag::Reverse,
            Self::FunctionBinary(_) => InvKindTag::FunctionBinary,
            Self::Implication(_) => InvKindTag::Implication,
        }
    }
}

fn int_of(kind: InvKindTag, value: &Value) -> Result<i64> {
    value
        .as_int()
        .ok_or_else(|| InferError::internal(format!("{kind} needs an integer, got {value}")))
}

fn each_element(seq: &Value, mut f: impl FnMut(&Value) -> UpdateOutcome) -> UpdateOutcome {
    for elt in seq.elements() {
        if f(&elt) == UpdateOutcome::Falsified {
            return UpdateOutcome::Falsified;
        }
    }
    UpdateOutcome::Continue
}

fn shown(value: Option<&Value>) -> String {
    value.map_or_else(|| "?".to_owned(), ToString::to_string)
}

/// `" + k"`, `" - k"`, or nothing for zero.
fn offset(k: i64) -> String {
    if k == 0 { String::new() } else { format!(" {}", signed(k)) }
}

/// `"+ k"` or `"- k"`.
fn signed(k: i64) -> String {
    format!("{} {}", if k < 0 { '-' } else { '+' }, k.unsigned_abs())
}

fn shown_relation(relation: Option<Relation>) -> &'static str {
    relation.map_or("?", Relation::symbol)
}

/// One hypothesis over one slice.
///
/// `samples` counts every sample routed here; `modified` counts those that
/// reached the kind's statistics. Falsification is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invariant {
    state: InvState,
    samples: u64,
    modified: u64,
    falsified: bool,
}

impl Invariant {
    #[must_use]
    pub const fn new(state: InvState) -> Self {
        Self {
            state,
            samples: 0,
            modified: 0,
            falsified: false,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &InvState {
        &self.state
    }

    #[must_use]
    pub const fn kind(&self) -> InvKindTag {
        self.state.kind()
    }

    #[must_use]
    pub const fn arity(&self) -> usize {
        self.kind().arity()
    }

    #[must_use]
    pub const fn samples(&self) -> u64 {
        self.samples
    }

    #[must_use]
    pub const fn modified(&self) -> u64 {
        self.modified
    }

    #[must_use]
    pub const fn is_falsified(&self) -> bool {
        self.falsified
    }

    /// Feed one projected sample.
    ///
    /// A sample whose every bit is `Unmodified` repeats values this
    /// invariant has already checked and only bumps `samples`. Missing bits
    /// must be filtered by the caller.
    pub fn update(&mut self, values: &[&Value], mods: &[ModBit]) -> Result<UpdateOutcome> {
        let arity = self.arity();
        if values.len() != arity || mods.len() != arity {
            return Err(InferError::ArityMismatch {
                slice: self.kind().to_string(),
                expected: arity,
                actual: values.len().max(mods.len()),
            });
        }
        if self.falsified {
            return Ok(UpdateOutcome::Falsified);
        }
        if mods.iter().any(|m| m.is_missing()) {
            return Err(InferError::internal(format!(
                "{} received a missing value",
                self.kind()
            )));
        }
        self.samples += 1;
        let unmodified = mods.iter().all(|m| *m == ModBit::Unmodified);
        if unmodified && self.modified > 0 {
            return Ok(UpdateOutcome::Continue);
        }
        self.modified += 1;
        let outcome = self.apply(values)?;
        if outcome == UpdateOutcome::Falsified {
            self.falsified = true;
        }
        Ok(outcome)
    }

    fn apply(&mut self, v: &[&Value]) -> Result<UpdateOutcome> {
        let kind = self.kind();
        let outcome = match &mut self.state {
            InvState::NonZero(s) => s.update(v[0]),
            InvState::LowerBound(s) | InvState::UpperBound(s) => s.update(v[0]),
            InvState::OneOf(s) => s.update(v[0]),
            InvState::Modulus(s) => s.update(int_of(kind, v[0])?),
            InvState::NonModulus(s) => s.update(int_of(kind, v[0])?),
            InvState::EltNonZero(s) => each_element(v[0], |e| s.update(e)),
            InvState::EltOneOf(s) => each_element(v[0], |e| s.update(e)),
            InvState::EltLowerBound(s) | InvState::EltUpperBound(s) => {
                each_element(v[0], |e| s.update(e))
            }
            InvState::EltwiseComparison(s) => s.update(v[0]),
            InvState::NoDuplicates(s) => s.update(v[0]),
            InvState::Comparison(s) => s.update(v[0], v[1])?,
            InvState::LinearBinary(s) => s.update(v[0], v[1])?,
            InvState::Member(s) => {
                if s.seq_first() {
                    s.update(v[0], v[1])?
                } else {
                    s.update(v[1], v[0])?
                }
            }
            InvState::SeqScalarComparison(s) => {
                if s.seq_first() {
                    s.update(v[0], v[1])?
                } else {
                    s.update(v[1], v[0])?
                }
            }
            InvState::SubSequence(s) => s.update(v[0], v[1]),
            InvState::SubSet(s) => s.update(v[0], v[1]),
            InvState::PairwiseComparison(s) => s.update(v[0], v[1])?,
            InvState::Reverse(s) => s.update(v[0], v[1]),
            InvState::FunctionBinary(s) => s.update([v[0], v[1], v[2]])?,
            InvState::Implication(s) => {
                if s.is_broken() {
                    UpdateOutcome::Falsified
                } else {
                    UpdateOutcome::Continue
                }
            }
        };
        Ok(outcome)
    }

    /// Probability in `[0, 1]` that the regularity is not an accident.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        if self.falsified {
            return 0.0;
        }
        match &self.state {
            InvState::NonZero(s) | InvState::EltNonZero(s) => s.confidence(),
            InvState::LowerBound(s)
            | InvState::UpperBound(s)
            | InvState::EltLowerBound(s)
            | InvState::EltUpperBound(s) => s.confidence(),
            InvState::OneOf(s) | InvState::EltOneOf(s) => s.confidence(),
            InvState::Modulus(s) => s.confidence(),
            InvState::NonModulus(s) => s.confidence(),
            InvState::EltwiseComparison(s) => s.confidence(),
            InvState::NoDuplicates(s) => s.confidence(),
            InvState::Comparison(s) => s.confidence(),
            InvState::LinearBinary(s) => s.confidence(),
            InvState::Member(_) | InvState::SubSequence(_) | InvState::SubSet(_) => {
                if self.modified > 0 { 1.0 } else { 0.0 }
            }
            InvState::SeqScalarComparison(s) => s.confidence(),
            InvState::PairwiseComparison(s) => s.confidence(),
            InvState::Reverse(s) => s.confidence(),
            InvState::FunctionBinary(s) => s.confidence(),
            InvState::Implication(s) => s.confidence(),
        }
    }

    /// Reporting status against a confidence `limit`.
    #[must_use]
    pub fn justification(&self, limit: f64) -> Justification {
        if self.falsified {
            return Justification::Never;
        }
        if let InvState::Implication(s) = &self.state {
            if s.is_broken() {
                return Justification::Never;
            }
        } else if self.samples == 0 {
            return Justification::Unjustified;
        }
        if self.confidence() >= limit {
            Justification::Justified
        } else {
            Justification::Unjustified
        }
    }

    /// Follow a reordering of the slice's variables: new position `i` holds
    /// what was at `order[i]`.
    pub fn permute(&mut self, order: &[usize]) -> Result<()> {
        if order.len() != self.arity() {
            return Err(InferError::internal(format!(
                "{} over {} variables reordered by {order:?}",
                self.kind(),
                self.arity()
            )));
        }
        match *order {
            [a, b, c] => {
                if let InvState::FunctionBinary(s) = &mut self.state {
                    s.permute([a, b, c]);
                }
            }
            [1, 0] => self.swap_operands(),
            _ => {}
        }
        Ok(())
    }

    fn swap_operands(&mut self) {
        match &mut self.state {
            InvState::Comparison(s) => s.swap_operands(),
            InvState::LinearBinary(s) => s.swap_operands(),
            InvState::Member(s) => s.swap_operands(),
            InvState::SeqScalarComparison(s) => s.swap_operands(),
            InvState::SubSequence(s) => s.swap_operands(),
            InvState::SubSet(s) => s.swap_operands(),
            InvState::PairwiseComparison(s) => s.swap_operands(),
            InvState::Reverse(s) => s.swap_operands(),
            _ => {}
        }
    }

    /// A co-located `x == r (mod m)` narrows a NonZero's value range.
    pub fn set_modulus_hint(&mut self, modulus: Option<u64>) {
        if let InvState::NonZero(s) = &mut self.state {
            s.set_range_divisor(modulus);
        }
    }

    /// Same hypothesis, statistics aside.
    #[must_use]
    pub fn same_formula(&self, other: &Self) -> bool {
        match (&self.state, &other.state) {
            (InvState::NonZero(a), InvState::NonZero(b))
            | (InvState::EltNonZero(a), InvState::EltNonZero(b)) => {
                a.is_pointer() == b.is_pointer()
            }
            (InvState::LowerBound(a), InvState::LowerBound(b))
            | (InvState::EltLowerBound(a), InvState::EltLowerBound(b)) => a.min() == b.min(),
            (InvState::UpperBound(a), InvState::UpperBound(b))
            | (InvState::EltUpperBound(a), InvState::EltUpperBound(b)) => a.max() == b.max(),
            (InvState::OneOf(a), InvState::OneOf(b))
            | (InvState::EltOneOf(a), InvState::EltOneOf(b)) => a.values() == b.values(),
            (InvState::Modulus(a), InvState::Modulus(b)) => a.result() == b.result(),
            (InvState::NonModulus(a), InvState::NonModulus(b)) => a.result() == b.result(),
            (InvState::EltwiseComparison(a), InvState::EltwiseComparison(b)) => {
                a.relation() == b.relation()
            }
            (InvState::NoDuplicates(_), InvState::NoDuplicates(_))
            | (InvState::Reverse(_), InvState::Reverse(_)) => true,
            (InvState::Comparison(a), InvState::Comparison(b)) => a.relation() == b.relation(),
            (InvState::LinearBinary(a), InvState::LinearBinary(b)) => {
                a.line() == b.line()
            }
            (InvState::Member(a), InvState::Member(b)) => a.seq_first() == b.seq_first(),
            (InvState::SeqScalarComparison(a), InvState::SeqScalarComparison(b)) => {
                a.seq_first() == b.seq_first() && a.relation() == b.relation()
            }
            (InvState::SubSequence(a), InvState::SubSequence(b)) => {
                a.containment() == b.containment()
            }
            (InvState::SubSet(a), InvState::SubSet(b)) => a.containment() == b.containment(),
            (InvState::PairwiseComparison(a), InvState::PairwiseComparison(b)) => {
                a.relation() == b.relation()
            }
            (InvState::FunctionBinary(a), InvState::FunctionBinary(b)) => {
                a.func() == b.func() && a.result_position() == b.result_position()
            }
            (InvState::Implication(a), InvState::Implication(b)) => a.same_formula(b),
            _ => false,
        }
    }

    /// The two hypotheses, over the same variables, cannot both hold.
    #[must_use]
    pub fn exclusive_formula(&self, other: &Self) -> bool {
        let relations_exclude = |a: Option<Relation>, b: Option<Relation>| match (a, b) {
            (Some(a), Some(b)) => a.excludes(b),
            _ => false,
        };
        match (&self.state, &other.state) {
            (InvState::Comparison(a), InvState::Comparison(b)) => {
                relations_exclude(a.relation(), b.relation())
            }
            (InvState::EltwiseComparison(a), InvState::EltwiseComparison(b)) => {
                relations_exclude(a.relation(), b.relation())
            }
            (InvState::PairwiseComparison(a), InvState::PairwiseComparison(b)) => {
                relations_exclude(a.relation(), b.relation())
            }
            (InvState::SeqScalarComparison(a), InvState::SeqScalarComparison(b)) => {
                a.seq_first() == b.seq_first() && relations_exclude(a.relation(), b.relation())
            }
            (InvState::NonZero(_), InvState::OneOf(o)) | (InvState::OneOf(o), InvState::NonZero(_)) => {
                !o.values().is_empty() && o.values().iter().all(Value::is_zero)
            }
            (InvState::OneOf(a), InvState::OneOf(b)) => {
                !a.values().is_empty()
                    && !b.values().is_empty()
                    && a.values().iter().all(|v| !b.contains(v))
            }
            (InvState::LowerBound(lo), InvState::UpperBound(hi))
            | (InvState::UpperBound(hi), InvState::LowerBound(lo)) => match (lo.min(), hi.max()) {
                (Some(min), Some(max)) => min.compare(max) == Some(std::cmp::Ordering::Greater),
                _ => false,
            },
            (InvState::Modulus(a), InvState::Modulus(b)) => match (a.result(), b.result()) {
                (Some((ra, ma)), Some((rb, mb))) => ma == mb && ra != rb,
                _ => false,
            },
            _ => false,
        }
    }

    /// Render against the slice's variable names, in slice order.
    ///
    /// Implications carry their own names and ignore `names`.
    #[must_use]
    pub fn describe(&self, names: &[&str]) -> InvariantDescription {
        let kind = self.kind();
        let var = |i: usize| names.get(i).copied().unwrap_or("?");
        let vars: Vec<String> = names.iter().map(|n| (*n).to_owned()).collect();
        let d = |formula: String| InvariantDescription::new(kind, vars.clone(), formula);
        match &self.state {
            InvState::NonZero(s) => {
                d(format!("{} != {}", var(0), s.zero_text())).param("zero", s.zero_text())
            }
            InvState::LowerBound(s) => {
                d(format!("{} >= {}", var(0), shown(s.min()))).param("min", shown(s.min()))
            }
            InvState::UpperBound(s) => {
                d(format!("{} <= {}", var(0), shown(s.max()))).param("max", shown(s.max()))
            }
            InvState::OneOf(s) => {
                let formula = match s.values() {
                    [only] => format!("{} == {only}", var(0)),
                    values => format!("{} one of {}", var(0), braced(values)),
                };
                d(formula).param("values", braced(s.values()))
            }
            InvState::Modulus(s) => match s.result() {
                Some((r, m)) => d(format!("{} == {r}  (mod {m})", var(0)))
                    .param("remainder", r)
                    .param("modulus", m),
                None => d(format!("{} == ?  (mod ?)", var(0))),
            },
            InvState::NonModulus(s) => match s.result() {
                Some((r, m)) => d(format!("{} != {r}  (mod {m})", var(0)))
                    .param("remainder", r)
                    .param("modulus", m),
                None => d(format!("{} != ?  (mod ?)", var(0))),
            },
            InvState::EltNonZero(s) => {
                d(format!("{} elements != {}", var(0), s.zero_text())).param("zero", s.zero_text())
            }
            InvState::EltOneOf(s) => d(format!("{} elements one of {}", var(0), braced(s.values())))
                .param("values", braced(s.values())),
            InvState::EltLowerBound(s) => d(format!("{} elements >= {}", var(0), shown(s.min())))
                .param("min", shown(s.min())),
            InvState::EltUpperBound(s) => d(format!("{} elements <= {}", var(0), shown(s.max())))
                .param("max", shown(s.max())),
            InvState::EltwiseComparison(s) => {
                let rel = shown_relation(s.relation());
                d(format!("{} sorted by {rel}", var(0))).param("relation", rel)
            }
            InvState::NoDuplicates(_) => d(format!("{} contains no duplicates", var(0))),
            InvState::Comparison(s) => {
                let rel = shown_relation(s.relation());
                d(format!("{} {rel} {}", var(0), var(1))).param("relation", rel)
            }
            InvState::LinearBinary(s) => {
                let formula = if let Some((slope, shift)) = s.y_of_x() {
                    format!("{} == {slope} * {}{}", var(1), var(0), offset(shift))
                } else if let Some((slope, shift)) = s.x_of_y() {
                    format!("{} == {slope} * {}{}", var(0), var(1), offset(shift))
                } else if let Some([x_coef, y_coef, constant]) = s.line() {
                    format!(
                        "{x_coef} * {} {} * {}{} == 0",
                        var(0),
                        signed(y_coef),
                        var(1),
                        offset(constant)
                    )
                } else {
                    format!("? * {} + ? * {} + ? == 0", var(0), var(1))
                };
                let described = d(formula);
                match s.line() {
                    Some([x_coef, y_coef, constant]) => described
                        .param("a", x_coef)
                        .param("b", y_coef)
                        .param("c", constant),
                    None => described,
                }
            }
            InvState::Member(s) => {
                let (seq, x) = if s.seq_first() { (0, 1) } else { (1, 0) };
                d(format!("{} in {}", var(x), var(seq)))
            }
            InvState::SeqScalarComparison(s) => {
                let (seq, x) = if s.seq_first() { (0, 1) } else { (1, 0) };
                let rel = shown_relation(s.relation());
                d(format!("{} elements {rel} {}", var(seq), var(x))).param("relation", rel)
            }
            InvState::SubSequence(s) => {
                let c = s.containment();
                let formula = if c.first_in_second() && c.second_in_first() {
                    format!("{} == {}", var(0), var(1))
                } else if c.first_in_second() {
                    format!("{} is a subsequence of {}", var(0), var(1))
                } else {
                    format!("{} is a subsequence of {}", var(1), var(0))
                };
                d(formula)
            }
            InvState::SubSet(s) => {
                let c = s.containment();
                let formula = if c.first_in_second() && c.second_in_first() {
                    format!("{} and {} have the same elements", var(0), var(1))
                } else if c.first_in_second() {
                    format!("{} is a subset of {}", var(0), var(1))
                } else {
                    format!("{} is a subset of {}", var(1), var(0))
                };
                d(formula)
            }
            InvState::PairwiseComparison(s) => {
                let rel = shown_relation(s.relation());
                d(format!("{} {rel} {} (elementwise)", var(0), var(1))).param("relation", rel)
            }
            InvState::Reverse(_) => d(format!("{} is the reverse of {}", var(0), var(1))),
            InvState::FunctionBinary(s) => {
                let [a, b] = s.argument_positions();
                let r = s.result_position();
                d(format!("{} == {}({}, {})", var(r), s.func(), var(a), var(b)))
                    .param("function", s.func())
                    .param("result", r)
            }
            InvState::Implication(s) => {
                let (p, q) = s.describe();
                let mut vars = p.vars.clone();
                vars.extend(q.vars.iter().cloned());
                InvariantDescription::new(kind, vars, format!("({p}) {} ({q})", s.arrow()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOD: [ModBit; 1] = [ModBit::Modified];

    fn nonzero() -> Invariant {
        Invariant::new(InvState::NonZero(NonZero::new(false, 50)))
    }

    #[test]
    fn test_zero_samples_is_unjustified_and_falsified_is_never() {
        let mut inv = nonzero();
        assert_eq!(inv.justification(0.5), Justification::Unjustified);
        inv.update(&[&Value::Int(0)], &MOD).unwrap();
        assert!(inv.is_falsified());
        assert_eq!(inv.justification(0.0), Justification::Never);
        assert_eq!(inv.confidence(), 0.0);
    }

    #[test]
    fn test_falsified_update_is_noop() {
        let mut inv = nonzero();
        inv.update(&[&Value::Int(0)], &MOD).unwrap();
        let before = inv.clone();
        assert_eq!(
            inv.update(&[&Value::Int(5)], &MOD).unwrap(),
            UpdateOutcome::Falsified
        );
        assert_eq!(inv, before);
    }

    #[test]
    fn test_unmodified_repeats_only_count() {
        let mut inv = nonzero();
        inv.update(&[&Value::Int(4)], &[ModBit::Unmodified]).unwrap();
        assert_eq!(inv.modified(), 1, "first sample is always checked");
        inv.update(&[&Value::Int(4)], &[ModBit::Unmodified]).unwrap();
        assert_eq!((inv.samples(), inv.modified()), (2, 1));
    }

    #[test]
    fn test_arity_and_missing_are_errors() {
        let mut inv = nonzero();
        let err = inv.update(&[], &[]).unwrap_err();
        assert!(matches!(err, InferError::ArityMismatch { expected: 1, actual: 0, .. }));
        assert!(inv.update(&[&Value::Int(1)], &[ModBit::MissingFlow]).is_err());
    }

    #[test]
    fn test_formula_identity_and_exclusion() {
        let mut lt = Invariant::new(InvState::Comparison(Comparison::new(false)));
        let mut ge = Invariant::new(InvState::Comparison(Comparison::new(false)));
        let mods = [ModBit::Modified; 2];
        lt.update(&[&Value::Int(1), &Value::Int(2)], &mods).unwrap();
        ge.update(&[&Value::Int(3), &Value::Int(2)], &mods).unwrap();
        ge.update(&[&Value::Int(2), &Value::Int(2)], &mods).unwrap();
        assert!(lt.exclusive_formula(&ge));
        assert!(!lt.same_formula(&ge));
        assert!(lt.same_formula(&lt.clone()));
        assert_eq!(lt.describe(&["x", "y"]).to_string(), "x < y");
        assert_eq!(ge.describe(&["x", "y"]).to_string(), "x >= y");
    }

    #[test]
    fn test_describe_linear_and_one_of() {
        let mut lin = Invariant::new(InvState::LinearBinary(LinearBinary::new()));
        let mods = [ModBit::Modified; 2];
        lin.update(&[&Value::Int(0), &Value::Int(-1)], &mods).unwrap();
        lin.update(&[&Value::Int(1), &Value::Int(1)], &mods).unwrap();
        assert_eq!(lin.describe(&["x", "y"]).to_string(), "y == 2 * x - 1");
        lin.permute(&[1, 0]).unwrap();
        assert_eq!(lin.describe(&["y", "x"]).to_string(), "y == 2 * x - 1");

        let mut slanted = Invariant::new(InvState::LinearBinary(LinearBinary::new()));
        slanted.update(&[&Value::Int(0), &Value::Int(1)], &mods).unwrap();
        slanted.update(&[&Value::Int(3), &Value::Int(3)], &mods).unwrap();
        assert_eq!(slanted.describe(&["x", "y"]).to_string(), "2 * x - 3 * y + 3 == 0");

        let mut one = Invariant::new(InvState::OneOf(OneOf::new(3)));
        one.update(&[&Value::Int(7)], &MOD).unwrap();
        assert_eq!(one.describe(&["x"]).to_string(), "x == 7");
        one.update(&[&Value::Int(2)], &MOD).unwrap();
        assert_eq!(one.describe(&["x"]).to_string(), "x one of { 2, 7 }");
    }

    #[test]
    fn test_permuted_comparison_reads_the_same() {
        let mut lt = Invariant::new(InvState::Comparison(Comparison::new(false)));
        lt.update(&[&Value::Int(1), &Value::Int(4)], &[ModBit::Modified; 2])
            .unwrap();
        lt.permute(&[1, 0]).unwrap();
        assert_eq!(lt.describe(&["y", "x"]).to_string(), "y > x");
        assert!(lt.permute(&[0, 1, 2]).is_err());

        let mut member = Invariant::new(InvState::Member(Member::new(true)));
        member.permute(&[1, 0]).unwrap();
        assert_eq!(member.describe(&["i", "a"]).to_string(), "i in a");
    }

    #[test]
    fn test_element_kinds_walk_sequences() {
        let mut elt = Invariant::new(InvState::EltNonZero(NonZero::new(false, 50)));
        let ok = Value::int_seq(vec![1, 2, 3]);
        let bad = Value::int_seq(vec![4, 0]);
        assert_eq!(elt.update(&[&ok], &MOD).unwrap(), UpdateOutcome::Continue);
        assert_eq!(elt.update(&[&bad], &MOD).unwrap(), UpdateOutcome::Falsified);
    }

    #[test]
    fn test_implication_follows_halves() {
        let mut p = nonzero();
        p.update(&[&Value::Int(3)], &MOD).unwrap();
        let q = Invariant::new(InvState::Comparison(Comparison::new(false)));
        let imp = Implication::new(p, vec!["x".into()], q, vec!["y".into(), "z".into()], false);
        let inv = Invariant::new(InvState::Implication(Box::new(imp)));
        assert_eq!(inv.arity(), 0);
        assert_eq!(inv.describe(&[]).to_string(), "(x != 0) ==> (y ? z)");
        assert_eq!(inv.justification(0.5), Justification::Unjustified);
    }
}
