//! Structural obviousness: facts that follow from variable provenance and
//! equality membership alone, without consulting any sample data.

use std::fmt;

use finv_inv::binary::Comparison;
use finv_inv::relation::Relation;
use finv_inv::{InvState, Invariant};
use finv_types::{DerivationKind, Value, VarId, VarInfo};
use serde::{Deserialize, Serialize};

use crate::equality::EqualityPartition;

/// Why an invariant is obvious.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Obviousness {
    /// `this != null`, or anything equal to `this`.
    ThisNonNull,
    /// `size(a) >= 0` and `size(a)-1 >= -1`.
    LengthNonNegative,
    /// Comparisons between two lengths of one sequence.
    LengthShift,
    /// An element drawn from a sequence (or from a subsequence of it) is a
    /// member of it.
    DerivedElement,
    /// A derived subsequence is contained in (and a prefix orders before)
    /// its source.
    DerivedSubsequence,
}

impl fmt::Display for Obviousness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ThisNonNull => "this is never null",
            Self::LengthNonNegative => "lengths are non-negative",
            Self::LengthShift => "lengths of one sequence",
            Self::DerivedElement => "element of its source",
            Self::DerivedSubsequence => "subsequence of its source",
        })
    }
}

/// Provenance lookups over one location.
pub struct Provenance<'a> {
    vars: &'a [VarInfo],
    partition: &'a EqualityPartition,
}

impl<'a> Provenance<'a> {
    #[must_use]
    pub const fn new(vars: &'a [VarInfo], partition: &'a EqualityPartition) -> Self {
        Self { vars, partition }
    }

    fn members(&self, var: VarId) -> impl Iterator<Item = &'a VarInfo> + 'a {
        let vars = self.vars;
        self.partition
            .class_of(var)
            .iter()
            .filter_map(move |m| vars.get(m.index()))
    }

    fn same_class(&self, a: VarId, b: VarId) -> bool {
        match (self.partition.leader_of(a), self.partition.leader_of(b)) {
            (Ok(x), Ok(y)) => x == y,
            _ => false,
        }
    }

    /// Leader of the sequence some member of `var`'s class is an element of
    /// (`a[0]`, `a[i]`, `min(a)`, `max(a)`).
    #[must_use]
    pub fn element_source(&self, var: VarId) -> Option<VarId> {
        self.members(var).find_map(|info| {
            let derived = info.derived.as_ref()?;
            match derived.kind {
                DerivationKind::SequenceInitial { .. }
                | DerivationKind::SequenceSubscript { .. }
                | DerivationKind::SequenceMin
                | DerivationKind::SequenceMax => {
                    self.partition.leader_of(derived.sequence()?).ok()
                }
                _ => None,
            }
        })
    }

    /// Some member of `sub`'s class is a derived subsequence of `seq`'s
    /// class. With `prefix_only`, only `a[0..i]` style subsequences count.
    #[must_use]
    pub fn is_subsequence_of(&self, sub: VarId, seq: VarId, prefix_only: bool) -> bool {
        self.members(sub).any(|info| {
            info.derived.as_ref().is_some_and(|d| match d.kind {
                DerivationKind::SequenceSubsequence { from_start, .. } => {
                    (from_start || !prefix_only)
                        && d.sequence().is_some_and(|s| self.same_class(s, seq))
                }
                _ => false,
            })
        })
    }

    /// Some member of `x`'s class is an element of `seq` or of a derived
    /// subsequence of `seq`.
    #[must_use]
    pub fn is_element_of(&self, x: VarId, seq: VarId) -> bool {
        self.members(x).any(|info| {
            let Some(d) = info.derived.as_ref() else {
                return false;
            };
            if !matches!(
                d.kind,
                DerivationKind::SequenceInitial { .. }
                    | DerivationKind::SequenceSubscript { .. }
                    | DerivationKind::SequenceMin
                    | DerivationKind::SequenceMax
            ) {
                return false;
            }
            d.sequence().is_some_and(|source| {
                self.same_class(source, seq) || self.is_subsequence_of(source, seq, false)
            })
        })
    }

    /// The shift of a length derivation over the sequence of `var`'s class.
    fn length_of(&self, var: VarId) -> Option<(VarId, i8)> {
        self.members(var).find_map(|info| {
            let d = info.derived.as_ref()?;
            match d.kind {
                DerivationKind::SequenceLength { shift } => {
                    Some((self.partition.leader_of(d.sequence()?).ok()?, shift))
                }
                _ => None,
            }
        })
    }

    fn is_this(&self, var: VarId) -> bool {
        self.members(var).any(VarInfo::is_this)
    }

    /// Why `inv` over `slice_vars` is obvious, if it is.
    #[must_use]
    pub fn obvious(&self, inv: &Invariant, slice_vars: &[VarId]) -> Option<Obviousness> {
        match (inv.state(), slice_vars) {
            (InvState::NonZero(nz), &[v]) if nz.is_pointer() && self.is_this(v) => {
                Some(Obviousness::ThisNonNull)
            }
            (InvState::LowerBound(b), &[v]) => {
                let (_, shift) = self.length_of(v)?;
                (b.min() == Some(&Value::Int(i64::from(shift))))
                    .then_some(Obviousness::LengthNonNegative)
            }
            (InvState::Comparison(c), &[a, b]) => self.comparison_obvious(c, a, b),
            (InvState::Member(m), &[a, b]) => {
                let (seq, x) = if m.seq_first() { (a, b) } else { (b, a) };
                self.is_element_of(x, seq)
                    .then_some(Obviousness::DerivedElement)
            }
            (InvState::SubSequence(s), &[a, b]) => {
                let c = s.containment();
                self.containment_obvious(c.first_in_second(), c.second_in_first(), a, b)
            }
            (InvState::SubSet(s), &[a, b]) => {
                let c = s.containment();
                self.containment_obvious(c.first_in_second(), c.second_in_first(), a, b)
            }
            _ => None,
        }
    }

    fn comparison_obvious(&self, c: &Comparison, a: VarId, b: VarId) -> Option<Obviousness> {
        if let (Some((sa, _)), Some((sb, _))) = (self.length_of(a), self.length_of(b)) {
            if sa == sb {
                return Some(Obviousness::LengthShift);
            }
        }
        if c.only_eq() {
            return None;
        }
        let rel = c.relation()?;
        let prefix_first = self.is_subsequence_of(a, b, true) && rel.implies(Relation::Le);
        let prefix_second = self.is_subsequence_of(b, a, true) && rel.implies(Relation::Ge);
        (prefix_first || prefix_second).then_some(Obviousness::DerivedSubsequence)
    }

    fn containment_obvious(
        &self,
        first_in_second: bool,
        second_in_first: bool,
        a: VarId,
        b: VarId,
    ) -> Option<Obviousness> {
        let obvious = match (first_in_second, second_in_first) {
            (true, false) => self.is_subsequence_of(a, b, false),
            (false, true) => self.is_subsequence_of(b, a, false),
            _ => false,
        };
        obvious.then_some(Obviousness::DerivedSubsequence)
    }
}
