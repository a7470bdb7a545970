//! Per-sample value tuples and modification bits.

use finv_error::{InferError, Result};
use serde::{Deserialize, Serialize};

use crate::value::Value;
use crate::var::VarId;

/// Per-variable, per-sample status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModBit {
    /// The value repeats the previous observation of this variable.
    Unmodified,
    /// The value may differ from the previous observation.
    Modified,
    /// The variable has no meaningful value (e.g. `a[i]` with `i` out of range).
    MissingNonsensical,
    /// The variable was not reached by control flow.
    MissingFlow,
}

impl ModBit {
    #[must_use]
    pub const fn is_missing(self) -> bool {
        matches!(self, Self::MissingNonsensical | Self::MissingFlow)
    }

    const fn rank(self) -> u8 {
        match self {
            Self::Unmodified => 0,
            Self::Modified => 1,
            Self::MissingFlow => 2,
            Self::MissingNonsensical => 3,
        }
    }

    /// Modification bit of a value computed from inputs with these bits.
    ///
    /// Precedence: nonsensical, flow, modified, unmodified.
    #[must_use]
    pub const fn combine(self, other: Self) -> Self {
        if self.rank() >= other.rank() { self } else { other }
    }

    /// Fold [`ModBit::combine`] over several inputs. An empty input is unmodified.
    #[must_use]
    pub fn combine_all(bits: impl IntoIterator<Item = Self>) -> Self {
        bits.into_iter().fold(Self::Unmodified, Self::combine)
    }
}

/// An immutable vector of `(value, modbit)` pairs indexed by [`VarId`].
///
/// A missing bit always pairs with `None` and a present bit with `Some`;
/// construction rejects anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueTuple {
    entries: Vec<(Option<Value>, ModBit)>,
}

impl ValueTuple {
    /// Validate and wrap a raw sample.
    pub fn new(entries: Vec<(Option<Value>, ModBit)>) -> Result<Self> {
        for (idx, (value, bit)) in entries.iter().enumerate() {
            check_entry(idx, value.as_ref(), *bit)?;
        }
        Ok(Self { entries })
    }

    /// A sample in which every value is present and modified.
    #[must_use]
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            entries: values
                .into_iter()
                .map(|v| (Some(v), ModBit::Modified))
                .collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value of `var`, `None` when missing or out of range.
    #[must_use]
    pub fn value(&self, var: VarId) -> Option<&Value> {
        self.entries.get(var.index()).and_then(|(v, _)| v.as_ref())
    }

    /// Modification bit of `var`. Out of range counts as nonsensical.
    #[must_use]
    pub fn modbit(&self, var: VarId) -> ModBit {
        self.entries
            .get(var.index())
            .map_or(ModBit::MissingNonsensical, |(_, bit)| *bit)
    }

    #[must_use]
    pub fn is_missing(&self, var: VarId) -> bool {
        self.modbit(var).is_missing()
    }

    /// Append a derived value. Used only by the derivation graph while it
    /// extends a base tuple.
    pub fn push_derived(&mut self, value: Option<Value>, bit: ModBit) -> Result<()> {
        let bit = match (&value, bit.is_missing()) {
            (None, false) => ModBit::MissingNonsensical,
            _ => bit,
        };
        check_entry(self.entries.len(), value.as_ref(), bit)?;
        self.entries.push((value, bit));
        Ok(())
    }

    pub fn entries(&self) -> impl Iterator<Item = (Option<&Value>, ModBit)> + '_ {
        self.entries.iter().map(|(v, b)| (v.as_ref(), *b))
    }
}

fn check_entry(idx: usize, value: Option<&Value>, bit: ModBit) -> Result<()> {
    match (value.is_some(), bit.is_missing()) {
        (true, true) => Err(InferError::InconsistentSample {
            var: idx as u32,
            reason: format!("{bit:?} paired with a value"),
        }),
        (false, false) => Err(InferError::InconsistentSample {
            var: idx as u32,
            reason: format!("{bit:?} without a value"),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_precedence() {
        use ModBit::{MissingFlow, MissingNonsensical, Modified, Unmodified};
        assert_eq!(Unmodified.combine(Modified), Modified);
        assert_eq!(Modified.combine(MissingFlow), MissingFlow);
        assert_eq!(MissingFlow.combine(MissingNonsensical), MissingNonsensical);
        assert_eq!(MissingNonsensical.combine(Unmodified), MissingNonsensical);
        assert_eq!(ModBit::combine_all([]), Unmodified);
    }

    #[test]
    fn test_new_rejects_inconsistent_pairs() {
        let err = ValueTuple::new(vec![
            (Some(Value::Int(1)), ModBit::Modified),
            (Some(Value::Int(2)), ModBit::MissingFlow),
        ])
        .unwrap_err();
        assert!(
            matches!(err, InferError::InconsistentSample { var: 1, .. }),
            "unexpected error: {err}"
        );
        assert!(ValueTuple::new(vec![(None, ModBit::Unmodified)]).is_err());
    }

    #[test]
    fn test_accessors() {
        let t = ValueTuple::new(vec![
            (Some(Value::Int(7)), ModBit::Unmodified),
            (None, ModBit::MissingNonsensical),
        ])
        .unwrap();
        assert_eq!(t.value(VarId(0)), Some(&Value::Int(7)));
        assert_eq!(t.modbit(VarId(0)), ModBit::Unmodified);
        assert!(t.is_missing(VarId(1)));
        assert!(t.is_missing(VarId(9)), "out of range reads as missing");
    }

    #[test]
    fn test_push_derived_normalizes_missing() {
        let mut t = ValueTuple::from_values([Value::Int(1)]);
        t.push_derived(None, ModBit::Modified).unwrap();
        assert_eq!(t.modbit(VarId(1)), ModBit::MissingNonsensical);
        assert!(t.push_derived(Some(Value::Int(2)), ModBit::MissingFlow).is_err());
        assert_eq!(t.len(), 2);
    }
}
