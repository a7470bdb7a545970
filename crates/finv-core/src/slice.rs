//! Slices and the registry that owns them.
//!
//! A slice pairs a positional tuple of leader variables with a body of live
//! invariants. Bodies sit behind an `Arc`: flowing a slice to a new leader
//! shares the body, and [`Slice::update`] is the single place a shared body
//! is cloned (`Arc::make_mut`) before it diverges.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use finv_error::{InferError, Result};
use finv_inv::{InvState, Invariant, UpdateOutcome};
use finv_types::{InvKindTag, ModBit, Value, VarId};
use smallvec::SmallVec;

/// Registry key: the slice's variables in ascending order.
pub type SliceKey = SmallVec<[VarId; 3]>;

/// Positional variables of a slice.
pub type SliceVars = SmallVec<[VarId; 3]>;

#[must_use]
pub fn slice_key(vars: &[VarId]) -> SliceKey {
    let mut key: SliceKey = vars.iter().copied().collect();
    key.sort_unstable();
    key
}

/// The invariants of one slice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SliceBody {
    invariants: Vec<Invariant>,
}

impl SliceBody {
    #[must_use]
    pub const fn new(invariants: Vec<Invariant>) -> Self {
        Self { invariants }
    }

    #[must_use]
    pub fn invariants(&self) -> &[Invariant] {
        &self.invariants
    }
}

/// What one sample did to a slice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SliceUpdate {
    /// Kinds falsified and removed.
    pub falsified: Vec<InvKindTag>,
    /// The body was shared and had to be cloned first.
    pub diverged: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice {
    vars: SliceVars,
    body: Arc<SliceBody>,
}

impl Slice {
    #[must_use]
    pub fn new(vars: &[VarId], invariants: Vec<Invariant>) -> Self {
        Self {
            vars: vars.iter().copied().collect(),
            body: Arc::new(SliceBody::new(invariants)),
        }
    }

    #[must_use]
    pub fn vars(&self) -> &[VarId] {
        &self.vars
    }

    #[must_use]
    pub fn key(&self) -> SliceKey {
        slice_key(&self.vars)
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.vars.len()
    }

    #[must_use]
    pub fn invariants(&self) -> &[Invariant] {
        self.body.invariants()
    }

    #[must_use]
    pub fn body(&self) -> &SliceBody {
        &self.body
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.invariants.is_empty()
    }

    /// Another slice currently shares this body.
    #[must_use]
    pub fn is_shared(&self) -> bool {
        Arc::strong_count(&self.body) > 1
    }

    /// The same body over substituted variables, put back in ascending
    /// order. The body stays shared until either side is updated, unless the
    /// reorder moved operands and the invariants had to follow.
    pub fn flow_to(&self, vars: &[VarId]) -> Result<Self> {
        let mut order: SmallVec<[usize; 3]> = (0..vars.len()).collect();
        order.sort_by_key(|&i| vars[i]);
        let sorted: SliceVars = order.iter().map(|&i| vars[i]).collect();
        if order.iter().enumerate().all(|(i, &from)| i == from) {
            return Ok(Self {
                vars: sorted,
                body: Arc::clone(&self.body),
            });
        }
        let mut body = SliceBody::clone(&self.body);
        for inv in &mut body.invariants {
            inv.permute(&order)?;
        }
        Ok(Self {
            vars: sorted,
            body: Arc::new(body),
        })
    }

    /// Feed one projected sample to every invariant and drop the falsified.
    pub fn update(&mut self, values: &[&Value], mods: &[ModBit]) -> Result<SliceUpdate> {
        if values.len() != self.arity() || mods.len() != self.arity() {
            return Err(InferError::ArityMismatch {
                slice: self.to_string(),
                expected: self.arity(),
                actual: values.len(),
            });
        }
        let diverged = self.is_shared();
        let body = Arc::make_mut(&mut self.body);
        let mut falsified = Vec::new();
        for inv in &mut body.invariants {
            if inv.update(values, mods)? == UpdateOutcome::Falsified {
                falsified.push(inv.kind());
            }
        }
        if !falsified.is_empty() {
            body.invariants.retain(|inv| !inv.is_falsified());
        }
        if self.vars.len() == 1 {
            let hint = body.invariants.iter().find_map(|inv| match inv.state() {
                InvState::Modulus(m) => m.result().map(|(_, modulus)| modulus),
                _ => None,
            });
            for inv in &mut body.invariants {
                inv.set_modulus_hint(hint);
            }
        }
        Ok(SliceUpdate {
            falsified,
            diverged,
        })
    }

    /// Add an invariant unless one with the same formula is present.
    pub fn push_unique(&mut self, inv: Invariant) -> bool {
        if self.invariants().iter().any(|have| have.same_formula(&inv)) {
            return false;
        }
        Arc::make_mut(&mut self.body).invariants.push(inv);
        true
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, v) in self.vars.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{v}")?;
        }
        f.write_str(")")
    }
}

/// Every slice of one location, keyed by sorted variable set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SliceRegistry {
    slices: BTreeMap<SliceKey, Slice>,
    /// Keys pruned for having no invariants left.
    retired: BTreeSet<SliceKey>,
}

impl SliceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Register a slice. Returns false, leaving the registry unchanged, when
    /// its variable set is already taken.
    pub fn insert(&mut self, slice: Slice) -> bool {
        let key = slice.key();
        if self.slices.contains_key(&key) {
            return false;
        }
        self.slices.insert(key, slice);
        true
    }

    #[must_use]
    pub fn contains(&self, vars: &[VarId]) -> bool {
        self.slices.contains_key(&slice_key(vars))
    }

    /// A slice over these variables existed and lost every invariant.
    #[must_use]
    pub fn is_retired(&self, vars: &[VarId]) -> bool {
        self.retired.contains(&slice_key(vars))
    }

    #[must_use]
    pub fn get(&self, key: &[VarId]) -> Option<&Slice> {
        self.slices.get(key)
    }

    pub fn get_mut(&mut self, key: &[VarId]) -> Option<&mut Slice> {
        self.slices.get_mut(key)
    }

    pub fn entry_or_insert(&mut self, vars: &[VarId]) -> &mut Slice {
        self.slices
            .entry(slice_key(vars))
            .or_insert_with(|| Slice::new(vars, Vec::new()))
    }

    /// The slice over exactly these variables, and whether its positional
    /// order is the reverse of `vars`. Orders that are neither are `None`.
    #[must_use]
    pub fn find(&self, vars: &[VarId]) -> Option<(&Slice, bool)> {
        let slice = self.slices.get(&slice_key(vars))?;
        if slice.vars() == vars {
            return Some((slice, false));
        }
        let reversed = vars.len() == 2 && slice.vars()[0] == vars[1] && slice.vars()[1] == vars[0];
        reversed.then_some((slice, true))
    }

    pub fn entries(&self) -> impl Iterator<Item = (&SliceKey, &Slice)> + '_ {
        self.slices.iter()
    }

    pub fn slices(&self) -> impl Iterator<Item = &Slice> + '_ {
        self.slices.values()
    }

    pub fn slices_mut(&mut self) -> impl Iterator<Item = &mut Slice> + '_ {
        self.slices.values_mut()
    }

    /// Drop slices without invariants; arity-0 slices stay. Returns how
    /// many were dropped.
    pub fn prune_empty(&mut self) -> usize {
        let before = self.slices.len();
        let retired = &mut self.retired;
        self.slices.retain(|key, slice| {
            let keep = key.is_empty() || !slice.is_empty();
            if !keep {
                retired.insert(key.clone());
            }
            keep
        });
        before - self.slices.len()
    }

    /// Total live invariants.
    #[must_use]
    pub fn invariant_count(&self) -> usize {
        self.slices.values().map(|s| s.invariants().len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use finv_inv::binary::Comparison;
    use finv_inv::scalar::NonZero;

    use super::*;

    fn nonzero_slice(var: u32) -> Slice {
        Slice::new(
            &[VarId(var)],
            vec![Invariant::new(InvState::NonZero(NonZero::new(false, 50)))],
        )
    }

    #[test]
    fn test_flow_shares_until_update() {
        let mut a = nonzero_slice(0);
        a.update(&[&Value::Int(3)], &[ModBit::Modified]).unwrap();
        let mut b = a.flow_to(&[VarId(4)]).unwrap();
        assert!(a.is_shared() && b.is_shared());
        assert_eq!(b.key().as_slice(), &[VarId(4)]);

        let up = b.update(&[&Value::Int(0)], &[ModBit::Modified]).unwrap();
        assert!(up.diverged);
        assert_eq!(up.falsified, vec![InvKindTag::NonZero]);
        assert!(b.is_empty());
        assert!(!a.is_shared());
        assert_eq!(a.invariants().len(), 1, "original keeps its history");
        assert_eq!(a.invariants()[0].samples(), 1);
    }

    #[test]
    fn test_reordering_flow_permutes_a_private_body() {
        let mut a = Slice::new(
            &[VarId(1), VarId(2)],
            vec![Invariant::new(InvState::Comparison(Comparison::new(false)))],
        );
        a.update(&[&Value::Int(1), &Value::Int(4)], &[ModBit::Modified; 2])
            .unwrap();
        // VarId(1) is replaced by VarId(3), which now sorts last.
        let b = a.flow_to(&[VarId(3), VarId(2)]).unwrap();
        assert_eq!(b.vars(), &[VarId(2), VarId(3)]);
        assert!(!a.is_shared() && !b.is_shared());
        assert_eq!(b.invariants()[0].describe(&["v2", "v3"]).to_string(), "v2 > v3");
        assert_eq!(a.invariants()[0].describe(&["v1", "v2"]).to_string(), "v1 < v2");
    }

    #[test]
    fn test_update_checks_arity() {
        let mut a = nonzero_slice(0);
        let err = a.update(&[], &[]).unwrap_err();
        assert!(matches!(err, InferError::ArityMismatch { expected: 1, .. }));
    }

    #[test]
    fn test_registry_find_and_prune() {
        let mut reg = SliceRegistry::new();
        assert!(reg.insert(Slice::new(&[VarId(2), VarId(1)], Vec::new())));
        assert!(!reg.insert(Slice::new(&[VarId(1), VarId(2)], Vec::new())));
        let (_, swapped) = reg.find(&[VarId(1), VarId(2)]).unwrap();
        assert!(swapped);
        assert!(!reg.find(&[VarId(2), VarId(1)]).unwrap().1);
        reg.entry_or_insert(&[]);
        assert_eq!(reg.prune_empty(), 1);
        assert_eq!(reg.len(), 1, "the arity-0 slice survives");
        assert!(reg.is_retired(&[VarId(2), VarId(1)]));
        assert!(!reg.is_retired(&[]));
    }
}
