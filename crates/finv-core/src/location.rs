//! One program point: its variables, equality partition and slices.
//!
//! [`Location::route_sample`] is the incremental phase. A sample is
//! validated, extended with derived values, used to split equality classes,
//! and then fed to every slice whose variables all carry a value. Slices
//! over a split leader are flowed to the new leaders before the sample is
//! applied, so a flowed body has seen exactly the history the new leader
//! shared with the old one.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::AddAssign;
use std::sync::Arc;

use finv_derive::DerivationGraph;
use finv_error::{InferError, Result};
use finv_inv::{Implication, InvState, Invariant, factory};
use finv_types::{
    InferenceConfig, InvKindTag, ModBit, Value, ValueInterner, ValueTuple, VarId, VarInfo,
    check_uniform_format,
};
use smallvec::SmallVec;
use tracing::{debug, info, warn};

use crate::equality::{EqualityClass, EqualityPartition, SplitEvent};
use crate::filter::{self, FilterInput, FilterReport};
use crate::prover::{self, ProverBridge};
use crate::slice::{Slice, SliceRegistry, SliceVars};

/// What one sample did to a location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleOutcome {
    /// Equality classes that split.
    pub splits: usize,
    /// Slices created by flowing a shared body to a new leader.
    pub flowed: usize,
    /// Slices created empty over variables that were just separated.
    pub instantiated: usize,
    /// Invariants falsified and removed.
    pub falsified: usize,
    /// Slices dropped for having no invariants left.
    pub pruned: usize,
}

impl AddAssign for SampleOutcome {
    fn add_assign(&mut self, rhs: Self) {
        self.splits += rhs.splits;
        self.flowed += rhs.flowed;
        self.instantiated += rhs.instantiated;
        self.falsified += rhs.falsified;
        self.pruned += rhs.pruned;
    }
}

pub struct Location {
    name: String,
    config: Arc<InferenceConfig>,
    graph: DerivationGraph,
    vars: Vec<VarInfo>,
    partition: EqualityPartition,
    slices: SliceRegistry,
    interner: ValueInterner,
    samples: u64,
    poisoned: bool,
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Location")
            .field("name", &self.name)
            .field("vars", &self.vars.len())
            .field("leaders", &self.partition.leaders().count())
            .field("slices", &self.slices.len())
            .field("samples", &self.samples)
            .field("poisoned", &self.poisoned)
            .finish_non_exhaustive()
    }
}

impl Location {
    /// Set up a location over `base_vars`, whose ids must be `0..n` in
    /// order. Derived variables are appended after them.
    pub fn new(
        name: impl Into<String>,
        base_vars: Vec<VarInfo>,
        config: Arc<InferenceConfig>,
    ) -> Result<Self> {
        let name = name.into();
        config.validate()?;
        for (i, var) in base_vars.iter().enumerate() {
            if var.id.index() != i {
                return Err(InferError::UnknownVariable {
                    location: name.clone(),
                    var: var.id.0,
                });
            }
        }
        check_uniform_format(&name, base_vars.iter().map(|v| &v.comparability))?;
        let (graph, vars) = DerivationGraph::build(&base_vars, &config)?;
        let partition = EqualityPartition::new(&vars, config.is_enabled(InvKindTag::Equality));

        let mut location = Self {
            name,
            config,
            graph,
            vars,
            partition,
            slices: SliceRegistry::new(),
            interner: ValueInterner::new(),
            samples: 0,
            poisoned: false,
        };
        let leaders: Vec<VarId> = location.partition.leaders().collect();
        for (i, &a) in leaders.iter().enumerate() {
            location.instantiate(&[a])?;
            for (j, &b) in leaders.iter().enumerate().skip(i + 1) {
                location.instantiate(&[a, b])?;
                for &c in &leaders[j + 1..] {
                    location.instantiate(&[a, b, c])?;
                }
            }
        }
        location.slices.entry_or_insert(&[]);
        info!(
            location = %location.name,
            base = base_vars.len(),
            derived = location.vars.len() - base_vars.len(),
            leaders = leaders.len(),
            slices = location.slices.len(),
            invariants = location.slices.invariant_count(),
            "location ready"
        );
        Ok(location)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Base variables followed by derived ones.
    #[must_use]
    pub fn vars(&self) -> &[VarInfo] {
        &self.vars
    }

    #[must_use]
    pub fn var_id(&self, name: &str) -> Option<VarId> {
        self.vars.iter().find(|v| v.name == name).map(|v| v.id)
    }

    #[must_use]
    pub const fn graph(&self) -> &DerivationGraph {
        &self.graph
    }

    #[must_use]
    pub const fn partition(&self) -> &EqualityPartition {
        &self.partition
    }

    #[must_use]
    pub const fn slices(&self) -> &SliceRegistry {
        &self.slices
    }

    /// Non-trivial equality classes.
    pub fn equalities(&self) -> impl Iterator<Item = &EqualityClass> + '_ {
        self.partition.classes().filter(|c| c.is_nontrivial())
    }

    /// Live invariants over exactly these variables, in the slice's own
    /// positional order.
    #[must_use]
    pub fn invariants_over(&self, vars: &[VarId]) -> &[Invariant] {
        self.slices
            .find(vars)
            .map_or(&[], |(slice, _)| slice.invariants())
    }

    #[must_use]
    pub const fn samples(&self) -> u64 {
        self.samples
    }

    #[must_use]
    pub const fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Number of interned values.
    #[must_use]
    pub fn interned(&self) -> usize {
        self.interner.len()
    }

    /// Route one base sample.
    pub fn route_sample(&mut self, base: &ValueTuple) -> Result<SampleOutcome> {
        if self.poisoned {
            return Err(InferError::LocationPoisoned(self.name.clone()));
        }
        let result = self.route(base);
        if let Err(err) = &result {
            self.poison_on(err);
        }
        result
    }

    /// Add an implication to the arity-0 slice. Returns false when an
    /// implication with the same formula is already present.
    pub fn add_implication(&mut self, implication: Implication) -> bool {
        let inv = Invariant::new(InvState::Implication(Box::new(implication)));
        let added = self.slices.entry_or_insert(&[]).push_unique(inv);
        debug!(location = %self.name, added, "implication offered");
        added
    }

    /// Assign a reporting verdict to every live invariant.
    #[must_use]
    pub fn filter(&self) -> FilterReport {
        let report = filter::run(&FilterInput {
            location: &self.name,
            vars: &self.vars,
            partition: &self.partition,
            slices: &self.slices,
            confidence_limit: self.config.confidence_limit,
        });
        info!(
            location = %self.name,
            entries = report.entries.len(),
            reportable = report.reportable().count(),
            equalities = report.equalities.len(),
            "filter complete"
        );
        report
    }

    /// Let `bridge` mark reportable entries of `report` redundant.
    pub fn apply_prover_verdicts(
        &mut self,
        report: &mut FilterReport,
        bridge: &mut dyn ProverBridge,
    ) -> Result<usize> {
        if self.poisoned {
            return Err(InferError::LocationPoisoned(self.name.clone()));
        }
        let result = prover::apply_verdicts(report, bridge);
        match &result {
            Ok(marked) => debug!(location = %self.name, marked, "prover verdicts applied"),
            Err(err) => self.poison_on(err),
        }
        result
    }

    fn poison_on(&mut self, err: &InferError) {
        if err.is_fatal() {
            self.poisoned = true;
            warn!(location = %self.name, error = %err, "location poisoned");
        }
    }

    // -----------------------------------------------------------------------
    // Sample routing
    // -----------------------------------------------------------------------

    fn route(&mut self, base: &ValueTuple) -> Result<SampleOutcome> {
        self.validate(base)?;
        let tuple = self.graph.derive_all_with(base, &mut self.interner)?;
        let events = self.partition.observe(&tuple)?;

        let mut outcome = SampleOutcome {
            splits: events.len(),
            ..SampleOutcome::default()
        };
        for event in &events {
            debug!(
                location = %self.name,
                leader = %event.old_leader,
                new_leaders = ?event.new_leaders,
                moved = event.moved.len(),
                "equality class split"
            );
            outcome.flowed += self.flow(event)?;
        }
        outcome.instantiated = self.instantiate_separated(&events)?;

        for slice in self.slices.slices_mut() {
            let Some((values, mods)) = project(&tuple, slice.vars()) else {
                continue;
            };
            let update = slice.update(&values, &mods)?;
            for kind in &update.falsified {
                debug!(location = %self.name, slice = %slice, %kind, "invariant falsified");
            }
            outcome.falsified += update.falsified.len();
        }
        outcome.pruned = self.slices.prune_empty();
        self.samples += 1;
        Ok(outcome)
    }

    fn validate(&self, base: &ValueTuple) -> Result<()> {
        let expected = self.graph.base_count();
        if base.len() != expected {
            return Err(InferError::SampleShape {
                location: self.name.clone(),
                expected,
                actual: base.len(),
            });
        }
        for (var, (value, _)) in self.vars.iter().zip(base.entries()) {
            if let Some(value) = value {
                if !var.rep_type.accepts(value) {
                    return Err(InferError::InconsistentSample {
                        var: var.id.0,
                        reason: format!("{value} is not a {:?}", var.rep_type),
                    });
                }
            }
        }
        Ok(())
    }

    /// Copy every slice over the split leader to each new leader, where the
    /// substituted tuple is still comparable.
    fn flow(&mut self, event: &SplitEvent) -> Result<usize> {
        for leader in event.leaders() {
            if !self.partition.is_leader(leader) {
                return Err(InferError::UnknownLeader {
                    location: self.name.clone(),
                    leader: leader.0,
                });
            }
        }
        let sources: Vec<Slice> = self
            .slices
            .slices()
            .filter(|s| s.vars().contains(&event.old_leader))
            .cloned()
            .collect();
        let mut flowed = 0;
        for source in &sources {
            for &leader in &event.new_leaders {
                let vars: SliceVars = source
                    .vars()
                    .iter()
                    .map(|&v| if v == event.old_leader { leader } else { v })
                    .collect();
                if !self.comparable_tuple(&vars)? {
                    debug!(location = %self.name, from = %source, "flow skips incomparable tuple");
                    continue;
                }
                let slice = source.flow_to(&vars)?;
                debug!(location = %self.name, from = %source, to = %slice, "slice flowed");
                if self.slices.insert(slice) {
                    flowed += 1;
                }
            }
        }
        Ok(flowed)
    }

    /// Create slices the flow could not: tuples holding two variables that
    /// were equal until this sample, and tuples whose pre-split counterpart
    /// was never created because comparability kept the old leader out.
    fn instantiate_separated(&mut self, events: &[SplitEvent]) -> Result<usize> {
        let mut old_leader: BTreeMap<VarId, VarId> = BTreeMap::new();
        for event in events {
            for &leader in &event.new_leaders {
                old_leader.insert(leader, event.old_leader);
            }
        }
        let leaders: Vec<VarId> = self.partition.leaders().collect();
        let mut created = 0;
        for (i, &a) in leaders.iter().enumerate() {
            for (j, &b) in leaders.iter().enumerate().skip(i + 1) {
                created += self.instantiate_after_split(&[a, b], &old_leader)?;
                for &c in &leaders[j + 1..] {
                    created += self.instantiate_after_split(&[a, b, c], &old_leader)?;
                }
            }
        }
        Ok(created)
    }

    fn instantiate_after_split(
        &mut self,
        vars: &[VarId],
        old_leader: &BTreeMap<VarId, VarId>,
    ) -> Result<usize> {
        if !vars.iter().any(|v| old_leader.contains_key(v)) || self.slices.contains(vars) {
            return Ok(0);
        }
        let mut source: SliceVars = vars
            .iter()
            .map(|v| old_leader.get(v).copied().unwrap_or(*v))
            .collect();
        source.sort_unstable();
        let separated = source.windows(2).any(|w| w[0] == w[1]);
        if !separated && (self.slices.contains(&source) || self.slices.is_retired(&source)) {
            return Ok(0);
        }
        self.instantiate(vars)
    }

    fn infos(&self, vars: &[VarId]) -> Result<SmallVec<[&VarInfo; 3]>> {
        vars.iter()
            .map(|v| {
                self.vars.get(v.index()).ok_or_else(|| InferError::UnknownVariable {
                    location: self.name.clone(),
                    var: v.0,
                })
            })
            .collect()
    }

    /// Every pair in `vars` may be related.
    fn comparable_tuple(&self, vars: &[VarId]) -> Result<bool> {
        let infos = self.infos(vars)?;
        Ok(infos.iter().enumerate().all(|(i, a)| {
            infos[i + 1..]
                .iter()
                .all(|b| factory::pair_comparable(a, b))
        }))
    }

    /// Create a slice over `vars` unless one exists or no kind applies.
    fn instantiate(&mut self, vars: &[VarId]) -> Result<usize> {
        if self.slices.contains(vars) {
            return Ok(0);
        }
        let invariants = {
            let infos = self.infos(vars)?;
            match infos.as_slice() {
                [a] => factory::unary(a, &self.config),
                [a, b] => factory::binary(a, b, &self.config),
                [a, b, c] => factory::ternary([*a, *b, *c], &self.config)?,
                _ => return Err(InferError::internal(format!("no slices of arity {}", vars.len()))),
            }
        };
        if invariants.is_empty() {
            return Ok(0);
        }
        Ok(usize::from(self.slices.insert(Slice::new(vars, invariants))))
    }
}

/// Values and bits of `vars`, or `None` when any is missing.
fn project<'t>(
    tuple: &'t ValueTuple,
    vars: &[VarId],
) -> Option<(SmallVec<[&'t Value; 3]>, SmallVec<[ModBit; 3]>)> {
    let mut values = SmallVec::new();
    let mut mods = SmallVec::new();
    for &var in vars {
        let bit = tuple.modbit(var);
        if bit.is_missing() {
            return None;
        }
        values.push(tuple.value(var)?);
        mods.push(bit);
    }
    Some((values, mods))
}

#[cfg(test)]
mod tests {
    use finv_types::RepType;

    use super::*;

    fn ints(names: &[&str]) -> Vec<VarInfo> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| VarInfo::new(i as u32, *n, RepType::Int))
            .collect()
    }

    fn location(names: &[&str]) -> Location {
        Location::new("P:::EXIT", ints(names), Arc::new(InferenceConfig::default())).unwrap()
    }

    fn sample(values: &[i64]) -> ValueTuple {
        ValueTuple::from_values(values.iter().map(|v| Value::Int(*v)))
    }

    #[test]
    fn test_setup_only_slices_leaders() {
        let loc = location(&["x", "y"]);
        assert_eq!(loc.partition().leaders().count(), 1);
        assert!(loc.slices().contains(&[VarId(0)]));
        assert!(!loc.slices().contains(&[VarId(1)]));
        assert!(loc.slices().contains(&[]), "arity-0 slice always exists");
    }

    #[test]
    fn test_split_flows_unary_and_instantiates_pair() {
        let mut loc = location(&["x", "y"]);
        for _ in 0..3 {
            let out = loc.route_sample(&sample(&[5, 5])).unwrap();
            assert_eq!(out.splits, 0);
        }
        // 7 keeps y's modulus alive so both unary bodies stay the same size.
        let out = loc.route_sample(&sample(&[5, 7])).unwrap();
        assert_eq!(out.splits, 1);
        assert_eq!(out.flowed, 1);
        assert_eq!(out.instantiated, 1);

        let x = loc.invariants_over(&[VarId(0)]);
        let y = loc.invariants_over(&[VarId(1)]);
        assert_eq!(x.len(), y.len());
        for (a, b) in x.iter().zip(y) {
            assert_eq!(a.samples(), 4);
            assert_eq!(b.samples(), 4);
        }
        let pair = loc.invariants_over(&[VarId(0), VarId(1)]);
        assert!(pair.iter().all(|i| i.samples() == 1));
        assert!(pair.iter().any(|i| i.kind() == InvKindTag::Comparison));
    }

    #[test]
    fn test_wrong_width_poisons() {
        let mut loc = location(&["x", "y"]);
        let err = loc.route_sample(&sample(&[1])).unwrap_err();
        assert!(matches!(err, InferError::SampleShape { expected: 2, actual: 1, .. }));
        assert!(loc.is_poisoned());
        let err = loc.route_sample(&sample(&[1, 2])).unwrap_err();
        assert_eq!(err, InferError::LocationPoisoned("P:::EXIT".to_owned()));
    }

    #[test]
    fn test_rep_type_mismatch_is_rejected() {
        let mut loc = location(&["x"]);
        let bad = ValueTuple::from_values([Value::str("hello")]);
        let err = loc.route_sample(&bad).unwrap_err();
        assert!(matches!(err, InferError::InconsistentSample { var: 0, .. }));
    }

    #[test]
    fn test_missing_values_skip_slices() {
        let mut loc = location(&["x"]);
        let missing = ValueTuple::new(vec![(None, ModBit::MissingFlow)]).unwrap();
        loc.route_sample(&missing).unwrap();
        assert!(loc.invariants_over(&[VarId(0)]).iter().all(|i| i.samples() == 0));
    }

    #[test]
    fn test_duplicate_implication_is_ignored() {
        let mut loc = location(&["x"]);
        let half = || Invariant::new(InvState::NonZero(finv_inv::scalar::NonZero::new(false, 50)));
        let imp = || Implication::new(half(), vec!["x".into()], half(), vec!["y".into()], false);
        assert!(loc.add_implication(imp()));
        assert!(!loc.add_implication(imp()));
        assert_eq!(loc.invariants_over(&[]).len(), 1);
    }
}
