//! Report filtering: justification, obviousness, logical suppression.
//!
//! Nothing is removed here. Every live invariant gets a [`Reportability`]
//! marker and the caller decides what to print.

use std::collections::BTreeMap;

use finv_error::{InferError, Result};
use finv_inv::{InvariantDescription, Justification};
use finv_types::{InvKindTag, VarId, VarInfo};
use serde::{Deserialize, Serialize};

use crate::equality::EqualityPartition;
use crate::obvious::{Obviousness, Provenance};
use crate::slice::{SliceKey, SliceRegistry};
use crate::suppress::{FactBase, Found, find_suppression};

/// Reporting verdict for one invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reportability {
    Reportable,
    Unjustified,
    Obvious(Obviousness),
    /// Implied by the listed reportable invariants.
    Suppressed { by: Vec<String> },
    /// The prover bridge found it implied by the other reportable facts.
    Redundant,
}

impl Reportability {
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        matches!(self, Self::Reportable)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterEntry {
    pub vars: Vec<String>,
    pub description: InvariantDescription,
    pub justification: Justification,
    pub confidence: f64,
    pub reportability: Reportability,
}

/// Every live invariant of one location with its verdict.
#[derive(Debug, Clone, Serialize)]
pub struct FilterReport {
    pub location: String,
    /// In slice-key order, then slice order.
    pub entries: Vec<FilterEntry>,
    /// Non-trivial equality classes.
    pub equalities: Vec<InvariantDescription>,
}

impl FilterReport {
    pub fn reportable(&self) -> impl Iterator<Item = &FilterEntry> + '_ {
        self.entries
            .iter()
            .filter(|e| e.reportability.is_reportable())
    }

    /// Formulas of every reportable entry, equalities first.
    #[must_use]
    pub fn reportable_formulas(&self) -> Vec<String> {
        self.equalities
            .iter()
            .map(ToString::to_string)
            .chain(self.reportable().map(|e| e.description.to_string()))
            .collect()
    }

    /// Entry with this exact formula.
    #[must_use]
    pub fn find(&self, formula: &str) -> Option<&FilterEntry> {
        self.entries
            .iter()
            .find(|e| e.description.formula == formula)
    }

    pub fn count(&self, pred: impl Fn(&Reportability) -> bool) -> usize {
        self.entries
            .iter()
            .filter(|e| pred(&e.reportability))
            .count()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| InferError::internal(format!("report serialization: {e}")))
    }
}

/// Everything the filter reads from a location.
pub(crate) struct FilterInput<'a> {
    pub location: &'a str,
    pub vars: &'a [VarInfo],
    pub partition: &'a EqualityPartition,
    pub slices: &'a SliceRegistry,
    pub confidence_limit: f64,
}

type Marks = BTreeMap<SliceKey, Vec<Reportability>>;

struct Facts<'a> {
    slices: &'a SliceRegistry,
    marks: &'a Marks,
    provenance: &'a Provenance<'a>,
    partition: &'a EqualityPartition,
}

impl FactBase for Facts<'_> {
    fn accepted(&self, kind: InvKindTag, vars: &[VarId]) -> Option<Found<'_>> {
        let (slice, swapped) = self.slices.find(vars)?;
        let marks = self.marks.get(&slice.key())?;
        slice
            .invariants()
            .iter()
            .zip(marks)
            .find(|(inv, mark)| inv.kind() == kind && mark.is_reportable())
            .map(|(inv, _)| Found { inv, swapped })
    }

    fn element_source(&self, var: VarId) -> Option<VarId> {
        self.provenance.element_source(var)
    }

    fn leaders(&self) -> Vec<VarId> {
        self.partition.leaders().collect()
    }
}

fn names<'a>(vars: &'a [VarInfo], ids: &[VarId]) -> Vec<&'a str> {
    ids.iter()
        .map(|id| vars.get(id.index()).map_or("?", |v| v.name.as_str()))
        .collect()
}

pub(crate) fn run(input: &FilterInput<'_>) -> FilterReport {
    let provenance = Provenance::new(input.vars, input.partition);

    // Justification and obviousness are local to each invariant.
    let mut marks: Marks = BTreeMap::new();
    for (key, slice) in input.slices.entries() {
        let slice_marks = slice
            .invariants()
            .iter()
            .map(|inv| {
                if inv.justification(input.confidence_limit) != Justification::Justified {
                    return Reportability::Unjustified;
                }
                if slice.arity() > 0 {
                    if let Some(reason) = provenance.obvious(inv, slice.vars()) {
                        return Reportability::Obvious(reason);
                    }
                }
                Reportability::Reportable
            })
            .collect();
        marks.insert(key.clone(), slice_marks);
    }

    // Suppression runs in registry order; an antecedent must still be
    // reportable when its dependent is evaluated.
    for (key, slice) in input.slices.entries() {
        if slice.arity() == 0 {
            continue;
        }
        for (idx, inv) in slice.invariants().iter().enumerate() {
            let reportable = marks
                .get(key)
                .and_then(|m| m.get(idx))
                .is_some_and(Reportability::is_reportable);
            if !reportable {
                continue;
            }
            let facts = Facts {
                slices: input.slices,
                marks: &marks,
                provenance: &provenance,
                partition: input.partition,
            };
            let Some(found) = find_suppression(&facts, inv, slice.vars()) else {
                continue;
            };
            let by = found
                .by
                .iter()
                .map(|(kind, vars)| describe_antecedent(input, *kind, vars))
                .collect();
            if let Some(mark) = marks.get_mut(key).and_then(|m| m.get_mut(idx)) {
                *mark = Reportability::Suppressed { by };
            }
        }
    }

    let mut entries = Vec::new();
    for (key, slice) in input.slices.entries() {
        let slice_names = names(input.vars, slice.vars());
        let Some(slice_marks) = marks.remove(key) else {
            continue;
        };
        for (inv, reportability) in slice.invariants().iter().zip(slice_marks) {
            entries.push(FilterEntry {
                vars: slice_names.iter().map(|n| (*n).to_owned()).collect(),
                description: inv.describe(&slice_names),
                justification: inv.justification(input.confidence_limit),
                confidence: inv.confidence(),
                reportability,
            });
        }
    }

    let equalities = input
        .partition
        .classes()
        .filter(|c| c.is_nontrivial() && c.samples() > 0)
        .map(|c| InvariantDescription::equality(&names(input.vars, c.members())))
        .collect();

    FilterReport {
        location: input.location.to_owned(),
        entries,
        equalities,
    }
}

fn describe_antecedent(input: &FilterInput<'_>, kind: InvKindTag, vars: &[VarId]) -> String {
    input
        .slices
        .find(vars)
        .and_then(|(slice, _)| {
            let inv = slice.invariants().iter().find(|i| i.kind() == kind)?;
            Some(inv.describe(&names(input.vars, slice.vars())).formula)
        })
        .unwrap_or_else(|| format!("{kind}({})", names(input.vars, vars).join(", ")))
}
