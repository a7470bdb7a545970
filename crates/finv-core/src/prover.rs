//! Boundary to an external theorem prover.
//!
//! The engine never reasons about formulas itself; it only asks a bridge
//! whether each reportable invariant follows from the others.

use finv_error::{InferError, Result};
use finv_inv::InvariantDescription;

use crate::filter::{FilterReport, Reportability};

/// Answers redundancy questions.
pub trait ProverBridge {
    /// One verdict per candidate: `true` when the candidate follows from
    /// `background`.
    fn redundancy_verdicts(
        &mut self,
        background: &[InvariantDescription],
        candidates: &[InvariantDescription],
    ) -> Vec<bool>;
}

impl<F> ProverBridge for F
where
    F: FnMut(&[InvariantDescription], &[InvariantDescription]) -> Vec<bool>,
{
    fn redundancy_verdicts(
        &mut self,
        background: &[InvariantDescription],
        candidates: &[InvariantDescription],
    ) -> Vec<bool> {
        self(background, candidates)
    }
}

/// Mark reportable entries the bridge proves redundant. Candidates are
/// asked one at a time against everything still reportable, so two facts
/// can never eliminate each other. Returns how many were marked.
pub fn apply_verdicts(report: &mut FilterReport, bridge: &mut dyn ProverBridge) -> Result<usize> {
    let mut marked = 0;
    for idx in 0..report.entries.len() {
        if !report.entries[idx].reportability.is_reportable() {
            continue;
        }
        let background: Vec<InvariantDescription> = report
            .equalities
            .iter()
            .cloned()
            .chain(
                report
                    .entries
                    .iter()
                    .enumerate()
                    .filter(|(i, e)| *i != idx && e.reportability.is_reportable())
                    .map(|(_, e)| e.description.clone()),
            )
            .collect();
        let candidate = [report.entries[idx].description.clone()];
        let verdicts = bridge.redundancy_verdicts(&background, &candidate);
        if verdicts.len() != candidate.len() {
            return Err(InferError::ProverVerdictMismatch {
                expected: candidate.len(),
                actual: verdicts.len(),
            });
        }
        if verdicts[0] {
            report.entries[idx].reportability = Reportability::Redundant;
            marked += 1;
        }
    }
    Ok(marked)
}
