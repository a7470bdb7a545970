//! The derivation DAG of one location.
//!
//! Nodes are created in two passes at setup and never change afterwards.
//! Every node's inputs have smaller variable ids than its output, so walking
//! nodes in creation order is a topological order.

use finv_error::{InferError, Result};
use finv_types::{
    DerivationKind, Derived, InferenceConfig, ModBit, Value, ValueInterner, ValueTuple, VarId,
    VarInfo,
};
use smallvec::SmallVec;
use tracing::{debug, info};

use crate::catalogue::{binary_candidates, compute, output_info, unary_candidates};

/// One derivation: the variable it produces and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationNode {
    pub output: VarId,
    pub derived: Derived,
}

impl DerivationNode {
    #[must_use]
    pub const fn kind(&self) -> DerivationKind {
        self.derived.kind
    }

    #[must_use]
    pub fn inputs(&self) -> &[VarId] {
        &self.derived.bases
    }
}

/// Derived-variable graph of one location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivationGraph {
    base_count: usize,
    nodes: Vec<DerivationNode>,
}

impl DerivationGraph {
    /// A graph with no derivations over `base_count` variables.
    #[must_use]
    pub fn empty(base_count: usize) -> Self {
        Self {
            base_count,
            nodes: Vec::new(),
        }
    }

    /// Instantiate every applicable derivation over `base_vars`.
    ///
    /// Returns the graph and the full variable table (base variables followed
    /// by derived ones). Base variables must carry ids `0..n` in order.
    pub fn build(base_vars: &[VarInfo], config: &InferenceConfig) -> Result<(Self, Vec<VarInfo>)> {
        for (idx, var) in base_vars.iter().enumerate() {
            if var.id.index() != idx {
                return Err(InferError::internal(format!(
                    "base variable {} has id {} at position {idx}",
                    var.name, var.id
                )));
            }
        }
        let mut graph = Self::empty(base_vars.len());
        let mut vars: Vec<VarInfo> = base_vars.to_vec();

        // Pass 1: unary derivations over base variables.
        for idx in 0..base_vars.len() {
            for kind in unary_candidates(&vars[idx], config) {
                graph.push(&mut vars, kind, &[idx])?;
            }
        }

        // Pass 2: binary derivations over base variables and unary outputs.
        let pass_one = vars.len();
        for i in 0..pass_one {
            for j in (i + 1)..pass_one {
                for (kind, bases) in binary_candidates(&vars[i], &vars[j], config) {
                    graph.push(&mut vars, kind, &bases)?;
                }
            }
        }

        graph.validate()?;
        info!(
            base = graph.base_count,
            derived = graph.nodes.len(),
            "derivation graph built"
        );
        Ok((graph, vars))
    }

    fn push(&mut self, vars: &mut Vec<VarInfo>, kind: DerivationKind, bases: &[usize]) -> Result<()> {
        let id = u32::try_from(vars.len())
            .map_err(|_| InferError::internal("variable table exceeds u32 ids"))?;
        let info = {
            let inputs: SmallVec<[&VarInfo; 2]> =
                bases.iter().filter_map(|&b| vars.get(b)).collect();
            if inputs.len() != bases.len() {
                return Err(InferError::internal(format!(
                    "derivation {kind:?} reads a variable outside the table"
                )));
            }
            output_info(id, kind, &inputs)
        };
        let Some(info) = info else {
            return Ok(());
        };
        debug!(var = %info.name, ?kind, "instantiated derived variable");
        let derived = info
            .derived
            .clone()
            .ok_or_else(|| InferError::internal("derived variable without provenance"))?;
        self.nodes.push(DerivationNode {
            output: VarId(id),
            derived,
        });
        vars.push(info);
        Ok(())
    }

    #[must_use]
    pub const fn base_count(&self) -> usize {
        self.base_count
    }

    /// Number of variables after derivation.
    #[must_use]
    pub fn var_count(&self) -> usize {
        self.base_count + self.nodes.len()
    }

    #[must_use]
    pub fn nodes(&self) -> &[DerivationNode] {
        &self.nodes
    }

    /// Re-check that every node only consumes variables computed before it.
    pub fn validate(&self) -> Result<()> {
        for (idx, node) in self.nodes.iter().enumerate() {
            let expected = self.base_count + idx;
            if node.output.index() != expected {
                return Err(InferError::internal(format!(
                    "derivation node {idx} outputs {} but should output v{expected}",
                    node.output
                )));
            }
            if let Some(bad) = node.inputs().iter().find(|input| input.index() >= expected) {
                return Err(InferError::DerivationCycle {
                    node: idx,
                    input: bad.0,
                });
            }
        }
        Ok(())
    }

    /// Extend a base sample with every derived value.
    pub fn derive_all(&self, base: &ValueTuple) -> Result<ValueTuple> {
        self.derive(base, None)
    }

    /// Like [`DerivationGraph::derive_all`], interning each computed value.
    pub fn derive_all_with(
        &self,
        base: &ValueTuple,
        interner: &mut ValueInterner,
    ) -> Result<ValueTuple> {
        self.derive(base, Some(interner))
    }

    fn derive(&self, base: &ValueTuple, mut interner: Option<&mut ValueInterner>) -> Result<ValueTuple> {
        if base.len() != self.base_count {
            return Err(InferError::internal(format!(
                "derive_all expects {} base values, got {}",
                self.base_count,
                base.len()
            )));
        }
        let mut tuple = base.clone();
        for node in &self.nodes {
            let bit = ModBit::combine_all(node.inputs().iter().map(|&v| tuple.modbit(v)));
            if bit.is_missing() {
                tuple.push_derived(None, bit)?;
                continue;
            }
            let value = {
                let inputs: SmallVec<[&Value; 2]> =
                    node.inputs().iter().filter_map(|&v| tuple.value(v)).collect();
                compute(node.kind(), &inputs)
            };
            let value = match (value, interner.as_deref_mut()) {
                (Some(v), Some(store)) => Some(store.intern(v)),
                (v, _) => v,
            };
            tuple.push_derived(value, bit)?;
        }
        Ok(tuple)
    }
}
