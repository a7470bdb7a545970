//! FrankenInv: infer likely invariants (`x > 0`, `a sorted by <=`,
//! `x == y`) from observed execution samples.
//!
//! ```text
//! VarInfo[] + InferenceConfig -> Location::new
//!     ValueTuple -> Location::route_sample   (repeat)
//!     Location::filter -> FilterReport
//! ```
//!
//! This crate re-exports the public surface of the workspace crates.

pub use finv_core::{
    EqualityClass, EqualityPartition, FilterEntry, FilterReport, Location, LocationMap,
    Obviousness, ProverBridge, Reportability, SampleOutcome, Slice, SliceRegistry, SplitEvent,
};
pub use finv_derive::DerivationGraph;
pub use finv_error::{InferError, Result};
pub use finv_inv::{
    Implication, InvState, Invariant, InvariantDescription, Justification, Relation,
    UpdateOutcome,
};
pub use finv_types::{
    Comparability, DerivationKind, DerivationTag, ImplicitTag, InferenceConfig, InvKindTag,
    ModBit, RepType, Value, ValueInterner, ValueTuple, VarAux, VarId, VarInfo,
};

/// Lower-level modules, for callers that build their own pipelines.
pub mod engine {
    pub use finv_core::{equality, filter, location, map, obvious, prover, slice, suppress};
    pub use finv_derive::{catalogue, graph};
    pub use finv_inv::{binary, factory, relation, scalar, sequence, ternary};
}
