//! Derived variables for FrankenInv.
//!
//! A location's variables are extended with values computed from them:
//! sequence lengths, fixed elements, min/max/sum, subscripts and subsequences
//! indexed by scalars, and (optionally) set operations between sequences.
//! The [`DerivationGraph`] is fixed at setup; per sample it turns a base
//! [`finv_types::ValueTuple`] into the full tuple the slices consume.

pub mod catalogue;
pub mod graph;

pub use graph::{DerivationGraph, DerivationNode};
