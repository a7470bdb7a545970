//! Invariant state machines.
//!
//! Every kind is a plain state struct; [`Invariant`] wraps the closed sum of
//! them ([`InvState`]) behind `update`, `confidence`, `same_formula`,
//! `exclusive_formula` and `describe`. The [`factory`] decides which kinds a
//! tuple of variables starts out with.

pub mod binary;
pub mod description;
pub mod factory;
pub mod implication;
pub mod invariant;
pub mod relation;
pub mod scalar;
pub mod sequence;
pub mod ternary;
pub mod tracker;

use serde::{Deserialize, Serialize};

pub use description::InvariantDescription;
pub use implication::Implication;
pub use invariant::{InvState, Invariant};
pub use relation::Relation;
pub use ternary::BinaryFunction;

/// Result of feeding one sample to an invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateOutcome {
    Continue,
    /// The sample contradicts the hypothesis. Terminal.
    Falsified,
}

/// Reporting status of an invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Justification {
    Justified,
    /// Too little evidence, including zero samples.
    Unjustified,
    /// Falsified.
    Never,
}
