//! The FrankenInv engine.
//!
//! A [`Location`] owns one program point's variables, its
//! [`EqualityPartition`] and a [`SliceRegistry`] of candidate invariants.
//! Samples are routed with [`Location::route_sample`]; when a run is over,
//! [`Location::filter`] marks each survivor reportable, unjustified, obvious
//! or suppressed. [`LocationMap`] holds every location of a run.

pub mod equality;
pub mod filter;
pub mod location;
pub mod map;
pub mod obvious;
pub mod prover;
pub mod slice;
pub mod suppress;

pub use equality::{EqualityClass, EqualityPartition, SplitEvent};
pub use filter::{FilterEntry, FilterReport, Reportability};
pub use location::{Location, SampleOutcome};
pub use map::LocationMap;
pub use obvious::Obviousness;
pub use prover::ProverBridge;
pub use slice::{Slice, SliceRegistry};
pub use suppress::{Rule, SuppressionTemplate, TEMPLATES};
